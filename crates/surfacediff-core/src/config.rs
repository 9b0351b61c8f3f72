//! Comparison configuration (surfacediff.json / surfacediff.toml)
//!
//! One immutable `ComparisonConfiguration` value is validated up front and
//! then threaded through every engine component.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use crate::graph::NameGraph;
use crate::pattern::PatternSet;

/// Namespace and type identity mappings between the two versions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingConfig {
    /// Match unresolved types by simple name across namespaces
    pub auto_map_same_name_types: bool,

    /// Compare names case-insensitively
    pub ignore_case: bool,

    /// Source namespace -> ordered target namespaces
    pub namespace_mappings: BTreeMap<String, Vec<String>>,

    /// Source fully-qualified type name -> target fully-qualified type name
    pub type_mappings: BTreeMap<String, String>,
}

impl MappingConfig {
    pub fn map_namespace(mut self, source: impl Into<String>, targets: Vec<String>) -> Self {
        self.namespace_mappings.insert(source.into(), targets);
        self
    }

    pub fn map_type(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.type_mappings.insert(source.into(), target.into());
        self
    }

    pub fn normalize(&self, name: &str) -> String {
        if self.ignore_case {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    /// Check keys, values, duplicates and namespace cycles
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut graph = NameGraph::new();

        for (source, targets) in &self.namespace_mappings {
            if source.trim().is_empty() {
                return Err(ConfigError::EmptyMappingKey);
            }
            if targets.is_empty() {
                return Err(ConfigError::EmptyMappingTargets(source.clone()));
            }

            let mut seen = HashSet::new();
            for target in targets {
                if target.trim().is_empty() {
                    return Err(ConfigError::EmptyMappingValue(source.clone()));
                }
                if !seen.insert(self.normalize(target)) {
                    return Err(ConfigError::DuplicateMappingTarget {
                        namespace: source.clone(),
                        target: target.clone(),
                    });
                }
                graph.add_edge(&self.normalize(source), &self.normalize(target));
            }
        }

        if let Some(cycle) = graph.find_cycle() {
            return Err(ConfigError::MappingCycle(cycle.join(" -> ")));
        }

        let mut type_keys = HashSet::new();
        for (source, target) in &self.type_mappings {
            if source.trim().is_empty() {
                return Err(ConfigError::EmptyMappingKey);
            }
            if target.trim().is_empty() {
                return Err(ConfigError::EmptyMappingValue(source.clone()));
            }
            if !type_keys.insert(self.normalize(source)) {
                return Err(ConfigError::DuplicateTypeMapping(source.clone()));
            }
        }

        Ok(())
    }
}

/// Scope filters applied to both descriptor streams
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub include_namespaces: Vec<String>,
    pub exclude_namespaces: Vec<String>,
    pub include_types: Vec<String>,
    pub exclude_types: Vec<String>,

    /// Compare internal-only elements too
    pub include_internals: bool,

    /// Compare compiler-generated elements too
    pub include_compiler_generated: bool,

    /// Compare elements marked obsolete
    pub include_obsolete: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_namespaces: Vec::new(),
            exclude_namespaces: Vec::new(),
            include_types: Vec::new(),
            exclude_types: Vec::new(),
            include_internals: false,
            include_compiler_generated: false,
            include_obsolete: true,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self, ignore_case: bool) -> Result<(), ConfigError> {
        for patterns in [
            &self.include_namespaces,
            &self.exclude_namespaces,
            &self.include_types,
            &self.exclude_types,
        ] {
            PatternSet::compile(patterns, ignore_case)?;
        }
        Ok(())
    }
}

/// Identities that are intentionally absent from the target
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExclusionConfig {
    pub excluded_types: Vec<String>,
    pub excluded_members: Vec<String>,
    pub excluded_type_patterns: Vec<String>,
    pub excluded_member_patterns: Vec<String>,
}

impl ExclusionConfig {
    pub fn validate(&self, ignore_case: bool) -> Result<(), ConfigError> {
        for literals in [&self.excluded_types, &self.excluded_members] {
            if let Some(empty) = literals.iter().find(|l| l.trim().is_empty()) {
                return Err(ConfigError::InvalidPattern {
                    pattern: empty.clone(),
                    reason: "excluded name is empty".to_string(),
                });
            }
        }

        PatternSet::compile(&self.excluded_type_patterns, ignore_case)?;
        PatternSet::compile(&self.excluded_member_patterns, ignore_case)?;
        Ok(())
    }
}

/// Breaking-change policy: which categories of change count as breaking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakingChangeRules {
    pub treat_type_removal_as_breaking: bool,
    pub treat_member_removal_as_breaking: bool,
    pub treat_signature_change_as_breaking: bool,
    pub treat_reduced_accessibility_as_breaking: bool,
    pub treat_added_interface_as_breaking: bool,
    pub treat_removed_interface_as_breaking: bool,
    pub treat_parameter_name_change_as_breaking: bool,
    pub treat_added_optional_parameter_as_breaking: bool,
    pub treat_added_member_as_breaking: bool,
    pub treat_added_type_as_breaking: bool,
}

impl Default for BreakingChangeRules {
    fn default() -> Self {
        Self {
            treat_type_removal_as_breaking: true,
            treat_member_removal_as_breaking: true,
            treat_signature_change_as_breaking: true,
            treat_reduced_accessibility_as_breaking: true,
            treat_added_interface_as_breaking: false,
            treat_removed_interface_as_breaking: true,
            treat_parameter_name_change_as_breaking: false,
            treat_added_optional_parameter_as_breaking: false,
            treat_added_member_as_breaking: false,
            treat_added_type_as_breaking: false,
        }
    }
}

impl BreakingChangeRules {
    /// Every switch on: any change is breaking
    pub fn strict() -> Self {
        Self {
            treat_type_removal_as_breaking: true,
            treat_member_removal_as_breaking: true,
            treat_signature_change_as_breaking: true,
            treat_reduced_accessibility_as_breaking: true,
            treat_added_interface_as_breaking: true,
            treat_removed_interface_as_breaking: true,
            treat_parameter_name_change_as_breaking: true,
            treat_added_optional_parameter_as_breaking: true,
            treat_added_member_as_breaking: true,
            treat_added_type_as_breaking: true,
        }
    }

    /// Every switch off: nothing is breaking
    pub fn lenient() -> Self {
        Self {
            treat_type_removal_as_breaking: false,
            treat_member_removal_as_breaking: false,
            treat_signature_change_as_breaking: false,
            treat_reduced_accessibility_as_breaking: false,
            treat_added_interface_as_breaking: false,
            treat_removed_interface_as_breaking: false,
            treat_parameter_name_change_as_breaking: false,
            treat_added_optional_parameter_as_breaking: false,
            treat_added_member_as_breaking: false,
            treat_added_type_as_breaking: false,
        }
    }
}

/// Report output format, forwarded to the renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Console
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComparisonConfiguration {
    /// Output format for the report renderer
    pub output_format: OutputFormat,

    /// Report output path (stdout when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Whether the caller should fail when breaking changes are found
    pub fail_on_breaking_changes: bool,

    /// Identity mappings
    pub mappings: MappingConfig,

    /// Scope filters
    pub filters: FilterConfig,

    /// Intentional exclusions
    pub exclusions: ExclusionConfig,

    /// Breaking-change policy
    pub breaking_rules: BreakingChangeRules,
}

impl Default for ComparisonConfiguration {
    fn default() -> Self {
        Self {
            mappings: MappingConfig::default(),
            filters: FilterConfig::default(),
            exclusions: ExclusionConfig::default(),
            breaking_rules: BreakingChangeRules::default(),
            output_format: OutputFormat::default(),
            output_path: None,
            fail_on_breaking_changes: true,
        }
    }
}

impl ComparisonConfiguration {
    /// Load config from a JSON or TOML file (chosen by extension)
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml(&contents)
        } else {
            Self::from_json(&contents)
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML config
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Save config to file (JSON, or TOML when the extension says so)
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let contents = if is_toml {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            self.to_json()?
        };

        std::fs::write(path, contents).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Validate every sub-configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ignore_case = self.mappings.ignore_case;
        self.mappings.validate()?;
        self.filters.validate(ignore_case)?;
        self.exclusions.validate(ignore_case)?;
        Ok(())
    }
}

/// Config error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("mapping has an empty key")]
    EmptyMappingKey,

    #[error("mapping for '{0}' has an empty value")]
    EmptyMappingValue(String),

    #[error("namespace mapping for '{0}' has no targets")]
    EmptyMappingTargets(String),

    #[error("namespace mapping for '{namespace}' lists '{target}' more than once")]
    DuplicateMappingTarget { namespace: String, target: String },

    #[error("type mapping for '{0}' is declared more than once")]
    DuplicateTypeMapping(String),

    #[error("namespace mappings contain a cycle: {0}")]
    MappingCycle(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
