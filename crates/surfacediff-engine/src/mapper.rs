//! Identity mapping between source and target type names
//!
//! Candidate order matters: the differ takes the first candidate that
//! resolves to a matching target type, so the configured order of namespace
//! targets decides ties. This is deliberately first-match, not best-match.

use serde::Serialize;
use surfacediff_core::descriptor::{qualify, split_qualified};
use surfacediff_core::{ConfigError, MappingConfig, MemberDescriptor, NameGraph};
use std::collections::HashMap;

/// Where a candidate identity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CandidateOrigin {
    /// Explicit type mapping
    TypeMapping,
    /// Namespace mapping (direct or transitive)
    NamespaceMapping,
    /// Unchanged namespace and name
    SameName,
    /// Same simple name found in another namespace
    AutoMapped,
}

impl CandidateOrigin {
    /// Whether the candidate was produced by user configuration
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::TypeMapping | Self::NamespaceMapping)
    }
}

/// A target-side identity to try for a source type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub namespace: String,
    pub full_name: String,
    pub origin: CandidateOrigin,
}

/// Resolves source identities to ordered target candidates
#[derive(Debug, Clone)]
pub struct IdentityMapper {
    ignore_case: bool,
    auto_map: bool,

    /// Normalized namespace mapping graph, edges in configured order
    namespaces: NameGraph,

    /// Original spelling of each normalized target namespace
    namespace_spelling: HashMap<String, String>,

    /// Normalized source full name -> target full name
    types: HashMap<String, String>,
}

impl IdentityMapper {
    /// Build a mapper, failing on empty entries, duplicates or cycles
    pub fn new(config: &MappingConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut namespaces = NameGraph::new();
        let mut namespace_spelling = HashMap::new();

        for (source, targets) in &config.namespace_mappings {
            let from = config.normalize(source);
            for target in targets {
                let to = config.normalize(target);
                namespace_spelling.entry(to.clone()).or_insert_with(|| target.clone());
                namespaces.add_edge(&from, &to);
            }
        }

        let types = config
            .type_mappings
            .iter()
            .map(|(source, target)| (config.normalize(source), target.clone()))
            .collect();

        Ok(Self {
            ignore_case: config.ignore_case,
            auto_map: config.auto_map_same_name_types,
            namespaces,
            namespace_spelling,
            types,
        })
    }

    /// Normalize a name for comparisons and index keys
    pub fn normalize(&self, name: &str) -> String {
        if self.ignore_case {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn names_equal(&self, a: &str, b: &str) -> bool {
        if self.ignore_case {
            a.to_lowercase() == b.to_lowercase()
        } else {
            a == b
        }
    }

    /// Ordered target candidates for a source type
    ///
    /// 1. An explicit type mapping is the only candidate.
    /// 2. Otherwise each namespace reachable through namespace mappings, in
    ///    configured depth-first order.
    /// 3. Then the unchanged identity.
    pub fn resolve_candidates(&self, namespace: &str, type_name: &str) -> Vec<Candidate> {
        let full_name = qualify(namespace, type_name);

        if let Some(target) = self.types.get(&self.normalize(&full_name)) {
            return vec![Candidate {
                namespace: split_qualified(target).0.to_string(),
                full_name: target.clone(),
                origin: CandidateOrigin::TypeMapping,
            }];
        }

        let mut candidates: Vec<Candidate> = self
            .namespaces
            .reachable(&self.normalize(namespace))
            .into_iter()
            .map(|ns| {
                let spelled = self.namespace_spelling.get(&ns).cloned().unwrap_or(ns);
                Candidate {
                    full_name: qualify(&spelled, type_name),
                    namespace: spelled,
                    origin: CandidateOrigin::NamespaceMapping,
                }
            })
            .collect();

        if !candidates.iter().any(|c| self.names_equal(&c.full_name, &full_name)) {
            candidates.push(Candidate {
                namespace: namespace.to_string(),
                full_name,
                origin: CandidateOrigin::SameName,
            });
        }

        candidates
    }

    /// Last-resort lookup by simple name across namespaces
    ///
    /// Returns the position of the first target in the given order with the
    /// same kind and type name, or `None` when auto-mapping is off. Callers
    /// only reach this for types no explicit mapping applies to.
    pub fn auto_map<'a, I>(&self, source: &MemberDescriptor, targets: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a MemberDescriptor>,
    {
        if !self.auto_map {
            return None;
        }

        targets.into_iter().position(|target| {
            target.kind == source.kind && self.names_equal(target.type_name(), source.type_name())
        })
    }

    /// Whether `target` differs from `source` in name or namespace
    pub fn is_rename(&self, source_full_name: &str, target_full_name: &str) -> bool {
        !self.names_equal(source_full_name, target_full_name)
    }
}
