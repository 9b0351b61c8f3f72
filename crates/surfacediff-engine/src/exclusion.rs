//! Exclusion registry: intentional absences versus genuine removals

use surfacediff_core::{ConfigError, ExclusionConfig, PatternSet};
use std::collections::HashSet;

/// Whether an identity names a type or a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityScope {
    Type,
    Member,
}

/// Outcome of checking an identity against the exclusion rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionVerdict {
    /// No exclusion rule applies
    NotExcluded,
    /// Excluded and absent from the target, as intended
    Excluded,
    /// Excluded but a descriptor exists in the target
    UnexpectedlyIncluded,
}

/// Compiled form of an `ExclusionConfig`
#[derive(Debug, Clone)]
pub struct ExclusionRegistry {
    ignore_case: bool,
    types: HashSet<String>,
    members: HashSet<String>,
    type_patterns: PatternSet,
    member_patterns: PatternSet,
}

impl ExclusionRegistry {
    pub fn new(config: &ExclusionConfig, ignore_case: bool) -> Result<Self, ConfigError> {
        config.validate(ignore_case)?;

        let normalize = |names: &[String]| -> HashSet<String> {
            names
                .iter()
                .map(|n| if ignore_case { n.to_lowercase() } else { n.clone() })
                .collect()
        };

        Ok(Self {
            ignore_case,
            types: normalize(&config.excluded_types),
            members: normalize(&config.excluded_members),
            type_patterns: PatternSet::compile(&config.excluded_type_patterns, ignore_case)?,
            member_patterns: PatternSet::compile(&config.excluded_member_patterns, ignore_case)?,
        })
    }

    /// Whether any literal or pattern excludes the identity
    pub fn is_excluded(&self, identity: &str, scope: IdentityScope) -> bool {
        let key = if self.ignore_case {
            identity.to_lowercase()
        } else {
            identity.to_string()
        };

        match scope {
            IdentityScope::Type => {
                self.types.contains(&key) || self.type_patterns.matches_any(identity)
            }
            IdentityScope::Member => {
                self.members.contains(&key) || self.member_patterns.matches_any(identity)
            }
        }
    }

    pub fn classify(&self, identity: &str, scope: IdentityScope, present_in_target: bool) -> ExclusionVerdict {
        if !self.is_excluded(identity, scope) {
            ExclusionVerdict::NotExcluded
        } else if present_in_target {
            ExclusionVerdict::UnexpectedlyIncluded
        } else {
            ExclusionVerdict::Excluded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(config: ExclusionConfig, ignore_case: bool) -> ExclusionRegistry {
        ExclusionRegistry::new(&config, ignore_case).unwrap()
    }

    #[test]
    fn literal_type_exclusion() {
        let exclusions = registry(
            ExclusionConfig {
                excluded_types: vec!["Acme.Legacy".into()],
                ..ExclusionConfig::default()
            },
            false,
        );

        assert_eq!(
            exclusions.classify("Acme.Legacy", IdentityScope::Type, false),
            ExclusionVerdict::Excluded
        );
        assert_eq!(
            exclusions.classify("Acme.Legacy", IdentityScope::Type, true),
            ExclusionVerdict::UnexpectedlyIncluded
        );
        assert_eq!(
            exclusions.classify("Acme.Legacy", IdentityScope::Member, false),
            ExclusionVerdict::NotExcluded
        );
        assert_eq!(
            exclusions.classify("Acme.Widget", IdentityScope::Type, false),
            ExclusionVerdict::NotExcluded
        );
    }

    #[test]
    fn member_patterns() {
        let exclusions = registry(
            ExclusionConfig {
                excluded_member_patterns: vec!["*.Debug*".into()],
                ..ExclusionConfig::default()
            },
            false,
        );

        assert!(exclusions.is_excluded("Acme.Widget.DebugDump", IdentityScope::Member));
        assert!(!exclusions.is_excluded("Acme.Widget.Run", IdentityScope::Member));
        assert!(!exclusions.is_excluded("Acme.Widget.DebugDump", IdentityScope::Type));
    }

    #[test]
    fn ignore_case_applies_to_literals_and_patterns() {
        let config = ExclusionConfig {
            excluded_types: vec!["acme.legacy".into()],
            excluded_type_patterns: vec!["acme.old*".into()],
            ..ExclusionConfig::default()
        };

        let sensitive = registry(config.clone(), false);
        assert!(!sensitive.is_excluded("Acme.Legacy", IdentityScope::Type));

        let insensitive = registry(config, true);
        assert!(insensitive.is_excluded("Acme.Legacy", IdentityScope::Type));
        assert!(insensitive.is_excluded("Acme.OldWidget", IdentityScope::Type));
    }

    #[test]
    fn malformed_pattern_is_rejected() {
        let config = ExclusionConfig {
            excluded_member_patterns: vec![" ".into()],
            ..ExclusionConfig::default()
        };
        assert!(ExclusionRegistry::new(&config, false).is_err());
    }
}
