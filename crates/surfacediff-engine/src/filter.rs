//! Scope filter: which descriptors take part in the comparison

use surfacediff_core::{ConfigError, FilterConfig, MemberDescriptor, PatternSet};

/// Compiled form of a `FilterConfig`
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    include_namespaces: PatternSet,
    exclude_namespaces: PatternSet,
    include_types: PatternSet,
    exclude_types: PatternSet,
    include_internals: bool,
    include_compiler_generated: bool,
    include_obsolete: bool,
}

impl ScopeFilter {
    pub fn new(config: &FilterConfig, ignore_case: bool) -> Result<Self, ConfigError> {
        Ok(Self {
            include_namespaces: PatternSet::compile(&config.include_namespaces, ignore_case)?,
            exclude_namespaces: PatternSet::compile(&config.exclude_namespaces, ignore_case)?,
            include_types: PatternSet::compile(&config.include_types, ignore_case)?,
            exclude_types: PatternSet::compile(&config.exclude_types, ignore_case)?,
            include_internals: config.include_internals,
            include_compiler_generated: config.include_compiler_generated,
            include_obsolete: config.include_obsolete,
        })
    }

    /// Whether a descriptor takes part in the comparison
    ///
    /// Members are filtered by the name of their declaring type, so a member
    /// is always in the same scope as the type that owns it.
    pub fn is_in_scope(&self, descriptor: &MemberDescriptor) -> bool {
        let type_name = if descriptor.kind.is_type() {
            descriptor.full_name.as_str()
        } else {
            descriptor.declaring_type.as_str()
        };

        if !included(&self.include_namespaces, &self.exclude_namespaces, &descriptor.namespace) {
            return false;
        }

        if !included(&self.include_types, &self.exclude_types, type_name) {
            return false;
        }

        if !self.include_internals && descriptor.accessibility.is_internal_only() {
            return false;
        }

        if !self.include_compiler_generated && descriptor.is_compiler_generated() {
            return false;
        }

        if !self.include_obsolete && descriptor.is_obsolete() {
            return false;
        }

        true
    }
}

/// Include list is vacuously satisfied when empty; exclude list always applies
fn included(include: &PatternSet, exclude: &PatternSet, candidate: &str) -> bool {
    (include.is_empty() || include.matches_any(candidate)) && !exclude.matches_any(candidate)
}
