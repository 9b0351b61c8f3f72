//! Per-snapshot lookup structures built before matching
//!
//! Building an index validates every descriptor, applies the scope filter and
//! groups members under their declaring type. Malformed descriptors are
//! skipped and reported instead of aborting the run.

use surfacediff_core::{
    DescriptorIdentity, Diagnostic, DiagnosticCode, MemberDescriptor, Severity, Side,
};
use std::collections::{HashMap, HashSet};
use crate::filter::ScopeFilter;
use crate::mapper::IdentityMapper;

/// Filtered, validated view over one snapshot's descriptors
#[derive(Debug)]
pub struct SnapshotIndex<'a> {
    /// In-scope types, in input order
    types: Vec<&'a MemberDescriptor>,

    /// Normalized full type name -> positions in `types`
    ///
    /// Generic arity variants share a name and differ by signature, so one
    /// name can resolve to several types.
    type_lookup: HashMap<String, Vec<usize>>,

    /// Normalized declaring type -> in-scope members, in input order
    members: HashMap<String, Vec<&'a MemberDescriptor>>,

    member_count: usize,

    diagnostics: Vec<Diagnostic>,
}

impl<'a> SnapshotIndex<'a> {
    pub fn build(
        descriptors: &'a [MemberDescriptor],
        side: Side,
        filter: &ScopeFilter,
        mapper: &IdentityMapper,
    ) -> Self {
        let mut index = Self {
            types: Vec::new(),
            type_lookup: HashMap::new(),
            members: HashMap::new(),
            member_count: 0,
            diagnostics: Vec::new(),
        };

        let mut seen: HashSet<DescriptorIdentity> = HashSet::new();
        let mut known_types: HashSet<(String, String)> = HashSet::new();
        let mut known_names: HashSet<String> = HashSet::new();
        let mut pending_members = Vec::new();

        for descriptor in descriptors {
            if let Err(violation) = descriptor.validate() {
                tracing::warn!(%side, "skipping malformed descriptor: {}", violation);
                index.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DescriptorMissingIdentity,
                        Severity::Warning,
                        violation.to_string(),
                    )
                    .with_side(side),
                );
                continue;
            }

            if !seen.insert(descriptor.identity()) {
                index.report_duplicate(descriptor, side);
                continue;
            }

            if !descriptor.kind.is_type() {
                pending_members.push(descriptor);
                continue;
            }

            let key = mapper.normalize(&descriptor.full_name);
            if !known_types.insert((key.clone(), descriptor.signature.clone())) {
                index.report_duplicate(descriptor, side);
                continue;
            }
            known_names.insert(key.clone());

            if filter.is_in_scope(descriptor) {
                index.type_lookup.entry(key).or_default().push(index.types.len());
                index.types.push(descriptor);
            }
        }

        // Members may precede their type in the input, so they are placed last
        for member in pending_members {
            let owner = mapper.normalize(&member.declaring_type);

            if index.type_lookup.contains_key(&owner) {
                if filter.is_in_scope(member) {
                    index.members.entry(owner).or_default().push(member);
                    index.member_count += 1;
                }
            } else if !known_names.contains(&owner) {
                tracing::warn!(%side, member = %member.full_name, "declaring type not found");
                index.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DescriptorOrphanMember,
                        Severity::Warning,
                        format!(
                            "member '{}' refers to unknown declaring type '{}'",
                            member.full_name, member.declaring_type
                        ),
                    )
                    .with_side(side)
                    .with_identity(member.full_name.clone()),
                );
            }
            // Members of filtered-out types leave scope with their type
        }

        tracing::debug!(
            %side,
            types = index.types.len(),
            members = index.member_count,
            "snapshot indexed"
        );

        index
    }

    fn report_duplicate(&mut self, descriptor: &MemberDescriptor, side: Side) {
        tracing::warn!(%side, identity = %descriptor.identity(), "skipping duplicate descriptor");
        self.diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::DescriptorDuplicateIdentity,
                Severity::Warning,
                format!("duplicate descriptor '{}'", descriptor.identity()),
            )
            .with_side(side)
            .with_identity(descriptor.full_name.clone()),
        );
    }

    pub fn types(&self) -> &[&'a MemberDescriptor] {
        &self.types
    }

    /// In-scope types with the given (normalized) full name, in input order
    pub fn find_types(&self, full_name: &str, mapper: &IdentityMapper) -> Vec<(usize, &'a MemberDescriptor)> {
        self.type_lookup
            .get(&mapper.normalize(full_name))
            .map(|positions| positions.iter().map(|&idx| (idx, self.types[idx])).collect())
            .unwrap_or_default()
    }

    /// In-scope members declared by the type at `position`, in input order
    ///
    /// Members name their declaring type without its signature. When arity
    /// variants share a name, the members belong to the first in-scope one.
    pub fn members_of(&self, position: usize, mapper: &IdentityMapper) -> &[&'a MemberDescriptor] {
        let Some(ty) = self.types.get(position) else {
            return &[];
        };
        let key = mapper.normalize(&ty.full_name);

        if self.type_lookup.get(&key).and_then(|positions| positions.first()) != Some(&position) {
            return &[];
        }

        self.members.get(&key).map(|m| m.as_slice()).unwrap_or(&[])
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn member_count(&self) -> usize {
        self.member_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
