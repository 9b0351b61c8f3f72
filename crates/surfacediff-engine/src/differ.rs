//! Matcher & differ: pairs source and target descriptors and emits typed
//! differences
//!
//! Types are matched through the identity mapper; within a matched pair of
//! types members are paired by kind and name, then overloads by structural
//! signature. Differences come out unclassified, in discovery order: each
//! source type followed by its members, then target-only types.

use surfacediff_core::descriptor::split_qualified;
use surfacediff_core::{
    ApiDifference, ChangeDetail, Diagnostic, DiagnosticCode, MemberDescriptor, Severity, Side,
};
use std::collections::BTreeSet;
use crate::exclusion::{ExclusionRegistry, ExclusionVerdict, IdentityScope};
use crate::index::SnapshotIndex;
use crate::mapper::{Candidate, CandidateOrigin, IdentityMapper};

/// Raw output of one diff pass
#[derive(Debug, Default)]
pub struct DiffOutcome {
    pub differences: Vec<ApiDifference>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Pairs descriptors across two snapshot indexes
///
/// When several mapping candidates exist for a type, the first one that
/// resolves to an unclaimed target type of the same kind wins. The result
/// therefore depends on the configured mapping order. Candidates with an
/// identical signature are tried before any looser match, so generic arity
/// variants sharing a name pair with each other.
///
/// Auto-mapping by simple name only applies to types that no explicit type
/// or namespace mapping covers.
pub struct ApiDiffer<'c> {
    mapper: &'c IdentityMapper,
    exclusions: &'c ExclusionRegistry,
}

impl<'c> ApiDiffer<'c> {
    pub fn new(mapper: &'c IdentityMapper, exclusions: &'c ExclusionRegistry) -> Self {
        Self { mapper, exclusions }
    }

    pub fn diff(&self, source: &SnapshotIndex<'_>, target: &SnapshotIndex<'_>) -> DiffOutcome {
        let mut outcome = DiffOutcome::default();
        let mut claimed = vec![false; target.types().len()];

        let resolutions = self.match_types(source, target, &mut claimed);

        for (position, (source_type, resolution)) in source.types().iter().zip(&resolutions).enumerate() {
            self.diff_type(position, source_type, resolution, source, target, &mut outcome);
        }

        // Target types no source type resolved to
        for (idx, target_type) in target.types().iter().enumerate() {
            if claimed[idx] {
                continue;
            }

            match self.exclusions.classify(&target_type.full_name, IdentityScope::Type, true) {
                ExclusionVerdict::NotExcluded => {
                    outcome.differences.push(ApiDifference::added((*target_type).clone()));
                }
                ExclusionVerdict::Excluded | ExclusionVerdict::UnexpectedlyIncluded => {
                    self.report_unexpected(None, target_type, &mut outcome);
                }
            }
        }

        outcome
    }

    /// Resolve every source type before any difference is emitted
    ///
    /// 1. Mapping candidates whose target has an identical signature.
    /// 2. Mapping candidates whose target has the same kind.
    /// 3. Auto-map by simple name, for types without explicit candidates.
    fn match_types<'t>(
        &self,
        source: &SnapshotIndex<'_>,
        target: &SnapshotIndex<'t>,
        claimed: &mut [bool],
    ) -> Vec<TypeResolution<'t>> {
        let candidates: Vec<Vec<Candidate>> = source
            .types()
            .iter()
            .map(|ty| self.mapper.resolve_candidates(&ty.namespace, ty.type_name()))
            .collect();

        let mut resolutions: Vec<TypeResolution<'t>> = candidates
            .iter()
            .map(|c| TypeResolution {
                matched: None,
                had_explicit_candidates: c.iter().any(|c| c.origin.is_explicit()),
            })
            .collect();

        for exact in [true, false] {
            for (position, source_type) in source.types().iter().enumerate() {
                if resolutions[position].matched.is_some() {
                    continue;
                }

                let found = self.find_candidate(source_type, &candidates[position], target, claimed, exact);
                if let Some(found) = found {
                    claimed[found.position] = true;
                    resolutions[position].matched = Some(found);
                }
            }
        }

        for (position, source_type) in source.types().iter().enumerate() {
            let resolution = &mut resolutions[position];
            if resolution.matched.is_some() || resolution.had_explicit_candidates {
                continue;
            }

            let unclaimed: Vec<(usize, &'t MemberDescriptor)> = target
                .types()
                .iter()
                .enumerate()
                .filter(|(idx, _)| !claimed[*idx])
                .map(|(idx, ty)| (idx, *ty))
                .collect();

            let found = self
                .mapper
                .auto_map(source_type, unclaimed.iter().map(|(_, ty)| *ty))
                .map(|at| unclaimed[at]);

            if let Some((idx, ty)) = found {
                claimed[idx] = true;
                resolution.matched = Some(TypeMatch {
                    position: idx,
                    descriptor: ty,
                    origin: CandidateOrigin::AutoMapped,
                });
            }
        }

        resolutions
    }

    /// First candidate naming an unclaimed target type of the same kind
    /// (and the same signature when `exact`)
    fn find_candidate<'t>(
        &self,
        source_type: &MemberDescriptor,
        candidates: &[Candidate],
        target: &SnapshotIndex<'t>,
        claimed: &[bool],
        exact: bool,
    ) -> Option<TypeMatch<'t>> {
        candidates.iter().find_map(|candidate| {
            target
                .find_types(&candidate.full_name, self.mapper)
                .into_iter()
                .find(|(idx, found)| {
                    !claimed[*idx]
                        && found.kind == source_type.kind
                        && (!exact || found.signature == source_type.signature)
                })
                .map(|(position, descriptor)| TypeMatch {
                    position,
                    descriptor,
                    origin: candidate.origin,
                })
        })
    }

    fn diff_type(
        &self,
        position: usize,
        source_type: &MemberDescriptor,
        resolution: &TypeResolution<'_>,
        source: &SnapshotIndex<'_>,
        target: &SnapshotIndex<'_>,
        outcome: &mut DiffOutcome,
    ) {
        let matched = resolution.matched;
        let verdict = self
            .exclusions
            .classify(&source_type.full_name, IdentityScope::Type, matched.is_some());

        match (verdict, matched) {
            (ExclusionVerdict::NotExcluded, Some(found)) => {
                self.diff_matched_type(position, source_type, found, source, target, outcome);
            }
            (ExclusionVerdict::NotExcluded, None) => {
                if resolution.had_explicit_candidates {
                    tracing::warn!(source = %source_type.full_name, "no mapping candidate resolved");
                    outcome.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::MappingUnresolved,
                            Severity::Warning,
                            format!(
                                "type '{}' is mapped but no mapped target exists",
                                source_type.full_name
                            ),
                        )
                        .with_side(Side::Source)
                        .with_identity(source_type.full_name.clone()),
                    );
                }

                outcome.differences.push(ApiDifference::removed(source_type.clone()));
            }
            (ExclusionVerdict::UnexpectedlyIncluded, Some(found)) => {
                self.report_unexpected(Some(source_type), found.descriptor, outcome);
            }
            // An absent target always yields Excluded from the registry
            (ExclusionVerdict::Excluded, _) | (ExclusionVerdict::UnexpectedlyIncluded, None) => {
                outcome.differences.push(ApiDifference::excluded(source_type.clone()));
            }
        }
    }

    fn diff_matched_type(
        &self,
        position: usize,
        source_type: &MemberDescriptor,
        found: TypeMatch<'_>,
        source: &SnapshotIndex<'_>,
        target: &SnapshotIndex<'_>,
        outcome: &mut DiffOutcome,
    ) {
        let target_type = found.descriptor;

        tracing::debug!(
            source = %source_type.full_name,
            target = %target_type.full_name,
            origin = ?found.origin,
            "type matched"
        );

        let details = self.compare_aspects(source_type, target_type);
        if self.mapper.is_rename(&source_type.full_name, &target_type.full_name) {
            outcome.differences.push(ApiDifference::moved(
                source_type.clone(),
                target_type.clone(),
                details,
            ));
        } else if !details.is_empty() {
            outcome.differences.push(ApiDifference::modified(
                source_type.clone(),
                target_type.clone(),
                details,
            ));
        }

        self.diff_members(
            source.members_of(position, self.mapper),
            target.members_of(found.position, self.mapper),
            outcome,
        );
    }

    fn diff_members(
        &self,
        source_members: &[&MemberDescriptor],
        target_members: &[&MemberDescriptor],
        outcome: &mut DiffOutcome,
    ) {
        let mut pairs: Vec<Option<usize>> = vec![None; source_members.len()];
        let mut used = vec![false; target_members.len()];

        // Overloads with an identical signature
        for (s_idx, s) in source_members.iter().enumerate() {
            let exact = target_members.iter().enumerate().position(|(t_idx, t)| {
                !used[t_idx] && same_group(s, t) && s.signature == t.signature
            });
            if let Some(t_idx) = exact {
                used[t_idx] = true;
                pairs[s_idx] = Some(t_idx);
            }
        }

        // Remaining overloads of the same name: prefer equal parameter count
        for (s_idx, s) in source_members.iter().enumerate() {
            if pairs[s_idx].is_some() {
                continue;
            }

            let open: Vec<usize> = (0..target_members.len())
                .filter(|&t_idx| !used[t_idx] && same_group(s, target_members[t_idx]))
                .collect();

            let chosen = open
                .iter()
                .copied()
                .find(|&t_idx| parameter_count(s) == parameter_count(target_members[t_idx]))
                .or_else(|| open.first().copied());

            if let Some(t_idx) = chosen {
                used[t_idx] = true;
                pairs[s_idx] = Some(t_idx);
            }
        }

        for (s_idx, s) in source_members.iter().enumerate() {
            let paired = pairs[s_idx].map(|t_idx| target_members[t_idx]);
            let verdict = self
                .exclusions
                .classify(&s.full_name, IdentityScope::Member, paired.is_some());

            match (verdict, paired) {
                (ExclusionVerdict::NotExcluded, Some(t)) => {
                    let details = self.compare_aspects(s, t);
                    if !details.is_empty() {
                        outcome
                            .differences
                            .push(ApiDifference::modified((*s).clone(), t.clone(), details));
                    }
                }
                (ExclusionVerdict::NotExcluded, None) => {
                    outcome.differences.push(ApiDifference::removed((*s).clone()));
                }
                (ExclusionVerdict::UnexpectedlyIncluded, Some(t)) => {
                    self.report_unexpected(Some(*s), t, outcome);
                }
                (ExclusionVerdict::Excluded, _) | (ExclusionVerdict::UnexpectedlyIncluded, None) => {
                    outcome.differences.push(ApiDifference::excluded((*s).clone()));
                }
            }
        }

        for (t_idx, t) in target_members.iter().enumerate() {
            if used[t_idx] {
                continue;
            }

            match self.exclusions.classify(&t.full_name, IdentityScope::Member, true) {
                ExclusionVerdict::NotExcluded => {
                    outcome.differences.push(ApiDifference::added((*t).clone()));
                }
                ExclusionVerdict::Excluded | ExclusionVerdict::UnexpectedlyIncluded => {
                    self.report_unexpected(None, t, outcome);
                }
            }
        }
    }

    /// One detail per differing aspect (one per interface for interface sets)
    fn compare_aspects(&self, source: &MemberDescriptor, target: &MemberDescriptor) -> Vec<ChangeDetail> {
        let mut details = Vec::new();

        if source.signature != target.signature {
            details.extend(signature_details(source, target));
        } else {
            details.extend(parameter_renames(source, target));
        }

        if target.accessibility < source.accessibility {
            details.push(ChangeDetail::AccessibilityReduced {
                from: source.accessibility,
                to: target.accessibility,
            });
        } else if target.accessibility > source.accessibility {
            details.push(ChangeDetail::AccessibilityWidened {
                from: source.accessibility,
                to: target.accessibility,
            });
        }

        details.extend(self.interface_changes(&source.interfaces, &target.interfaces));

        match (source.is_obsolete(), target.is_obsolete()) {
            (false, true) => details.push(ChangeDetail::ObsoleteAdded),
            (true, false) => details.push(ChangeDetail::ObsoleteRemoved),
            _ => {}
        }

        details
    }

    /// Interface set delta; a source interface counts as kept when a target
    /// interface matches it through the mapper, generic arguments included
    fn interface_changes(&self, source: &BTreeSet<String>, target: &BTreeSet<String>) -> Vec<ChangeDetail> {
        let targets: Vec<&String> = target.iter().collect();
        let mut used = vec![false; targets.len()];
        let mut details = Vec::new();

        for interface in source {
            let kept = (0..targets.len()).find(|&i| !used[i] && self.type_names_match(interface, targets[i]));

            match kept {
                Some(i) => used[i] = true,
                None => details.push(ChangeDetail::InterfaceRemoved {
                    interface: interface.clone(),
                }),
            }
        }

        for (i, interface) in targets.iter().enumerate() {
            if !used[i] {
                details.push(ChangeDetail::InterfaceAdded {
                    interface: (*interface).clone(),
                });
            }
        }

        details
    }

    /// Whether a target type reference is a mapped form of a source one
    ///
    /// The outer name must match one of its mapping candidates and every
    /// generic argument must match pairwise.
    fn type_names_match(&self, source: &str, target: &str) -> bool {
        let (source_outer, source_args) = split_generic(source);
        let (target_outer, target_args) = split_generic(target);

        if source_args.len() != target_args.len() {
            return false;
        }

        let (namespace, name) = split_qualified(source_outer);
        let outer_matches = self
            .mapper
            .resolve_candidates(namespace, name)
            .iter()
            .any(|c| self.mapper.names_equal(&c.full_name, target_outer));

        outer_matches
            && source_args
                .iter()
                .zip(&target_args)
                .all(|(s, t)| self.type_names_match(s, t))
    }

    fn report_unexpected(
        &self,
        source: Option<&MemberDescriptor>,
        target: &MemberDescriptor,
        outcome: &mut DiffOutcome,
    ) {
        tracing::warn!(identity = %target.full_name, "excluded element present in target");
        outcome.diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::ExcludedButPresent,
                Severity::Warning,
                format!("'{}' is excluded but exists in the target", target.full_name),
            )
            .with_side(Side::Target)
            .with_identity(target.full_name.clone()),
        );
        outcome.differences.push(ApiDifference::unexpectedly_included(
            source.cloned(),
            target.clone(),
        ));
    }
}

#[derive(Debug, Clone, Copy)]
struct TypeMatch<'t> {
    /// Position in the target index
    position: usize,
    descriptor: &'t MemberDescriptor,
    origin: CandidateOrigin,
}

struct TypeResolution<'t> {
    matched: Option<TypeMatch<'t>>,
    had_explicit_candidates: bool,
}

fn same_group(a: &MemberDescriptor, b: &MemberDescriptor) -> bool {
    a.kind == b.kind && a.name == b.name
}

/// Declared parameter count, from the parameter list or the signature text
fn parameter_count(descriptor: &MemberDescriptor) -> Option<usize> {
    if !descriptor.parameters.is_empty() {
        return Some(descriptor.parameters.len());
    }

    let sig = descriptor.signature.as_str();
    let open = sig.find('(')?;
    let close = sig.rfind(')')?;
    if close <= open {
        return None;
    }

    let inner = sig[open + 1..close].trim();
    if inner.is_empty() {
        return Some(0);
    }

    Some(split_top_level(inner).len())
}

/// Split `Outer<A, B>` into `("Outer", ["A", "B"])`; non-generic names have no arguments
fn split_generic(name: &str) -> (&str, Vec<&str>) {
    let name = name.trim();
    match name.find('<') {
        Some(open) if name.ends_with('>') => {
            (&name[..open], split_top_level(&name[open + 1..name.len() - 1]))
        }
        _ => (name, Vec::new()),
    }
}

/// Comma-separated items outside any bracket pair
fn split_top_level(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in list.char_indices() {
        match ch {
            '<' | '[' | '(' => depth += 1,
            '>' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    items.push(list[start..].trim());
    items
}

/// Part of a signature before the parameter list (return type, generic arity)
fn signature_head(signature: &str) -> &str {
    signature.split('(').next().unwrap_or(signature)
}

/// Classify a signature delta: trailing optional parameters only, or a
/// general signature change
fn signature_details(source: &MemberDescriptor, target: &MemberDescriptor) -> Vec<ChangeDetail> {
    let (sp, tp) = (&source.parameters, &target.parameters);

    let only_optional_appended = !tp.is_empty()
        && tp.len() > sp.len()
        && signature_head(&source.signature) == signature_head(&target.signature)
        && sp.iter().zip(tp.iter()).all(|(a, b)| a.type_name == b.type_name)
        && tp[sp.len()..].iter().all(|p| p.is_optional);

    if only_optional_appended {
        return tp[sp.len()..]
            .iter()
            .map(|p| ChangeDetail::OptionalParameterAdded {
                parameter: format!("{} {}", p.type_name, p.name),
            })
            .collect();
    }

    vec![ChangeDetail::SignatureChanged {
        from: source.signature.clone(),
        to: target.signature.clone(),
    }]
}

fn parameter_renames(source: &MemberDescriptor, target: &MemberDescriptor) -> Vec<ChangeDetail> {
    if source.parameters.len() != target.parameters.len() {
        return Vec::new();
    }

    source
        .parameters
        .iter()
        .zip(target.parameters.iter())
        .enumerate()
        .filter(|(_, (a, b))| a.name != b.name && a.type_name == b.type_name)
        .map(|(position, (a, b))| ChangeDetail::ParameterRenamed {
            position,
            from: a.name.clone(),
            to: b.name.clone(),
        })
        .collect()
}
