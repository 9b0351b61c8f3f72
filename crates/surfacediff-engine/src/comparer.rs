//! Comparison entry point
//!
//! `ApiComparer` owns the compiled configuration and runs one comparison per
//! call: index both sides, diff, classify, assemble the result.

use surfacediff_core::{
    ApiSnapshot, ComparisonConfiguration, ComparisonResult, ConfigError, MemberDescriptor, Side,
    SnapshotInfo,
};
use crate::classifier::classify;
use crate::differ::ApiDiffer;
use crate::exclusion::ExclusionRegistry;
use crate::filter::ScopeFilter;
use crate::index::SnapshotIndex;
use crate::mapper::IdentityMapper;

/// Compares API snapshots under one configuration
///
/// Holds only immutable state, so a single comparer can be shared across
/// threads to compare many snapshot pairs.
#[derive(Debug, Clone)]
pub struct ApiComparer {
    config: ComparisonConfiguration,
    mapper: IdentityMapper,
    filter: ScopeFilter,
    exclusions: ExclusionRegistry,
}

impl ApiComparer {
    /// Validate the configuration and compile every rule layer
    pub fn new(config: ComparisonConfiguration) -> Result<Self, ConfigError> {
        config.validate()?;

        let ignore_case = config.mappings.ignore_case;
        let mapper = IdentityMapper::new(&config.mappings)?;
        let filter = ScopeFilter::new(&config.filters, ignore_case)?;
        let exclusions = ExclusionRegistry::new(&config.exclusions, ignore_case)?;

        Ok(Self {
            config,
            mapper,
            filter,
            exclusions,
        })
    }

    pub fn config(&self) -> &ComparisonConfiguration {
        &self.config
    }

    pub fn compare(&self, source: &ApiSnapshot, target: &ApiSnapshot) -> ComparisonResult {
        tracing::info!(
            source = %source.name,
            target = %target.name,
            "comparing API snapshots"
        );

        self.run(source.info(), target.info(), &source.descriptors, &target.descriptors)
    }

    /// Compare two bare descriptor sequences
    pub fn compare_descriptors(
        &self,
        source: &[MemberDescriptor],
        target: &[MemberDescriptor],
    ) -> ComparisonResult {
        tracing::info!(
            source = source.len(),
            target = target.len(),
            "comparing descriptor sets"
        );

        self.run(
            SnapshotInfo::new("source", None, source),
            SnapshotInfo::new("target", None, target),
            source,
            target,
        )
    }

    fn run(
        &self,
        source_info: SnapshotInfo,
        target_info: SnapshotInfo,
        source: &[MemberDescriptor],
        target: &[MemberDescriptor],
    ) -> ComparisonResult {
        let source_index = SnapshotIndex::build(source, Side::Source, &self.filter, &self.mapper);
        let target_index = SnapshotIndex::build(target, Side::Target, &self.filter, &self.mapper);

        let outcome = ApiDiffer::new(&self.mapper, &self.exclusions).diff(&source_index, &target_index);

        let differences = outcome
            .differences
            .into_iter()
            .map(|difference| {
                let classification = classify(&difference, &self.config.breaking_rules);
                difference.with_classification(classification)
            })
            .collect();

        let mut diagnostics = source_index.into_diagnostics();
        diagnostics.extend(target_index.into_diagnostics());
        diagnostics.extend(outcome.diagnostics);

        let result = ComparisonResult::new(source_info, target_info, differences, diagnostics);

        tracing::info!(
            differences = result.summary.total,
            breaking = result.summary.breaking,
            diagnostics = result.diagnostics.len(),
            "comparison finished"
        );

        result
    }
}
