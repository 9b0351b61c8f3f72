//! surfacediff core
//!
//! Core domain model with stable, versioned types: descriptors, snapshots,
//! configuration, differences and the comparison result.
//! Never rename diagnostic codes - they are part of the public API.

pub mod config;
pub mod descriptor;
pub mod diagnostic;
pub mod difference;
pub mod graph;
pub mod pattern;
pub mod result;
pub mod snapshot;

pub use config::{
    BreakingChangeRules, ComparisonConfiguration, ConfigError, ExclusionConfig, FilterConfig,
    MappingConfig, OutputFormat,
};
pub use descriptor::{
    split_qualified, Accessibility, DescriptorIdentity, DescriptorViolation, MemberDescriptor,
    MemberKind, ParameterDescriptor,
};
pub use diagnostic::{Diagnostic, DiagnosticCategory, DiagnosticCode, Side};
pub use difference::{ApiDifference, ChangeDetail, ChangeDetailEntry, ChangeKind, Classification, Severity};
pub use graph::NameGraph;
pub use pattern::{PatternSet, WildcardPattern};
pub use result::{ComparisonResult, ComparisonSummary, ResultVersion};
pub use snapshot::{ApiSnapshot, SnapshotError, SnapshotInfo};
