//! Comparison result schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::diagnostic::Diagnostic;
use crate::difference::{ApiDifference, ChangeKind};
use crate::snapshot::SnapshotInfo;

/// Result schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ResultVersion {
    /// Current result schema version
    pub const CURRENT: ResultVersion = ResultVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ResultVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary counters for a comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    /// Total number of differences
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub moved: usize,
    pub excluded: usize,
    pub unexpectedly_included: usize,

    /// Differences classified as breaking
    pub breaking: usize,
}

impl ComparisonSummary {
    pub fn from_differences(differences: &[ApiDifference]) -> Self {
        let mut summary = Self::default();

        for diff in differences {
            match diff.change_kind {
                ChangeKind::Added => summary.added += 1,
                ChangeKind::Removed => summary.removed += 1,
                ChangeKind::Modified => summary.modified += 1,
                ChangeKind::Moved => summary.moved += 1,
                ChangeKind::Excluded => summary.excluded += 1,
                ChangeKind::UnexpectedlyIncluded => summary.unexpectedly_included += 1,
            }

            if diff.is_breaking {
                summary.breaking += 1;
            }
            summary.total += 1;
        }

        summary
    }
}

/// Result of one comparison run
///
/// Built once per run and handed to the renderers unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Schema version
    pub version: ResultVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Compared source snapshot
    pub source: SnapshotInfo,

    /// Compared target snapshot
    pub target: SnapshotInfo,

    /// Summary counters
    pub summary: ComparisonSummary,

    /// Classified differences, in discovery order
    pub differences: Vec<ApiDifference>,

    /// Non-fatal anomalies encountered during the run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ComparisonResult {
    /// Assemble a result; counters are derived from the differences
    pub fn new(
        source: SnapshotInfo,
        target: SnapshotInfo,
        differences: Vec<ApiDifference>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            version: ResultVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            source,
            target,
            summary: ComparisonSummary::from_differences(&differences),
            differences,
            diagnostics,
        }
    }

    /// Check if the result has any breaking differences
    pub fn has_breaking_changes(&self) -> bool {
        self.summary.breaking > 0
    }

    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }

    pub fn breaking_changes(&self) -> impl Iterator<Item = &ApiDifference> {
        self.differences.iter().filter(|d| d.is_breaking)
    }

    pub fn differences_of(&self, kind: ChangeKind) -> impl Iterator<Item = &ApiDifference> {
        self.differences.iter().filter(move |d| d.change_kind == kind)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
