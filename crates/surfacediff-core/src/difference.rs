//! Typed API differences
//!
//! A difference is created once by the differ with a neutral verdict and
//! annotated once by the classifier. Nothing mutates it afterwards.

use serde::{Deserialize, Serialize};
use crate::descriptor::{Accessibility, MemberDescriptor, MemberKind};

/// What happened to an element between the two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
    Moved,
    Excluded,
    UnexpectedlyIncluded,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Modified => write!(f, "modified"),
            Self::Moved => write!(f, "moved"),
            Self::Excluded => write!(f, "excluded"),
            Self::UnexpectedlyIncluded => write!(f, "unexpectedly included"),
        }
    }
}

/// Severity of a difference or diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, no action needed
    Info,

    /// Should be reviewed
    Warning,

    /// Incompatible change
    Error,

    /// Incompatible change affecting a whole type
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One aspect of a modified element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChangeDetail {
    SignatureChanged { from: String, to: String },
    AccessibilityReduced { from: Accessibility, to: Accessibility },
    AccessibilityWidened { from: Accessibility, to: Accessibility },
    InterfaceAdded { interface: String },
    InterfaceRemoved { interface: String },
    ParameterRenamed { position: usize, from: String, to: String },
    OptionalParameterAdded { parameter: String },
    ObsoleteAdded,
    ObsoleteRemoved,
}

impl std::fmt::Display for ChangeDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignatureChanged { from, to } => write!(f, "signature changed: {} -> {}", from, to),
            Self::AccessibilityReduced { from, to } => {
                write!(f, "accessibility reduced: {} -> {}", from, to)
            }
            Self::AccessibilityWidened { from, to } => {
                write!(f, "accessibility widened: {} -> {}", from, to)
            }
            Self::InterfaceAdded { interface } => write!(f, "interface added: {}", interface),
            Self::InterfaceRemoved { interface } => write!(f, "interface removed: {}", interface),
            Self::ParameterRenamed { position, from, to } => {
                write!(f, "parameter {} renamed: {} -> {}", position, from, to)
            }
            Self::OptionalParameterAdded { parameter } => {
                write!(f, "optional parameter added: {}", parameter)
            }
            Self::ObsoleteAdded => write!(f, "marked obsolete"),
            Self::ObsoleteRemoved => write!(f, "no longer obsolete"),
        }
    }
}

/// A change detail together with its own breaking verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDetailEntry {
    pub detail: ChangeDetail,
    pub is_breaking: bool,
}

/// Verdict assigned by the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub is_breaking: bool,
    pub severity: Severity,

    /// One verdict per change detail, in order
    pub detail_verdicts: Vec<bool>,
}

/// A single difference between the two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDifference {
    pub change_kind: ChangeKind,

    pub element_kind: MemberKind,

    /// Human-readable one-line summary
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_descriptor: Option<MemberDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_descriptor: Option<MemberDescriptor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_details: Vec<ChangeDetailEntry>,

    pub is_breaking: bool,

    pub severity: Severity,
}

impl ApiDifference {
    fn unclassified(
        change_kind: ChangeKind,
        element_kind: MemberKind,
        description: String,
        source: Option<MemberDescriptor>,
        target: Option<MemberDescriptor>,
        details: Vec<ChangeDetail>,
    ) -> Self {
        Self {
            change_kind,
            element_kind,
            description,
            source_descriptor: source,
            target_descriptor: target,
            change_details: details
                .into_iter()
                .map(|detail| ChangeDetailEntry { detail, is_breaking: false })
                .collect(),
            is_breaking: false,
            severity: Severity::Info,
        }
    }

    pub fn added(target: MemberDescriptor) -> Self {
        let description = format!("{} '{}' was added", target.kind, target.full_name);
        Self::unclassified(ChangeKind::Added, target.kind, description, None, Some(target), Vec::new())
    }

    pub fn removed(source: MemberDescriptor) -> Self {
        let description = format!("{} '{}' was removed", source.kind, source.full_name);
        Self::unclassified(ChangeKind::Removed, source.kind, description, Some(source), None, Vec::new())
    }

    pub fn modified(source: MemberDescriptor, target: MemberDescriptor, details: Vec<ChangeDetail>) -> Self {
        let description = format!(
            "{} '{}' was modified ({})",
            source.kind,
            source.full_name,
            join_details(&details)
        );
        Self::unclassified(ChangeKind::Modified, source.kind, description, Some(source), Some(target), details)
    }

    /// Matched through a mapping under a different name; both names are kept
    pub fn moved(source: MemberDescriptor, target: MemberDescriptor, details: Vec<ChangeDetail>) -> Self {
        let mut description = format!(
            "{} '{}' moved to '{}'",
            source.kind, source.full_name, target.full_name
        );
        if !details.is_empty() {
            description.push_str(&format!(" ({})", join_details(&details)));
        }
        Self::unclassified(ChangeKind::Moved, source.kind, description, Some(source), Some(target), details)
    }

    pub fn excluded(source: MemberDescriptor) -> Self {
        let description = format!(
            "{} '{}' is absent and intentionally excluded",
            source.kind, source.full_name
        );
        Self::unclassified(ChangeKind::Excluded, source.kind, description, Some(source), None, Vec::new())
    }

    pub fn unexpectedly_included(source: Option<MemberDescriptor>, target: MemberDescriptor) -> Self {
        let description = format!(
            "{} '{}' is excluded but present in the target",
            target.kind, target.full_name
        );
        Self::unclassified(
            ChangeKind::UnexpectedlyIncluded,
            target.kind,
            description,
            source,
            Some(target),
            Vec::new(),
        )
    }

    /// Apply the classifier verdict, consuming the unclassified difference
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.is_breaking = classification.is_breaking;
        self.severity = classification.severity;
        for (entry, verdict) in self
            .change_details
            .iter_mut()
            .zip(classification.detail_verdicts)
        {
            entry.is_breaking = verdict;
        }
        self
    }

    /// Full name of the element as it appears in the source, else the target
    pub fn element_name(&self) -> &str {
        self.source_descriptor
            .as_ref()
            .or(self.target_descriptor.as_ref())
            .map(|d| d.full_name.as_str())
            .unwrap_or_default()
    }

    pub fn details(&self) -> impl Iterator<Item = &ChangeDetail> {
        self.change_details.iter().map(|entry| &entry.detail)
    }
}

fn join_details(details: &[ChangeDetail]) -> String {
    details
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
