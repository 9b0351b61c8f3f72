//! Diagnostic codes for non-fatal comparison anomalies
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};
use crate::difference::Severity;

/// Diagnostic code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Resolution ambiguities
    /// A source type had explicit mapping candidates but none exists in the target
    MappingUnresolved,

    /// An excluded identity is present in the target
    ExcludedButPresent,

    // Descriptor contract violations
    /// A descriptor is missing a required identity field
    DescriptorMissingIdentity,

    /// Two descriptors in one snapshot share the same identity
    DescriptorDuplicateIdentity,

    /// A member refers to a declaring type that is not in the snapshot
    DescriptorOrphanMember,
}

/// Anomaly category a diagnostic code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    ResolutionAmbiguity,
    DescriptorContractViolation,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MappingUnresolved => "MAPPING_UNRESOLVED",
            Self::ExcludedButPresent => "EXCLUDED_BUT_PRESENT",
            Self::DescriptorMissingIdentity => "DESCRIPTOR_MISSING_IDENTITY",
            Self::DescriptorDuplicateIdentity => "DESCRIPTOR_DUPLICATE_IDENTITY",
            Self::DescriptorOrphanMember => "DESCRIPTOR_ORPHAN_MEMBER",
        }
    }

    pub fn category(&self) -> DiagnosticCategory {
        match self {
            Self::MappingUnresolved | Self::ExcludedButPresent => DiagnosticCategory::ResolutionAmbiguity,
            Self::DescriptorMissingIdentity
            | Self::DescriptorDuplicateIdentity
            | Self::DescriptorOrphanMember => DiagnosticCategory::DescriptorContractViolation,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which snapshot a diagnostic refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Snapshot the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,

    /// Identity of the element concerned (best-effort)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            side: None,
            identity: None,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn category(&self) -> DiagnosticCategory {
        self.code.category()
    }
}
