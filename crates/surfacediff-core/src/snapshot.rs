//! Introspected API snapshots
//!
//! A snapshot is the complete public surface of one module as handed over by
//! the introspector: a flat, ordered list of descriptors.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use crate::descriptor::MemberDescriptor;

/// One introspected module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSnapshot {
    /// Module name (e.g. assembly name)
    pub name: String,

    /// Module version, if the introspector reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Descriptors in introspection order
    #[serde(default)]
    pub descriptors: Vec<MemberDescriptor>,
}

impl ApiSnapshot {
    pub fn new(name: impl Into<String>, descriptors: Vec<MemberDescriptor>) -> Self {
        Self {
            name: name.into(),
            version: None,
            descriptors,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Load a snapshot from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SnapshotError::Io(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Parse a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Parse(e.to_string()))
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.descriptors)
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo::new(self.name.clone(), self.version.clone(), &self.descriptors)
    }
}

/// Hex SHA-256 over a length-prefixed encoding of every descriptor field
pub fn fingerprint(descriptors: &[MemberDescriptor]) -> String {
    let mut hasher = Sha256::new();

    for descriptor in descriptors {
        hash_descriptor(&mut hasher, descriptor);
    }

    hex::encode(hasher.finalize())
}

fn hash_descriptor(hasher: &mut Sha256, descriptor: &MemberDescriptor) {
    hash_field(hasher, descriptor.kind.as_str());
    hash_field(hasher, &descriptor.name);
    hash_field(hasher, &descriptor.full_name);
    hash_field(hasher, &descriptor.namespace);
    hash_field(hasher, &descriptor.declaring_type);
    hash_field(hasher, &descriptor.accessibility.to_string());
    hash_field(hasher, &descriptor.signature);

    hasher.update((descriptor.attributes.len() as u64).to_le_bytes());
    for attribute in &descriptor.attributes {
        hash_field(hasher, attribute);
    }

    hasher.update((descriptor.interfaces.len() as u64).to_le_bytes());
    for interface in &descriptor.interfaces {
        hash_field(hasher, interface);
    }

    hasher.update((descriptor.parameters.len() as u64).to_le_bytes());
    for parameter in &descriptor.parameters {
        hash_field(hasher, &parameter.name);
        hash_field(hasher, &parameter.type_name);
        hasher.update([u8::from(parameter.is_optional)]);
    }
}

// Length prefix keeps ("ab", "c") and ("a", "bc") apart
fn hash_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// Traceability record of a compared snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub fingerprint: String,

    pub descriptor_count: usize,
}

impl SnapshotInfo {
    pub fn new(name: impl Into<String>, version: Option<String>, descriptors: &[MemberDescriptor]) -> Self {
        Self {
            name: name.into(),
            version,
            fingerprint: fingerprint(descriptors),
            descriptor_count: descriptors.len(),
        }
    }
}

/// Snapshot loading errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
