//! Descriptor types and canonical API surface model
//!
//! Descriptors are produced by an external introspector and are read-only
//! here: the engine combines and annotates them, it never mutates them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of a declared API element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
    Method,
    Property,
    Field,
    Event,
    Constructor,
}

impl MemberKind {
    /// Whether this kind declares a type (as opposed to a member of one)
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Self::Class | Self::Interface | Self::Struct | Self::Enum | Self::Delegate
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Delegate => "delegate",
            Self::Method => "method",
            Self::Property => "property",
            Self::Field => "field",
            Self::Event => "event",
            Self::Constructor => "constructor",
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared accessibility
///
/// Variant order is the comparison order used to decide whether a change
/// narrows or widens access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Accessibility {
    Private,
    Protected,
    Internal,
    ProtectedInternal,
    ProtectedOrPrivate,
    Public,
}

impl Accessibility {
    /// Visible only inside the declaring module
    pub fn is_internal_only(&self) -> bool {
        matches!(self, Self::Private | Self::Internal | Self::ProtectedOrPrivate)
    }
}

impl Default for Accessibility {
    fn default() -> Self {
        Self::Public
    }
}

impl std::fmt::Display for Accessibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Protected => write!(f, "protected"),
            Self::Internal => write!(f, "internal"),
            Self::ProtectedInternal => write!(f, "protected internal"),
            Self::ProtectedOrPrivate => write!(f, "private protected"),
            Self::Public => write!(f, "public"),
        }
    }
}

/// A single declared parameter of a method, constructor, delegate or indexer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    /// Parameter name
    pub name: String,

    /// Canonical parameter type name
    pub type_name: String,

    /// Whether the parameter has a default value
    #[serde(default)]
    pub is_optional: bool,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_optional: false,
        }
    }

    /// Mark the parameter as optional
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

/// Identity of a descriptor within one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DescriptorIdentity {
    pub full_name: String,
    pub signature: String,
}

impl std::fmt::Display for DescriptorIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.signature.is_empty() {
            write!(f, "{}", self.full_name)
        } else {
            write!(f, "{} {}", self.full_name, self.signature)
        }
    }
}

/// A required identity field is missing or inconsistent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorViolation {
    #[error("descriptor has an empty name")]
    EmptyName,

    #[error("descriptor '{0}' has an empty fully-qualified name")]
    EmptyFullName(String),

    #[error("member '{0}' has no declaring type")]
    MissingDeclaringType(String),
}

/// Canonical, assembly-agnostic description of a type or member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDescriptor {
    /// Element kind
    pub kind: MemberKind,

    /// Simple name
    pub name: String,

    /// Fully-qualified name
    pub full_name: String,

    /// Containing namespace (empty for the global namespace)
    #[serde(default)]
    pub namespace: String,

    /// Full name of the declaring type; empty for top-level types
    #[serde(default)]
    pub declaring_type: String,

    /// Declared accessibility
    #[serde(default)]
    pub accessibility: Accessibility,

    /// Canonical structural signature (parameter types, return type, generic arity)
    #[serde(default)]
    pub signature: String,

    /// Attribute type names
    #[serde(default)]
    pub attributes: BTreeSet<String>,

    /// Implemented interfaces (types only)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub interfaces: BTreeSet<String>,

    /// Declared parameters, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterDescriptor>,
}

impl MemberDescriptor {
    /// Create a top-level type descriptor
    pub fn new_type(kind: MemberKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        let full_name = qualify(&namespace, &name);

        Self {
            kind,
            name,
            full_name,
            namespace,
            declaring_type: String::new(),
            accessibility: Accessibility::Public,
            signature: String::new(),
            attributes: BTreeSet::new(),
            interfaces: BTreeSet::new(),
            parameters: Vec::new(),
        }
    }

    /// Create a member descriptor owned by `declaring_type`
    pub fn new_member(
        kind: MemberKind,
        declaring_type: &MemberDescriptor,
        name: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        let name = name.into();

        Self {
            kind,
            full_name: format!("{}.{}", declaring_type.full_name, name),
            name,
            namespace: declaring_type.namespace.clone(),
            declaring_type: declaring_type.full_name.clone(),
            accessibility: Accessibility::Public,
            signature: signature.into(),
            attributes: BTreeSet::new(),
            interfaces: BTreeSet::new(),
            parameters: Vec::new(),
        }
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.insert(interface.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterDescriptor>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Identity used for equality across snapshots
    pub fn identity(&self) -> DescriptorIdentity {
        DescriptorIdentity {
            full_name: self.full_name.clone(),
            signature: self.signature.clone(),
        }
    }

    /// Type name relative to the namespace (includes outer types for nested types)
    pub fn type_name(&self) -> &str {
        if self.namespace.is_empty() {
            return &self.full_name;
        }

        self.full_name
            .strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.name)
    }

    pub fn is_obsolete(&self) -> bool {
        self.has_attribute("Obsolete")
    }

    pub fn is_compiler_generated(&self) -> bool {
        self.has_attribute("CompilerGenerated") || self.name.contains('<')
    }

    /// Check for an attribute, accepting the `Attribute` suffix and a `System.` qualifier
    pub fn has_attribute(&self, short_name: &str) -> bool {
        self.attributes.iter().any(|attr| {
            let attr = attr.rsplit('.').next().unwrap_or(attr);
            let attr = attr.strip_suffix("Attribute").unwrap_or(attr);
            attr == short_name
        })
    }

    /// Check that the identity fields required for matching are present
    pub fn validate(&self) -> Result<(), DescriptorViolation> {
        if self.name.trim().is_empty() {
            return Err(DescriptorViolation::EmptyName);
        }

        if self.full_name.trim().is_empty() {
            return Err(DescriptorViolation::EmptyFullName(self.name.clone()));
        }

        if !self.kind.is_type() && self.declaring_type.trim().is_empty() {
            return Err(DescriptorViolation::MissingDeclaringType(self.full_name.clone()));
        }

        Ok(())
    }
}

/// Join a namespace and a relative name
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// Split a qualified name at its last top-level dot into (namespace, name)
///
/// Dots inside generic argument lists or array brackets do not split, so
/// `System.IEquatable<Acme.Widget>` yields `("System", "IEquatable<Acme.Widget>")`.
pub fn split_qualified(full_name: &str) -> (&str, &str) {
    let mut depth = 0usize;
    let mut split = None;

    for (i, ch) in full_name.char_indices() {
        match ch {
            '<' | '[' => depth += 1,
            '>' | ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => split = Some(i),
            _ => {}
        }
    }

    match split {
        Some(i) => (&full_name[..i], &full_name[i + 1..]),
        None => ("", full_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessibility_ordering() {
        assert!(Accessibility::Private < Accessibility::Protected);
        assert!(Accessibility::Internal < Accessibility::ProtectedInternal);
        assert!(Accessibility::ProtectedOrPrivate < Accessibility::Public);
        assert!(Accessibility::Internal.is_internal_only());
        assert!(!Accessibility::Protected.is_internal_only());
    }

    #[test]
    fn type_and_member_construction() {
        let ty = MemberDescriptor::new_type(MemberKind::Interface, "TestAssembly", "IPublicInterface");
        let method = MemberDescriptor::new_member(MemberKind::Method, &ty, "UnchangedMethod", "void()");

        assert_eq!(ty.full_name, "TestAssembly.IPublicInterface");
        assert_eq!(ty.type_name(), "IPublicInterface");
        assert_eq!(method.full_name, "TestAssembly.IPublicInterface.UnchangedMethod");
        assert_eq!(method.declaring_type, "TestAssembly.IPublicInterface");
        assert_eq!(method.namespace, "TestAssembly");
    }

    #[test]
    fn nested_type_name_keeps_outer_type() {
        let mut nested = MemberDescriptor::new_type(MemberKind::Class, "Acme.Core", "Inner");
        nested.full_name = "Acme.Core.Outer.Inner".to_string();
        nested.declaring_type = "Acme.Core.Outer".to_string();

        assert_eq!(nested.type_name(), "Outer.Inner");
    }

    #[test]
    fn identity_ignores_non_identity_fields() {
        let ty = MemberDescriptor::new_type(MemberKind::Class, "Acme", "Widget");
        let a = MemberDescriptor::new_member(MemberKind::Method, &ty, "Run", "void(int)");
        let b = a.clone().with_accessibility(Accessibility::Protected);

        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), a.clone().with_signature("void(string)").identity());
    }

    #[test]
    fn attribute_detection() {
        let ty = MemberDescriptor::new_type(MemberKind::Class, "Acme", "Widget")
            .with_attribute("System.ObsoleteAttribute");
        assert!(ty.is_obsolete());
        assert!(!ty.is_compiler_generated());

        let generated = MemberDescriptor::new_type(MemberKind::Class, "Acme", "<>c__DisplayClass0_0");
        assert!(generated.is_compiler_generated());
    }

    #[test]
    fn validation_rejects_missing_identity() {
        let ty = MemberDescriptor::new_type(MemberKind::Class, "Acme", "Widget");
        assert!(ty.validate().is_ok());

        let mut member = MemberDescriptor::new_member(MemberKind::Field, &ty, "count", "int");
        member.declaring_type.clear();
        assert!(matches!(
            member.validate(),
            Err(DescriptorViolation::MissingDeclaringType(_))
        ));

        let mut unnamed = ty.clone();
        unnamed.name.clear();
        assert_eq!(unnamed.validate(), Err(DescriptorViolation::EmptyName));
    }

    #[test]
    fn descriptor_json_uses_camel_case() {
        let ty = MemberDescriptor::new_type(MemberKind::Struct, "Acme", "Point");
        let json = serde_json::to_string(&ty).unwrap();
        assert!(json.contains("\"fullName\""));
        assert!(json.contains("\"declaringType\""));

        let parsed: MemberDescriptor = serde_json::from_str(
            r#"{"kind":"Method","name":"Run","fullName":"Acme.Point.Run","declaringType":"Acme.Point"}"#,
        )
        .unwrap();
        assert_eq!(parsed.accessibility, Accessibility::Public);
        assert!(parsed.signature.is_empty());
    }

    #[test]
    fn split_qualified_ignores_dots_in_generic_arguments() {
        assert_eq!(split_qualified("Acme.Core.Widget"), ("Acme.Core", "Widget"));
        assert_eq!(split_qualified("Widget"), ("", "Widget"));
        assert_eq!(
            split_qualified("System.IEquatable<Acme.Old.Widget>"),
            ("System", "IEquatable<Acme.Old.Widget>")
        );
        assert_eq!(
            split_qualified("Acme.IMap<Acme.Key, System.Collections.List<Acme.Value>>"),
            ("Acme", "IMap<Acme.Key, System.Collections.List<Acme.Value>>")
        );
        assert_eq!(split_qualified("Acme.Widget[]"), ("Acme", "Widget[]"));
    }
}
