//! Integration tests for the comparison pipeline

use pretty_assertions::assert_eq;
use surfacediff_core::{
    ApiSnapshot, BreakingChangeRules, ChangeDetail, ChangeKind, ComparisonConfiguration,
    ComparisonResult, ConfigError, DiagnosticCode, ExclusionConfig, MappingConfig,
    MemberDescriptor, MemberKind, Severity,
};
use surfacediff_engine::ApiComparer;
use std::path::Path;

fn fixture(name: &str) -> ApiSnapshot {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    ApiSnapshot::from_file(&path).unwrap()
}

fn v1() -> ApiSnapshot {
    fixture("test_assembly_v1.json")
}

fn v2() -> ApiSnapshot {
    fixture("test_assembly_v2.json")
}

fn compare(config: ComparisonConfiguration, source: &ApiSnapshot, target: &ApiSnapshot) -> ComparisonResult {
    ApiComparer::new(config).unwrap().compare(source, target)
}

/// (kind, element, breaking) triples in emission order
fn outline(result: &ComparisonResult) -> Vec<(ChangeKind, String, bool)> {
    result
        .differences
        .iter()
        .map(|d| (d.change_kind, d.element_name().to_string(), d.is_breaking))
        .collect()
}

fn renamed_namespace_config() -> ComparisonConfiguration {
    ComparisonConfiguration {
        mappings: MappingConfig::default()
            .map_namespace("TestAssembly.Old", vec!["TestAssembly.RenamedNamespace".into()]),
        exclusions: ExclusionConfig {
            excluded_types: vec!["TestAssembly.LegacyClass".into()],
            ..ExclusionConfig::default()
        },
        ..ComparisonConfiguration::default()
    }
}

#[test]
fn default_configuration_against_fixtures() {
    let result = compare(ComparisonConfiguration::default(), &v1(), &v2());

    assert_eq!(
        outline(&result),
        vec![
            (ChangeKind::Removed, "TestAssembly.IPublicInterface.RemovedMethod".to_string(), true),
            (ChangeKind::Added, "TestAssembly.IPublicInterface.NewMethod".to_string(), false),
            (ChangeKind::Modified, "TestAssembly.PublicClass.ChangedSignatureMethod".to_string(), true),
            (ChangeKind::Removed, "TestAssembly.Old.ClassA".to_string(), true),
            (ChangeKind::Removed, "TestAssembly.LegacyClass".to_string(), true),
            (ChangeKind::Added, "TestAssembly.RenamedNamespace.ClassA".to_string(), false),
        ]
    );

    assert_eq!(result.summary.total, 6);
    assert_eq!(result.summary.removed, 3);
    assert_eq!(result.summary.added, 2);
    assert_eq!(result.summary.modified, 1);
    assert_eq!(result.summary.breaking, 4);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn removed_interface_method_is_breaking_and_new_one_is_not() {
    let result = compare(ComparisonConfiguration::default(), &v1(), &v2());

    let removed: Vec<_> = result.differences_of(ChangeKind::Removed).collect();
    let method = removed
        .iter()
        .find(|d| d.element_name() == "TestAssembly.IPublicInterface.RemovedMethod")
        .unwrap();
    assert!(method.is_breaking);
    assert_eq!(method.severity, Severity::Error);

    let added = result
        .differences_of(ChangeKind::Added)
        .find(|d| d.element_name() == "TestAssembly.IPublicInterface.NewMethod")
        .unwrap();
    assert!(!added.is_breaking);
    assert_eq!(added.severity, Severity::Info);
}

#[test]
fn namespace_rename_yields_single_moved() {
    let result = compare(renamed_namespace_config(), &v1(), &v2());

    let class_a: Vec<_> = result
        .differences
        .iter()
        .filter(|d| d.element_name().ends_with("ClassA") || d.element_name().contains("ClassA."))
        .collect();
    assert_eq!(class_a.len(), 1);

    let moved = class_a[0];
    assert_eq!(moved.change_kind, ChangeKind::Moved);
    assert!(!moved.is_breaking);
    assert_eq!(
        moved.source_descriptor.as_ref().map(|d| d.full_name.as_str()),
        Some("TestAssembly.Old.ClassA")
    );
    assert_eq!(
        moved.target_descriptor.as_ref().map(|d| d.full_name.as_str()),
        Some("TestAssembly.RenamedNamespace.ClassA")
    );
}

#[test]
fn changed_parameter_type_is_breaking_signature_change() {
    let result = compare(ComparisonConfiguration::default(), &v1(), &v2());

    let modified: Vec<_> = result.differences_of(ChangeKind::Modified).collect();
    assert_eq!(modified.len(), 1);

    let difference = modified[0];
    assert_eq!(difference.element_name(), "TestAssembly.PublicClass.ChangedSignatureMethod");
    assert!(difference.is_breaking);
    assert_eq!(
        difference.details().collect::<Vec<_>>(),
        vec![&ChangeDetail::SignatureChanged {
            from: "void(string)".to_string(),
            to: "void(int)".to_string(),
        }]
    );
    assert!(difference.change_details[0].is_breaking);
}

#[test]
fn mapped_and_excluded_configuration() {
    let result = compare(renamed_namespace_config(), &v1(), &v2());

    assert_eq!(
        outline(&result),
        vec![
            (ChangeKind::Removed, "TestAssembly.IPublicInterface.RemovedMethod".to_string(), true),
            (ChangeKind::Added, "TestAssembly.IPublicInterface.NewMethod".to_string(), false),
            (ChangeKind::Modified, "TestAssembly.PublicClass.ChangedSignatureMethod".to_string(), true),
            (ChangeKind::Moved, "TestAssembly.Old.ClassA".to_string(), false),
            (ChangeKind::Excluded, "TestAssembly.LegacyClass".to_string(), false),
        ]
    );
    assert_eq!(result.summary.moved, 1);
    assert_eq!(result.summary.excluded, 1);
    assert_eq!(result.summary.breaking, 2);
}

#[test]
fn comparing_a_snapshot_with_itself_is_empty() {
    let snapshot = v1();
    let result = compare(ComparisonConfiguration::default(), &snapshot, &snapshot);

    assert!(!result.has_differences());
    assert!(!result.has_breaking_changes());
    assert_eq!(result.source.fingerprint, result.target.fingerprint);
}

#[test]
fn comparison_is_idempotent() {
    let comparer = ApiComparer::new(renamed_namespace_config()).unwrap();
    let (source, target) = (v1(), v2());

    let first = comparer.compare(&source, &target);
    let second = comparer.compare(&source, &target);

    assert_eq!(first.differences, second.differences);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn cyclic_namespace_mapping_is_rejected() {
    let config = ComparisonConfiguration {
        mappings: MappingConfig::default()
            .map_namespace("A", vec!["B".into()])
            .map_namespace("B", vec!["A".into()]),
        ..ComparisonConfiguration::default()
    };

    match ApiComparer::new(config) {
        Err(ConfigError::MappingCycle(cycle)) => assert_eq!(cycle, "A -> B -> A"),
        other => panic!("expected a mapping cycle error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn exclusion_dominates_breaking_rules() {
    let config = ComparisonConfiguration {
        exclusions: ExclusionConfig {
            excluded_types: vec!["TestAssembly.LegacyClass".into()],
            ..ExclusionConfig::default()
        },
        breaking_rules: BreakingChangeRules::strict(),
        ..ComparisonConfiguration::default()
    };

    let result = compare(config, &v1(), &v2());
    let excluded: Vec<_> = result.differences_of(ChangeKind::Excluded).collect();

    assert_eq!(excluded.len(), 1);
    assert_eq!(excluded[0].element_name(), "TestAssembly.LegacyClass");
    assert!(!excluded[0].is_breaking);
    assert_eq!(excluded[0].severity, Severity::Info);
}

#[test]
fn excluded_type_present_in_target_is_reported() {
    let config = ComparisonConfiguration {
        exclusions: ExclusionConfig {
            excluded_type_patterns: vec!["TestAssembly.Public*".into()],
            ..ExclusionConfig::default()
        },
        ..ComparisonConfiguration::default()
    };

    let result = compare(config, &v1(), &v2());
    let unexpected: Vec<_> = result.differences_of(ChangeKind::UnexpectedlyIncluded).collect();

    assert_eq!(unexpected.len(), 1);
    assert_eq!(unexpected[0].element_name(), "TestAssembly.PublicClass");
    assert!(!unexpected[0].is_breaking);
    assert_eq!(unexpected[0].severity, Severity::Warning);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::ExcludedButPresent);

    // Members of the excluded type are not compared
    assert!(result.differences_of(ChangeKind::Modified).next().is_none());
}

#[test]
fn default_rule_symmetry_for_methods() {
    let ty = MemberDescriptor::new_type(MemberKind::Class, "Acme", "Widget");
    let old = MemberDescriptor::new_member(MemberKind::Method, &ty, "Old", "void()");
    let new = MemberDescriptor::new_member(MemberKind::Method, &ty, "New", "void()");

    let comparer = ApiComparer::new(ComparisonConfiguration::default()).unwrap();
    let result = comparer.compare_descriptors(&[ty.clone(), old], &[ty, new]);

    let removed = result.differences_of(ChangeKind::Removed).next().unwrap();
    let added = result.differences_of(ChangeKind::Added).next().unwrap();
    assert!(removed.is_breaking);
    assert!(!added.is_breaking);
}

#[test]
fn internals_are_out_of_scope_unless_requested() {
    let mut target = v1();
    target
        .descriptors
        .retain(|d| d.full_name != "TestAssembly.InternalHelper");

    let result = compare(ComparisonConfiguration::default(), &v1(), &target);
    assert!(!result.has_differences());

    let mut config = ComparisonConfiguration::default();
    config.filters.include_internals = true;
    let result = compare(config, &v1(), &target);
    assert_eq!(
        outline(&result),
        vec![(ChangeKind::Removed, "TestAssembly.InternalHelper".to_string(), true)]
    );
}

#[test]
fn json_configuration_drives_the_comparison() {
    let json = r#"{
        "failOnBreakingChanges": false,
        "mappings": {
            "namespaceMappings": {
                "TestAssembly.Old": ["TestAssembly.RenamedNamespace"]
            }
        },
        "exclusions": {
            "excludedTypes": ["TestAssembly.LegacyClass"]
        },
        "breakingRules": {
            "treatMemberRemovalAsBreaking": false,
            "treatSignatureChangeAsBreaking": false
        }
    }"#;

    let config = ComparisonConfiguration::from_json(json).unwrap();
    assert!(!config.fail_on_breaking_changes);
    assert!(config.breaking_rules.treat_type_removal_as_breaking);

    let result = compare(config, &v1(), &v2());
    assert_eq!(result.summary.total, 5);
    assert!(!result.has_breaking_changes());
}

#[test]
fn malformed_descriptors_are_diagnosed_not_fatal() {
    let mut source = v1();
    let mut broken = source.descriptors[1].clone();
    broken.full_name.clear();
    source.descriptors.push(broken);
    let orphan = MemberDescriptor::new_member(
        MemberKind::Method,
        &MemberDescriptor::new_type(MemberKind::Class, "TestAssembly", "Ghost"),
        "Haunt",
        "void()",
    );
    source.descriptors.push(orphan);

    let result = compare(ComparisonConfiguration::default(), &source, &v2());

    let codes: Vec<DiagnosticCode> = result.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![DiagnosticCode::DescriptorMissingIdentity, DiagnosticCode::DescriptorOrphanMember]
    );
    assert_eq!(result.summary.total, 6);
}

#[test]
fn result_serializes_to_json() {
    let result = compare(ComparisonConfiguration::default(), &v1(), &v2());
    let json = result.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["summary"]["breaking"], 4);
    assert_eq!(value["differences"][0]["changeKind"], "Removed");
    assert_eq!(value["source"]["version"], "1.0.0");
}

fn auto_map_config(mappings: MappingConfig) -> ComparisonConfiguration {
    ComparisonConfiguration {
        mappings: MappingConfig {
            auto_map_same_name_types: true,
            ..mappings
        },
        ..ComparisonConfiguration::default()
    }
}

#[test]
fn auto_map_alone_moves_class_a() {
    let result = compare(auto_map_config(MappingConfig::default()), &v1(), &v2());

    let moved: Vec<_> = result.differences_of(ChangeKind::Moved).collect();
    assert_eq!(moved.len(), 1);
    assert_eq!(
        moved[0].target_descriptor.as_ref().map(|d| d.full_name.as_str()),
        Some("TestAssembly.RenamedNamespace.ClassA")
    );
    assert!(result.diagnostics.is_empty());
}

#[test]
fn auto_map_never_overrides_an_unresolved_namespace_mapping() {
    let mappings = MappingConfig::default()
        .map_namespace("TestAssembly.Old", vec!["TestAssembly.Missing".into()]);
    let result = compare(auto_map_config(mappings), &v1(), &v2());

    let class_a: Vec<(ChangeKind, String, bool)> = outline(&result)
        .into_iter()
        .filter(|(_, name, _)| name.ends_with(".ClassA"))
        .collect();
    assert_eq!(
        class_a,
        vec![
            (ChangeKind::Removed, "TestAssembly.Old.ClassA".to_string(), true),
            (ChangeKind::Added, "TestAssembly.RenamedNamespace.ClassA".to_string(), false),
        ]
    );

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::MappingUnresolved);
    assert_eq!(result.diagnostics[0].identity.as_deref(), Some("TestAssembly.Old.ClassA"));
}

#[test]
fn auto_map_never_overrides_an_unresolved_type_mapping() {
    let mappings = MappingConfig::default()
        .map_type("TestAssembly.Old.ClassA", "TestAssembly.Gone.ClassA");
    let result = compare(auto_map_config(mappings), &v1(), &v2());

    assert!(result.differences_of(ChangeKind::Moved).next().is_none());
    let removed: Vec<&str> = result
        .differences_of(ChangeKind::Removed)
        .map(|d| d.element_name())
        .collect();
    assert!(removed.contains(&"TestAssembly.Old.ClassA"));

    let codes: Vec<DiagnosticCode> = result.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![DiagnosticCode::MappingUnresolved]);
}

#[test]
fn generic_arity_variants_compare_independently() {
    let single = MemberDescriptor::new_type(MemberKind::Class, "Acme", "Result").with_signature("`1");
    let pair = MemberDescriptor::new_type(MemberKind::Class, "Acme", "Result").with_signature("`2");
    let value = MemberDescriptor::new_member(MemberKind::Property, &single, "Value", "T");

    let source = vec![single.clone(), value.clone(), pair];
    let target = vec![single, value];

    let comparer = ApiComparer::new(ComparisonConfiguration::default()).unwrap();
    let result = comparer.compare_descriptors(&source, &target);

    assert!(result.diagnostics.is_empty());
    assert_eq!(
        outline(&result),
        vec![(ChangeKind::Removed, "Acme.Result".to_string(), true)]
    );

    let removed = &result.differences[0];
    assert_eq!(removed.source_descriptor.as_ref().map(|d| d.signature.as_str()), Some("`2"));
    assert_eq!(removed.severity, Severity::Critical);
}

#[test]
fn removal_keeps_its_severity_when_not_breaking() {
    let config = ComparisonConfiguration {
        breaking_rules: BreakingChangeRules::lenient(),
        ..ComparisonConfiguration::default()
    };
    let result = compare(config, &v1(), &v2());

    let removed = result
        .differences_of(ChangeKind::Removed)
        .find(|d| d.element_name() == "TestAssembly.LegacyClass")
        .unwrap();
    assert!(!removed.is_breaking);
    assert_eq!(removed.severity, Severity::Critical);
}
