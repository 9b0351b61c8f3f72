//! Breaking-change classifier
//!
//! Turns a raw difference into a policy verdict. Every change detail is
//! judged on its own; the difference is breaking if any part of it is, and
//! takes the highest severity among its parts.

use surfacediff_core::{
    ApiDifference, BreakingChangeRules, ChangeDetail, ChangeKind, Classification, Severity,
};

/// Verdict for a single part of a difference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub is_breaking: bool,
    pub severity: Severity,
}

impl Verdict {
    /// Breaking when `switch` is on, with the given severities for each case
    fn governed(switch: bool, breaking: Severity, otherwise: Severity) -> Self {
        Self {
            is_breaking: switch,
            severity: if switch { breaking } else { otherwise },
        }
    }

    /// Breaking when `switch` is on; severity does not depend on it
    fn flagged(switch: bool, severity: Severity) -> Self {
        Self {
            is_breaking: switch,
            severity,
        }
    }

    fn never(severity: Severity) -> Self {
        Self {
            is_breaking: false,
            severity,
        }
    }
}

/// Classify a difference under the given rules
pub fn classify(difference: &ApiDifference, rules: &BreakingChangeRules) -> Classification {
    let is_type = difference.element_kind.is_type();

    let base = match difference.change_kind {
        ChangeKind::Removed => {
            let switch = if is_type {
                rules.treat_type_removal_as_breaking
            } else {
                rules.treat_member_removal_as_breaking
            };
            let severity = if is_type { Severity::Critical } else { Severity::Error };
            Verdict::flagged(switch, severity)
        }
        ChangeKind::Added => {
            let switch = if is_type {
                rules.treat_added_type_as_breaking
            } else {
                rules.treat_added_member_as_breaking
            };
            Verdict::governed(switch, Severity::Error, Severity::Info)
        }
        // Details carry the verdicts
        ChangeKind::Modified | ChangeKind::Moved => Verdict::never(Severity::Info),
        ChangeKind::Excluded => Verdict::never(Severity::Info),
        ChangeKind::UnexpectedlyIncluded => Verdict::never(Severity::Warning),
    };

    let detail_verdicts: Vec<Verdict> = match difference.change_kind {
        ChangeKind::Modified | ChangeKind::Moved => difference
            .details()
            .map(|detail| classify_detail(detail, rules))
            .collect(),
        // Exclusion outcomes are never breaking, whatever they carry
        _ => difference
            .details()
            .map(|_| Verdict::never(Severity::Info))
            .collect(),
    };

    let is_breaking = base.is_breaking || detail_verdicts.iter().any(|v| v.is_breaking);
    let severity = detail_verdicts
        .iter()
        .map(|v| v.severity)
        .fold(base.severity, Severity::max);

    Classification {
        is_breaking,
        severity,
        detail_verdicts: detail_verdicts.iter().map(|v| v.is_breaking).collect(),
    }
}

/// Classify one change detail of a Modified or Moved difference
pub fn classify_detail(detail: &ChangeDetail, rules: &BreakingChangeRules) -> Verdict {
    match detail {
        ChangeDetail::SignatureChanged { .. } => {
            Verdict::governed(rules.treat_signature_change_as_breaking, Severity::Error, Severity::Warning)
        }
        ChangeDetail::AccessibilityReduced { .. } => Verdict::governed(
            rules.treat_reduced_accessibility_as_breaking,
            Severity::Error,
            Severity::Warning,
        ),
        ChangeDetail::AccessibilityWidened { .. } => Verdict::never(Severity::Info),
        ChangeDetail::InterfaceAdded { .. } => {
            Verdict::governed(rules.treat_added_interface_as_breaking, Severity::Error, Severity::Info)
        }
        ChangeDetail::InterfaceRemoved { .. } => Verdict::governed(
            rules.treat_removed_interface_as_breaking,
            Severity::Error,
            Severity::Warning,
        ),
        ChangeDetail::ParameterRenamed { .. } => Verdict::governed(
            rules.treat_parameter_name_change_as_breaking,
            Severity::Error,
            Severity::Warning,
        ),
        ChangeDetail::OptionalParameterAdded { .. } => Verdict::governed(
            rules.treat_added_optional_parameter_as_breaking,
            Severity::Error,
            Severity::Warning,
        ),
        ChangeDetail::ObsoleteAdded => Verdict::never(Severity::Warning),
        ChangeDetail::ObsoleteRemoved => Verdict::never(Severity::Info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfacediff_core::{Accessibility, MemberDescriptor, MemberKind};

    fn widget() -> MemberDescriptor {
        MemberDescriptor::new_type(MemberKind::Class, "Acme", "Widget")
    }

    fn run() -> MemberDescriptor {
        MemberDescriptor::new_member(MemberKind::Method, &widget(), "Run", "void()")
    }

    fn modified(details: Vec<ChangeDetail>) -> ApiDifference {
        ApiDifference::modified(run(), run(), details)
    }

    #[test]
    fn removals_follow_switches_and_element_kind() {
        let rules = BreakingChangeRules::default();

        let c = classify(&ApiDifference::removed(widget()), &rules);
        assert!(c.is_breaking);
        assert_eq!(c.severity, Severity::Critical);

        let c = classify(&ApiDifference::removed(run()), &rules);
        assert!(c.is_breaking);
        assert_eq!(c.severity, Severity::Error);

        let c = classify(&ApiDifference::removed(run()), &BreakingChangeRules::lenient());
        assert!(!c.is_breaking);
        assert_eq!(c.severity, Severity::Error);
    }

    #[test]
    fn removal_severity_ignores_the_breaking_switch() {
        let lenient = BreakingChangeRules::lenient();
        assert!(!lenient.treat_type_removal_as_breaking);

        let c = classify(&ApiDifference::removed(widget()), &lenient);
        assert!(!c.is_breaking);
        assert_eq!(c.severity, Severity::Critical);

        let rules = BreakingChangeRules {
            treat_member_removal_as_breaking: false,
            ..BreakingChangeRules::default()
        };
        let c = classify(&ApiDifference::removed(run()), &rules);
        assert!(!c.is_breaking);
        assert_eq!(c.severity, Severity::Error);
    }

    #[test]
    fn additions_are_breaking_only_when_enabled() {
        let c = classify(&ApiDifference::added(run()), &BreakingChangeRules::default());
        assert!(!c.is_breaking);
        assert_eq!(c.severity, Severity::Info);

        let rules = BreakingChangeRules {
            treat_added_type_as_breaking: true,
            ..BreakingChangeRules::default()
        };
        assert!(classify(&ApiDifference::added(widget()), &rules).is_breaking);
        assert!(!classify(&ApiDifference::added(run()), &rules).is_breaking);
    }

    #[test]
    fn details_get_independent_verdicts() {
        let difference = modified(vec![
            ChangeDetail::ParameterRenamed { position: 0, from: "a".into(), to: "b".into() },
            ChangeDetail::AccessibilityReduced {
                from: Accessibility::Public,
                to: Accessibility::Protected,
            },
        ]);

        let c = classify(&difference, &BreakingChangeRules::default());
        assert_eq!(c.detail_verdicts, vec![false, true]);
        assert!(c.is_breaking);
        assert_eq!(c.severity, Severity::Error);

        let classified = difference.with_classification(c);
        assert!(!classified.change_details[0].is_breaking);
        assert!(classified.change_details[1].is_breaking);
    }

    #[test]
    fn non_breaking_details_keep_their_severity() {
        let difference = modified(vec![
            ChangeDetail::AccessibilityWidened {
                from: Accessibility::Protected,
                to: Accessibility::Public,
            },
            ChangeDetail::ObsoleteAdded,
        ]);

        let c = classify(&difference, &BreakingChangeRules::strict());
        assert!(!c.is_breaking);
        assert_eq!(c.severity, Severity::Warning);
    }

    #[test]
    fn signature_change_switch() {
        let difference = modified(vec![ChangeDetail::SignatureChanged {
            from: "void(string)".into(),
            to: "void(int)".into(),
        }]);

        assert!(classify(&difference, &BreakingChangeRules::default()).is_breaking);

        let rules = BreakingChangeRules {
            treat_signature_change_as_breaking: false,
            ..BreakingChangeRules::default()
        };
        let c = classify(&difference, &rules);
        assert!(!c.is_breaking);
        assert_eq!(c.severity, Severity::Warning);
    }

    #[test]
    fn moved_alone_is_never_breaking() {
        let moved = ApiDifference::moved(widget(), widget(), Vec::new());
        let c = classify(&moved, &BreakingChangeRules::strict());
        assert!(!c.is_breaking);
        assert_eq!(c.severity, Severity::Info);

        let moved = ApiDifference::moved(
            widget(),
            widget(),
            vec![ChangeDetail::InterfaceRemoved { interface: "System.IDisposable".into() }],
        );
        assert!(classify(&moved, &BreakingChangeRules::default()).is_breaking);
    }

    #[test]
    fn exclusion_outcomes_ignore_rules() {
        let strict = BreakingChangeRules::strict();

        let c = classify(&ApiDifference::excluded(widget()), &strict);
        assert!(!c.is_breaking);
        assert_eq!(c.severity, Severity::Info);

        let c = classify(&ApiDifference::unexpectedly_included(None, widget()), &strict);
        assert!(!c.is_breaking);
        assert_eq!(c.severity, Severity::Warning);
    }

    #[test]
    fn interface_added_switch() {
        let detail = ChangeDetail::InterfaceAdded { interface: "System.IComparable".into() };

        let off = classify_detail(&detail, &BreakingChangeRules::default());
        assert_eq!(off, Verdict { is_breaking: false, severity: Severity::Info });

        let on = classify_detail(&detail, &BreakingChangeRules::strict());
        assert_eq!(on, Verdict { is_breaking: true, severity: Severity::Error });
    }
}
