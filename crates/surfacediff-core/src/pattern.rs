//! Anchored wildcard patterns for namespace, type and member names
//!
//! `*` matches any run of characters (including none), `?` matches exactly
//! one character. A pattern always has to match the whole candidate.

use regex::{Regex, RegexBuilder};
use crate::config::ConfigError;

/// A compiled wildcard pattern
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compile a pattern; literals without wildcards are valid patterns too
    pub fn compile(pattern: &str, ignore_case: bool) -> Result<Self, ConfigError> {
        if pattern.trim().is_empty() {
            return Err(ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern is empty".to_string(),
            });
        }

        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        let mut literal = String::new();

        for ch in pattern.chars() {
            match ch {
                '*' | '?' => {
                    expr.push_str(&regex::escape(&literal));
                    literal.clear();
                    expr.push_str(if ch == '*' { ".*" } else { "." });
                }
                _ => literal.push(ch),
            }
        }
        expr.push_str(&regex::escape(&literal));
        expr.push('$');

        let regex = RegexBuilder::new(&expr)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// An ordered list of patterns matched with "any" semantics
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<WildcardPattern>,
}

impl PatternSet {
    pub fn compile<S: AsRef<str>>(patterns: &[S], ignore_case: bool) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| WildcardPattern::compile(p.as_ref(), ignore_case))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// First pattern matching the candidate, in configured order
    pub fn first_match(&self, candidate: &str) -> Option<&WildcardPattern> {
        self.patterns.iter().find(|p| p.is_match(candidate))
    }

    pub fn matches_any(&self, candidate: &str) -> bool {
        self.first_match(candidate).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, text: &str) -> bool {
        WildcardPattern::compile(pattern, false).unwrap().is_match(text)
    }

    #[test]
    fn star_and_question_mark() {
        assert!(matches("*", "anything"));
        assert!(matches("*", ""));
        assert!(matches("System.*", "System.Collections"));
        assert!(matches("*.Internal", "Acme.Core.Internal"));
        assert!(matches("Acme.V?", "Acme.V2"));
        assert!(!matches("Acme.V?", "Acme.V10"));
        assert!(matches("Acme.*.Tests.*", "Acme.Core.Tests.Unit"));
    }

    #[test]
    fn patterns_are_anchored() {
        assert!(!matches("Acme", "Acme.Core"));
        assert!(!matches("Core", "Acme.Core"));
        assert!(!matches("Acme.*", "Other.Acme.Core"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches("List`1", "List`1"));
        assert!(matches("Acme.Op(int)", "Acme.Op(int)"));
        assert!(!matches("Acme.Core", "AcmexCore"));
        assert!(matches("Outer+Inner", "Outer+Inner"));
    }

    #[test]
    fn case_sensitivity() {
        assert!(!matches("acme.*", "Acme.Core"));
        let insensitive = WildcardPattern::compile("acme.*", true).unwrap();
        assert!(insensitive.is_match("Acme.Core"));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(WildcardPattern::compile("", false).is_err());
        assert!(WildcardPattern::compile("   ", false).is_err());
        assert!(PatternSet::compile(&["Acme.*", ""], false).is_err());
    }

    #[test]
    fn pattern_set_first_match_respects_order() {
        let set = PatternSet::compile(&["Acme.*", "Acme.Core"], false).unwrap();
        assert_eq!(set.first_match("Acme.Core").map(|p| p.as_str()), Some("Acme.*"));
        assert!(!set.matches_any("Other"));
        assert!(PatternSet::default().is_empty());
    }
}
