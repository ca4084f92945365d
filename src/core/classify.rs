// logsift - core/classify.rs
//
// Applies the configured keyword rules to individual lines of log text.
// Pure logic, no I/O.
//
// Matching policy: rules are evaluated in configured order and the FIRST
// rule whose pattern occurs in the line wins. Evaluation order is the only
// tie-break, which is what lets a "mismatch" rule shadow a "match" rule.
// A line matching no rule is Plain.

use crate::core::model::{KeywordRule, Tag};

/// Compiled form of an ordered keyword rule set. Built once per run;
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<KeywordRule>,

    /// Lowercased copies of the patterns, used in case-insensitive mode.
    lowered: Vec<String>,

    /// Matching is case-sensitive by default; the configuration document
    /// can switch the whole rule set to case-insensitive.
    case_sensitive: bool,
}

impl Classifier {
    pub fn new(rules: Vec<KeywordRule>, case_sensitive: bool) -> Self {
        let lowered = rules.iter().map(|r| r.pattern.to_lowercase()).collect();
        Self {
            rules,
            lowered,
            case_sensitive,
        }
    }

    /// The rule that classifies one line: first matching rule wins.
    /// Callers needing the highlight colour take it from the returned rule,
    /// so it always belongs to the rule that actually matched.
    pub fn matching_rule(&self, line: &str) -> Option<&KeywordRule> {
        if self.case_sensitive {
            self.rules.iter().find(|rule| line.contains(&rule.pattern))
        } else {
            let line_lower = line.to_lowercase();
            self.rules
                .iter()
                .zip(&self.lowered)
                .find(|(_, pattern)| line_lower.contains(pattern.as_str()))
                .map(|(rule, _)| rule)
        }
    }

    /// Classify one line: first matching rule wins, no rule -> `Plain`.
    pub fn classify(&self, line: &str) -> Tag {
        self.matching_rule(line).map_or(Tag::Plain, |rule| rule.tag)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, tag: Tag) -> KeywordRule {
        KeywordRule {
            pattern: pattern.to_string(),
            tag,
            color: "#000000".to_string(),
        }
    }

    fn default_like_classifier() -> Classifier {
        Classifier::new(
            vec![
                rule("mismatch", Tag::Mismatch),
                rule("match", Tag::Match),
                rule("Configuration file:", Tag::Config),
                rule("CCP: EPK", Tag::Match),
            ],
            true,
        )
    }

    #[test]
    fn test_first_match_wins_mismatch_shadows_match() {
        let c = default_like_classifier();
        // "mismatch" contains "match"; rule order decides.
        assert_eq!(c.classify("Protocols: CCP mismatch"), Tag::Mismatch);
        assert_eq!(c.classify("Protocols: CCP match"), Tag::Match);
    }

    #[test]
    fn test_no_rule_is_plain() {
        let c = default_like_classifier();
        assert_eq!(c.classify("2025-11-12 09:00:00 boot sequence done"), Tag::Plain);
    }

    #[test]
    fn test_config_line() {
        let c = default_like_classifier();
        assert_eq!(
            c.classify("Configuration file: Miguel_BEV3_r12.icf"),
            Tag::Config
        );
    }

    #[test]
    fn test_case_sensitivity_is_configurable() {
        let sensitive = default_like_classifier();
        assert_eq!(sensitive.classify("PROTOCOLS: CCP MATCH"), Tag::Plain);

        let insensitive = Classifier::new(
            vec![rule("mismatch", Tag::Mismatch), rule("match", Tag::Match)],
            false,
        );
        assert_eq!(insensitive.classify("PROTOCOLS: CCP MATCH"), Tag::Match);
        assert_eq!(insensitive.classify("PROTOCOLS: CCP MISMATCH"), Tag::Mismatch);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = default_like_classifier();
        let line = "Protocols: XCP mismatch, CCP match";
        let first = c.classify(line);
        for _ in 0..10 {
            assert_eq!(c.classify(line), first);
        }
        assert_eq!(first, Tag::Mismatch);
    }

    #[test]
    fn test_matching_rule_is_the_rule_that_matched() {
        // Two rules with the same tag but different colours: the colour
        // must come from the rule whose pattern occurred in the line.
        let c = Classifier::new(
            vec![
                KeywordRule {
                    pattern: "alpha-token".to_string(),
                    tag: Tag::Match,
                    color: "#FF0000".to_string(),
                },
                KeywordRule {
                    pattern: "beta-token".to_string(),
                    tag: Tag::Match,
                    color: "#00FF00".to_string(),
                },
            ],
            true,
        );
        let rule = c.matching_rule("Protocols: beta-token agreed").unwrap();
        assert_eq!(rule.color, "#00FF00");
        assert_eq!(rule.tag, Tag::Match);
        assert!(c.matching_rule("nothing here").is_none());
    }
}
