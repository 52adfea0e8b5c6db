use regex::{NoExpand, Regex, Replacer};
use std::borrow::Cow;
use tracing::trace;

use crate::normalizer::TranscriptionNormalizer;
use crate::rules::{NameRule, PhraseRule, RuleTable};

/// Rewrites mis-transcribed phrases and proper nouns.
///
/// Phrase rules run first, in declaration order, each against the output of
/// the previous one. Name rules run afterwards as case-insensitive whole-word
/// substitutions, so an alias never fires inside a longer token.
#[derive(Debug, Clone)]
pub struct TextCorrector {
    phrases: Vec<PhraseRule>,
    names: Vec<NameRule>,
}

impl TextCorrector {
    pub fn new(rules: &RuleTable) -> Self {
        Self {
            phrases: rules.phrases().to_vec(),
            names: rules.names().to_vec(),
        }
    }

    pub fn correct(&self, text: &str) -> String {
        let mut current = Cow::Borrowed(text);

        for rule in &self.phrases {
            if substitute(&mut current, &rule.pattern, rule.replacement.as_str()) {
                trace!("Phrase rule {} matched", rule.pattern.as_str());
            }
        }

        for rule in &self.names {
            if substitute(&mut current, &rule.matcher, NoExpand(&rule.canonical)) {
                trace!("Name rule {} -> {} matched", rule.alias, rule.canonical);
            }
        }

        current.into_owned()
    }
}

/// Replace every match in place; returns whether anything matched.
fn substitute<R: Replacer>(text: &mut Cow<'_, str>, pattern: &Regex, replacement: R) -> bool {
    let replaced = match pattern.replace_all(&**text, replacement) {
        Cow::Owned(next) => next,
        Cow::Borrowed(_) => return false,
    };
    *text = Cow::Owned(replaced);
    true
}

impl TranscriptionNormalizer for TextCorrector {
    fn normalize(&self, text: &str) -> String {
        self.correct(text)
    }

    fn name(&self) -> &'static str {
        "TextCorrector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> TextCorrector {
        TextCorrector::new(&RuleTable::builtin().unwrap())
    }

    fn from_toml(source: &str) -> TextCorrector {
        TextCorrector::new(&RuleTable::from_toml_str(source).unwrap())
    }

    #[test]
    fn test_phrase_rule_rewrites_bought() {
        let corrector = builtin();
        assert_eq!(
            corrector.correct("Check out McGinnis' board"),
            "Check out what McGinnis bought"
        );
    }

    #[test]
    fn test_stun_phrase() {
        let corrector = builtin();
        assert_eq!(corrector.correct("Stone Viscous"), "Stun Viscous");
        assert_eq!(corrector.correct("Stan busy"), "Stun Billy");
    }

    #[test]
    fn test_compound_rule_handles_joined_tokens() {
        let corrector = builtin();
        assert_eq!(corrector.correct("Stoneyamato"), "Stun Yamato");
        assert_eq!(corrector.correct("Stanyamato!"), "Stun Yamato!");
    }

    #[test]
    fn test_alias_does_not_fire_inside_longer_token() {
        let corrector = builtin();
        assert_eq!(corrector.correct("Stonewall"), "Stonewall");
        assert_eq!(corrector.correct("Stoned again"), "Stoned again");
    }

    #[test]
    fn test_generic_alias_fires_on_whole_word() {
        let corrector = builtin();
        assert_eq!(corrector.correct("Stone Foo"), "Stun Foo");
    }

    #[test]
    fn test_name_rules_are_case_insensitive() {
        let corrector = builtin();
        assert_eq!(corrector.correct("careful, DORMIN!"), "careful, Doorman!");
        assert_eq!(corrector.correct("quill is low"), "Krill is low");
    }

    #[test]
    fn test_capture_group_replacement() {
        let corrector = builtin();
        assert_eq!(
            corrector.correct("Check out what Haze brought"),
            "Check out what Haze bought"
        );
    }

    #[test]
    fn test_every_match_is_replaced() {
        let corrector = builtin();
        assert_eq!(
            corrector.correct("He took out Dorman, She took out Hayes"),
            "They took out Doorman, They took out Haze"
        );
    }

    #[test]
    fn test_phrase_rules_chain_on_cumulative_output() {
        let corrector = from_toml(
            r#"
[[phrase]]
pattern = 'aaa'
replacement = 'bbb'

[[phrase]]
pattern = 'bb'
replacement = 'c'
"#,
        );
        assert_eq!(corrector.correct("aaa"), "cb");
    }

    #[test]
    fn test_names_run_after_phrases() {
        let corrector = from_toml(
            r#"
[[phrase]]
pattern = 'Stone wall'
replacement = 'Stone Wall'

[[name]]
alias = 'stone'
canonical = 'Stun'
"#,
        );
        assert_eq!(corrector.correct("Stone wall"), "Stun Wall");
    }

    #[test]
    fn test_unmatched_text_is_unchanged() {
        let corrector = builtin();
        let text = "Nothing to see here.";
        assert_eq!(corrector.correct(text), text);
        assert_eq!(corrector.correct(""), "");
    }

    #[test]
    fn test_canonical_is_inserted_literally() {
        let corrector = from_toml(
            r#"
[[name]]
alias = 'cash'
canonical = '$1 cash'
"#,
        );
        assert_eq!(corrector.correct("cash"), "$1 cash");
    }
}
