use tracing::debug;

use crate::normalizer::TranscriptionNormalizer;
use crate::rules::{ClassificationRules, RuleTable};

/// Decides whether text transcribed from a non-verbal clip is fabricated.
///
/// Checks run in a fixed order and the first hit wins: allow list (keep),
/// block list (clear), no alphabetic content (clear), too many tokens (clear).
/// Anything left over is kept.
#[derive(Debug, Clone)]
pub struct HallucinationClassifier {
    rules: ClassificationRules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Empty,
    Allowed,
    Blocked,
    NoWords,
    TooLong,
    Kept,
}

impl Verdict {
    pub fn is_hallucinated(self) -> bool {
        matches!(self, Verdict::Blocked | Verdict::NoWords | Verdict::TooLong)
    }
}

impl HallucinationClassifier {
    pub fn new(rules: &RuleTable) -> Self {
        Self {
            rules: rules.classification().clone(),
        }
    }

    pub fn classify(&self, text: &str) -> Verdict {
        let text = text.trim();

        if text.is_empty() {
            return Verdict::Empty;
        }

        if self.rules.allow.iter().any(|pattern| pattern.is_match(text)) {
            return Verdict::Allowed;
        }

        if let Some(pattern) = self.rules.block.iter().find(|p| p.is_match(text)) {
            debug!("Block pattern {} matched {:?}", pattern.as_str(), text);
            return Verdict::Blocked;
        }

        if text.chars().all(is_non_word_char) {
            return Verdict::NoWords;
        }

        if text.split_whitespace().count() > self.rules.max_tokens {
            return Verdict::TooLong;
        }

        Verdict::Kept
    }

    pub fn is_hallucinated(&self, text: &str) -> bool {
        self.classify(text).is_hallucinated()
    }
}

fn is_non_word_char(c: char) -> bool {
    c.is_whitespace()
        || c.is_numeric()
        || c.is_ascii_punctuation()
        || matches!(c, '•' | '…' | '–' | '—' | '·' | '¡' | '¿')
}

impl TranscriptionNormalizer for HallucinationClassifier {
    fn normalize(&self, text: &str) -> String {
        if self.is_hallucinated(text) {
            String::new()
        } else {
            text.to_string()
        }
    }

    fn name(&self) -> &'static str {
        "HallucinationClassifier"
    }
}
