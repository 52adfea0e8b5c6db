//! Idempotence audit over a rule table.
//!
//! Two kinds of text go through the corrector twice: the literal output of
//! every rule, and inputs built by putting a name alias where a phrase pattern
//! expects the canonical spelling. Anything the second pass still rewrites is
//! reported.

use serde::Serialize;

use super::RuleTable;
use crate::normalizer::TextCorrector;

/// Text that the corrector rewrites again after one full pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    pub source: String,
    pub input: String,
    pub output: String,
    pub rewritten: String,
}

pub(super) fn run(table: &RuleTable) -> Vec<AuditFinding> {
    let corrector = TextCorrector::new(table);
    let mut findings = Vec::new();

    for (source, output) in literal_outputs(table) {
        let rewritten = corrector.correct(&output);
        if rewritten != output {
            findings.push(AuditFinding {
                source,
                input: output.clone(),
                output,
                rewritten,
            });
        }
    }

    for (source, input) in alias_compositions(table) {
        let output = corrector.correct(&input);
        let rewritten = corrector.correct(&output);
        if rewritten != output {
            findings.push(AuditFinding {
                source,
                input,
                output,
                rewritten,
            });
        }
    }

    findings
}

fn literal_outputs(table: &RuleTable) -> Vec<(String, String)> {
    let phrases = table
        .phrases()
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.is_literal())
        .map(|(index, rule)| (format!("phrase #{index}"), rule.replacement.clone()));
    let names = table
        .names()
        .iter()
        .map(|rule| (format!("name `{}`", rule.alias), rule.canonical.clone()));

    phrases.chain(names).collect()
}

/// Texts where a name alias stands in for the canonical word a phrase pattern expects.
fn alias_compositions(table: &RuleTable) -> Vec<(String, String)> {
    let mut inputs = Vec::new();

    for (index, phrase) in table.phrases().iter().enumerate() {
        let Some(sample) = literal_sample(phrase.pattern.as_str()) else {
            continue;
        };
        for name in table.names().iter().filter(|name| !name.canonical.is_empty()) {
            for start in word_positions(&sample, &name.canonical) {
                let input = format!(
                    "{}{}{}",
                    &sample[..start],
                    name.alias,
                    &sample[start + name.canonical.len()..]
                );
                inputs.push((format!("name `{}` into phrase #{index}", name.alias), input));
            }
        }
    }

    inputs
}

/// The text a pattern matches when it is a plain phrase between optional `\b` anchors.
fn literal_sample(pattern: &str) -> Option<String> {
    let trimmed = pattern.strip_prefix(r"\b").unwrap_or(pattern);
    let trimmed = trimmed.strip_suffix(r"\b").unwrap_or(trimmed);
    let plain = !trimmed.is_empty() && !trimmed.chars().any(|c| r"\.+*?()[]{}|^$".contains(c));
    plain.then(|| trimmed.to_string())
}

fn word_positions<'a>(text: &'a str, word: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(word)
        .map(|(start, _)| start)
        .filter(move |&start| {
            let before = text[..start].chars().next_back();
            let after = text[start + word.len()..].chars().next();
            !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
        })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
