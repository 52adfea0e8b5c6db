//! Rule table for transcript correction.
//!
//! The curated rules are data, not code: they live in `assets/rules.toml`,
//! which is embedded as the built-in table and can be replaced wholesale by a
//! user-supplied file of the same shape. Every pattern is compiled once here;
//! the corrector and classifier only borrow the compiled forms.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

mod audit;

pub use audit::AuditFinding;

const BUILTIN_RULES: &str = include_str!("../../assets/rules.toml");
const DEFAULT_MAX_TOKENS: usize = 5;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to read rule table {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rule table: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {section} pattern #{index} `{pattern}`: {source}")]
    InvalidPattern {
        section: &'static str,
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// On-disk shape of a rule table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTableSource {
    pub phrase: Vec<PhraseRuleSource>,
    pub name: Vec<NameRuleSource>,
    pub category: Vec<CategorySource>,
    pub hallucination: HallucinationSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseRuleSource {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRuleSource {
    pub alias: String,
    pub canonical: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySource {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HallucinationSource {
    pub allow: Vec<String>,
    pub block: Vec<String>,
    pub max_tokens: usize,
}

impl Default for HallucinationSource {
    fn default() -> Self {
        Self {
            allow: Vec::new(),
            block: Vec::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// A phrase substitution, applied to the cumulative output of earlier rules.
#[derive(Debug, Clone)]
pub struct PhraseRule {
    pub pattern: Regex,
    pub replacement: String,
}

impl PhraseRule {
    /// True when the replacement has no capture-group references.
    pub fn is_literal(&self) -> bool {
        !self.replacement.contains('$')
    }
}

/// A misheard token and the canonical spelling it is rewritten to.
#[derive(Debug, Clone)]
pub struct NameRule {
    pub alias: String,
    pub canonical: String,
    pub(crate) matcher: Regex,
}

#[derive(Debug, Clone)]
pub struct CategoryPattern {
    pub name: String,
    pub pattern: Regex,
}

/// Compiled allow/block lists for the hallucination classifier.
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    pub allow: Vec<Regex>,
    pub block: Vec<Regex>,
    pub max_tokens: usize,
}

/// Immutable, fully compiled rule table.
#[derive(Debug, Clone)]
pub struct RuleTable {
    phrases: Vec<PhraseRule>,
    names: Vec<NameRule>,
    categories: Vec<CategoryPattern>,
    classification: ClassificationRules,
}

impl RuleTable {
    /// The curated table shipped with the binary.
    pub fn builtin() -> Result<Self, RuleError> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    pub fn from_file(path: &Path) -> Result<Self, RuleError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuleError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_toml_str(&content)?;
        info!("Loaded rule table from {:?}", path);
        Ok(table)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RuleError> {
        let source: RuleTableSource = toml::from_str(content)?;
        Self::compile(source)
    }

    pub fn compile(source: RuleTableSource) -> Result<Self, RuleError> {
        let phrases = source
            .phrase
            .into_iter()
            .enumerate()
            .map(|(index, rule)| {
                Ok(PhraseRule {
                    pattern: compile("phrase", index, &rule.pattern)?,
                    replacement: rule.replacement,
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        let names = source
            .name
            .into_iter()
            .enumerate()
            .map(|(index, rule)| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(&rule.alias));
                Ok(NameRule {
                    matcher: compile("name", index, &pattern)?,
                    alias: rule.alias,
                    canonical: rule.canonical,
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        let categories = source
            .category
            .into_iter()
            .enumerate()
            .map(|(index, category)| {
                Ok(CategoryPattern {
                    pattern: compile("category", index, &category.pattern)?,
                    name: category.name,
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        let hallucination = source.hallucination;
        let allow = hallucination
            .allow
            .iter()
            .enumerate()
            .map(|(index, pattern)| compile("allow", index, &format!("(?i)^(?:{pattern})$")))
            .collect::<Result<Vec<_>, RuleError>>()?;
        let block = hallucination
            .block
            .iter()
            .enumerate()
            .map(|(index, pattern)| compile("block", index, &format!("(?i){pattern}")))
            .collect::<Result<Vec<_>, RuleError>>()?;

        let table = Self {
            phrases,
            names,
            categories,
            classification: ClassificationRules {
                allow,
                block,
                max_tokens: hallucination.max_tokens,
            },
        };

        debug!(
            "Compiled rule table: {} phrase, {} name, {} category, {} allow, {} block",
            table.phrases.len(),
            table.names.len(),
            table.categories.len(),
            table.classification.allow.len(),
            table.classification.block.len()
        );

        Ok(table)
    }

    pub fn phrases(&self) -> &[PhraseRule] {
        &self.phrases
    }

    pub fn names(&self) -> &[NameRule] {
        &self.names
    }

    pub fn categories(&self) -> &[CategoryPattern] {
        &self.categories
    }

    pub fn classification(&self) -> &ClassificationRules {
        &self.classification
    }

    /// Report rule outputs and alias/phrase compositions that a second
    /// correction pass would rewrite again.
    pub fn audit(&self) -> Vec<AuditFinding> {
        audit::run(self)
    }
}

fn compile(section: &'static str, index: usize, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        section,
        index,
        pattern: pattern.to_string(),
        source,
    })
}
