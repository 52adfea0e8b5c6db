use crate::rules::{CategoryPattern, RuleTable};

/// Decides from a file name whether a record holds non-verbal audio
/// (screams, grunts) and is therefore eligible for hallucination clearing.
#[derive(Debug, Clone)]
pub struct CategoryGate {
    categories: Vec<CategoryPattern>,
}

impl CategoryGate {
    pub fn new(rules: &RuleTable) -> Self {
        Self {
            categories: rules.categories().to_vec(),
        }
    }

    pub fn is_non_verbal(&self, filename: &str) -> bool {
        self.categories
            .iter()
            .any(|category| category.pattern.is_match(filename))
    }
}
