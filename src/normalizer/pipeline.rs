use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalizer::{
    CategoryGate, HallucinationClassifier, TextCorrector, TranscriptionNormalizer,
};
use crate::rules::RuleTable;

/// Which stages of the pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineMode {
    /// Correct every segment, then clear hallucinations in non-verbal records
    #[default]
    Full,
    /// Only run the text corrector
    CorrectOnly,
    /// Only clear hallucinations, and only in non-verbal records
    ScrubOnly,
}

impl PipelineMode {
    fn corrects(self) -> bool {
        matches!(self, PipelineMode::Full | PipelineMode::CorrectOnly)
    }

    fn scrubs(self) -> bool {
        matches!(self, PipelineMode::Full | PipelineMode::ScrubOnly)
    }
}

/// Per-segment text pipeline: corrector first, classifier second.
#[derive(Debug, Clone)]
pub struct SegmentPipeline {
    mode: PipelineMode,
    corrector: TextCorrector,
    classifier: HallucinationClassifier,
    gate: CategoryGate,
}

impl SegmentPipeline {
    pub fn new(rules: &RuleTable, mode: PipelineMode) -> Self {
        Self {
            mode,
            corrector: TextCorrector::new(rules),
            classifier: HallucinationClassifier::new(rules),
            gate: CategoryGate::new(rules),
        }
    }

    /// Whether a file name is eligible for hallucination clearing.
    pub fn is_eligible(&self, filename: &str) -> bool {
        self.mode.scrubs() && self.gate.is_non_verbal(filename)
    }

    /// Whether a file needs loading at all under this mode.
    pub fn wants(&self, filename: &str) -> bool {
        match self.mode {
            PipelineMode::ScrubOnly => self.gate.is_non_verbal(filename),
            PipelineMode::Full | PipelineMode::CorrectOnly => true,
        }
    }

    /// Run the enabled stages over one segment's text.
    pub fn run(&self, text: &str, eligible: bool) -> String {
        let mut stages: Vec<&dyn TranscriptionNormalizer> = Vec::with_capacity(2);
        if self.mode.corrects() {
            stages.push(&self.corrector);
        }
        if eligible && self.mode.scrubs() {
            stages.push(&self.classifier);
        }

        stages.into_iter().fold(text.to_string(), |current, stage| {
            let next = stage.normalize(&current);
            if next != current {
                debug!("{} rewrote {:?} -> {:?}", stage.name(), current, next);
            }
            next
        })
    }
}
