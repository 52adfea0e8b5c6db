mod category;
mod hallucination;
mod pipeline;
mod text_corrector;
mod transcription_normalizer;

pub use category::CategoryGate;
pub use hallucination::{HallucinationClassifier, Verdict};
pub use pipeline::{PipelineMode, SegmentPipeline};
pub use text_corrector::TextCorrector;
pub use transcription_normalizer::TranscriptionNormalizer;
