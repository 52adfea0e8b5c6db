/// A single rewriting stage applied to the text of one transcript segment
pub trait TranscriptionNormalizer: Send + Sync {
    /// Normalize the segment text, returning the rewritten text
    fn normalize(&self, text: &str) -> String;

    /// Get the name of this normalizer for logging
    fn name(&self) -> &'static str;
}
