//! Scoring interface for context-aware ranking.

/// A statistical model judging how well `word` fits next to `context`.
///
/// Implementations must be pure functions of their inputs; they are shared
/// between sessions and called concurrently.
pub trait Grammar: Send + Sync {
    /// Score `word` following `context`. With `is_rear` set, `context` is the
    /// candidate and `word` the text after the caret.
    ///
    /// Higher is better; 0.0 means "no opinion".
    fn query(&self, context: &str, word: &str, is_rear: bool) -> f64;
}
