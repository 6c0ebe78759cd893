use thiserror::Error;

/// Reasons an index cannot be constructed. Query-time problems never surface
/// as errors; they degrade to empty or zero results instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Corpus has zero documents, so the average document length is undefined.
    #[error("corpus contains no documents")]
    EmptyCorpus,
    /// Corpus has documents but no tokens, so the average idf is undefined.
    #[error("corpus contains no tokens")]
    EmptyVocabulary,
    #[error("invalid bm25 parameters: {0}")]
    InvalidParams(&'static str),
    /// A deserialized index whose tables disagree with each other.
    #[error("inconsistent index: {0}")]
    Inconsistent(&'static str),
}
