//! Error types for the full-text index layer

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    /// The literal node-key placeholder cannot be full-text indexed.
    #[error("full-text indexing the node key itself (\"{{key}}\") is not possible")]
    InvalidKey,

    /// A word pattern without a character class cannot take include characters.
    #[error("word pattern {0:?} has no character class to extend")]
    PatternShape(String),

    #[error("operator {0:?} is not supported by full-text indexes")]
    UnsupportedOperator(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("invalid word pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Failure propagated from the underlying posting store.
    #[error("posting store error: {0}")]
    Substrate(String),
}
