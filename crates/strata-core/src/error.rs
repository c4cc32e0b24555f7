//! Error types for world generation

use thiserror::Error;

/// Fatal configuration errors, raised when a world or generator is built
#[derive(Debug, Error)]
pub enum WorldGenError {
    #[error("invalid world config: {0}")]
    InvalidWorldConfig(String),

    #[error("invalid generation params: {0}")]
    InvalidParams(String),

    #[error("failed to parse generation params: {0}")]
    ParamsParse(#[from] ron::error::SpannedError),

    #[error("failed to serialize generation params: {0}")]
    ParamsSerialize(#[from] ron::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single generation stage
///
/// Recorded in the chunk metadata; the remaining stages still run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("block id {0} is not registered")]
    MissingBlock(u16),

    #[error("no block named {0:?}")]
    UnknownBlockName(String),

    #[error("chunk grid mismatch: expected {expected} cells, found {actual}")]
    GridMismatch { expected: usize, actual: usize },
}
