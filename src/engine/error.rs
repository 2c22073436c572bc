use thiserror::Error;

use crate::core::tensor::BufferId;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Benchmark '{0}' has no bound operands")]
    NotBound(String),

    #[error("Benchmark '{0}' has no bound operation")]
    NoOperation(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid tensor: {0}")]
    InvalidTensor(String),

    #[error("Unknown pairwise operation: {0}")]
    UnknownOp(String),

    #[error("Unknown memory order '{0}' (expected 'c' or 'f')")]
    UnknownOrder(char),

    #[error("Benchmark '{0}' produced no timing samples")]
    NoSamples(String),

    #[error("Buffer {0} is poisoned by a panicked writer")]
    Poisoned(BufferId),
}
