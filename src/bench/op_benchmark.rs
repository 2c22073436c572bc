use std::fmt;

use crate::engine::error::EngineError;

/// Axis reported by operations without an axis concept.
pub const NOT_APPLICABLE: &str = "N/A";

/// Placeholder for metadata of an instance without bound operands.
pub const UNBOUND: &str = "-";

/// A single operation invocation bound to concrete tensor operands.
///
/// Drivers call `execute_once` inside a timed loop and read the descriptive
/// metadata for reporting. Dropping an instance releases its share of the
/// buffers it holds; buffers shared with clones stay alive until the last
/// owner is dropped.
pub trait OpBenchmark: fmt::Debug + Send {
    /// Reporting label
    fn test_name(&self) -> &str;

    /// Runs the bound operation exactly once, synchronously.
    ///
    /// Repeatable: the instance itself is never modified.
    fn execute_once(&self) -> Result<(), EngineError>;

    /// Axis the operation reduces or broadcasts along.
    fn axis(&self) -> String {
        NOT_APPLICABLE.to_string()
    }

    /// Layout tags of first operand, second operand and result, joined by `/`.
    fn orders(&self) -> String;

    /// Shape of the first operand.
    fn shape(&self) -> String;

    /// Whether the result is written into an operand buffer.
    fn inplace(&self) -> bool;

    /// Numeric code of the bound operation.
    fn op_num(&self) -> Option<i32>;

    /// Elements written per `execute_once`.
    fn elements(&self) -> usize;

    /// New instance with the same operation and label, sharing the operands
    /// currently held.
    fn clone_op(&self) -> Box<dyn OpBenchmark>;
}

impl Clone for Box<dyn OpBenchmark> {
    fn clone(&self) -> Self {
        self.clone_op()
    }
}
