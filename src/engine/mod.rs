pub mod error;
pub mod kernels;
pub mod operations;

pub use error::EngineError;
pub use kernels::exec_pairwise_transform;
pub use operations::PairwiseOp;
