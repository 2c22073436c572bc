// src/lib.rs

pub mod bench;
pub mod config;
pub mod core;
pub mod engine;
pub mod logging;

// Re-exports para tener una API limpia desde fuera del crate
pub use bench::{
    BenchmarkReport, BenchmarkRunner, OpBenchmark, PairwiseBenchmark, SuiteError, TimingStats,
    NOT_APPLICABLE,
};
pub use config::{AliasMode, BenchConfig, ConfigError, RunConfig, SuiteConfig};
pub use crate::core::{Aliasing, BufferId, BufferPool, Order, ReleaseLog, Shape, TensorBuffer, TensorHandle};
pub use engine::{exec_pairwise_transform, EngineError, PairwiseOp};
