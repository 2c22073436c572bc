pub mod op_benchmark;
pub mod pairwise;
pub mod runner;
pub mod suite;

pub use op_benchmark::{OpBenchmark, NOT_APPLICABLE};
pub use pairwise::PairwiseBenchmark;
pub use runner::{BenchmarkReport, BenchmarkRunner, TimingStats};
pub use suite::{expand, SuiteError};
