use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::bench::op_benchmark::OpBenchmark;
use crate::config::RunConfig;
use crate::engine::error::EngineError;

/// Summary of the nanosecond samples of one benchmark
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingStats {
    pub min_ns: u64,
    pub median_ns: u64,
    pub mean_ns: f64,
    pub max_ns: u64,
}

impl TimingStats {
    /// Returns `None` for an empty sample set.
    pub fn from_samples(mut samples: Vec<u64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_unstable();
        let len = samples.len();
        let sum: u128 = samples.iter().map(|&s| u128::from(s)).sum();
        let median_ns = if len % 2 == 0 {
            samples[len / 2 - 1] + (samples[len / 2] - samples[len / 2 - 1]) / 2
        } else {
            samples[len / 2]
        };
        Some(Self {
            min_ns: samples[0],
            median_ns,
            mean_ns: sum as f64 / len as f64,
            max_ns: samples[len - 1],
        })
    }
}

/// Nanoseconds of one sample, saturating at `u64::MAX`.
fn sample_ns(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
}

/// Resultado de un benchmark
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub name: String,
    pub op_num: Option<i32>,
    pub shape: String,
    pub orders: String,
    pub axis: String,
    pub inplace: bool,
    pub elements: usize,
    pub warmup_iterations: u32,
    pub iterations: u32,
    pub timing: TimingStats,
    /// Elements per second at the median sample
    pub throughput: f64,
    pub finished_at: DateTime<Utc>,
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<40} {:>12} {:>8} {:>8} {:>7} {:>12} {:>12} {:>14.3e}",
            self.name,
            self.shape,
            self.orders,
            self.axis,
            if self.inplace { "yes" } else { "no" },
            self.timing.median_ns,
            format!("{:.1}", self.timing.mean_ns),
            self.throughput
        )
    }
}

impl BenchmarkReport {
    pub fn header() -> String {
        format!(
            "{:<40} {:>12} {:>8} {:>8} {:>7} {:>12} {:>12} {:>14}",
            "name", "shape", "orders", "axis", "inplace", "median ns", "mean ns", "elems/s"
        )
    }
}

/// Drives the timed loop over any `OpBenchmark`.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkRunner {
    config: RunConfig,
}

impl BenchmarkRunner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Warmup, then `iterations` individually timed calls to `execute_once`.
    pub fn run(&self, bench: &dyn OpBenchmark) -> Result<BenchmarkReport, EngineError> {
        debug!(
            name = bench.test_name(),
            warmup = self.config.warmup_iterations,
            iterations = self.config.iterations,
            "starting benchmark"
        );

        for _ in 0..self.config.warmup_iterations {
            bench.execute_once()?;
        }

        let mut samples = Vec::with_capacity(self.config.iterations as usize);
        for _ in 0..self.config.iterations {
            let start = Instant::now();
            bench.execute_once()?;
            samples.push(sample_ns(start.elapsed()));
        }

        let timing = TimingStats::from_samples(samples)
            .ok_or_else(|| EngineError::NoSamples(bench.test_name().to_string()))?;

        let elements = bench.elements();
        let throughput = if timing.median_ns == 0 {
            0.0
        } else {
            elements as f64 * 1e9 / timing.median_ns as f64
        };

        let report = BenchmarkReport {
            name: bench.test_name().to_string(),
            op_num: bench.op_num(),
            shape: bench.shape(),
            orders: bench.orders(),
            axis: bench.axis(),
            inplace: bench.inplace(),
            elements,
            warmup_iterations: self.config.warmup_iterations,
            iterations: self.config.iterations,
            timing,
            throughput,
            finished_at: Utc::now(),
        };

        info!(
            name = %report.name,
            median_ns = report.timing.median_ns,
            throughput = report.throughput,
            "benchmark finished"
        );
        Ok(report)
    }

    /// Runs every benchmark in order, stopping at the first failure.
    pub fn run_all<'a, I>(&self, benches: I) -> Result<Vec<BenchmarkReport>, EngineError>
    where
        I: IntoIterator<Item = &'a dyn OpBenchmark>,
    {
        benches.into_iter().map(|b| self.run(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_odd_samples() {
        let stats = TimingStats::from_samples(vec![30, 10, 20]).unwrap();
        assert_eq!(stats.min_ns, 10);
        assert_eq!(stats.median_ns, 20);
        assert_eq!(stats.max_ns, 30);
        assert_eq!(stats.mean_ns, 20.0);
    }

    #[test]
    fn test_stats_even_samples() {
        let stats = TimingStats::from_samples(vec![4, 1, 3, 2]).unwrap();
        assert_eq!(stats.median_ns, 2);
        assert_eq!(stats.mean_ns, 2.5);
    }

    #[test]
    fn test_sample_ns_saturates() {
        assert_eq!(sample_ns(Duration::from_micros(3)), 3_000);
        assert_eq!(sample_ns(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_stats_empty() {
        assert!(TimingStats::from_samples(Vec::new()).is_none());
    }
}
