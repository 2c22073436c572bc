// src/config.rs

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::tensor::{Order, Shape};
use crate::engine::operations::PairwiseOp;

pub const DEFAULT_CONFIG_PATH: &str = "pairbench.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How the three roles share buffers in a generated benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AliasMode {
    /// x, y and z are separate buffers
    Distinct,
    /// z is x
    Inplace,
    /// z is y
    InplaceSecond,
    /// x and y are the same buffer, z separate
    SharedOperands,
    /// x, y and z are one buffer
    AllShared,
}

impl AliasMode {
    pub fn label(self) -> &'static str {
        match self {
            AliasMode::Distinct => "distinct",
            AliasMode::Inplace => "inplace",
            AliasMode::InplaceSecond => "inplace-second",
            AliasMode::SharedOperands => "shared-operands",
            AliasMode::AllShared => "all-shared",
        }
    }
}

/// Iteration counts for the timed loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub warmup_iterations: u32,
    pub iterations: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            warmup_iterations: 10,
            iterations: 100,
        }
    }
}

/// Cartesian product of benchmark configurations to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub ops: Vec<PairwiseOp>,
    pub shapes: Vec<Vec<usize>>,
    /// Layout signatures such as "c/f/c" (x/y/z)
    pub orders: Vec<String>,
    pub aliasing: Vec<AliasMode>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            ops: vec![PairwiseOp::Add, PairwiseOp::Multiply],
            shapes: vec![vec![4096], vec![64, 64]],
            orders: vec!["c/c/c".to_string()],
            aliasing: vec![AliasMode::Distinct, AliasMode::Inplace],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub run: RunConfig,
    pub suite: SuiteConfig,
}

/// Parses an `x/y/z` layout signature such as `"c/f/c"`.
pub fn parse_orders(signature: &str) -> Result<[Order; 3], ConfigError> {
    let parts: Vec<&str> = signature.split('/').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ConfigError::Invalid(format!(
            "order signature '{}' must have three parts like 'c/c/c'",
            signature
        )));
    }
    let mut orders = [Order::C; 3];
    for (slot, part) in orders.iter_mut().zip(parts) {
        let mut chars = part.chars();
        let tag = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "order tag '{}' in '{}' must be a single character",
                    part, signature
                )))
            }
        };
        *slot = Order::from_char(tag).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    }
    Ok(orders)
}

impl BenchConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BenchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.iterations == 0 {
            return Err(ConfigError::Invalid("run.iterations must be > 0".into()));
        }
        if self.suite.ops.is_empty() {
            return Err(ConfigError::Invalid("suite.ops must not be empty".into()));
        }
        if self.suite.shapes.is_empty() {
            return Err(ConfigError::Invalid("suite.shapes must not be empty".into()));
        }
        if self.suite.orders.is_empty() {
            return Err(ConfigError::Invalid("suite.orders must not be empty".into()));
        }
        if self.suite.aliasing.is_empty() {
            return Err(ConfigError::Invalid(
                "suite.aliasing must not be empty".into(),
            ));
        }
        for dims in &self.suite.shapes {
            if dims.is_empty() || dims.iter().any(|d| *d == 0) {
                return Err(ConfigError::Invalid(format!(
                    "shape {:?} must have at least one dimension and no zero dimensions",
                    dims
                )));
            }
            if Shape::new(dims.clone()).checked_num_elements().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "shape {:?} has more elements than fit in memory",
                    dims
                )));
            }
        }
        for signature in &self.suite.orders {
            parse_orders(signature)?;
        }
        Ok(())
    }
}
