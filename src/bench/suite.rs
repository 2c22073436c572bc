use thiserror::Error;
use tracing::{debug, warn};

use crate::bench::pairwise::PairwiseBenchmark;
use crate::config::{parse_orders, AliasMode, ConfigError, SuiteConfig};
use crate::core::pool::BufferPool;
use crate::core::tensor::{Order, Shape, TensorHandle};
use crate::engine::error::EngineError;

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Allocates the operands of one configuration from `pool`, honouring the
/// requested aliasing. Aliased roles are views over the first operand's
/// buffer with their own layout tag.
pub fn allocate_operands(
    pool: &mut BufferPool,
    shape: &Shape,
    orders: [Order; 3],
    mode: AliasMode,
) -> Result<(TensorHandle, TensorHandle, Option<TensorHandle>), EngineError> {
    let [ox, oy, oz] = orders;
    let x = pool.filled(shape.clone(), ox, 0)?;

    let operands = match mode {
        AliasMode::Distinct => {
            let y = pool.filled(shape.clone(), oy, 7)?;
            let z = pool.zeros(shape.clone(), oz)?;
            (x, y, Some(z))
        }
        AliasMode::Inplace => {
            let y = pool.filled(shape.clone(), oy, 7)?;
            let z = x.view(shape.clone(), oz)?;
            (x, y, Some(z))
        }
        AliasMode::InplaceSecond => {
            let y = pool.filled(shape.clone(), oy, 7)?;
            let z = y.view(shape.clone(), oz)?;
            (x, y, Some(z))
        }
        AliasMode::SharedOperands => {
            let y = x.view(shape.clone(), oy)?;
            let z = pool.zeros(shape.clone(), oz)?;
            (x, y, Some(z))
        }
        AliasMode::AllShared => {
            let y = x.view(shape.clone(), oy)?;
            let z = x.view(shape.clone(), oz)?;
            (x, y, Some(z))
        }
    };
    Ok(operands)
}

/// Fans the suite out into bound benchmarks. Every combination of operation,
/// shape, layout signature and aliasing mode gets a labelled prototype that is
/// completed with freshly allocated operands.
pub fn expand(
    suite: &SuiteConfig,
    pool: &mut BufferPool,
) -> Result<Vec<PairwiseBenchmark>, SuiteError> {
    let signatures = suite
        .orders
        .iter()
        .map(|s| parse_orders(s).map(|orders| (s.as_str(), orders)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut benches = Vec::new();
    for op in &suite.ops {
        for dims in &suite.shapes {
            let shape = Shape::new(dims.clone());
            for (signature, orders) in &signatures {
                for mode in &suite.aliasing {
                    if *mode == AliasMode::AllShared && orders.iter().any(|o| *o != orders[0]) {
                        warn!(
                            op = %op,
                            signature = %signature,
                            "all-shared with mixed layouts reads through transposed views of one buffer"
                        );
                    }
                    let name = format!("{} {} {} {}", op, shape, signature, mode.label());
                    let prototype = PairwiseBenchmark::prototype(*op, name);
                    let (x, y, z) = allocate_operands(pool, &shape, *orders, *mode)?;
                    benches.push(prototype.with_operands(x, y, z)?);
                }
            }
        }
    }

    debug!(count = benches.len(), "expanded benchmark suite");
    Ok(benches)
}
