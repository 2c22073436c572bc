// src/engine/kernels.rs

use crate::core::aliasing::Aliasing;
use crate::core::tensor::TensorHandle;
use crate::engine::error::EngineError;
use crate::engine::operations::PairwiseOp;

/// Verifica que los tres roles tengan el mismo shape
fn ensure_same_shape(x: &TensorHandle, y: &TensorHandle, z: &TensorHandle) -> Result<(), EngineError> {
    if x.shape() != y.shape() || x.shape() != z.shape() {
        Err(EngineError::ShapeMismatch(format!(
            "{} vs {} -> {}",
            x.shape(),
            y.shape(),
            z.shape()
        )))
    } else {
        Ok(())
    }
}

/// Pairwise transform entry point: `z[i] = op(x[i], y[i])`.
///
/// `z = None` writes the result in place into `x`. Roles may alias each other;
/// every distinct buffer is locked exactly once. Synchronous: returns after the
/// result buffer is fully written.
pub fn exec_pairwise_transform(
    op: PairwiseOp,
    x: &TensorHandle,
    y: &TensorHandle,
    z: Option<&TensorHandle>,
) -> Result<(), EngineError> {
    let z = z.unwrap_or(x);
    ensure_same_shape(x, y, z)?;

    if x.order() == y.order() && x.order() == z.order() {
        exec_linear(op, Aliasing::classify(x, y, z), x, y, z)
    } else {
        exec_strided(op, x, y, z)
    }
}

/// Todos los roles comparten layout: se recorre la memoria en orden físico.
fn exec_linear(
    op: PairwiseOp,
    aliasing: Aliasing,
    x: &TensorHandle,
    y: &TensorHandle,
    z: &TensorHandle,
) -> Result<(), EngineError> {
    match aliasing {
        Aliasing::Distinct => {
            let xs = x.buffer().lock()?;
            let ys = y.buffer().lock()?;
            let mut zs = z.buffer().lock()?;
            for ((out, a), b) in zs.iter_mut().zip(xs.iter()).zip(ys.iter()) {
                *out = op.apply(*a, *b);
            }
        }
        Aliasing::AllShared => {
            let mut data = x.buffer().lock()?;
            for v in data.iter_mut() {
                *v = op.apply(*v, *v);
            }
        }
        Aliasing::FirstIsResult => {
            let ys = y.buffer().lock()?;
            let mut zs = z.buffer().lock()?;
            for (out, b) in zs.iter_mut().zip(ys.iter()) {
                *out = op.apply(*out, *b);
            }
        }
        Aliasing::SecondIsResult => {
            let xs = x.buffer().lock()?;
            let mut zs = z.buffer().lock()?;
            for (out, a) in zs.iter_mut().zip(xs.iter()) {
                *out = op.apply(*a, *out);
            }
        }
        Aliasing::SharedOperands => {
            let xs = x.buffer().lock()?;
            let mut zs = z.buffer().lock()?;
            for (out, a) in zs.iter_mut().zip(xs.iter()) {
                *out = op.apply(*a, *a);
            }
        }
    }
    Ok(())
}

/// Layouts mezclados: se combinan por índice lógico.
///
/// Operands are gathered before the result is locked, so an aliased result
/// never overwrites an element that is still to be read.
fn exec_strided(
    op: PairwiseOp,
    x: &TensorHandle,
    y: &TensorHandle,
    z: &TensorHandle,
) -> Result<(), EngineError> {
    let xs = x.read()?;
    let ys = if y.same_buffer(x) && y.order() == x.order() {
        xs.clone()
    } else {
        y.read()?
    };

    let shape = z.shape();
    let order = z.order();
    let mut zs = z.buffer().lock()?;
    for (i, (a, b)) in xs.iter().zip(ys.iter()).enumerate() {
        zs[shape.offset_of(i, order)] = op.apply(*a, *b);
    }
    Ok(())
}

/// Evaluates `op` into a fresh row-major vector without touching any buffer.
pub fn reference_pairwise(
    op: PairwiseOp,
    x: &TensorHandle,
    y: &TensorHandle,
) -> Result<Vec<f32>, EngineError> {
    if x.shape() != y.shape() {
        return Err(EngineError::ShapeMismatch(format!(
            "{} vs {}",
            x.shape(),
            y.shape()
        )));
    }
    let xs = x.read()?;
    let ys = y.read()?;
    Ok(xs.iter().zip(ys.iter()).map(|(a, b)| op.apply(*a, *b)).collect())
}
