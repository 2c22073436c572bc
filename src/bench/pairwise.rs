use tracing::debug;

use crate::bench::op_benchmark::{OpBenchmark, UNBOUND};
use crate::core::aliasing::Aliasing;
use crate::core::tensor::{BufferId, TensorHandle};
use crate::engine::error::EngineError;
use crate::engine::kernels::exec_pairwise_transform;
use crate::engine::operations::PairwiseOp;

/// Los tres roles de una invocación pairwise
#[derive(Debug, Clone)]
struct Operands {
    x: TensorHandle,
    y: TensorHandle,
    z: Option<TensorHandle>,
}

impl Operands {
    fn bind(x: TensorHandle, y: TensorHandle, z: Option<TensorHandle>) -> Result<Self, EngineError> {
        let result = z.as_ref().unwrap_or(&x);
        if x.shape() != y.shape() || x.shape() != result.shape() {
            return Err(EngineError::ShapeMismatch(format!(
                "{} vs {} -> {}",
                x.shape(),
                y.shape(),
                result.shape()
            )));
        }
        Ok(Self { x, y, z })
    }

    /// Destino efectivo: `z`, o `x` si no hay `z`
    fn result(&self) -> &TensorHandle {
        self.z.as_ref().unwrap_or(&self.x)
    }

    fn aliasing(&self) -> Aliasing {
        Aliasing::classify(&self.x, &self.y, self.result())
    }
}

/// Benchmark of one binary elementwise operation over three tensor handles.
///
/// Handles are reference counted: `clone_op` and `with_operands` add owners of
/// the same buffers, and a buffer is released when its last owner drops.
#[derive(Debug, Clone, Default)]
pub struct PairwiseBenchmark {
    op: Option<PairwiseOp>,
    test_name: String,
    operands: Option<Operands>,
}

impl PairwiseBenchmark {
    /// Fully bound instance; `z = None` runs in place into `x`.
    pub fn new(
        op: PairwiseOp,
        test_name: impl Into<String>,
        x: TensorHandle,
        y: TensorHandle,
        z: Option<TensorHandle>,
    ) -> Result<Self, EngineError> {
        let operands = Operands::bind(x, y, z)?;
        let bench = Self {
            op: Some(op),
            test_name: test_name.into(),
            operands: Some(operands),
        };
        debug!(
            name = %bench.test_name,
            op = %op,
            orders = %bench.orders(),
            aliasing = ?bench.aliasing(),
            "bound pairwise benchmark"
        );
        Ok(bench)
    }

    /// Label-only template, completed later through `with_operands`.
    pub fn prototype(op: PairwiseOp, test_name: impl Into<String>) -> Self {
        Self {
            op: Some(op),
            test_name: test_name.into(),
            operands: None,
        }
    }

    /// Fresh bound instance carrying this template's operation and label.
    pub fn with_operands(
        &self,
        x: TensorHandle,
        y: TensorHandle,
        z: Option<TensorHandle>,
    ) -> Result<Self, EngineError> {
        let op = self
            .op
            .ok_or_else(|| EngineError::NoOperation(self.test_name.clone()))?;
        Self::new(op, self.test_name.clone(), x, y, z)
    }

    pub fn op(&self) -> Option<PairwiseOp> {
        self.op
    }

    pub fn is_bound(&self) -> bool {
        self.operands.is_some()
    }

    pub fn x(&self) -> Option<&TensorHandle> {
        self.operands.as_ref().map(|o| &o.x)
    }

    pub fn y(&self) -> Option<&TensorHandle> {
        self.operands.as_ref().map(|o| &o.y)
    }

    pub fn z(&self) -> Option<&TensorHandle> {
        self.operands.as_ref().and_then(|o| o.z.as_ref())
    }

    /// Handle the result is written into (`z`, or `x` when in place).
    pub fn result(&self) -> Option<&TensorHandle> {
        self.operands.as_ref().map(Operands::result)
    }

    pub fn aliasing(&self) -> Option<Aliasing> {
        self.operands.as_ref().map(Operands::aliasing)
    }

    /// Distinct physical buffers held by this instance, each listed once.
    pub fn owned_buffers(&self) -> Vec<BufferId> {
        match &self.operands {
            Some(o) => o.aliasing().distinct_buffers(&o.x, &o.y, o.result()),
            None => Vec::new(),
        }
    }
}

impl OpBenchmark for PairwiseBenchmark {
    fn test_name(&self) -> &str {
        &self.test_name
    }

    fn execute_once(&self) -> Result<(), EngineError> {
        let op = self
            .op
            .ok_or_else(|| EngineError::NoOperation(self.test_name.clone()))?;
        let o = self
            .operands
            .as_ref()
            .ok_or_else(|| EngineError::NotBound(self.test_name.clone()))?;
        exec_pairwise_transform(op, &o.x, &o.y, o.z.as_ref())
    }

    fn orders(&self) -> String {
        match &self.operands {
            Some(o) => format!(
                "{}/{}/{}",
                o.x.order(),
                o.y.order(),
                o.result().order()
            ),
            None => format!("{UNBOUND}/{UNBOUND}/{UNBOUND}"),
        }
    }

    fn shape(&self) -> String {
        match &self.operands {
            Some(o) => o.x.shape().to_string(),
            None => UNBOUND.to_string(),
        }
    }

    fn inplace(&self) -> bool {
        self.aliasing().map(Aliasing::is_inplace).unwrap_or(false)
    }

    fn op_num(&self) -> Option<i32> {
        self.op.map(PairwiseOp::op_num)
    }

    fn elements(&self) -> usize {
        self.result().map(TensorHandle::len).unwrap_or(0)
    }

    fn clone_op(&self) -> Box<dyn OpBenchmark> {
        Box::new(self.clone())
    }
}
