use serde::{Deserialize, Serialize};

use crate::core::tensor::{BufferId, TensorHandle};

/// How the three roles of a pairwise invocation share physical buffers.
///
/// Three labelled roles have exactly five equality partitions; every
/// consumer matches on all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Aliasing {
    /// x, y and z are pairwise distinct
    Distinct,
    /// x == y == z
    AllShared,
    /// x == z, y distinct (classic in-place)
    FirstIsResult,
    /// y == z, x distinct
    SecondIsResult,
    /// x == y, z distinct
    SharedOperands,
}

impl Aliasing {
    pub fn classify(x: &TensorHandle, y: &TensorHandle, z: &TensorHandle) -> Self {
        let xy = x.same_buffer(y);
        let xz = x.same_buffer(z);
        let yz = y.same_buffer(z);
        match (xy, xz, yz) {
            (false, false, false) => Aliasing::Distinct,
            (true, true, _) | (true, _, true) | (_, true, true) => Aliasing::AllShared,
            (false, true, false) => Aliasing::FirstIsResult,
            (false, false, true) => Aliasing::SecondIsResult,
            (true, false, false) => Aliasing::SharedOperands,
        }
    }

    /// Classify with an optional result role; an absent `z` writes into `x`.
    pub fn classify_optional(x: &TensorHandle, y: &TensorHandle, z: Option<&TensorHandle>) -> Self {
        Self::classify(x, y, z.unwrap_or(x))
    }

    /// Distinct physical buffers, each listed once, in role order.
    pub fn distinct_buffers(
        self,
        x: &TensorHandle,
        y: &TensorHandle,
        z: &TensorHandle,
    ) -> Vec<BufferId> {
        match self {
            Aliasing::Distinct => vec![x.buffer_id(), y.buffer_id(), z.buffer_id()],
            Aliasing::AllShared => vec![x.buffer_id()],
            Aliasing::FirstIsResult => vec![x.buffer_id(), y.buffer_id()],
            Aliasing::SecondIsResult => vec![x.buffer_id(), y.buffer_id()],
            Aliasing::SharedOperands => vec![x.buffer_id(), z.buffer_id()],
        }
    }

    /// True when the result buffer is also an operand buffer.
    pub fn is_inplace(self) -> bool {
        match self {
            Aliasing::Distinct | Aliasing::SharedOperands => false,
            Aliasing::AllShared | Aliasing::FirstIsResult | Aliasing::SecondIsResult => true,
        }
    }
}
