// src/core/tensor.rs
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::core::pool::ReleaseLog;
use crate::engine::error::EngineError;

/// Identificador de buffer físico (newtype para no confundir con otros u64)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BufferId(pub u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Representa la forma (shape) de un tensor.
/// []        -> escalar (rank 0)
/// [3]       -> vector 3D (rank 1)
/// [2, 3]    -> matriz 2x3 (rank 2)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub dims: Vec<usize>,
}

impl Shape {
    /// Crea un nuevo shape a partir de una lista de dimensiones
    pub fn new<D: Into<Vec<usize>>>(dims: D) -> Self {
        Self { dims: dims.into() }
    }

    /// Número de dimensiones (rank)
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Número total de elementos, `None` si el producto desborda `usize`
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d))
    }

    /// Número total de elementos. Saturates at `usize::MAX`, which no
    /// buffer can hold, so an overflowing shape never matches a buffer.
    pub fn num_elements(&self) -> usize {
        self.checked_num_elements().unwrap_or(usize::MAX)
    }

    /// Like `checked_num_elements`, as an engine error.
    pub fn try_num_elements(&self) -> Result<usize, EngineError> {
        self.checked_num_elements().ok_or_else(|| {
            EngineError::InvalidTensor(format!("shape {} has too many elements", self))
        })
    }

    /// Strides en elementos para el layout indicado
    pub fn strides(&self, order: Order) -> Vec<usize> {
        let mut strides = vec![0; self.dims.len()];
        let mut acc: usize = 1;
        match order {
            Order::C => {
                for (i, d) in self.dims.iter().enumerate().rev() {
                    strides[i] = acc;
                    acc = acc.saturating_mul(*d);
                }
            }
            Order::F => {
                for (i, d) in self.dims.iter().enumerate() {
                    strides[i] = acc;
                    acc = acc.saturating_mul(*d);
                }
            }
        }
        strides
    }

    /// Offset físico del elemento `logical` (índice row-major) bajo `order`.
    pub fn offset_of(&self, logical: usize, order: Order) -> usize {
        if order == Order::C {
            return logical;
        }
        let strides = self.strides(order);
        let mut rem = logical;
        let mut offset = 0;
        for (i, d) in self.dims.iter().enumerate().rev() {
            offset += (rem % d) * strides[i];
            rem /= d;
        }
        offset
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.dims.iter().map(|d| d.to_string()).collect();
        write!(f, "[{}]", dims.join(", "))
    }
}

/// Layout en memoria lineal: row-major ('c') o column-major ('f')
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    C,
    F,
}

impl Order {
    pub fn as_char(self) -> char {
        match self {
            Order::C => 'c',
            Order::F => 'f',
        }
    }

    pub fn from_char(c: char) -> Result<Self, EngineError> {
        match c.to_ascii_lowercase() {
            'c' => Ok(Order::C),
            'f' => Ok(Order::F),
            other => Err(EngineError::UnknownOrder(other)),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Buffer físico de f32. Sólo se libera cuando cae el último `Arc`.
pub struct TensorBuffer {
    id: BufferId,
    len: usize,
    data: Mutex<Vec<f32>>,
    release_log: Option<ReleaseLog>,
}

impl TensorBuffer {
    pub fn new(id: BufferId, data: Vec<f32>) -> Self {
        Self {
            id,
            len: data.len(),
            data: Mutex::new(data),
            release_log: None,
        }
    }

    /// Buffer whose release is recorded in `log` when it is dropped.
    pub(crate) fn tracked(id: BufferId, data: Vec<f32>, log: ReleaseLog) -> Self {
        Self {
            id,
            len: data.len(),
            data: Mutex::new(data),
            release_log: Some(log),
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Los buffers nunca cambian de tamaño
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Vec<f32>>, EngineError> {
        self.data.lock().map_err(|_| EngineError::Poisoned(self.id))
    }
}

impl fmt::Debug for TensorBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorBuffer")
            .field("id", &self.id)
            .field("len", &self.len())
            .finish()
    }
}

impl Drop for TensorBuffer {
    fn drop(&mut self) {
        if let Some(log) = &self.release_log {
            log.record(self.id);
        }
    }
}

/// Vista (shape + layout) sobre un buffer compartido.
///
/// Clonar un handle no copia datos: ambos apuntan al mismo `TensorBuffer`.
#[derive(Debug, Clone)]
pub struct TensorHandle {
    buffer: Arc<TensorBuffer>,
    shape: Shape,
    order: Order,
}

impl TensorHandle {
    /// Crea un handle verificando que el buffer tenga shape.num_elements() elementos
    pub fn new(buffer: Arc<TensorBuffer>, shape: Shape, order: Order) -> Result<Self, EngineError> {
        let expected = shape.try_num_elements()?;
        let len = buffer.len();
        if len != expected {
            return Err(EngineError::InvalidTensor(format!(
                "buffer {} holds {} elements but shape {} needs {}",
                buffer.id(),
                len,
                shape,
                expected
            )));
        }
        Ok(Self {
            buffer,
            shape,
            order,
        })
    }

    /// Another view over the same physical buffer.
    pub fn view(&self, shape: Shape, order: Order) -> Result<Self, EngineError> {
        Self::new(Arc::clone(&self.buffer), shape, order)
    }

    pub fn buffer(&self) -> &Arc<TensorBuffer> {
        &self.buffer
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer.id()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn len(&self) -> usize {
        self.shape.num_elements()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when both handles refer to the identical physical buffer.
    pub fn same_buffer(&self, other: &TensorHandle) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// Number of live owners of the underlying buffer.
    pub fn owners(&self) -> usize {
        Arc::strong_count(&self.buffer)
    }

    /// Copia del contenido en orden lógico (row-major), independiente del layout.
    pub fn read(&self) -> Result<Vec<f32>, EngineError> {
        let data = self.buffer.lock()?;
        Ok(gather(&data, &self.shape, self.order))
    }

    /// Copia cruda del buffer físico
    pub fn raw(&self) -> Result<Vec<f32>, EngineError> {
        Ok(self.buffer.lock()?.clone())
    }
}

pub(crate) fn gather(data: &[f32], shape: &Shape, order: Order) -> Vec<f32> {
    match order {
        Order::C => data.to_vec(),
        Order::F => (0..shape.num_elements())
            .map(|i| data[shape.offset_of(i, order)])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_c_and_f() {
        let shape = Shape::new(vec![2, 3]);
        assert_eq!(shape.strides(Order::C), vec![3, 1]);
        assert_eq!(shape.strides(Order::F), vec![1, 2]);
    }

    #[test]
    fn test_offset_of_column_major() {
        let shape = Shape::new(vec![2, 3]);
        // (0,1) -> logical 1 -> f offset 2
        assert_eq!(shape.offset_of(1, Order::F), 2);
        // (1,0) -> logical 3 -> f offset 1
        assert_eq!(shape.offset_of(3, Order::F), 1);
        assert_eq!(shape.offset_of(5, Order::F), 5);
        assert_eq!(shape.offset_of(4, Order::C), 4);
    }

    #[test]
    fn test_order_from_char() {
        assert_eq!(Order::from_char('c').unwrap(), Order::C);
        assert_eq!(Order::from_char('F').unwrap(), Order::F);
        assert!(matches!(
            Order::from_char('x'),
            Err(EngineError::UnknownOrder('x'))
        ));
    }

    #[test]
    fn test_handle_rejects_wrong_length() {
        let buffer = Arc::new(TensorBuffer::new(BufferId(1), vec![1.0, 2.0, 3.0]));
        let err = TensorHandle::new(buffer, Shape::new(vec![2, 2]), Order::C).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTensor(_)));
    }

    #[test]
    fn test_overflowing_shape_is_rejected() {
        let shape = Shape::new(vec![usize::MAX, 2]);
        assert_eq!(shape.checked_num_elements(), None);
        assert!(matches!(
            shape.try_num_elements(),
            Err(EngineError::InvalidTensor(_))
        ));

        let buffer = Arc::new(TensorBuffer::new(BufferId(3), vec![0.0; 4]));
        let err = TensorHandle::new(buffer, shape, Order::C).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTensor(_)));
    }

    #[test]
    fn test_read_in_logical_order() {
        // 2x2 column-major: [[1, 2], [3, 4]] stored as [1, 3, 2, 4]
        let buffer = Arc::new(TensorBuffer::new(BufferId(7), vec![1.0, 3.0, 2.0, 4.0]));
        let handle = TensorHandle::new(buffer, Shape::new(vec![2, 2]), Order::F).unwrap();
        assert_eq!(handle.read().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(handle.raw().unwrap(), vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_view_shares_buffer() {
        let buffer = Arc::new(TensorBuffer::new(BufferId(2), vec![0.0; 6]));
        let a = TensorHandle::new(buffer, Shape::new(vec![2, 3]), Order::C).unwrap();
        let b = a.view(Shape::new(vec![3, 2]), Order::F).unwrap();
        assert!(a.same_buffer(&b));
        assert_eq!(a.owners(), 2);
        assert_eq!(b.order(), Order::F);
    }
}
