// src/core/pool.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::core::tensor::{BufferId, Order, Shape, TensorBuffer, TensorHandle};
use crate::engine::error::EngineError;

/// Registro compartido de buffers liberados, en orden de liberación.
#[derive(Debug, Clone, Default)]
pub struct ReleaseLog {
    released: Arc<Mutex<Vec<BufferId>>>,
}

impl ReleaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, id: BufferId) {
        // Drop must not panic: a poisoned log still accepts entries.
        let mut released = match self.released.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        released.push(id);
    }

    /// Buffers liberados hasta ahora
    pub fn released(&self) -> Vec<BufferId> {
        match self.released.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Cuántas veces se liberó cada buffer
    pub fn release_counts(&self) -> HashMap<BufferId, usize> {
        let mut counts = HashMap::new();
        for id in self.released() {
            *counts.entry(id).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_released(&self, id: BufferId) -> bool {
        self.released().contains(&id)
    }
}

/// Asignador de buffers: cada buffer que entrega registra su liberación.
#[derive(Debug, Default)]
pub struct BufferPool {
    next_id: u64,
    log: ReleaseLog,
}

impl BufferPool {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            log: ReleaseLog::new(),
        }
    }

    /// Genera un nuevo ID interno
    fn gen_id_internal(&mut self) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Inserta un buffer a partir de shape + data y devuelve un handle sobre él
    pub fn allocate(
        &mut self,
        shape: Shape,
        order: Order,
        data: Vec<f32>,
    ) -> Result<TensorHandle, EngineError> {
        let expected = shape.try_num_elements()?;
        if data.len() != expected {
            return Err(EngineError::InvalidTensor(format!(
                "data length {} does not match shape {} (expected {})",
                data.len(),
                shape,
                expected
            )));
        }
        let id = self.gen_id_internal();
        let buffer = Arc::new(TensorBuffer::tracked(id, data, self.log.clone()));
        TensorHandle::new(buffer, shape, order)
    }

    pub fn zeros(&mut self, shape: Shape, order: Order) -> Result<TensorHandle, EngineError> {
        let len = shape.try_num_elements()?;
        self.allocate(shape, order, vec![0.0; len])
    }

    /// Deterministic fill `(i + offset) % 100 + 1`, never zero so divisions stay finite.
    pub fn filled(
        &mut self,
        shape: Shape,
        order: Order,
        offset: usize,
    ) -> Result<TensorHandle, EngineError> {
        let len = shape.try_num_elements()?;
        let data = (0..len).map(|i| ((i + offset) % 100 + 1) as f32).collect();
        self.allocate(shape, order, data)
    }

    pub fn allocated(&self) -> usize {
        self.next_id as usize
    }

    /// Buffers entregados que aún no se han liberado
    pub fn live(&self) -> usize {
        self.allocated() - self.log.released().len()
    }

    pub fn release_log(&self) -> &ReleaseLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_assigns_sequential_ids() {
        let mut pool = BufferPool::new();
        let a = pool.zeros(Shape::new(vec![2]), Order::C).unwrap();
        let b = pool.zeros(Shape::new(vec![2]), Order::C).unwrap();
        assert_eq!(a.buffer_id(), BufferId(0));
        assert_eq!(b.buffer_id(), BufferId(1));
        assert_eq!(pool.allocated(), 2);
        assert_eq!(pool.live(), 2);
    }

    #[test]
    fn test_allocate_rejects_length_mismatch() {
        let mut pool = BufferPool::new();
        let err = pool
            .allocate(Shape::new(vec![3]), Order::C, vec![1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTensor(_)));
        assert_eq!(pool.allocated(), 0);
    }

    #[test]
    fn test_overflowing_shape_allocates_nothing() {
        let mut pool = BufferPool::new();
        let shape = Shape::new(vec![usize::MAX, 2]);

        let err = pool.zeros(shape.clone(), Order::C).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTensor(_)));
        let err = pool.filled(shape.clone(), Order::F, 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTensor(_)));
        let err = pool.allocate(shape, Order::C, vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTensor(_)));
        assert_eq!(pool.allocated(), 0);
    }

    #[test]
    fn test_drop_records_release_once() {
        let mut pool = BufferPool::new();
        let a = pool.zeros(Shape::new(vec![4]), Order::C).unwrap();
        let id = a.buffer_id();
        let a2 = a.clone();

        drop(a);
        assert!(!pool.release_log().is_released(id));

        drop(a2);
        assert_eq!(pool.release_log().release_counts().get(&id), Some(&1));
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn test_filled_never_zero() {
        let mut pool = BufferPool::new();
        let t = pool.filled(Shape::new(vec![250]), Order::C, 3).unwrap();
        let data = t.read().unwrap();
        assert!(data.iter().all(|v| *v >= 1.0 && *v <= 100.0));
        assert_eq!(data[0], 4.0);
    }
}
