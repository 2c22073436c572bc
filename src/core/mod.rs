pub mod aliasing;
pub mod pool;
pub mod tensor;

// Re-export commonly used types
pub use aliasing::Aliasing;
pub use pool::{BufferPool, ReleaseLog};
pub use tensor::{BufferId, Order, Shape, TensorBuffer, TensorHandle};
