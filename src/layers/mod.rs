//! Layer abstractions for the LeNet-5 forward pass
//!
//! This module provides the Layer trait for feature-map stages (convolution, pooling),
//! the dense layer, and the parameter containers they own.

mod r#trait;
pub mod connectivity;
pub mod conv2d;
pub mod dense;
pub mod pooling;

// Re-export the Layer trait for convenience
pub use r#trait::Layer;
pub use connectivity::ConnectionTable;
pub use conv2d::{convolve, ConvLayer, Kernel};
pub use dense::{DenseLayer, FullyConnectedParams};
pub use pooling::{max_pool, MaxPoolLayer};
