//! Shared utilities for the inference engine
//!
//! Seeded random number generation for weight synthesis, plus the activation and
//! decision functions used by the layers.

pub mod activations;
pub mod rng;

pub use activations::{argmax_last, relu, relu_inplace};
pub use rng::SimpleRng;
