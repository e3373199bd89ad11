//! LeNet-5 Inference Library
//!
//! Forward inference for a fixed seven-layer LeNet-5 digit classifier over padded 32×32
//! inputs. Weights are read from (or synthesized into) one text file per kernel and per
//! dense neuron, then reused across any number of inferences.
//!
//! # Modules
//!
//! - `grid`: square containers for feature maps, kernel weights and input images
//! - `layers`: Layer trait, convolution / pooling / dense layers, connectivity tables
//! - `weights`: WeightStore, the load-or-synthesize weight persistence
//! - `lenet5`: the inference engine
//! - `dataset`: CSV and text image readers
//! - `config`: engine configuration
//! - `utils`: shared utilities (RNG, activation functions)

pub mod config;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod layers;
pub mod lenet5;
pub mod utils;
pub mod weights;

pub use error::{DatasetError, EngineError, GridError, WeightError, WeightFormatError};
pub use grid::{FeatureMap, Grid, LabeledInputGrid};
pub use lenet5::{Activations, Lenet5};
pub use weights::{ResourceKey, WeightStore};
