//! Layer trait definition for feature-map layers
//!
//! Convolution and pooling stages both map a slice of input feature maps to a slice of
//! output feature maps, so they share this interface. Dense layers work on flat vectors
//! and expose their own `forward`.

use crate::grid::FeatureMap;

/// Core trait for layers that consume and produce feature maps.
///
/// Layers are immutable during inference: `forward` takes `&self` and writes only into
/// `output`, which lets a single network be shared between threads as long as each
/// caller brings its own output buffers.
///
/// # Example
///
/// ```ignore
/// let mut output = vec![FeatureMap::new(layer.output_length()); layer.output_maps()];
/// layer.forward(&input, &mut output);
/// ```
pub trait Layer: Sync {
    /// Forward propagation through the layer.
    ///
    /// Every cell of every output map is overwritten. Output maps whose side differs from
    /// [`output_length`](Layer::output_length) are reallocated first.
    ///
    /// # Panics
    ///
    /// Panics if `input.len() != self.input_maps()` or `output.len() != self.output_maps()`.
    fn forward(&self, input: &[FeatureMap], output: &mut [FeatureMap]);

    /// Number of input feature maps consumed.
    fn input_maps(&self) -> usize;

    /// Number of output feature maps produced.
    fn output_maps(&self) -> usize;

    /// Side length of each output feature map.
    fn output_length(&self) -> usize;

    /// Number of weights and biases held by the layer.
    fn parameter_count(&self) -> usize;
}
