//! Dense (fully connected) layer implementation
//!
//! Each output neuron owns its own [`FullyConnectedParams`]: a weight per input plus a
//! bias. The layer computes `output[n] = input · weights[n] + bias[n]`, optionally
//! followed by ReLU.

use crate::error::WeightFormatError;
use crate::utils::{relu_inplace, SimpleRng};
use crate::weights::{
    format_row, parse_row, split_lines, synthesize_bias, synthesize_weight, WeightParams,
};

/// Weights and bias of one dense output neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct FullyConnectedParams {
    weights: Vec<f32>,
    bias: f32,
}

impl FullyConnectedParams {
    /// Zero weights and bias for `length` inputs.
    pub fn new(length: usize) -> Self {
        Self {
            weights: vec![0.0; length],
            bias: 0.0,
        }
    }

    pub fn from_parts(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn set_weight(&mut self, value: f32, index: usize) {
        self.weights[index] = value;
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias;
    }

    /// Dot product with `input` plus bias, without activation.
    pub fn output(&self, input: &[f32]) -> f32 {
        debug_assert_eq!(input.len(), self.weights.len());
        let mut sum = 0.0f32;
        for (x, w) in input.iter().zip(&self.weights) {
            sum += x * w;
        }
        sum + self.bias
    }
}

impl WeightParams for FullyConnectedParams {
    fn serialize(&self) -> String {
        format!("{}\n{}", format_row(&self.weights), self.bias)
    }

    fn deserialize(&mut self, text: &str) -> Result<(), WeightFormatError> {
        let lines = split_lines(text, 2)?;
        let weights = parse_row(lines[0], 1, self.len())?;
        let bias = parse_row(lines[1], 2, 1)?[0];

        self.weights = weights;
        self.bias = bias;
        Ok(())
    }

    fn synthesize(&mut self, rng: &mut SimpleRng) {
        for w in &mut self.weights {
            *w = synthesize_weight(rng);
        }
        self.bias = synthesize_bias(rng);
    }
}

/// Dense layer: one [`FullyConnectedParams`] per output.
///
/// # Example
///
/// ```ignore
/// // F6: 120 inputs -> 84 outputs with ReLU
/// let layer = DenseLayer::new(120, 84, true);
/// assert_eq!(layer.parameter_count(), 84 * 121);
/// ```
#[derive(Debug, Clone)]
pub struct DenseLayer {
    input_size: usize,
    neurons: Vec<FullyConnectedParams>,
    relu: bool,
}

impl DenseLayer {
    /// Create a layer with zeroed parameters. `relu` selects ReLU activation.
    pub fn new(input_size: usize, output_size: usize, relu: bool) -> Self {
        Self {
            input_size,
            neurons: vec![FullyConnectedParams::new(input_size); output_size],
            relu,
        }
    }

    /// Compute every output. Input and output lengths must match the layer.
    ///
    /// # Panics
    ///
    /// Panics if `input` or `output` has the wrong length.
    pub fn forward(&self, input: &[f32], output: &mut [f32]) {
        assert_eq!(input.len(), self.input_size, "dense input length mismatch");
        assert_eq!(output.len(), self.neurons.len(), "dense output length mismatch");

        for (out, neuron) in output.iter_mut().zip(&self.neurons) {
            *out = neuron.output(input);
        }
        if self.relu {
            relu_inplace(output);
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.neurons.len()
    }

    pub fn neuron(&self, index: usize) -> &FullyConnectedParams {
        &self.neurons[index]
    }

    pub fn neuron_mut(&mut self, index: usize) -> &mut FullyConnectedParams {
        &mut self.neurons[index]
    }

    pub fn neurons_mut(&mut self) -> impl Iterator<Item = (usize, &mut FullyConnectedParams)> {
        self.neurons.iter_mut().enumerate()
    }

    /// Returns input_size × output_size (weights) + output_size (biases).
    pub fn parameter_count(&self) -> usize {
        self.neurons.len() * (self.input_size + 1)
    }
}
