//! 2D convolution with sparse input-map connectivity
//!
//! A [`ConvLayer`] holds one [`Kernel`] per (output map, input slot) pair described by a
//! [`ConnectionTable`]. Each output cell sums the window products of every connected
//! input map against its own kernel, including that kernel's bias, then applies ReLU.
//! Stride is 1 and there is no padding, so the output side is `input - kernel + 1`.

use crate::error::WeightFormatError;
use crate::grid::{FeatureMap, Grid};
use crate::layers::{ConnectionTable, Layer};
use crate::utils::{relu, SimpleRng};
use crate::weights::{
    format_row, parse_row, split_lines, synthesize_bias, synthesize_weight, WeightParams,
};
use rayon::prelude::*;

/// One square convolution filter: a grid of weights plus a bias.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Grid<f32>,
    bias: f32,
}

impl Kernel {
    /// Zero weights and bias.
    pub fn new(length: usize) -> Self {
        Self {
            weights: Grid::new(length),
            bias: 0.0,
        }
    }

    pub fn from_parts(weights: Grid<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }

    pub fn length(&self) -> usize {
        self.weights.length()
    }

    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> f32 {
        self.weights.cell(row, col)
    }

    pub fn set_weight(&mut self, value: f32, row: usize, col: usize) {
        self.weights.set_cell(value, row, col);
    }

    pub fn weights(&self) -> &Grid<f32> {
        &self.weights
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias;
    }
}

impl WeightParams for Kernel {
    fn serialize(&self) -> String {
        let rows = self
            .weights
            .rows()
            .map(format_row)
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n{}", rows, self.bias)
    }

    fn deserialize(&mut self, text: &str) -> Result<(), WeightFormatError> {
        let length = self.length();
        let lines = split_lines(text, length + 1)?;

        let mut weights = Grid::new(length);
        for (i, line) in lines[..length].iter().enumerate() {
            for (j, value) in parse_row(line, i + 1, length)?.into_iter().enumerate() {
                weights.set_cell(value, i, j);
            }
        }
        let bias = parse_row(lines[length], length + 1, 1)?[0];

        self.weights = weights;
        self.bias = bias;
        Ok(())
    }

    fn synthesize(&mut self, rng: &mut SimpleRng) {
        let length = self.length();
        for i in 0..length {
            for j in 0..length {
                self.weights.set_cell(synthesize_weight(rng), i, j);
            }
        }
        self.bias = synthesize_bias(rng);
    }
}

/// Window dot product of `kernel` against `input` anchored at (`row`, `col`), plus bias.
///
/// The window must fit inside `input`.
pub fn convolve(input: &FeatureMap, row: usize, col: usize, kernel: &Kernel) -> f32 {
    let length = kernel.length();
    let mut sum = 0.0f32;
    for i in 0..length {
        for j in 0..length {
            sum += input.cell(row + i, col + j) * kernel.weight(i, j);
        }
    }
    sum + kernel.bias()
}

/// Convolution layer over a connection table, stride 1, ReLU activation.
///
/// # Example
///
/// ```ignore
/// // C3: 6 S2 maps of side 14 -> 16 maps of side 10 with 5x5 kernels
/// let layer = ConvLayer::new(ConnectionTable::lenet5_c3(), 5, 10);
/// assert_eq!(layer.parameter_count(), 60 * (25 + 1));
/// ```
#[derive(Debug, Clone)]
pub struct ConvLayer {
    table: ConnectionTable,
    kernels: Vec<Vec<Kernel>>,
    kernel_length: usize,
    output_length: usize,
}

impl ConvLayer {
    /// Create a layer with zeroed kernels shaped by `table`.
    pub fn new(table: ConnectionTable, kernel_length: usize, output_length: usize) -> Self {
        let kernels = (0..table.output_maps())
            .map(|n| vec![Kernel::new(kernel_length); table.fan_in(n)])
            .collect();
        Self {
            table,
            kernels,
            kernel_length,
            output_length,
        }
    }

    pub fn table(&self) -> &ConnectionTable {
        &self.table
    }

    pub fn kernel_length(&self) -> usize {
        self.kernel_length
    }

    /// Kernel for input slot `slot` of output map `map`.
    pub fn kernel(&self, map: usize, slot: usize) -> &Kernel {
        &self.kernels[map][slot]
    }

    pub fn kernel_mut(&mut self, map: usize, slot: usize) -> &mut Kernel {
        &mut self.kernels[map][slot]
    }

    /// All kernels as `(map, slot, kernel)`, map-major.
    pub fn kernels_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut Kernel)> {
        self.kernels
            .iter_mut()
            .enumerate()
            .flat_map(|(n, slots)| {
                slots
                    .iter_mut()
                    .enumerate()
                    .map(move |(k, kernel)| (n, k, kernel))
            })
    }

    fn forward_map(&self, input: &[FeatureMap], map: usize, out: &mut FeatureMap) {
        let sources = self.table.inputs(map);
        let kernels = &self.kernels[map];

        for i in 0..self.output_length {
            for j in 0..self.output_length {
                let mut sum = 0.0f32;
                for (&source, kernel) in sources.iter().zip(kernels) {
                    sum += convolve(&input[source], i, j, kernel);
                }
                out.set_cell(relu(sum), i, j);
            }
        }
    }
}

impl Layer for ConvLayer {
    fn forward(&self, input: &[FeatureMap], output: &mut [FeatureMap]) {
        assert_eq!(input.len(), self.input_maps(), "input map count mismatch");
        assert_eq!(output.len(), self.output_maps(), "output map count mismatch");

        output.par_iter_mut().enumerate().for_each(|(n, out)| {
            if out.length() != self.output_length {
                out.init(self.output_length);
            }
            self.forward_map(input, n, out);
        });
    }

    fn input_maps(&self) -> usize {
        self.table.input_maps()
    }

    fn output_maps(&self) -> usize {
        self.table.output_maps()
    }

    fn output_length(&self) -> usize {
        self.output_length
    }

    fn parameter_count(&self) -> usize {
        self.table.connection_count() * (self.kernel_length * self.kernel_length + 1)
    }
}
