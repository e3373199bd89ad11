//! Max pooling over non-overlapping square windows
//!
//! No activation is applied; pooling only downsamples.

use crate::grid::FeatureMap;
use crate::layers::Layer;
use rayon::prelude::*;

/// Maximum of the `size × size` window of `input` starting at (`row`, `col`).
///
/// Ties keep the first maximum seen in row-major order.
pub fn max_pool(input: &FeatureMap, row: usize, col: usize, size: usize) -> f32 {
    let mut max = input.cell(row, col);
    for i in 0..size {
        for j in 0..size {
            let value = input.cell(row + i, col + j);
            if value > max {
                max = value;
            }
        }
    }
    max
}

/// Max pooling with window and stride both equal to `window`.
#[derive(Debug, Clone)]
pub struct MaxPoolLayer {
    maps: usize,
    window: usize,
    output_length: usize,
}

impl MaxPoolLayer {
    pub fn new(maps: usize, window: usize, output_length: usize) -> Self {
        Self {
            maps,
            window,
            output_length,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Layer for MaxPoolLayer {
    fn forward(&self, input: &[FeatureMap], output: &mut [FeatureMap]) {
        assert_eq!(input.len(), self.maps, "input map count mismatch");
        assert_eq!(output.len(), self.maps, "output map count mismatch");

        output
            .par_iter_mut()
            .zip(input.par_iter())
            .for_each(|(out, map)| {
                if out.length() != self.output_length {
                    out.init(self.output_length);
                }
                for i in 0..self.output_length {
                    for j in 0..self.output_length {
                        let value = max_pool(map, i * self.window, j * self.window, self.window);
                        out.set_cell(value, i, j);
                    }
                }
            });
    }

    fn input_maps(&self) -> usize {
        self.maps
    }

    fn output_maps(&self) -> usize {
        self.maps
    }

    fn output_length(&self) -> usize {
        self.output_length
    }

    fn parameter_count(&self) -> usize {
        0
    }
}
