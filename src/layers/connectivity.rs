//! Sparse input-map connectivity for convolution layers
//!
//! A [`ConnectionTable`] lists, for each output map, the ordered input maps it reads.
//! Slot `k` of output map `n` pairs input map `inputs(n)[k]` with kernel `k` of that map.

/// Output-map index to ordered list of input-map indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTable {
    input_maps: usize,
    inputs: Vec<Vec<usize>>,
}

impl ConnectionTable {
    /// Every output map reads the single input map 0.
    pub fn single_source(output_maps: usize) -> Self {
        Self {
            input_maps: 1,
            inputs: vec![vec![0]; output_maps],
        }
    }

    /// Every output map reads every input map in order.
    pub fn full(output_maps: usize, input_maps: usize) -> Self {
        Self {
            input_maps,
            inputs: vec![(0..input_maps).collect::<Vec<usize>>(); output_maps],
        }
    }

    /// Build a table from groups of `(base pattern, count)`.
    ///
    /// Within a group, output map `g` (0-based inside the group) reads the base pattern
    /// with every index shifted by `g`, wrapping modulo `input_maps`. Groups are laid out
    /// one after another.
    pub fn rotating(input_maps: usize, groups: &[(&[usize], usize)]) -> Self {
        let mut inputs = Vec::new();
        for &(base, count) in groups {
            for shift in 0..count {
                inputs.push(base.iter().map(|&m| (m + shift) % input_maps).collect());
            }
        }
        Self { input_maps, inputs }
    }

    /// The C3 table of LeNet-5 over the six S2 maps.
    ///
    /// Maps 0-5 read contiguous triples, 6-11 contiguous quadruples, 12-14 the
    /// discontiguous quadruples starting from {0,1,3,4}, and map 15 reads all six.
    pub fn lenet5_c3() -> Self {
        const TRIPLE: &[usize] = &[0, 1, 2];
        const QUADRUPLE: &[usize] = &[0, 1, 2, 3];
        const SPLIT_QUADRUPLE: &[usize] = &[0, 1, 3, 4];
        const ALL: &[usize] = &[0, 1, 2, 3, 4, 5];

        Self::rotating(
            6,
            &[(TRIPLE, 6), (QUADRUPLE, 6), (SPLIT_QUADRUPLE, 3), (ALL, 1)],
        )
    }

    /// Ordered input maps feeding `output`.
    pub fn inputs(&self, output: usize) -> &[usize] {
        &self.inputs[output]
    }

    pub fn fan_in(&self, output: usize) -> usize {
        self.inputs[output].len()
    }

    pub fn input_maps(&self) -> usize {
        self.input_maps
    }

    pub fn output_maps(&self) -> usize {
        self.inputs.len()
    }

    /// Total number of (output, input) pairs, i.e. the number of kernels needed.
    pub fn connection_count(&self) -> usize {
        self.inputs.iter().map(Vec::len).sum()
    }
}
