//! LeNet-5 inference engine
//!
//! Fixed topology, all side lengths and map counts are constants:
//!
//! ```text
//! input 1x32x32 -> C1 conv 6x28x28 -> S2 pool 6x14x14 -> C3 sparse conv 16x10x10
//!   -> S4 pool 16x5x5 -> C5 conv 120x1x1 -> F6 dense 84 -> OUTPUT dense 10 -> argmax
//! ```
//!
//! Weights are loaded once through a [`WeightStore`] and never mutated afterwards.
//! Activations live in an [`Activations`] scratch owned by the caller (or created per
//! call), so one engine can serve concurrent inferences.

use crate::config::EngineConfig;
use crate::error::{EngineError, WeightError};
use crate::grid::{FeatureMap, LabeledInputGrid, INPUT_LEN};
use crate::layers::{ConnectionTable, ConvLayer, DenseLayer, Layer, MaxPoolLayer};
use crate::utils::{argmax_last, SimpleRng};
use crate::weights::{LoadOutcome, ResourceKey, WeightStore};
use tracing::info;

pub const C1_LEN: usize = 28;
pub const S2_LEN: usize = 14;
pub const C3_LEN: usize = 10;
pub const S4_LEN: usize = 5;
pub const C5_LEN: usize = 1;
pub const F6_LEN: usize = 84;
pub const OUT_LEN: usize = 10;

pub const C1_MAPS: usize = 6;
pub const C3_MAPS: usize = 16;
pub const C5_MAPS: usize = 120;

/// Side of every convolution kernel.
pub const CONV: usize = 5;
/// Side and stride of every pooling window.
pub const POOL: usize = 2;

/// Per-inference feature maps and dense outputs.
///
/// Every buffer is overwritten by each forward pass; nothing carries over between calls.
#[derive(Debug, Clone)]
pub struct Activations {
    input: Vec<FeatureMap>,
    c1: Vec<FeatureMap>,
    s2: Vec<FeatureMap>,
    c3: Vec<FeatureMap>,
    s4: Vec<FeatureMap>,
    c5: Vec<FeatureMap>,
    c5_flat: Vec<f32>,
    f6: Vec<f32>,
    output: Vec<f32>,
}

impl Activations {
    pub fn new() -> Self {
        Self {
            input: vec![FeatureMap::new(INPUT_LEN)],
            c1: vec![FeatureMap::new(C1_LEN); C1_MAPS],
            s2: vec![FeatureMap::new(S2_LEN); C1_MAPS],
            c3: vec![FeatureMap::new(C3_LEN); C3_MAPS],
            s4: vec![FeatureMap::new(S4_LEN); C3_MAPS],
            c5: vec![FeatureMap::new(C5_LEN); C5_MAPS],
            c5_flat: Vec::with_capacity(C5_MAPS * C5_LEN * C5_LEN),
            f6: vec![0.0; F6_LEN],
            output: vec![0.0; OUT_LEN],
        }
    }

    pub fn c1(&self) -> &[FeatureMap] {
        &self.c1
    }

    pub fn s2(&self) -> &[FeatureMap] {
        &self.s2
    }

    pub fn c3(&self) -> &[FeatureMap] {
        &self.c3
    }

    pub fn s4(&self) -> &[FeatureMap] {
        &self.s4
    }

    pub fn c5(&self) -> &[FeatureMap] {
        &self.c5
    }

    pub fn f6(&self) -> &[f32] {
        &self.f6
    }

    /// Raw OUTPUT layer scores of the last forward pass.
    pub fn scores(&self) -> &[f32] {
        &self.output
    }
}

impl Default for Activations {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct LoadReport {
    loaded: usize,
    synthesized: usize,
}

impl LoadReport {
    fn record(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded => self.loaded += 1,
            LoadOutcome::Synthesized => self.synthesized += 1,
        }
    }
}

/// The LeNet-5 network with all weights loaded.
#[derive(Debug, Clone)]
pub struct Lenet5 {
    c1: ConvLayer,
    s2: MaxPoolLayer,
    c3: ConvLayer,
    s4: MaxPoolLayer,
    c5: ConvLayer,
    f6: DenseLayer,
    output: DenseLayer,
}

impl Lenet5 {
    /// Build the engine from the default configuration: weights under `params/`,
    /// missing ones synthesized with a clock-derived seed.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let rng = SimpleRng::from_seed(config.seed);
        let mut store = WeightStore::new(&config.params_dir, rng);
        Self::from_store(&mut store)
    }

    /// Allocate every layer and populate it from `store`, in C1, C3, C5, F6, OUTPUT order.
    pub fn from_store(store: &mut WeightStore) -> Result<Self, EngineError> {
        let mut net = Self::unloaded();
        let mut report = LoadReport::default();

        load_conv(store, &mut net.c1, &mut report, |map, _| ResourceKey::C1Kernel {
            map,
        })?;
        load_conv(store, &mut net.c3, &mut report, |map, slot| {
            ResourceKey::C3Kernel { map, slot }
        })?;
        load_conv(store, &mut net.c5, &mut report, |map, slot| {
            ResourceKey::C5Kernel { map, slot }
        })?;
        for (output, neuron) in net.f6.neurons_mut() {
            report.record(store.load(neuron, &ResourceKey::F6Params { output })?);
        }
        for (output, neuron) in net.output.neurons_mut() {
            report.record(store.load(neuron, &ResourceKey::OutputParams { output })?);
        }

        info!(
            loaded = report.loaded,
            synthesized = report.synthesized,
            "weights ready from '{}'",
            store.dir().display()
        );
        Ok(net)
    }

    /// Every layer allocated with zero weights.
    fn unloaded() -> Self {
        Self {
            c1: ConvLayer::new(ConnectionTable::single_source(C1_MAPS), CONV, C1_LEN),
            s2: MaxPoolLayer::new(C1_MAPS, POOL, S2_LEN),
            c3: ConvLayer::new(ConnectionTable::lenet5_c3(), CONV, C3_LEN),
            s4: MaxPoolLayer::new(C3_MAPS, POOL, S4_LEN),
            c5: ConvLayer::new(ConnectionTable::full(C5_MAPS, C3_MAPS), CONV, C5_LEN),
            f6: DenseLayer::new(C5_MAPS * C5_LEN * C5_LEN, F6_LEN, true),
            output: DenseLayer::new(F6_LEN, OUT_LEN, false),
        }
    }

    /// Every weight resource of the network, in load order.
    pub fn resource_keys() -> Vec<ResourceKey> {
        let mut keys: Vec<ResourceKey> = (0..C1_MAPS)
            .map(|map| ResourceKey::C1Kernel { map })
            .collect();
        let c3 = ConnectionTable::lenet5_c3();
        for map in 0..C3_MAPS {
            keys.extend((0..c3.fan_in(map)).map(|slot| ResourceKey::C3Kernel { map, slot }));
        }
        for map in 0..C5_MAPS {
            keys.extend((0..C3_MAPS).map(|slot| ResourceKey::C5Kernel { map, slot }));
        }
        keys.extend((0..F6_LEN).map(|output| ResourceKey::F6Params { output }));
        keys.extend((0..OUT_LEN).map(|output| ResourceKey::OutputParams { output }));
        keys
    }

    /// Predict the class of `image`, in `[0, OUT_LEN)`.
    pub fn run_inference(&self, image: &LabeledInputGrid) -> Result<usize, EngineError> {
        let mut activations = Activations::new();
        self.run_inference_with(image, &mut activations)
    }

    /// Like [`run_inference`](Self::run_inference) but reuses caller-owned scratch.
    pub fn run_inference_with(
        &self,
        image: &LabeledInputGrid,
        activations: &mut Activations,
    ) -> Result<usize, EngineError> {
        self.forward(image, activations)?;
        Ok(argmax_last(activations.scores()))
    }

    /// Raw OUTPUT layer scores for `image`.
    pub fn output_scores(&self, image: &LabeledInputGrid) -> Result<Vec<f32>, EngineError> {
        let mut activations = Activations::new();
        self.forward(image, &mut activations)?;
        Ok(activations.output)
    }

    /// Run every stage in order, filling `activations`.
    pub fn forward(
        &self,
        image: &LabeledInputGrid,
        activations: &mut Activations,
    ) -> Result<(), EngineError> {
        let grid = image.grid();
        if grid.length() != INPUT_LEN {
            return Err(EngineError::InputSize {
                expected: INPUT_LEN,
                found: grid.length(),
            });
        }

        let acts = activations;
        acts.input[0] = grid.map(f32::from);
        self.c1.forward(&acts.input, &mut acts.c1);
        self.s2.forward(&acts.c1, &mut acts.s2);
        self.c3.forward(&acts.s2, &mut acts.c3);
        self.s4.forward(&acts.c3, &mut acts.s4);
        self.c5.forward(&acts.s4, &mut acts.c5);

        acts.c5_flat.clear();
        acts.c5_flat
            .extend(acts.c5.iter().flat_map(|map| map.cells().iter().copied()));
        self.f6.forward(&acts.c5_flat, &mut acts.f6);
        self.output.forward(&acts.f6, &mut acts.output);
        Ok(())
    }

    pub fn c1(&self) -> &ConvLayer {
        &self.c1
    }

    pub fn c3(&self) -> &ConvLayer {
        &self.c3
    }

    pub fn c5(&self) -> &ConvLayer {
        &self.c5
    }

    pub fn f6(&self) -> &DenseLayer {
        &self.f6
    }

    pub fn output_layer(&self) -> &DenseLayer {
        &self.output
    }

    /// Total number of weights and biases.
    pub fn parameter_count(&self) -> usize {
        self.c1.parameter_count()
            + self.c3.parameter_count()
            + self.c5.parameter_count()
            + self.f6.parameter_count()
            + self.output.parameter_count()
    }
}

fn load_conv(
    store: &mut WeightStore,
    layer: &mut ConvLayer,
    report: &mut LoadReport,
    key: impl Fn(usize, usize) -> ResourceKey,
) -> Result<(), WeightError> {
    for (map, slot, kernel) in layer.kernels_mut() {
        report.record(store.load(kernel, &key(map, slot))?);
    }
    Ok(())
}
