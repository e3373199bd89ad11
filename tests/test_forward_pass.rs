// Tests for the LeNet-5 forward pass: output range, determinism, bias-only decisions
// and sharing one engine between threads.

use approx::assert_relative_eq;
use lenet5_inference::config::EngineConfig;
use lenet5_inference::grid::{IMAGE_LEN, INPUT_LEN};
use lenet5_inference::layers::{FullyConnectedParams, Kernel, Layer};
use lenet5_inference::lenet5::{C5_MAPS, CONV, F6_LEN, OUT_LEN};
use lenet5_inference::utils::SimpleRng;
use lenet5_inference::{Activations, Grid, LabeledInputGrid, Lenet5, ResourceKey, WeightStore};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn random_image(seed: u64) -> LabeledInputGrid {
    let mut rng = SimpleRng::new(seed);
    let pixels: Vec<u8> = (0..IMAGE_LEN * IMAGE_LEN)
        .map(|_| rng.gen_usize(256) as u8)
        .collect();
    LabeledInputGrid::from_pixels('5', &pixels).unwrap()
}

fn blank_image() -> LabeledInputGrid {
    LabeledInputGrid::new(Grid::new(INPUT_LEN), '0')
}

// Write every weight resource with zero weights and biases, except the OUTPUT biases.
fn write_zero_params(dir: &Path, output_biases: &[f32; OUT_LEN]) {
    let store = WeightStore::new(dir, SimpleRng::new(1));
    for key in Lenet5::resource_keys() {
        match key {
            ResourceKey::C1Kernel { .. }
            | ResourceKey::C3Kernel { .. }
            | ResourceKey::C5Kernel { .. } => store.save(&Kernel::new(CONV), &key).unwrap(),
            ResourceKey::F6Params { .. } => store
                .save(&FullyConnectedParams::new(C5_MAPS), &key)
                .unwrap(),
            ResourceKey::OutputParams { output } => store
                .save(
                    &FullyConnectedParams::from_parts(vec![0.0; F6_LEN], output_biases[output]),
                    &key,
                )
                .unwrap(),
        }
    }
}

fn engine_in(dir: &Path, seed: u64) -> Lenet5 {
    let config = EngineConfig::default().with_params_dir(dir).with_seed(seed);
    Lenet5::with_config(&config).expect("engine construction failed")
}

// ============================================================================
// Bias-only Tests
// ============================================================================

mod bias_only_tests {
    use super::*;

    #[test]
    fn test_zero_weights_predict_largest_output_bias() {
        let dir = tempdir().unwrap();
        let biases = [0.2, 1.0, -3.0, 0.5, 7.5, 0.0, 2.0, -1.0, 6.0, 0.1];
        write_zero_params(dir.path(), &biases);

        let lenet5 = engine_in(dir.path(), 1);
        assert_eq!(lenet5.run_inference(&blank_image()).unwrap(), 4);
    }

    #[test]
    fn test_zero_weights_ignore_image_content() {
        let dir = tempdir().unwrap();
        let biases = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0];
        write_zero_params(dir.path(), &biases);

        let lenet5 = engine_in(dir.path(), 1);
        assert_eq!(lenet5.run_inference(&random_image(3)).unwrap(), 8);

        let scores = lenet5.output_scores(&random_image(4)).unwrap();
        for (score, bias) in scores.iter().zip(biases.iter()) {
            assert_relative_eq!(*score, *bias);
        }
    }

    #[test]
    fn test_tied_output_biases_pick_later_index() {
        let dir = tempdir().unwrap();
        let biases = [0.5, 0.5, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        write_zero_params(dir.path(), &biases);

        let lenet5 = engine_in(dir.path(), 1);
        assert_eq!(lenet5.run_inference(&blank_image()).unwrap(), 1);
    }

    #[test]
    fn test_preexisting_weights_are_not_rewritten() {
        let dir = tempdir().unwrap();
        write_zero_params(dir.path(), &[0.0; OUT_LEN]);
        let before = fs::read_to_string(dir.path().join("kernel_c5_m7_3.txt")).unwrap();

        engine_in(dir.path(), 12345);

        let after = fs::read_to_string(dir.path().join("kernel_c5_m7_3.txt")).unwrap();
        assert_eq!(before, after);
    }
}

// ============================================================================
// Synthesized Weight Tests
// ============================================================================

mod synthesized_tests {
    use super::*;

    #[test]
    fn test_prediction_in_class_range() {
        let dir = tempdir().unwrap();
        let lenet5 = engine_in(dir.path(), 2024);

        for seed in 1..6 {
            let digit = lenet5.run_inference(&random_image(seed)).unwrap();
            assert!(digit < OUT_LEN, "prediction {} out of range", digit);
        }
        assert!(lenet5.run_inference(&blank_image()).unwrap() < OUT_LEN);
    }

    #[test]
    fn test_repeated_inference_is_deterministic() {
        let dir = tempdir().unwrap();
        let lenet5 = engine_in(dir.path(), 7);
        let image = random_image(11);

        let first = lenet5.output_scores(&image).unwrap();
        let second = lenet5.output_scores(&image).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            lenet5.run_inference(&image).unwrap(),
            lenet5.run_inference(&image).unwrap()
        );
    }

    #[test]
    fn test_second_engine_reads_first_engines_weights() {
        let dir = tempdir().unwrap();
        let first = engine_in(dir.path(), 7);
        let second = engine_in(dir.path(), 8);

        for seed in [21, 22] {
            let image = random_image(seed);
            let a = first.output_scores(&image).unwrap();
            let b = second.output_scores(&image).unwrap();
            let a_bits: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
            let b_bits: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
        }
        assert_eq!(first.c3().kernel(15, 5), second.c3().kernel(15, 5));
        assert_eq!(first.f6().neuron(83), second.f6().neuron(83));
    }

    #[test]
    fn test_every_resource_is_persisted() {
        let dir = tempdir().unwrap();
        engine_in(dir.path(), 99);

        for key in Lenet5::resource_keys() {
            assert!(
                dir.path().join(key.file_name()).is_file(),
                "missing {}",
                key
            );
        }
    }

    #[test]
    fn test_reused_scratch_matches_fresh_scratch() {
        let dir = tempdir().unwrap();
        let lenet5 = engine_in(dir.path(), 5);
        let mut activations = Activations::new();

        for seed in [31, 32, 33] {
            let image = random_image(seed);
            let reused = lenet5.run_inference_with(&image, &mut activations).unwrap();
            assert_eq!(reused, lenet5.run_inference(&image).unwrap());
            assert_eq!(
                activations.scores(),
                lenet5.output_scores(&image).unwrap().as_slice()
            );
        }
    }

    #[test]
    fn test_activation_shapes_after_forward() {
        let dir = tempdir().unwrap();
        let lenet5 = engine_in(dir.path(), 5);
        let mut activations = Activations::new();
        lenet5.forward(&random_image(1), &mut activations).unwrap();

        assert_eq!(activations.c1().len(), 6);
        assert!(activations.c1().iter().all(|m| m.length() == 28));
        assert!(activations.s2().iter().all(|m| m.length() == 14));
        assert_eq!(activations.c3().len(), 16);
        assert!(activations.c3().iter().all(|m| m.length() == 10));
        assert!(activations.s4().iter().all(|m| m.length() == 5));
        assert_eq!(activations.c5().len(), 120);
        assert_eq!(activations.f6().len(), 84);
        assert!(activations.f6().iter().all(|&v| v >= 0.0));
        assert_eq!(activations.scores().len(), 10);
        assert_eq!(lenet5.c5().output_length(), 1);
    }

    #[test]
    fn test_concurrent_inference_matches_sequential() {
        let dir = tempdir().unwrap();
        let lenet5 = engine_in(dir.path(), 13);
        let images: Vec<LabeledInputGrid> = (40..44).map(random_image).collect();
        let expected: Vec<usize> = images
            .iter()
            .map(|image| lenet5.run_inference(image).unwrap())
            .collect();

        let engine = &lenet5;
        let results: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = images
                .iter()
                .map(|image| scope.spawn(move || engine.run_inference(image).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results, expected);
    }
}
