// lenet5_mnist.rs
// Run LeNet-5 inference over an MNIST-style CSV dataset on CPU.
// Expected files:
//   ./test_dataset.csv   (label,p0,...,p783 per row; override with the DATASET argument)
//   ./params/            (weight files; missing ones are synthesized and written here)
//
// Output:
//   - predicted digit and inference time per image
//   - accuracy over rows whose label is a decimal digit
//   - optional per-image log (index,label,prediction,seconds) with --log

use anyhow::{Context, Result};
use clap::Parser;
use lenet5_inference::config::{load_config, EngineConfig};
use lenet5_inference::dataset::{load_image, read_dataset};
use lenet5_inference::{Activations, LabeledInputGrid, Lenet5};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "lenet5_mnist", about = "LeNet-5 digit inference over a CSV dataset")]
struct Args {
    /// CSV dataset: one `label,p0,...,p783` row per image
    #[arg(default_value = "test_dataset.csv")]
    dataset: PathBuf,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<String>,

    /// Directory of weight files (overrides the config)
    #[arg(long)]
    params_dir: Option<PathBuf>,

    /// Seed for synthesizing missing weights (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Classify a single padded 32x32 comma-separated image instead of the dataset
    #[arg(long)]
    image: Option<PathBuf>,

    /// Print each image before classifying it
    #[arg(long)]
    print_images: bool,

    /// Write per-image results as CSV to this file
    #[arg(long)]
    log: Option<PathBuf>,
}

/// Outcome of classifying a batch of images one at a time.
#[derive(Debug, Default, PartialEq)]
struct RunSummary {
    images: usize,
    labeled: usize,
    correct: usize,
}

impl RunSummary {
    fn accuracy(&self) -> Option<f32> {
        if self.labeled == 0 {
            None
        } else {
            Some(100.0 * self.correct as f32 / self.labeled as f32)
        }
    }
}

fn engine_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .map_err(|err| anyhow::anyhow!("{}", err))
            .with_context(|| format!("loading config '{}'", path))?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &args.params_dir {
        config.params_dir = dir.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    Ok(config)
}

fn run_images(
    lenet5: &Lenet5,
    images: &[LabeledInputGrid],
    print_images: bool,
    mut log: Option<&mut dyn Write>,
) -> Result<RunSummary> {
    let mut activations = Activations::new();
    let mut summary = RunSummary::default();

    for (i, image) in images.iter().enumerate() {
        if print_images {
            println!("Image:\n{}\n", image.serialize());
        }

        let start = Instant::now();
        let digit = lenet5
            .run_inference_with(image, &mut activations)
            .with_context(|| format!("inference on image {}", i))?;
        let secs = start.elapsed().as_secs_f64();

        println!("Predicted Digit: {}", digit);
        println!("time_spent: {:.4} seconds\n", secs);

        summary.images += 1;
        if let Some(expected) = image.label().to_digit(10) {
            summary.labeled += 1;
            if expected as usize == digit {
                summary.correct += 1;
            }
        }
        if let Some(log) = log.as_mut() {
            writeln!(log, "{},{},{},{}", i, image.label().escape_default(), digit, secs)
                .context("writing inference log")?;
        }
    }

    Ok(summary)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lenet5_inference=info")),
        )
        .init();

    let args = Args::parse();
    let config = engine_config(&args)?;

    let images = match &args.image {
        Some(path) => vec![load_image(path).context("loading image")?],
        None => {
            println!("Loading dataset {}...", args.dataset.display());
            read_dataset(&args.dataset).context("loading dataset")?
        }
    };
    println!("Images: {}", images.len());

    let lenet5 = Lenet5::with_config(&config).context("loading LeNet-5 weights")?;
    println!("Parameters: {}", lenet5.parameter_count());

    let mut log_writer = match &args.log {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating '{}'", path.display()))?,
        )),
        None => None,
    };

    let summary = run_images(
        &lenet5,
        &images,
        args.print_images,
        log_writer.as_mut().map(|w| w as &mut dyn Write),
    )?;
    if let Some(mut writer) = log_writer {
        writer.flush().context("flushing inference log")?;
    }

    if let Some(acc) = summary.accuracy() {
        println!(
            "Accuracy: {:.2}% ({}/{})",
            acc, summary.correct, summary.labeled
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_without_labels() {
        let summary = RunSummary {
            images: 3,
            labeled: 0,
            correct: 0,
        };
        assert_eq!(summary.accuracy(), None);
    }

    #[test]
    fn test_accuracy_percent() {
        let summary = RunSummary {
            images: 4,
            labeled: 4,
            correct: 3,
        };
        assert_eq!(summary.accuracy(), Some(75.0));
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from(["lenet5_mnist", "data.csv", "--params-dir", "w", "--seed", "9"]);
        let config = engine_config(&args).unwrap();
        assert_eq!(config.params_dir, PathBuf::from("w"));
        assert_eq!(config.seed, Some(9));
        assert_eq!(args.dataset, PathBuf::from("data.csv"));
    }
}
