//! Weight persistence: load from disk or synthesize and persist
//!
//! Each kernel and each dense neuron lives in its own text file under a parameter
//! directory. Loading a missing file synthesizes pseudo-random weights from the store's
//! RNG and writes them back, so the next run reads the same values from disk.
//!
//! # Text format
//!
//! Kernel of side `N`: `N` lines of `N` space-separated floats, then one line holding the
//! bias. Dense neuron with `N` inputs: one line of `N` space-separated floats, then one
//! line holding the bias. No trailing newline after the bias.

use crate::error::{WeightError, WeightFormatError};
use crate::utils::SimpleRng;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parameters that can be written to and read from a weight resource.
pub trait WeightParams {
    /// Text form of the weights followed by the bias line.
    fn serialize(&self) -> String;

    /// Replace weights and bias from `text`.
    ///
    /// On error the parameters are left unchanged.
    fn deserialize(&mut self, text: &str) -> Result<(), WeightFormatError>;

    /// Fill weights and bias with fresh pseudo-random values.
    fn synthesize(&mut self, rng: &mut SimpleRng);
}

/// Identifies one weight resource of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// Kernel of C1 output map `map`.
    C1Kernel { map: usize },
    /// Kernel for input slot `slot` of C3 output map `map`.
    C3Kernel { map: usize, slot: usize },
    /// Kernel for input slot `slot` of C5 output map `map`.
    C5Kernel { map: usize, slot: usize },
    /// Neuron `output` of F6.
    F6Params { output: usize },
    /// Neuron `output` of the OUTPUT layer.
    OutputParams { output: usize },
}

impl ResourceKey {
    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ResourceKey::C1Kernel { map } => write!(f, "kernel_c1_m{}.txt", map),
            ResourceKey::C3Kernel { map, slot } => write!(f, "kernel_c3_m{}_{}.txt", map, slot),
            ResourceKey::C5Kernel { map, slot } => write!(f, "kernel_c5_m{}_{}.txt", map, slot),
            ResourceKey::F6Params { output } => write!(f, "fc_f6_out{}.txt", output),
            ResourceKey::OutputParams { output } => write!(f, "fc_last_out{}.txt", output),
        }
    }
}

/// Whether a resource was read from disk or freshly synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Synthesized,
}

impl LoadOutcome {
    /// `true` when the resource already existed.
    pub fn existed(self) -> bool {
        self == LoadOutcome::Loaded
    }
}

/// Loads weight resources from a directory, synthesizing missing ones.
#[derive(Debug)]
pub struct WeightStore {
    dir: PathBuf,
    rng: SimpleRng,
}

impl WeightStore {
    pub fn new(dir: impl Into<PathBuf>, rng: SimpleRng) -> Self {
        Self {
            dir: dir.into(),
            rng,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &ResourceKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Load `params` from the resource named by `key`.
    ///
    /// Only a missing resource is synthesized from the store's RNG and written back. A
    /// resource that exists but cannot be read or does not parse is an error, `params` is
    /// left untouched and nothing is written.
    pub fn load<P: WeightParams>(
        &mut self,
        params: &mut P,
        key: &ResourceKey,
    ) -> Result<LoadOutcome, WeightError> {
        let path = self.path_for(key);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("weight resource '{}' missing, synthesizing", path.display());
                params.synthesize(&mut self.rng);
                self.persist(params, &path)?;
                return Ok(LoadOutcome::Synthesized);
            }
            Err(source) => {
                warn!("cannot read weight resource '{}': {}", path.display(), source);
                return Err(WeightError::Read { path, source });
            }
        };

        let parsed = String::from_utf8(bytes)
            .map_err(|_| WeightFormatError::InvalidEncoding)
            .and_then(|text| params.deserialize(&text));
        parsed.map_err(|source| WeightError::Format { path, source })?;
        Ok(LoadOutcome::Loaded)
    }

    /// Write `params` to the resource named by `key`.
    pub fn save<P: WeightParams>(&self, params: &P, key: &ResourceKey) -> Result<(), WeightError> {
        self.persist(params, &self.path_for(key))
    }

    fn persist<P: WeightParams>(&self, params: &P, path: &Path) -> Result<(), WeightError> {
        let io_err = |source| WeightError::Io {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(path, params.serialize()).map_err(io_err)
    }
}

/// Synthesized weight: `0.02 * (d - 50)` for an integer draw `d` in [0, 100).
pub fn synthesize_weight(rng: &mut SimpleRng) -> f32 {
    0.02f32 * (rng.gen_usize(100) as i32 - 50) as f32
}

/// Synthesized bias: `0.01 * (d - 1000)` for an integer draw `d` in [0, 2000).
pub fn synthesize_bias(rng: &mut SimpleRng) -> f32 {
    0.01f32 * (rng.gen_usize(2000) as i32 - 1000) as f32
}

/// Join values with single spaces using shortest round-trip formatting.
pub(crate) fn format_row(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split `text` into exactly `expected` lines.
pub(crate) fn split_lines(text: &str, expected: usize) -> Result<Vec<&str>, WeightFormatError> {
    if text.trim().is_empty() {
        return Err(WeightFormatError::Empty);
    }
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() != expected {
        return Err(WeightFormatError::WrongRowCount {
            expected,
            found: lines.len(),
        });
    }
    Ok(lines)
}

/// Parse one line of exactly `expected` floats. `line` is the 1-based line number.
pub(crate) fn parse_row(
    text: &str,
    line: usize,
    expected: usize,
) -> Result<Vec<f32>, WeightFormatError> {
    let values = text
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f32>()
                .map_err(|_| WeightFormatError::InvalidNumber {
                    line,
                    token: token.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() != expected {
        return Err(WeightFormatError::WrongColumnCount {
            line,
            expected,
            found: values.len(),
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names() {
        assert_eq!(ResourceKey::C1Kernel { map: 3 }.file_name(), "kernel_c1_m3.txt");
        assert_eq!(
            ResourceKey::C3Kernel { map: 12, slot: 2 }.file_name(),
            "kernel_c3_m12_2.txt"
        );
        assert_eq!(
            ResourceKey::C5Kernel { map: 119, slot: 15 }.file_name(),
            "kernel_c5_m119_15.txt"
        );
        assert_eq!(ResourceKey::F6Params { output: 83 }.file_name(), "fc_f6_out83.txt");
        assert_eq!(
            ResourceKey::OutputParams { output: 9 }.file_name(),
            "fc_last_out9.txt"
        );
    }

    #[test]
    fn test_synthesized_ranges() {
        let mut rng = SimpleRng::new(9);
        for _ in 0..2000 {
            let w = synthesize_weight(&mut rng);
            assert!((-1.0..1.0).contains(&w), "weight {} out of range", w);
            let b = synthesize_bias(&mut rng);
            assert!((-10.0..10.0).contains(&b), "bias {} out of range", b);
        }
    }

    #[test]
    fn test_parse_row_counts() {
        assert_eq!(parse_row("1 2.5 -3", 1, 3).unwrap(), vec![1.0, 2.5, -3.0]);
        assert_eq!(
            parse_row("1 2", 4, 3),
            Err(WeightFormatError::WrongColumnCount {
                line: 4,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_parse_row_invalid_token() {
        assert_eq!(
            parse_row("1 x 3", 2, 3),
            Err(WeightFormatError::InvalidNumber {
                line: 2,
                token: "x".to_string()
            })
        );
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("", 2), Err(WeightFormatError::Empty));
        assert_eq!(split_lines("1 2\n3", 2).unwrap(), vec!["1 2", "3"]);
        assert_eq!(
            split_lines("1\n2\n3", 2),
            Err(WeightFormatError::WrongRowCount {
                expected: 2,
                found: 3
            })
        );
    }
}
