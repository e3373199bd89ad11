//! Configuration for constructing the inference engine
//!
//! The network topology is fixed; only where weights live and how missing weights are
//! seeded can be configured.

use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Default directory holding weight resources.
pub const DEFAULT_PARAMS_DIR: &str = "params";

/// Engine configuration, typically parsed from JSON.
///
/// Both fields are optional in the JSON form:
///
/// - **params_dir**: directory of weight resources (default `params`)
/// - **seed**: seed for synthesizing missing weights; when absent the clock is used
///
/// # Example
///
/// ```json
/// {
///   "params_dir": "weights/lenet5",
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Directory holding one text file per kernel or dense neuron
    #[serde(default = "default_params_dir")]
    pub params_dir: PathBuf,

    /// Seed for synthesizing weights that are not on disk yet
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_params_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PARAMS_DIR)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params_dir: default_params_dir(),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_params_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.params_dir = dir.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Loads an engine configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents into an `EngineConfig`.
///
/// # Returns
///
/// `Ok(EngineConfig)` on success, or an error if the file cannot be read, the JSON is
/// invalid, or `params_dir` is empty.
///
/// # Examples
///
/// ```no_run
/// use lenet5_inference::config::load_config;
///
/// let cfg = load_config("config/lenet5.json").unwrap();
/// println!("weights in {}", cfg.params_dir.display());
/// ```
pub fn load_config(path: &str) -> Result<EngineConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &EngineConfig) -> Result<(), Box<dyn Error>> {
    if config.params_dir.as_os_str().is_empty() {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "params_dir must not be empty",
        )));
    }

    Ok(())
}
