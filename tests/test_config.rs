//! Tests for configuration parsing
//!
//! This file tests the config module including:
//! - Loading valid JSON config files
//! - Falling back to defaults for missing fields
//! - Handling invalid JSON and missing files

use lenet5_inference::config::{load_config, EngineConfig, DEFAULT_PARAMS_DIR};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp config");
    file
}

// ============================================================================
// Valid Config Loading Tests
// ============================================================================

mod valid_config_tests {
    use super::*;

    #[test]
    fn test_load_full_config() {
        let temp = write_temp_config(r#"{ "params_dir": "weights/lenet5", "seed": 42 }"#);
        let config = load_config(temp.path().to_str().unwrap()).expect("failed to load config");

        assert_eq!(config.params_dir, PathBuf::from("weights/lenet5"));
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp = write_temp_config("{}");
        let config = load_config(temp.path().to_str().unwrap()).unwrap();

        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.params_dir, PathBuf::from(DEFAULT_PARAMS_DIR));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_only_seed() {
        let temp = write_temp_config(r#"{ "seed": 7 }"#);
        let config = load_config(temp.path().to_str().unwrap()).unwrap();

        assert_eq!(config.params_dir, PathBuf::from("params"));
        assert_eq!(config.seed, Some(7));
    }
}

// ============================================================================
// Invalid Config Tests
// ============================================================================

mod invalid_config_tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        assert!(load_config("config/does_not_exist.json").is_err());
    }

    #[test]
    fn test_invalid_json() {
        let temp = write_temp_config("{ params_dir: ");
        assert!(load_config(temp.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_wrong_seed_type() {
        let temp = write_temp_config(r#"{ "seed": "forty-two" }"#);
        assert!(load_config(temp.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_negative_seed() {
        let temp = write_temp_config(r#"{ "seed": -1 }"#);
        assert!(load_config(temp.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_empty_params_dir() {
        let temp = write_temp_config(r#"{ "params_dir": "" }"#);
        let err = load_config(temp.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("params_dir"));
    }
}
