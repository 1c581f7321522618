// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Configuration file types and parsing.
//!
//! JSON5 input format (plain JSON is accepted, comments and trailing
//! commas are tolerated); output is pretty-printed JSON. The file carries
//! the benchmark toggles under `skipListBenchmark`.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Benchmark behavior toggles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BenchmarkToggles {
    /// Emit coarse per-worker progress lines during a pass.
    #[serde(rename = "useProgressBar")]
    pub use_progress_bar: bool,

    /// Drive workloads with the `rand` crate generator instead of the
    /// xorshift fallback.
    #[serde(rename = "useRandRNG")]
    pub use_rand_rng: bool,
}

/// On-disk configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(rename = "skipListBenchmark")]
    pub skip_list_benchmark: BenchmarkToggles,
}

impl Config {
    /// Load configuration from a JSON5 file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    ///
    /// Missing keys and type mismatches are parse errors; no defaults are
    /// silently substituted.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize configuration with pretty formatting
    pub fn to_json5(&self) -> String {
        // json5 has no pretty printer; serde_json output is valid json5
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5();
        std::fs::write(path, content)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))
    }

    /// Rewrite `skipListBenchmark.useProgressBar` in place. The file must
    /// already parse; on any failure nothing is written.
    pub fn update_use_progress_bar(path: &Path, value: bool) -> Result<(), ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.skip_list_benchmark.use_progress_bar = value;
        config.save_to_file(path)
    }

    /// Rewrite `skipListBenchmark.useRandRNG` in place.
    pub fn update_use_rand_rng(path: &Path, value: bool) -> Result<(), ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.skip_list_benchmark.use_rand_rng = value;
        config.save_to_file(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            skip_list_benchmark: BenchmarkToggles::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    IoError(std::path::PathBuf, String),
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(f, "failed to access config file '{}': {}", path.display(), msg)
            }
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let config = Config::parse(
            r#"{"skipListBenchmark": {"useProgressBar": true, "useRandRNG": false}}"#,
        )
        .unwrap();
        assert!(config.skip_list_benchmark.use_progress_bar);
        assert!(!config.skip_list_benchmark.use_rand_rng);
    }

    #[test]
    fn test_parse_with_comments() {
        let json5 = r#"{
            // benchmark switches
            skipListBenchmark: {
                useProgressBar: false,
                useRandRNG: true, // trailing comma is fine
            },
        }"#;
        let config = Config::parse(json5).unwrap();
        assert!(config.skip_list_benchmark.use_rand_rng);
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let result = Config::parse(r#"{"skipListBenchmark": {"useProgressBar": true}}"#);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let result = Config::parse(
            r#"{"skipListBenchmark": {"useProgressBar": "yes", "useRandRNG": false}}"#,
        );
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_roundtrip() {
        let config = Config {
            skip_list_benchmark: BenchmarkToggles {
                use_progress_bar: true,
                use_rand_rng: true,
            },
        };
        let text = config.to_json5();
        assert!(text.contains("useProgressBar"));
        assert!(text.contains("useRandRNG"));
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_update_progress_bar_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config::default().save_to_file(&path).unwrap();

        Config::update_use_progress_bar(&path, true).unwrap();
        let config = Config::load_from_file(&path).unwrap();
        assert!(config.skip_list_benchmark.use_progress_bar);
        assert!(!config.skip_list_benchmark.use_rand_rng);
    }

    #[test]
    fn test_update_rand_rng_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config::default().save_to_file(&path).unwrap();

        Config::update_use_rand_rng(&path, true).unwrap();
        let config = Config::load_from_file(&path).unwrap();
        assert!(config.skip_list_benchmark.use_rand_rng);
    }

    #[test]
    fn test_update_on_malformed_file_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json at all").unwrap();

        let result = Config::update_use_progress_bar(&path, true);
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json at all");
    }

    #[test]
    fn test_update_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::update_use_rand_rng(&dir.path().join("absent.json"), true);
        assert!(matches!(result, Err(ConfigError::IoError(_, _))));
    }
}
