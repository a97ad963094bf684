//! Configuration for sampling and long-running scans.
//!
//! Both structs deserialize from JSON with every field optional:
//!
//! ```
//! use exampleset::{SamplingConfig, SamplingType};
//!
//! let config = SamplingConfig::from_json(r#"{ "sampling_type": "stratified", "seed": 1992 }"#).unwrap();
//! assert_eq!(config.sampling_type, SamplingType::Stratified);
//! assert_eq!(config.seed, Some(1992));
//! assert!(!config.strict_stratification);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How rows are assigned to partition groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingType {
    /// Contiguous blocks in original row order.
    Linear,
    /// Linear blocks, then shuffled.
    Shuffled,
    /// Class proportions preserved per group (needs a nominal label).
    Stratified,
    /// Stratified if a nominal label exists, shuffled otherwise.
    #[default]
    Automatic,
}

impl SamplingType {
    /// Parse a sampling type name.
    ///
    /// Accepts: "linear", "shuffled", "stratified", "automatic"
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" | "linear_sampling" => Some(SamplingType::Linear),
            "shuffled" | "shuffled_sampling" => Some(SamplingType::Shuffled),
            "stratified" | "stratified_sampling" => Some(SamplingType::Stratified),
            "automatic" => Some(SamplingType::Automatic),
            _ => None,
        }
    }
}

/// Settings for the partition builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Which partition algorithm to use.
    pub sampling_type: SamplingType,
    /// Seed for shuffling; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Fail instead of falling back to shuffled sampling when stratification is impossible.
    pub strict_stratification: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            sampling_type: SamplingType::Automatic,
            seed: None,
            strict_stratification: false,
        }
    }
}

impl SamplingConfig {
    /// Load from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Shorthand for a seeded configuration of the given type.
    pub fn seeded(sampling_type: SamplingType, seed: u64) -> Self {
        SamplingConfig {
            sampling_type,
            seed: Some(seed),
            strict_stratification: false,
        }
    }
}

/// Polling cadence for cancellable scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Rows between two polls of the cancellation token.
    pub check_interval: usize,
    /// Rows between two progress notifications.
    pub progress_interval: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            check_interval: 1,
            progress_interval: 1000,
        }
    }
}

impl ScanConfig {
    /// Load from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_type_parse() {
        assert_eq!(SamplingType::parse("Linear"), Some(SamplingType::Linear));
        assert_eq!(
            SamplingType::parse("stratified_sampling"),
            Some(SamplingType::Stratified)
        );
        assert_eq!(SamplingType::parse("bogus"), None);
    }

    #[test]
    fn test_scan_config_defaults_fill_missing_fields() {
        let config = ScanConfig::from_json(r#"{ "check_interval": 64 }"#).unwrap();
        assert_eq!(config.check_interval, 64);
        assert_eq!(config.progress_interval, 1000);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let err = SamplingConfig::from_json(r#"{ "sampling_type": "sideways" }"#).unwrap_err();
        assert!(matches!(err, crate::Error::Config { .. }));
    }
}
