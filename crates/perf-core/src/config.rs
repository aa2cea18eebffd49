//! Collector configuration
//!
//! The serializable part of the collector options. Callbacks (the emitter and
//! the resource filter) live in [`crate::collector::CollectorOptions`]; the
//! plain values here can be loaded from JSON or from a JS options object.

use crate::error::{PerfError, Result};
use serde::{Deserialize, Serialize};

/// Sampling rate applied to resource entries when none is configured
pub const DEFAULT_RESOURCE_SAMPLE_RATE: f64 = 0.25;

/// Plain configuration values for the collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorConfig {
    /// Fraction of resource entries to keep (default: 0.25)
    #[serde(default = "default_resource_sample_rate")]
    pub resource_sample_rate: f64,
    /// Emit a network-quality snapshot (default: true)
    #[serde(default = "default_include_network_info")]
    pub include_network_info: bool,
    /// Emit a JS heap snapshot where supported (default: false)
    #[serde(default)]
    pub include_memory_snapshot: bool,
}

fn default_resource_sample_rate() -> f64 {
    DEFAULT_RESOURCE_SAMPLE_RATE
}

fn default_include_network_info() -> bool {
    true
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            resource_sample_rate: DEFAULT_RESOURCE_SAMPLE_RATE,
            include_network_info: true,
            include_memory_snapshot: false,
        }
    }
}

impl CollectorConfig {
    /// Parse configuration from a JSON string
    ///
    /// Missing keys take their defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use perf_core::config::CollectorConfig;
    ///
    /// let config = CollectorConfig::from_json(r#"{"resourceSampleRate": 0.5}"#).unwrap();
    /// assert_eq!(config.resource_sample_rate, 0.5);
    /// assert!(config.include_network_info);
    /// ```
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| PerfError::Config(e.to_string()))
    }

    pub fn with_resource_sample_rate(mut self, rate: f64) -> Self {
        self.resource_sample_rate = rate;
        self
    }

    pub fn with_network_info(mut self, include: bool) -> Self {
        self.include_network_info = include;
        self
    }

    pub fn with_memory_snapshot(mut self, include: bool) -> Self {
        self.include_memory_snapshot = include;
        self
    }

    /// The configured resource rate after normalization
    pub fn sample_rate(&self) -> SampleRate {
        SampleRate::new(self.resource_sample_rate)
    }
}

/// A sampling rate guaranteed to lie in `[0, 1]`.
///
/// Non-finite and negative inputs fall back to the default rate; values above
/// one are clamped to one. Zero is kept and drops every entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRate(f64);

impl SampleRate {
    pub fn new(rate: f64) -> Self {
        if !rate.is_finite() || rate < 0.0 {
            return Self(DEFAULT_RESOURCE_SAMPLE_RATE);
        }
        Self(rate.min(1.0))
    }

    pub fn get(&self) -> f64 {
        self.0
    }

    /// A uniform draw in `[0, 1)` passes when it is strictly below the rate
    pub fn admits(&self, draw: f64) -> bool {
        draw < self.0
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self(DEFAULT_RESOURCE_SAMPLE_RATE)
    }
}
