//! Converter configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides.

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// Knobs for the emitted program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Fixed step of the generated step function, in seconds.
    pub sample_time: f64,
    /// Simulated duration of the demonstration driver, in seconds.
    pub stop_time: f64,
    /// Value fed to every input port by the demonstration driver.
    pub demo_input: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sample_time: 0.001,
            stop_time: 10.0,
            demo_input: 1.0,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.sample_time.is_finite() || self.sample_time <= 0.0 {
            bail!("sample_time must be a positive number, got {}", self.sample_time);
        }
        if !self.stop_time.is_finite() || self.stop_time <= 0.0 {
            bail!("stop_time must be a positive number, got {}", self.stop_time);
        }
        if !self.demo_input.is_finite() {
            bail!("demo_input must be finite, got {}", self.demo_input);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub generator: GeneratorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl Config {
    /// Load a JSON config file.
    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.generator.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.generator.sample_time, 0.001);
        assert_eq!(config.generator.stop_time, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"generator": {"stop_time": 2.5}}"#).unwrap();
        assert_eq!(config.generator.stop_time, 2.5);
        assert_eq!(config.generator.sample_time, 0.001);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn rejects_non_positive_sample_time() {
        let config = GeneratorConfig {
            sample_time: 0.0,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
