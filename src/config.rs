//! Engine and resampler configuration.
//!
//! Both structs deserialize from JSON with every field optional, falling
//! back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::dsp::analyser::DEFAULT_FFT_SIZE;
use crate::dsp::resampler::DEFAULT_CAPACITY;
use crate::dsp::shaper::Oversample;
use crate::error::ConfigError;

/// Declared range of an automatable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    #[serde(rename = "defaultValue")]
    pub default: f64,
    #[serde(rename = "minValue")]
    pub min: f64,
    #[serde(rename = "maxValue")]
    pub max: f64,
}

impl ParamRange {
    pub const fn new(default: f64, min: f64, max: f64) -> Self {
        ParamRange { default, min, max }
    }

    /// Clamp `value` into `[min, max]`; NaN falls back to the default.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.default
        } else {
            // Never panics, even for an inverted or NaN range.
            value.max(self.min).min(self.max)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Range of the resampler's pitch ratio (1.0 leaves pitch unchanged).
pub const PITCH_RATIO: ParamRange = ParamRange::new(1.0, 0.1, 10.0);

/// Settings for the tone engine's clock and processing chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Samples per second of the engine clock.
    pub sample_rate: f64,
    /// Oversampling used by every tone's shaping stage.
    pub oversample: Oversample,
    /// Window of the analysis tap created by [`ToneEngine::analyser`](crate::tone::ToneEngine::analyser).
    pub analyser_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: 44100.0,
            oversample: Oversample::X4,
            analyser_size: DEFAULT_FFT_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::Invalid {
                field: "sampleRate",
                reason: format!("must be positive, got {}", self.sample_rate),
            });
        }
        if self.analyser_size == 0 {
            return Err(ConfigError::Invalid {
                field: "analyserSize",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings for [`PitchShiftResampler`](crate::dsp::resampler::PitchShiftResampler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResamplerConfig {
    /// Nominal history size; twice this many samples are retained.
    pub capacity: usize,
    pub pitch_ratio: ParamRange,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        ResamplerConfig {
            capacity: DEFAULT_CAPACITY,
            pitch_ratio: PITCH_RATIO,
        }
    }
}

impl ResamplerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ResamplerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        let r = &self.pitch_ratio;
        if !(r.min > 0.0 && r.min <= r.default && r.default <= r.max) {
            return Err(ConfigError::Invalid {
                field: "pitchRatio",
                reason: format!("expected 0 < min <= default <= max, got {r:?}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
        assert_eq!(ResamplerConfig::from_json("{}").unwrap(), ResamplerConfig::default());
    }

    #[test]
    fn partial_engine_config() {
        let config = EngineConfig::from_json(r#"{"sampleRate": 48000, "oversample": "none"}"#).unwrap();
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.oversample, Oversample::None);
        assert_eq!(config.analyser_size, DEFAULT_FFT_SIZE);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let err = EngineConfig::from_json(r#"{"sampleRate": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "sampleRate", .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn resampler_config_round_trip() {
        let config = ResamplerConfig {
            capacity: 512,
            pitch_ratio: ParamRange::new(2.0, 0.5, 4.0),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"defaultValue\":2.0"));
        assert_eq!(ResamplerConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn rejects_inverted_pitch_range() {
        let json = r#"{"pitchRatio": {"defaultValue": 1.0, "minValue": 2.0, "maxValue": 3.0}}"#;
        assert!(ResamplerConfig::from_json(json).is_err());
        assert!(ResamplerConfig::from_json(r#"{"capacity": 0}"#).is_err());
    }

    #[test]
    fn pitch_ratio_clamps() {
        assert_eq!(PITCH_RATIO.clamp(0.0), 0.1);
        assert_eq!(PITCH_RATIO.clamp(12.0), 10.0);
        assert_eq!(PITCH_RATIO.clamp(f64::NAN), 1.0);
        assert!(PITCH_RATIO.contains(1.0));
    }

    #[test]
    fn inverted_range_clamps_without_panicking() {
        let inverted = ParamRange::new(1.0, 2.0, 0.5);
        assert_eq!(inverted.clamp(1.0), 0.5);
        assert_eq!(inverted.clamp(f64::NAN), 1.0);

        let unbounded = ParamRange::new(1.0, f64::NAN, f64::NAN);
        assert_eq!(unbounded.clamp(3.0), 3.0);
    }
}
