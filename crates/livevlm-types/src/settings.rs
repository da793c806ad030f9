//! Per-query model settings with validated bounds.

use serde::{Deserialize, Serialize};

use crate::VlmError;

pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_DELAY_SECONDS: f32 = 2.0;

pub const MAX_TOKENS_RANGE: std::ops::RangeInclusive<u32> = 1..=4000;
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;
pub const DELAY_SECONDS_RANGE: std::ops::RangeInclusive<f32> = 0.1..=60.0;

/// Settings accepted for a single model query.
///
/// Deserialization fills missing fields with defaults but does not check
/// bounds; call [`QuerySettings::validate`] at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Advisory pacing hint for the caller between frames. Not enforced here.
    pub delay_seconds: f32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            delay_seconds: DEFAULT_DELAY_SECONDS,
        }
    }
}

impl QuerySettings {
    /// Build settings, rejecting out-of-range values.
    pub fn new(max_tokens: u32, temperature: f32, delay_seconds: f32) -> Result<Self, VlmError> {
        let settings = Self {
            max_tokens,
            temperature,
            delay_seconds,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Settings used for text-only summary generation.
    pub fn for_summary() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.3,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), VlmError> {
        if !MAX_TOKENS_RANGE.contains(&self.max_tokens) {
            return Err(VlmError::InvalidInput(format!(
                "max_tokens must be between {} and {}, got {}",
                MAX_TOKENS_RANGE.start(),
                MAX_TOKENS_RANGE.end(),
                self.max_tokens
            )));
        }
        // `contains` is false for NaN, which is what we want.
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(VlmError::InvalidInput(format!(
                "temperature must be between {} and {}, got {}",
                TEMPERATURE_RANGE.start(),
                TEMPERATURE_RANGE.end(),
                self.temperature
            )));
        }
        if !DELAY_SECONDS_RANGE.contains(&self.delay_seconds) {
            return Err(VlmError::InvalidInput(format!(
                "delay_seconds must be between {} and {}, got {}",
                DELAY_SECONDS_RANGE.start(),
                DELAY_SECONDS_RANGE.end(),
                self.delay_seconds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = QuerySettings::default();
        assert_eq!(settings.max_tokens, 300);
        assert!((settings.temperature - 0.7).abs() < f32::EPSILON);
        assert!((settings.delay_seconds - 2.0).abs() < f32::EPSILON);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(QuerySettings::new(1, 0.0, 0.1).is_ok());
        assert!(QuerySettings::new(4000, 2.0, 60.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_max_tokens() {
        let err = QuerySettings::new(0, 0.7, 2.0).unwrap_err();
        assert_eq!(err.kind(), "invalid-input");
        assert!(err.to_string().contains("max_tokens"));
        assert!(QuerySettings::new(4001, 0.7, 2.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        assert!(QuerySettings::new(300, -0.1, 2.0).is_err());
        assert!(QuerySettings::new(300, 2.5, 2.0).is_err());
        assert!(QuerySettings::new(300, f32::NAN, 2.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_delay() {
        assert!(QuerySettings::new(300, 0.7, 0.05).is_err());
        assert!(QuerySettings::new(300, 0.7, 61.0).is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: QuerySettings = serde_json::from_str(r#"{"max_tokens": 120}"#).unwrap();
        assert_eq!(settings.max_tokens, 120);
        assert!((settings.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
        assert!((settings.delay_seconds - DEFAULT_DELAY_SECONDS).abs() < f32::EPSILON);
    }

    #[test]
    fn summary_settings() {
        let settings = QuerySettings::for_summary();
        assert_eq!(settings.max_tokens, 300);
        assert!((settings.temperature - 0.3).abs() < f32::EPSILON);
        assert!(settings.validate().is_ok());
    }
}
