//! Engine configuration
//!
//! Loaded from a YAML file with kebab-case keys. Every key is optional:
//!
//! ```yaml
//! lead-in: 0.1              # seconds between play and the first sound
//! completion-grace: 0.2     # seconds after the last loop before "finished"
//! piano-lowest-octave: 3    # floor octave for piano voicings
//! count-in: true            # play one measure of clicks first
//! loop-count: 1             # passes through the main loop
//! master-volume: 0.5        # 0.0 to 1.0
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::AccompError;
use crate::playback::{ArrangementOptions, SchedulerOptions, DEFAULT_MASTER_VOLUME};

/// Raw config for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    lead_in: Option<f64>,
    completion_grace: Option<f64>,
    piano_lowest_octave: Option<i8>,
    count_in: Option<bool>,
    loop_count: Option<u32>,
    master_volume: Option<f32>,
}

/// Validated engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub arrangement: ArrangementOptions,
    pub scheduler: SchedulerOptions,
    pub loop_count: u32,
    pub master_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            arrangement: ArrangementOptions::default(),
            scheduler: SchedulerOptions::default(),
            loop_count: 1,
            master_volume: DEFAULT_MASTER_VOLUME,
        }
    }
}

fn non_negative_seconds(key: &str, value: f64) -> Result<f64, AccompError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AccompError::ConfigError(format!(
            "{} must be a non-negative number of seconds, got {}",
            key, value
        )));
    }
    Ok(value)
}

impl EngineConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, AccompError> {
        // An empty file deserializes as unit, not as an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| AccompError::ConfigError(e.to_string()))?;

        let defaults = Self::default();

        let lead_in = match raw.lead_in {
            Some(value) => non_negative_seconds("lead-in", value)?,
            None => defaults.scheduler.lead_in,
        };
        let completion_grace = match raw.completion_grace {
            Some(value) => non_negative_seconds("completion-grace", value)?,
            None => defaults.scheduler.completion_grace,
        };

        let piano_lowest_octave = raw
            .piano_lowest_octave
            .unwrap_or(defaults.arrangement.piano_lowest_octave);
        if !(0..=7).contains(&piano_lowest_octave) {
            return Err(AccompError::ConfigError(format!(
                "piano-lowest-octave must be between 0 and 7, got {}",
                piano_lowest_octave
            )));
        }

        let loop_count = raw.loop_count.unwrap_or(defaults.loop_count);
        if loop_count == 0 {
            return Err(AccompError::ConfigError("loop-count must be at least 1".to_string()));
        }

        let master_volume = raw.master_volume.unwrap_or(defaults.master_volume);
        if !(0.0..=1.0).contains(&master_volume) {
            return Err(AccompError::ConfigError(format!(
                "master-volume must be between 0.0 and 1.0, got {}",
                master_volume
            )));
        }

        Ok(EngineConfig {
            arrangement: ArrangementOptions {
                piano_lowest_octave,
                count_in: raw.count_in.unwrap_or(defaults.arrangement.count_in),
            },
            scheduler: SchedulerOptions {
                lead_in,
                completion_grace,
            },
            loop_count,
            master_volume,
        })
    }

    pub fn load(path: &Path) -> Result<Self, AccompError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AccompError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }
}
