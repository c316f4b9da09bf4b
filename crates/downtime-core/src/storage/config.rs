//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Set-down timer thresholds and default session duration
//! - Rep detector thresholds and default rep goal
//! - Reward minutes granted per completed session
//!
//! Configuration is stored at `~/.config/downtime/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::reps::RepDetectorConfig;
use crate::setdown::SetDownConfig;

/// Set-down timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Default countdown length in seconds.
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u64,
    #[serde(default = "default_stationary_threshold")]
    pub stationary_threshold: f64,
    #[serde(default = "default_stationary_duration_ms")]
    pub stationary_duration_ms: u64,
    #[serde(default = "default_motion_end_threshold")]
    pub motion_end_threshold: f64,
    /// Countdown display tick period.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Requested sensor sampling interval.
    #[serde(default = "default_timer_sample_interval_ms")]
    pub sample_interval_ms: u64,
}

/// Rep detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepSettings {
    #[serde(default = "default_rep_goal")]
    pub default_goal: u32,
    #[serde(default = "default_down_delta_deg")]
    pub down_delta_deg: f64,
    #[serde(default = "default_up_delta_deg")]
    pub up_delta_deg: f64,
    #[serde(default = "default_min_rep_interval_ms")]
    pub min_rep_interval_ms: u64,
    #[serde(default = "default_rep_sample_interval_ms")]
    pub sample_interval_ms: u64,
}

/// Reward grants per completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardSettings {
    /// Starting ledger balance for a fresh install.
    #[serde(default = "default_initial_minutes")]
    pub initial_minutes: u32,
    #[serde(default = "default_focus_reward")]
    pub minutes_per_focus_session: u32,
    #[serde(default = "default_exercise_reward")]
    pub minutes_per_exercise_session: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/downtime/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerSettings,
    #[serde(default)]
    pub reps: RepSettings,
    #[serde(default)]
    pub rewards: RewardSettings,
}

// Default functions
fn default_duration_secs() -> u64 {
    60
}
fn default_stationary_threshold() -> f64 {
    crate::setdown::STATIONARY_THRESHOLD
}
fn default_stationary_duration_ms() -> u64 {
    crate::setdown::STATIONARY_DURATION_MS
}
fn default_motion_end_threshold() -> f64 {
    crate::setdown::MOTION_END_THRESHOLD
}
fn default_tick_interval_ms() -> u64 {
    150
}
fn default_timer_sample_interval_ms() -> u64 {
    120
}
fn default_rep_goal() -> u32 {
    15
}
fn default_down_delta_deg() -> f64 {
    crate::reps::DOWN_DELTA_DEG
}
fn default_up_delta_deg() -> f64 {
    crate::reps::UP_DELTA_DEG
}
fn default_min_rep_interval_ms() -> u64 {
    crate::reps::MIN_REP_INTERVAL_MS
}
fn default_rep_sample_interval_ms() -> u64 {
    100
}
fn default_initial_minutes() -> u32 {
    140
}
fn default_focus_reward() -> u32 {
    10
}
fn default_exercise_reward() -> u32 {
    5
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
            stationary_threshold: default_stationary_threshold(),
            stationary_duration_ms: default_stationary_duration_ms(),
            motion_end_threshold: default_motion_end_threshold(),
            tick_interval_ms: default_tick_interval_ms(),
            sample_interval_ms: default_timer_sample_interval_ms(),
        }
    }
}

impl Default for RepSettings {
    fn default() -> Self {
        Self {
            default_goal: default_rep_goal(),
            down_delta_deg: default_down_delta_deg(),
            up_delta_deg: default_up_delta_deg(),
            min_rep_interval_ms: default_min_rep_interval_ms(),
            sample_interval_ms: default_rep_sample_interval_ms(),
        }
    }
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            initial_minutes: default_initial_minutes(),
            minutes_per_focus_session: default_focus_reward(),
            minutes_per_exercise_session: default_exercise_reward(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerSettings::default(),
            reps: RepSettings::default(),
            rewards: RewardSettings::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Detector thresholds for the set-down timer.
    pub fn setdown_config(&self) -> SetDownConfig {
        SetDownConfig {
            stationary_threshold: self.timer.stationary_threshold,
            stationary_duration_ms: self.timer.stationary_duration_ms,
            motion_end_threshold: self.timer.motion_end_threshold,
        }
    }

    /// Detector thresholds for the rep counter.
    pub fn rep_config(&self) -> RepDetectorConfig {
        RepDetectorConfig {
            down_delta_deg: self.reps.down_delta_deg,
            up_delta_deg: self.reps.up_delta_deg,
            min_rep_interval_ms: self.reps.min_rep_interval_ms,
            fixed_baseline_deg: None,
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// as the existing type, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    invalid(format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }
}
