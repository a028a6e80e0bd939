//! Engine configuration (`timetable.toml`).
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! max_backtracks = 100000
//! time_budget_ms = 10000
//! tie_break_seed = 42
//! heavy_difficulty = 3
//!
//! [weights]
//! preferred_room = 4.0
//! difficulty_spread = 3.0
//! faculty_load = 2.0
//! early_slot = 0.5
//! subject_repeat = 2.5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default cap on backtracking steps per generation run.
pub const DEFAULT_MAX_BACKTRACKS: u64 = 100_000;
/// Default wall-clock budget per generation run (ms).
pub const DEFAULT_TIME_BUDGET_MS: u64 = 10_000;
/// Default difficulty tier at or above which a subject counts as heavy.
pub const DEFAULT_HEAVY_DIFFICULTY: u8 = 3;

/// Solver and cost-model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backtracking steps allowed before the run fails with `PlacementFailure`.
    pub max_backtracks: u64,
    /// Wall-clock budget before the run fails with `Timeout`.
    pub time_budget_ms: u64,
    /// Seed for shuffling equal-cost candidates. `None` keeps grid order.
    pub tie_break_seed: Option<u64>,
    /// Difficulty tier at or above which a subject counts as heavy.
    pub heavy_difficulty: u8,
    /// Soft-cost weights.
    pub weights: CostWeights,
}

/// Weights of the soft-cost rules. Zero disables a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    pub preferred_room: f64,
    pub difficulty_spread: f64,
    pub faculty_load: f64,
    pub early_slot: f64,
    pub subject_repeat: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            preferred_room: 4.0,
            difficulty_spread: 3.0,
            faculty_load: 2.0,
            early_slot: 0.5,
            subject_repeat: 2.5,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_backtracks: DEFAULT_MAX_BACKTRACKS,
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            tie_break_seed: None,
            heavy_difficulty: DEFAULT_HEAVY_DIFFICULTY,
            weights: CostWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&contents)
    }

    /// Load config from a TOML string.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Rejects negative or non-finite weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        let named = [
            ("preferred_room", w.preferred_room),
            ("difficulty_spread", w.difficulty_spread),
            ("faculty_load", w.faculty_load),
            ("early_slot", w.early_slot),
            ("subject_repeat", w.subject_repeat),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "weights.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Sets the backtracking cap.
    pub fn with_max_backtracks(mut self, max: u64) -> Self {
        self.max_backtracks = max;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the tie-break seed.
    pub fn with_tie_break_seed(mut self, seed: u64) -> Self {
        self.tie_break_seed = Some(seed);
        self
    }

    /// Sets the heavy-difficulty threshold.
    pub fn with_heavy_difficulty(mut self, tier: u8) -> Self {
        self.heavy_difficulty = tier;
        self
    }

    /// Sets the cost weights.
    pub fn with_weights(mut self, weights: CostWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Wall-clock budget as a `Duration`.
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let c = EngineConfig::default();
        assert_eq!(c.max_backtracks, 100_000);
        assert_eq!(c.time_budget(), Duration::from_secs(10));
        assert!(c.tie_break_seed.is_none());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let c = EngineConfig::from_toml("").unwrap();
        assert_eq!(c, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let c = EngineConfig::from_toml(
            r#"
            time_budget_ms = 2500
            tie_break_seed = 9

            [weights]
            early_slot = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(c.time_budget_ms, 2500);
        assert_eq!(c.tie_break_seed, Some(9));
        assert_eq!(c.weights.early_slot, 0.0);
        // Unset weights keep defaults
        assert_eq!(c.weights.preferred_room, CostWeights::default().preferred_room);
        assert_eq!(c.max_backtracks, DEFAULT_MAX_BACKTRACKS);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = EngineConfig::from_toml("[weights]\nfaculty_load = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("faculty_load"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = EngineConfig::from_toml("max_backtracks = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let c = EngineConfig::new()
            .with_max_backtracks(500)
            .with_tie_break_seed(3)
            .with_time_budget(Duration::from_millis(750));
        let text = c.to_toml().unwrap();
        assert_eq!(EngineConfig::from_toml(&text).unwrap(), c);
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_file(Path::new("/nonexistent/timetable.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
