//! Game tunables, validated on every write and never mutated mid-round.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, engine_error};
use protocol::ErrorCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub timer_duration_secs: u32,
    pub year_range_min: i32,
    pub year_range_max: i32,
    pub exact_points: i64,
    pub close_points: i64,
    pub near_points: i64,
    pub bet_multiplier: i64,
    pub playback_target_id: String,
    pub playlist_id: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            timer_duration_secs: 30,
            year_range_min: 1950,
            year_range_max: 2025,
            exact_points: 10,
            close_points: 5,
            near_points: 2,
            bet_multiplier: 2,
            playback_target_id: String::new(),
            playlist_id: String::new(),
        }
    }
}

impl GameConfig {
    /// Validates the invariants from the data model: timer in [10, 120]s,
    /// `year_range_min < year_range_max`.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(10..=120).contains(&self.timer_duration_secs) {
            return Err(engine_error!(
                InvalidName,
                "timer_duration must be between 10 and 120 seconds, got {}",
                self.timer_duration_secs
            ));
        }
        if self.year_range_min >= self.year_range_max {
            return Err(engine_error!(
                InvalidName,
                "year_range_min ({}) must be less than year_range_max ({})",
                self.year_range_min,
                self.year_range_max
            ));
        }
        Ok(())
    }

    /// Applies a partial set of overrides, keeping previously configured
    /// values for any field left unset, then re-validates the result.
    pub fn apply_overrides(
        &self,
        overrides: &protocol::GameConfigOverrides,
    ) -> Result<Self, EngineError> {
        let mut updated = self.clone();
        if let Some(v) = overrides.timer_duration_secs {
            updated.timer_duration_secs = v;
        }
        if let Some(v) = overrides.year_range_min {
            updated.year_range_min = v;
        }
        if let Some(v) = overrides.year_range_max {
            updated.year_range_max = v;
        }
        if let Some(v) = overrides.exact_points {
            updated.exact_points = v;
        }
        if let Some(v) = overrides.close_points {
            updated.close_points = v;
        }
        if let Some(v) = overrides.near_points {
            updated.near_points = v;
        }
        if let Some(v) = overrides.bet_multiplier {
            updated.bet_multiplier = v;
        }
        if let Some(v) = &overrides.playback_target_id {
            updated.playback_target_id = v.clone();
        }
        if let Some(v) = &overrides.playlist_id {
            updated.playlist_id = v.clone();
        }
        updated.validate()?;
        Ok(updated)
    }

    pub fn year_in_range(&self, year: i32) -> bool {
        year >= self.year_range_min && year <= self.year_range_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn timer_out_of_range_rejected() {
        let mut config = GameConfig::default();
        config.timer_duration_secs = 5;
        assert_eq!(config.validate().unwrap_err().code, ErrorCode::InvalidName);
        config.timer_duration_secs = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_year_range_rejected() {
        let mut config = GameConfig::default();
        config.year_range_min = 2020;
        config.year_range_max = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn boundary_years_are_in_range() {
        let config = GameConfig::default();
        assert!(config.year_in_range(config.year_range_min));
        assert!(config.year_in_range(config.year_range_max));
        assert!(!config.year_in_range(config.year_range_min - 1));
        assert!(!config.year_in_range(config.year_range_max + 1));
    }
}
