//! Rule interpretation knobs shared by the attribution engines.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_SCHEDULED_INNINGS, HOLD_MIN_OUTS, LATE_INNING_WINDOW, LONG_RELIEF_MIN_OUTS,
    MAX_SAVE_LEAD, OUTS_PER_INNING, SAVE_MIN_OUTS,
};

/// Errors raised when rules configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: i64,
        value: i64,
    },
    #[error("late inning window {window} leaves no eligible innings in a {scheduled}-inning game")]
    LateWindowTooWide { window: u8, scheduled: u8 },
    #[error("hold minimum {hold} outs exceeds save minimum {save} outs")]
    HoldExceedsSave { hold: u32, save: u32 },
    #[error("rules config could not be parsed: {0}")]
    Parse(String),
}

/// Tunable subset of the save, hold and game-length rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "RulesConfig::default_scheduled_innings")]
    pub scheduled_innings: u8,
    #[serde(default = "RulesConfig::default_max_save_lead")]
    pub max_save_lead: i32,
    /// `None` disables the late-inning gate on save opportunities.
    #[serde(default = "RulesConfig::default_late_inning_window")]
    pub late_inning_window: Option<u8>,
    #[serde(default = "RulesConfig::default_save_min_outs")]
    pub save_min_outs: u32,
    #[serde(default = "RulesConfig::default_hold_min_outs")]
    pub hold_min_outs: u32,
    #[serde(default = "RulesConfig::default_long_relief_min_outs")]
    pub long_relief_min_outs: u32,
}

impl RulesConfig {
    const fn default_scheduled_innings() -> u8 {
        DEFAULT_SCHEDULED_INNINGS
    }

    const fn default_max_save_lead() -> i32 {
        MAX_SAVE_LEAD
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_late_inning_window() -> Option<u8> {
        Some(LATE_INNING_WINDOW)
    }

    const fn default_save_min_outs() -> u32 {
        SAVE_MIN_OUTS
    }

    const fn default_hold_min_outs() -> u32 {
        HOLD_MIN_OUTS
    }

    const fn default_long_relief_min_outs() -> u32 {
        LONG_RELIEF_MIN_OUTS
    }

    /// Parse and validate a JSON rules document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are inconsistent.
    pub fn from_json(json: &str) -> Result<Self, RulesConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| RulesConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), RulesConfigError> {
        if self.scheduled_innings < 1 {
            return Err(RulesConfigError::MinViolation {
                field: "scheduled_innings",
                min: 1,
                value: i64::from(self.scheduled_innings),
            });
        }
        if self.max_save_lead < 1 {
            return Err(RulesConfigError::MinViolation {
                field: "max_save_lead",
                min: 1,
                value: i64::from(self.max_save_lead),
            });
        }
        if let Some(window) = self.late_inning_window
            && window >= self.scheduled_innings
        {
            return Err(RulesConfigError::LateWindowTooWide {
                window,
                scheduled: self.scheduled_innings,
            });
        }
        if self.hold_min_outs < 1 {
            return Err(RulesConfigError::MinViolation {
                field: "hold_min_outs",
                min: 1,
                value: i64::from(self.hold_min_outs),
            });
        }
        if self.hold_min_outs > self.save_min_outs {
            return Err(RulesConfigError::HoldExceedsSave {
                hold: self.hold_min_outs,
                save: self.save_min_outs,
            });
        }
        if self.long_relief_min_outs < OUTS_PER_INNING {
            return Err(RulesConfigError::MinViolation {
                field: "long_relief_min_outs",
                min: i64::from(OUTS_PER_INNING),
                value: i64::from(self.long_relief_min_outs),
            });
        }
        Ok(())
    }

    /// First inning in which relief can create a save opportunity.
    #[must_use]
    pub fn late_inning_start(&self) -> u32 {
        self.late_inning_window.map_or(1, |window| {
            u32::from(self.scheduled_innings.saturating_sub(window)).max(1)
        })
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            scheduled_innings: Self::default_scheduled_innings(),
            max_save_lead: Self::default_max_save_lead(),
            late_inning_window: Self::default_late_inning_window(),
            save_min_outs: Self::default_save_min_outs(),
            hold_min_outs: Self::default_hold_min_outs(),
            long_relief_min_outs: Self::default_long_relief_min_outs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = RulesConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.late_inning_start(), 7);
    }

    #[test]
    fn late_start_scales_with_game_length() {
        let seven = RulesConfig {
            scheduled_innings: 7,
            ..RulesConfig::default()
        };
        assert_eq!(seven.late_inning_start(), 5);
        let ungated = RulesConfig {
            late_inning_window: None,
            ..RulesConfig::default()
        };
        assert_eq!(ungated.late_inning_start(), 1);
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = RulesConfig::from_json(r#"{"scheduled_innings": 7}"#).unwrap();
        assert_eq!(config.scheduled_innings, 7);
        assert_eq!(config.max_save_lead, MAX_SAVE_LEAD);
        assert_eq!(config.late_inning_window, Some(LATE_INNING_WINDOW));
    }

    #[test]
    fn from_json_rejects_bad_documents() {
        assert!(matches!(
            RulesConfig::from_json("not json"),
            Err(RulesConfigError::Parse(_))
        ));
        assert_eq!(
            RulesConfig::from_json(r#"{"scheduled_innings": 2, "late_inning_window": 2}"#),
            Err(RulesConfigError::LateWindowTooWide {
                window: 2,
                scheduled: 2
            })
        );
        assert_eq!(
            RulesConfig::from_json(r#"{"hold_min_outs": 4}"#),
            Err(RulesConfigError::HoldExceedsSave { hold: 4, save: 3 })
        );
    }

    #[test]
    fn validate_reports_minimums() {
        let config = RulesConfig {
            max_save_lead: 0,
            ..RulesConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(RulesConfigError::MinViolation {
                field: "max_save_lead",
                min: 1,
                value: 0
            })
        );
    }
}
