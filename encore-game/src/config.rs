//! Run configuration: scoring mode, dice retention, presentation delay and
//! the venue roster.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::PRESENTATION_DELAY_MS;
use crate::dice::DiceRetention;
use crate::scoring::ScoringMode;
use crate::venue::{VenueId, VenueTable};

const MAX_PRESENTATION_DELAY_MS: u64 = 10_000;

/// Errors raised when career configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{venue}: {field} out of range (got {value:.2})")]
    VenueField {
        venue: VenueId,
        field: &'static str,
        value: f64,
    },
    #[error("{venue}: variance range must be between 0 and 50 (got {value})")]
    VenueVariance { venue: VenueId, value: i32 },
    #[error("venue table is empty")]
    NoVenues,
    #[error("presentation delay must be at most {max}ms (got {value}ms)")]
    PresentationDelay { value: u64, max: u64 },
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunable knobs for a career run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerConfig {
    #[serde(default)]
    pub scoring_mode: ScoringMode,
    #[serde(default)]
    pub dice_retention: DiceRetention,
    #[serde(default = "CareerConfig::default_presentation_delay_ms")]
    pub presentation_delay_ms: u64,
    #[serde(default)]
    pub venues: VenueTable,
}

impl Default for CareerConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl CareerConfig {
    #[must_use]
    pub const fn default_presentation_delay_ms() -> u64 {
        PRESENTATION_DELAY_MS
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self {
            scoring_mode: ScoringMode::default(),
            dice_retention: DiceRetention::default(),
            presentation_delay_ms: Self::default_presentation_delay_ms(),
            venues: VenueTable::default_table(),
        }
    }

    /// Parse a JSON override document and validate it. Missing fields keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the document is malformed or violates an invariant.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.presentation_delay_ms > MAX_PRESENTATION_DELAY_MS {
            return Err(ConfigError::PresentationDelay {
                value: self.presentation_delay_ms,
                max: MAX_PRESENTATION_DELAY_MS,
            });
        }
        self.venues.validate()
    }

    #[must_use]
    pub const fn presentation_delay(&self) -> Duration {
        Duration::from_millis(self.presentation_delay_ms)
    }

    #[must_use]
    pub const fn with_scoring_mode(mut self, mode: ScoringMode) -> Self {
        self.scoring_mode = mode;
        self
    }

    #[must_use]
    pub const fn with_dice_retention(mut self, retention: DiceRetention) -> Self {
        self.dice_retention = retention;
        self
    }

    #[must_use]
    pub const fn with_presentation_delay_ms(mut self, delay_ms: u64) -> Self {
        self.presentation_delay_ms = delay_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CareerConfig::from_json("{}").expect("defaults validate");
        assert_eq!(config, CareerConfig::default_config());
        assert_eq!(config.presentation_delay(), Duration::from_millis(1_200));
        assert_eq!(config.scoring_mode, ScoringMode::Dice);
        assert_eq!(config.dice_retention, DiceRetention::Last);
    }

    #[test]
    fn overrides_apply() {
        let config = CareerConfig::from_json(
            r#"{"scoringMode":"legacy","diceRetention":"best","presentationDelayMs":0}"#,
        )
        .expect("valid overrides");
        assert_eq!(config.scoring_mode, ScoringMode::Legacy);
        assert_eq!(config.dice_retention, DiceRetention::Best);
        assert_eq!(config.presentation_delay_ms, 0);
        assert!(config.venues.get(VenueId::Arena).is_some());
    }

    #[test]
    fn venue_overrides_replace_the_roster() {
        let config = CareerConfig::from_json(
            r#"{"venues":{"street":{"cost":0,"breakEven":0,"payoutPerPoint":0.5,
                "fanMultiplier":1.0,"varianceRange":1,"tipFloor":3}}}"#,
        )
        .expect("single venue roster");
        assert!(config.venues.get(VenueId::Club).is_none());
        let street = config.venues.get(VenueId::Street).expect("street present");
        assert_eq!(street.tip_floor, Some(3));
        assert_eq!(street.fan_requirement, 0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = CareerConfig::from_json(r#"{"presentationDelayMs":60000}"#).unwrap_err();
        assert!(matches!(err, ConfigError::PresentationDelay { value: 60_000, .. }));

        let err = CareerConfig::from_json(r#"{"venues":{}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoVenues));

        let err = CareerConfig::from_json(
            r#"{"venues":{"club":{"cost":-5,"breakEven":60,"payoutPerPoint":1.3,
                "fanMultiplier":1.3,"varianceRange":6}}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::VenueField {
                venue: VenueId::Club,
                field: "cost",
                ..
            }
        ));
        assert!(err.to_string().contains("club"));

        let err = CareerConfig::from_json(
            r#"{"venues":{"club":{"cost":5,"breakEven":60,"payoutPerPoint":1.3,
                "fanMultiplier":1.3,"varianceRange":99}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::VenueVariance { value: 99, .. }));

        assert!(matches!(
            CareerConfig::from_json("not json").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }
}
