//! Venue economics.
//!
//! Converts a release score into money and fan deltas. Each venue is a risk
//! tier: entry cost, the score it takes to break even, payout per point of
//! margin, fan multiplier and score variance.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::constants::{
    BUSK_STAGE_BONUS, FAN_CARRY_RATE, ONBOARDING_MONEY_FLOOR, ONBOARDING_WEEKS,
};
use crate::numbers::{floor_f64_to_i64, i64_to_f64, round_f64_to_u64, u64_to_f64};
use crate::scoring::Grade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueId {
    Street,
    OpenMic,
    Club,
    Theater,
    Arena,
}

impl VenueId {
    pub const ALL: [Self; 5] = [
        Self::Street,
        Self::OpenMic,
        Self::Club,
        Self::Theater,
        Self::Arena,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Street => "street",
            Self::OpenMic => "open_mic",
            Self::Club => "club",
            Self::Theater => "theater",
            Self::Arena => "arena",
        }
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for VenueId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|venue| venue.key() == wanted)
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub cost: f64,
    pub break_even: f64,
    pub payout_per_point: f64,
    pub fan_multiplier: f64,
    pub variance_range: i32,
    #[serde(default)]
    pub tip_floor: Option<i64>,
    #[serde(default)]
    pub fan_requirement: u64,
    /// Flat stage gain granted on every performance here.
    #[serde(default)]
    pub stage_bonus: f64,
}

impl Venue {
    /// Zero entry cost venues never lose money.
    #[must_use]
    pub fn is_no_risk(&self) -> bool {
        self.cost <= 0.0
    }

    #[must_use]
    pub const fn is_open_to(&self, fans: u64) -> bool {
        fans >= self.fan_requirement
    }

    /// Fan delta for a grade, before any gig decay.
    #[must_use]
    pub fn raw_fans_gain(&self, grade: Grade, fans: u64) -> f64 {
        let carry = (u64_to_f64(fans) * FAN_CARRY_RATE).floor();
        (grade.fans_gain() + carry) * self.fan_multiplier
    }

    /// Net money before guardrails: `max(0, score - breakEven) * payout - cost`.
    #[must_use]
    pub fn raw_net(&self, score: f64) -> f64 {
        let margin = score - self.break_even;
        let gross = margin.max(0.0) * self.payout_per_point;
        gross - self.cost
    }

    pub(crate) fn validate(&self, id: VenueId) -> Result<(), ConfigError> {
        let checks = [
            ("cost", self.cost, 0.0, f64::MAX),
            ("breakEven", self.break_even, 0.0, 100.0),
            ("payoutPerPoint", self.payout_per_point, 0.0, f64::MAX),
            ("fanMultiplier", self.fan_multiplier, 0.0, f64::MAX),
            ("stageBonus", self.stage_bonus, 0.0, 1.0),
        ];
        for (field, value, min, max) in checks {
            if !value.is_finite() || value < min || value > max {
                return Err(ConfigError::VenueField {
                    venue: id,
                    field,
                    value,
                });
            }
        }
        if !(0..=50).contains(&self.variance_range) {
            return Err(ConfigError::VenueVariance {
                venue: id,
                value: self.variance_range,
            });
        }
        if self.tip_floor.is_some_and(|floor| floor < 0) {
            return Err(ConfigError::VenueField {
                venue: id,
                field: "tipFloor",
                value: i64_to_f64(self.tip_floor.unwrap_or_default()),
            });
        }
        Ok(())
    }
}

/// Money and fans settled for one performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payout {
    pub money: i64,
    pub fans: u64,
    /// The onboarding floor lifted the result.
    pub guardrail_applied: bool,
    /// The no-risk tip floor lifted the result.
    pub tip_floor_applied: bool,
}

/// Apply a multiplier to raw economics, then the tip floor and the onboarding guardrail.
pub(crate) fn settle(
    venue: &Venue,
    raw_net: f64,
    raw_fans: f64,
    multiplier: f64,
    week: u32,
) -> Payout {
    let mut money = floor_f64_to_i64(raw_net * multiplier);
    let fans = round_f64_to_u64(raw_fans * multiplier);
    let mut tip_floor_applied = false;
    let mut guardrail_applied = false;

    if venue.is_no_risk() {
        let floor = venue.tip_floor.unwrap_or(0);
        if money < floor {
            money = floor;
            tip_floor_applied = true;
        }
    }
    if week <= ONBOARDING_WEEKS && money < ONBOARDING_MONEY_FLOOR {
        money = ONBOARDING_MONEY_FLOOR;
        guardrail_applied = true;
    }

    Payout {
        money,
        fans,
        guardrail_applied,
        tip_floor_applied,
    }
}

/// Money and fans earned by releasing a song with `score` at `venue`.
#[must_use]
pub fn venue_payout(venue: &Venue, score: f64, grade: Grade, fans: u64, week: u32) -> Payout {
    settle(
        venue,
        venue.raw_net(score),
        venue.raw_fans_gain(grade, fans),
        1.0,
        week,
    )
}

/// The venue roster, keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueTable {
    venues: BTreeMap<VenueId, Venue>,
}

impl Default for VenueTable {
    fn default() -> Self {
        Self::default_table()
    }
}

impl VenueTable {
    #[must_use]
    pub fn default_table() -> Self {
        let venues = BTreeMap::from([
            (
                VenueId::Street,
                Venue {
                    cost: 0.0,
                    break_even: 0.0,
                    payout_per_point: 0.2,
                    fan_multiplier: 0.6,
                    variance_range: 2,
                    tip_floor: Some(5),
                    fan_requirement: 0,
                    stage_bonus: BUSK_STAGE_BONUS,
                },
            ),
            (
                VenueId::OpenMic,
                Venue {
                    cost: 10.0,
                    break_even: 45.0,
                    payout_per_point: 1.0,
                    fan_multiplier: 1.0,
                    variance_range: 4,
                    tip_floor: None,
                    fan_requirement: 0,
                    stage_bonus: 0.0,
                },
            ),
            (
                VenueId::Club,
                Venue {
                    cost: 20.0,
                    break_even: 60.0,
                    payout_per_point: 1.3,
                    fan_multiplier: 1.3,
                    variance_range: 6,
                    tip_floor: None,
                    fan_requirement: 50,
                    stage_bonus: 0.0,
                },
            ),
            (
                VenueId::Theater,
                Venue {
                    cost: 60.0,
                    break_even: 70.0,
                    payout_per_point: 3.0,
                    fan_multiplier: 1.8,
                    variance_range: 8,
                    tip_floor: None,
                    fan_requirement: 250,
                    stage_bonus: 0.0,
                },
            ),
            (
                VenueId::Arena,
                Venue {
                    cost: 200.0,
                    break_even: 80.0,
                    payout_per_point: 9.0,
                    fan_multiplier: 2.6,
                    variance_range: 12,
                    tip_floor: None,
                    fan_requirement: 1_000,
                    stage_bonus: 0.0,
                },
            ),
        ]);
        Self { venues }
    }

    #[must_use]
    pub fn get(&self, id: VenueId) -> Option<&Venue> {
        self.venues.get(&id)
    }

    pub fn insert(&mut self, id: VenueId, venue: Venue) {
        self.venues.insert(id, venue);
    }

    pub fn iter(&self) -> impl Iterator<Item = (VenueId, &Venue)> {
        self.venues.iter().map(|(id, venue)| (*id, venue))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Venues whose fan requirement lies in `(before, after]`.
    #[must_use]
    pub fn newly_unlocked(&self, before: u64, after: u64) -> Vec<VenueId> {
        self.iter()
            .filter(|(_, venue)| venue.fan_requirement > before && venue.fan_requirement <= after)
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.venues.is_empty() {
            return Err(ConfigError::NoVenues);
        }
        for (id, venue) in self.iter() {
            venue.validate(id)?;
        }
        Ok(())
    }
}
