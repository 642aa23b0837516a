//! Release scoring.
//!
//! The final score combines a quality base (dice checks or the legacy triad
//! sum), the realized pairing bonus and bounded noise, clamped to `[0, 100]`.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::compat::{CompatibilityRating, expected_bonus, realized_bonus};
use crate::constants::{
    BASE_NOISE, CHART_BASE, CHART_JITTER, CHART_MAX, CHART_MIN, FAN_BOOST_CAP, FAN_BOOST_OFFSET,
    FAN_BOOST_SCALE, FANS_GAIN_A, FANS_GAIN_B, FANS_GAIN_C, FANS_GAIN_D, FANS_GAIN_S, GRADE_A,
    GRADE_B, GRADE_C, GRADE_S, LEGACY_DAMPENER_START, LEGACY_DAMPENER_STEP, LEGACY_TRIAD_SCALE,
    SCORE_MAX, SCORE_MIN, WEIGHT_PERFORM, WEIGHT_SING, WEIGHT_WRITE,
};
use crate::dice::DiceBest;
use crate::numbers::{round_f64_to_i64, u64_to_f64};
use crate::rng::{RollDomain, Roller};
use crate::stats::Skill;
use crate::venue::Venue;

/// How the quality base of a release is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Weighted skill-check dice.
    #[default]
    Dice,
    /// Summed daily triad contributions with an early-season dampener.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const ALL: [Self; 5] = [Self::S, Self::A, Self::B, Self::C, Self::D];

    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= GRADE_S {
            Self::S
        } else if score >= GRADE_A {
            Self::A
        } else if score >= GRADE_B {
            Self::B
        } else if score >= GRADE_C {
            Self::C
        } else {
            Self::D
        }
    }

    /// Base fan gain before venue multiplier and fan carry-over.
    #[must_use]
    pub const fn fans_gain(self) -> f64 {
        match self {
            Self::S => FANS_GAIN_S,
            Self::A => FANS_GAIN_A,
            Self::B => FANS_GAIN_B,
            Self::C => FANS_GAIN_C,
            Self::D => FANS_GAIN_D,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn skill_weight(skill: Skill) -> f64 {
    match skill {
        Skill::Sing => WEIGHT_SING,
        Skill::Write => WEIGHT_WRITE,
        Skill::Perform => WEIGHT_PERFORM,
    }
}

/// Weighted dice quality scaled to `[0, 100]`. Unresolved skills count as zero.
#[must_use]
pub fn dice_quality(dice: &DiceBest) -> f64 {
    Skill::ALL
        .into_iter()
        .map(|skill| dice.get(skill).map_or(0.0, |r| r.quality()) * skill_weight(skill))
        .sum::<f64>()
        * 100.0
}

/// Early-season multiplier for legacy scoring: 0.75 in week 1, 1.0 from week 6.
#[must_use]
pub fn legacy_dampener(week: u32) -> f64 {
    let elapsed = f64::from(week.max(1) - 1);
    (LEGACY_DAMPENER_START + LEGACY_DAMPENER_STEP * elapsed).min(1.0)
}

/// Legacy triad quality, clamped to `[0, 100]`.
#[must_use]
pub fn legacy_quality(triad_total: f64, week: u32) -> f64 {
    clamp_score(triad_total * LEGACY_TRIAD_SCALE * legacy_dampener(week))
}

#[must_use]
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return SCORE_MIN;
    }
    score.clamp(SCORE_MIN, SCORE_MAX)
}

/// Chart advantage from an existing audience, capped at 40 places.
#[must_use]
pub fn fan_boost(fans: u64) -> f64 {
    let audience = u64_to_f64(fans) + FAN_BOOST_OFFSET;
    (audience.log10() * FAN_BOOST_SCALE).floor().min(FAN_BOOST_CAP)
}

/// Chart position in `[1, 100]`; lower is better.
pub fn chart_position<R: Roller + ?Sized>(score: f64, fans: u64, roller: &mut R) -> u32 {
    let jitter = roller.roll(RollDomain::Chart, -CHART_JITTER, CHART_JITTER);
    let raw = (CHART_BASE - score) - fan_boost(fans) + f64::from(jitter);
    let position = round_f64_to_i64(raw).clamp(i64::from(CHART_MIN), i64::from(CHART_MAX));
    u32::try_from(position).unwrap_or(CHART_MAX)
}

/// Everything the scorer needs about the week.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs<'a> {
    pub mode: ScoringMode,
    pub dice: &'a DiceBest,
    pub triad_total: f64,
    pub week: u32,
    pub rating: CompatibilityRating,
    pub venue: &'a Venue,
    pub fans: u64,
}

impl ScoreInputs<'_> {
    #[must_use]
    pub fn quality_base(&self) -> f64 {
        match self.mode {
            ScoringMode::Dice => dice_quality(self.dice),
            ScoringMode::Legacy => legacy_quality(self.triad_total, self.week),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub quality: f64,
    pub compat_bonus: i32,
    pub base_noise: i32,
    pub venue_noise: i32,
    pub score: f64,
    pub grade: Grade,
    pub chart_pos: u32,
}

/// Score a release. Draw order: pairing gamble (risky pairs only), base
/// noise, venue noise, chart jitter.
pub fn score_release<R: Roller + ?Sized>(inputs: &ScoreInputs<'_>, roller: &mut R) -> ScoreBreakdown {
    let quality = inputs.quality_base();
    let compat_bonus = realized_bonus(inputs.rating, roller);
    let base_noise = roller.roll(RollDomain::Noise, -BASE_NOISE, BASE_NOISE);
    let variance = inputs.venue.variance_range.max(0);
    let venue_noise = roller.roll(RollDomain::Noise, -variance, variance);
    let score = clamp_score(
        quality + f64::from(compat_bonus) + f64::from(base_noise) + f64::from(venue_noise),
    );
    let chart_pos = chart_position(score, inputs.fans, roller);
    ScoreBreakdown {
        quality,
        compat_bonus,
        base_noise,
        venue_noise,
        score,
        grade: Grade::from_score(score),
        chart_pos,
    }
}

/// Deterministic preview of a release at a venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub expected: f64,
    pub low: f64,
    pub high: f64,
    pub grade: Grade,
}

/// Expected score and noise envelope, without drawing from any RNG.
#[must_use]
pub fn forecast(inputs: &ScoreInputs<'_>) -> Forecast {
    let expected_raw = inputs.quality_base() + f64::from(expected_bonus(inputs.rating));
    let spread = f64::from(BASE_NOISE + inputs.venue.variance_range.max(0));
    let expected = clamp_score(expected_raw);
    Forecast {
        expected,
        low: clamp_score(expected_raw - spread),
        high: clamp_score(expected_raw + spread),
        grade: Grade::from_score(expected),
    }
}
