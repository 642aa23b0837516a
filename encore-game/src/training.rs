//! Diminishing-returns training.
//!
//! The n-th session of the same activity within a week yields
//! `0.15 * max(0.3, 0.85^(n-1))`. Gains are clamped by the stat ceiling.
use crate::constants::{TRAINING_BASE_GAIN, TRAINING_DECAY, TRAINING_FLOOR, TRIAD_STAT_DIVISOR};
use crate::plan::{DayEntry, DayKind};
use crate::stats::{Activity, PerformerStats, StatDelta};

/// Effectiveness of the `ordinal`-th repetition (1-based) of an activity this week.
#[must_use]
pub fn diminish_factor(ordinal: u32) -> f64 {
    let exponent = i32::try_from(ordinal.saturating_sub(1)).unwrap_or(i32::MAX);
    TRAINING_DECAY.powi(exponent).max(TRAINING_FLOOR)
}

/// Raw stat gain for the `ordinal`-th repetition, before clamping.
#[must_use]
pub fn training_gain(ordinal: u32) -> f64 {
    TRAINING_BASE_GAIN * diminish_factor(ordinal)
}

/// Contribution of one day to the legacy triad sum for a skill value.
#[must_use]
pub fn triad_contribution(stat: f64) -> f64 {
    1.0 + stat / TRIAD_STAT_DIVISOR
}

/// Apply one training day to `stats` and describe it as a plan entry.
///
/// `ordinal` is the 1-based count of this activity this week, including
/// the day being applied.
pub fn apply_training(stats: &mut PerformerStats, activity: Activity, ordinal: u32) -> DayEntry {
    let skill = activity.skill();
    let applied = stats.raise(skill, training_gain(ordinal));
    DayEntry {
        kind: DayKind::from(activity),
        delta: StatDelta::only(skill, applied),
        triad_contribution: triad_contribution(stats.get(skill)),
        gig_release: None,
    }
}
