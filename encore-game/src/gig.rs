//! Gig replays of released songs.
//!
//! A gig reuses a release's stored score and grade at a venue and scales the
//! venue economics by freshness, repetition and the weekly soft cap. The
//! tip floor and onboarding guardrail apply after scaling.
use serde::{Deserialize, Serialize};

use crate::constants::{
    GIG_FRESHNESS_DECAY, GIG_FRESHNESS_FLOOR, GIG_NO_RISK_BOOST, GIG_REPETITION,
    GIG_REPETITION_FLOOR, GIG_SOFT_CAP, GIG_STAGE_GAIN, GIG_VOCAL_GAIN, MAX_GIGS_PER_WEEK,
};
use crate::release::ReleaseRecord;
use crate::stats::StatDelta;
use crate::training::diminish_factor;
use crate::venue::{Payout, Venue, settle};

/// Freshness multiplier: loses a tenth per week since release, floored at one half.
#[must_use]
pub fn freshness(weeks_since_release: u32) -> f64 {
    (1.0 - GIG_FRESHNESS_DECAY * f64::from(weeks_since_release)).max(GIG_FRESHNESS_FLOOR)
}

/// Multiplier for the `play`-th (1-based) gig of the same song this week.
#[must_use]
pub fn repetition_factor(play: usize) -> f64 {
    GIG_REPETITION
        .get(play.saturating_sub(1))
        .copied()
        .unwrap_or(GIG_REPETITION_FLOOR)
}

/// Weekly soft cap given the gig count including the one being booked.
#[must_use]
pub fn soft_cap(weekly_gigs: usize) -> f64 {
    if weekly_gigs >= MAX_GIGS_PER_WEEK {
        GIG_SOFT_CAP
    } else {
        1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigModifiers {
    pub freshness: f64,
    pub repetition: f64,
    pub soft_cap: f64,
}

impl GigModifiers {
    /// Modifiers for a gig booked in `week` replaying the song released in
    /// `release_week`. `song_play` and `weekly_gig` are 1-based and include
    /// the gig being booked.
    #[must_use]
    pub fn for_booking(week: u32, release_week: u32, song_play: usize, weekly_gig: usize) -> Self {
        Self {
            freshness: freshness(week.saturating_sub(release_week)),
            repetition: repetition_factor(song_play),
            soft_cap: soft_cap(weekly_gig),
        }
    }

    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.freshness * self.repetition * self.soft_cap
    }

    #[must_use]
    pub fn soft_capped(&self) -> bool {
        self.soft_cap < 1.0
    }
}

/// Money and fans for replaying `record` at `venue`.
#[must_use]
pub fn gig_payout(
    venue: &Venue,
    record: &ReleaseRecord,
    fans: u64,
    week: u32,
    modifiers: &GigModifiers,
) -> Payout {
    settle(
        venue,
        venue.raw_net(record.score),
        venue.raw_fans_gain(record.grade, fans),
        modifiers.multiplier(),
        week,
    )
}

/// Training side effect of the `weekly_gig`-th gig this week. No-risk venues
/// boost the gain, and a venue's flat stage bonus is added on top.
#[must_use]
pub fn gig_stat_gain(venue: &Venue, weekly_gig: usize) -> StatDelta {
    let ordinal = u32::try_from(weekly_gig).unwrap_or(u32::MAX);
    let boost = if venue.is_no_risk() {
        GIG_NO_RISK_BOOST
    } else {
        1.0
    };
    let factor = diminish_factor(ordinal) * boost;
    StatDelta {
        vocals: GIG_VOCAL_GAIN * factor,
        writing: 0.0,
        stage: GIG_STAGE_GAIN * factor + venue.stage_bonus,
    }
}
