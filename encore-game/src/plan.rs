//! The week's day-entry log.
//!
//! Per-week counters (gains, gig count, activity repetitions) are always
//! derived from the entries rather than tracked separately.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::constants::{DAYS_PER_WEEK, MAX_GIGS_PER_WEEK};
use crate::stats::{Activity, StatDelta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    Practice,
    Write,
    Perform,
    Gig,
}

impl DayKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Write => "write",
            Self::Perform => "perform",
            Self::Gig => "gig",
        }
    }
}

impl From<Activity> for DayKind {
    fn from(value: Activity) -> Self {
        match value {
            Activity::Practice => Self::Practice,
            Activity::Write => Self::Write,
            Activity::Perform => Self::Perform,
        }
    }
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One spent day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    #[serde(rename = "type")]
    pub kind: DayKind,
    #[serde(default)]
    pub delta: StatDelta,
    /// Legacy-mode song contribution; zero for gig days.
    #[serde(default)]
    pub triad_contribution: f64,
    /// Release week of the song replayed on a gig day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gig_release: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekPlan {
    entries: SmallVec<[DayEntry; DAYS_PER_WEEK]>,
}

impl WeekPlan {
    #[must_use]
    pub fn entries(&self) -> &[DayEntry] {
        &self.entries
    }

    pub(crate) fn push(&mut self, entry: DayEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries beyond the weekly budget (used when loading damaged saves).
    pub(crate) fn truncate_to_budget(&mut self) {
        self.entries.truncate(DAYS_PER_WEEK);
        let mut gigs = 0;
        self.entries.retain(|entry| {
            if entry.kind != DayKind::Gig {
                return true;
            }
            gigs += 1;
            gigs <= MAX_GIGS_PER_WEEK
        });
    }

    #[must_use]
    pub fn days_used(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn days_remaining(&self) -> usize {
        DAYS_PER_WEEK.saturating_sub(self.entries.len())
    }

    /// Canonical weekly gig count used by the cap, the soft cap and gig training.
    #[must_use]
    pub fn gigs_this_week(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == DayKind::Gig)
            .count()
    }

    #[must_use]
    pub fn count_of(&self, activity: Activity) -> usize {
        let kind = DayKind::from(activity);
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    /// Number of gig days this week that replayed the given release.
    #[must_use]
    pub fn gigs_for(&self, release_week: u32) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == DayKind::Gig && entry.gig_release == Some(release_week))
            .count()
    }

    /// Stat gains accumulated this week.
    #[must_use]
    pub fn weekly_gains(&self) -> StatDelta {
        self.entries
            .iter()
            .fold(StatDelta::default(), |acc, entry| acc.plus(entry.delta))
    }

    /// Sum of the legacy triad contributions of every day.
    #[must_use]
    pub fn triad_total(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.triad_contribution)
            .sum()
    }
}
