//! Notifications emitted by career transitions.
//!
//! Rendering, reward and dialogue layers consume these instead of polling
//! state diffs. Toasts carry a stable key for presentation lookup.
use serde::{Deserialize, Serialize};

use crate::release::{GigEvent, ReleaseRecord};
use crate::stats::StatDelta;
use crate::venue::VenueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CareerEvent {
    /// Stats moved by training, a gig or the busking bonus.
    StatsChanged { delta: StatDelta },
    /// Cumulative fans crossed a venue's requirement.
    VenueUnlocked { venue: VenueId },
    Toast { level: ToastLevel, key: String },
    /// The presentation delay started for a release at `venue`.
    PerformanceStarted { venue: VenueId },
    ReleaseCompleted { record: Box<ReleaseRecord> },
    GigCompleted { release_week: u32, gig: GigEvent },
    /// The week-52 release is in; only a restart is accepted from here.
    SeasonOver { money: i64, fans: u64 },
    Restarted,
}

impl CareerEvent {
    #[must_use]
    pub fn toast(level: ToastLevel, key: &str) -> Self {
        Self::Toast {
            level,
            key: key.to_string(),
        }
    }

    #[must_use]
    pub const fn is_toast(&self) -> bool {
        matches!(self, Self::Toast { .. })
    }
}
