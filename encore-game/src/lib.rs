//! Encore Career Engine
//!
//! Platform-agnostic progression and economy logic for the Encore music-career
//! game: training, skill checks, release scoring, venue and gig economics, and
//! versioned saves. Rendering and content layers sit outside this crate.

pub mod compat;
pub mod config;
pub mod constants;
pub mod dice;
pub mod events;
pub mod gig;
pub mod numbers;
pub mod plan;
pub mod release;
pub mod rng;
pub mod save;
pub mod schedule;
pub mod scoring;
pub mod seed;
pub mod session;
pub mod state;
pub mod stats;
pub mod training;
pub mod venue;

// Re-export commonly used types
pub use compat::{CompatibilityRating, CompatibilityTable, Genre, Theme, expected_bonus, realized_bonus};
pub use config::{CareerConfig, ConfigError};
pub use dice::{DiceBest, DiceResult, DiceRetention, DieUpgrade, die_faces, next_upgrade, roll_check};
pub use events::{CareerEvent, ToastLevel};
pub use gig::{GigModifiers, freshness, gig_payout, gig_stat_gain, repetition_factor, soft_cap};
pub use plan::{DayEntry, DayKind, WeekPlan};
pub use release::{GigEvent, ReleaseRecord, SongConcept, compose_feedback};
pub use rng::{CountingRng, RngBundle, RollDomain, Roller, ScriptedRoller, StreamRoller};
pub use save::{
    LoadReport, MemoryStore, SaveError, SaveStore, load_state, load_with_report, serialize_state,
};
pub use schedule::{ClockScheduler, ImmediateScheduler, ManualScheduler, ScheduledTask, Scheduler};
pub use scoring::{
    Forecast, Grade, ScoreBreakdown, ScoreInputs, ScoringMode, chart_position, fan_boost,
    forecast, score_release,
};
pub use seed::{encode_friendly, generate_code_from_entropy, parse_share_code};
pub use session::CareerSession;
pub use state::{ActionError, CareerRules, CareerState, Phase, Transition};
pub use stats::{Activity, PerformerStats, Skill, StatDelta};
pub use training::{apply_training, diminish_factor, training_gain, triad_contribution};
pub use venue::{Payout, Venue, VenueId, VenueTable, venue_payout};

/// Career engine binding validated rules to a save store.
pub struct CareerEngine<S>
where
    S: SaveStore,
{
    rules: CareerRules,
    storage: S,
}

impl<S> CareerEngine<S>
where
    S: SaveStore,
{
    /// Create an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration violates an invariant.
    pub fn new(config: CareerConfig, storage: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rules: CareerRules::new(config),
            storage,
        })
    }

    /// Slot key used by `resume_default_session`.
    pub const DEFAULT_SLOT: &'static str = constants::SAVE_KEY;

    #[must_use]
    pub const fn rules(&self) -> &CareerRules {
        &self.rules
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Start a fresh career bound to `slot`.
    #[must_use]
    pub fn create_session<C: Scheduler>(
        &self,
        slot: &str,
        seed: u64,
        scheduler: C,
    ) -> CareerSession<&S, C> {
        CareerSession::new(self.rules.clone(), seed, &self.storage, scheduler, slot)
    }

    /// Resume the career in `slot`, or start fresh if it is missing or corrupt.
    #[must_use]
    pub fn resume_session<C: Scheduler>(
        &self,
        slot: &str,
        seed: u64,
        scheduler: C,
    ) -> CareerSession<&S, C> {
        CareerSession::load(self.rules.clone(), seed, &self.storage, scheduler, slot)
    }

    /// Resume the single-career slot hosts use when they keep one save.
    #[must_use]
    pub fn resume_default_session<C: Scheduler>(
        &self,
        seed: u64,
        scheduler: C,
    ) -> CareerSession<&S, C> {
        self.resume_session(Self::DEFAULT_SLOT, seed, scheduler)
    }

    /// Save a career state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be encoded or written.
    pub fn save_state(&self, slot: &str, state: &CareerState) -> anyhow::Result<()> {
        let blob = serialize_state(state)?;
        self.storage.write(slot, &blob)?;
        Ok(())
    }

    /// Load a career state. Corrupt blobs load as a fresh career; only store
    /// failures are reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    pub fn load_state(&self, slot: &str) -> anyhow::Result<Option<CareerState>> {
        Ok(self.storage.read(slot)?.map(|blob| load_state(&blob)))
    }

    /// Delete saved career
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_slot(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.remove(slot)
    }
}
