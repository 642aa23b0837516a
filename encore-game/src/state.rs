//! Career state and the weekly lifecycle.
//!
//! Every player action is a pure transition: it takes the current state, the
//! rules and an RNG, and returns either a new state plus the notifications it
//! produced, or the reason the action was rejected. The current state is
//! never modified in place.
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::compat::{CompatibilityTable, Genre, Theme};
use crate::config::CareerConfig;
use crate::constants::{
    MAX_GIGS_PER_WEEK, SEASON_LENGTH, TOAST_CONCEPT_LOCKED, TOAST_GIG_SOFT_CAP, TOAST_GUARDRAIL,
    TOAST_SEASON_OVER, TOAST_SONG_FINISHED, TOAST_TIP_FLOOR, TOAST_WEEK_DONE,
};
use crate::dice::{DiceBest, roll_check};
use crate::events::{CareerEvent, ToastLevel};
use crate::gig::{GigModifiers, gig_payout, gig_stat_gain};
use crate::plan::{DayEntry, DayKind, WeekPlan};
use crate::release::{GigEvent, ReleaseRecord, SongConcept, compose_feedback};
use crate::rng::Roller;
use crate::scoring::{Forecast, ScoreInputs, ScoringMode, forecast, score_release};
use crate::stats::{Activity, PerformerStats, Skill, StatDelta};
use crate::training::apply_training;
use crate::venue::{Payout, Venue, VenueId, venue_payout};

/// Everything a transition needs besides the state itself.
#[derive(Debug, Clone)]
pub struct CareerRules {
    pub config: CareerConfig,
    pub compat: CompatibilityTable,
}

impl Default for CareerRules {
    fn default() -> Self {
        Self::new(CareerConfig::default_config())
    }
}

impl CareerRules {
    #[must_use]
    pub fn new(config: CareerConfig) -> Self {
        Self {
            config,
            compat: CompatibilityTable::default_table(),
        }
    }

    #[must_use]
    pub fn with_compat(mut self, compat: CompatibilityTable) -> Self {
        self.compat = compat;
        self
    }
}

/// Why an action was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("the season is over")]
    SeasonOver,
    #[error("a release is already being performed")]
    ReleaseInFlight,
    #[error("no release is being performed")]
    NotPerforming,
    #[error("no song concept chosen")]
    NoConcept,
    #[error("the concept is locked for this week")]
    ConceptLocked,
    #[error("the concept has not been locked yet")]
    ConceptNotLocked,
    #[error("no days left this week")]
    NoDaysLeft,
    #[error("{remaining} day(s) still unspent")]
    DaysRemaining { remaining: usize },
    #[error("the song is already finished")]
    AlreadyFinished,
    #[error("the song is not finished")]
    NotFinished,
    #[error("unknown venue {0}")]
    UnknownVenue(VenueId),
    #[error("{venue} needs {required} fans (have {fans})")]
    VenueLocked {
        venue: VenueId,
        required: u64,
        fans: u64,
    },
    #[error("weekly gig cap reached")]
    GigCapReached,
    #[error("no release from week {0}")]
    UnknownRelease(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Choosing a concept for the week.
    Planning,
    /// Concept locked; days are being spent.
    InProgress,
    /// Song finished; waiting for a venue.
    Finished,
    /// Venue chosen; the outcome is pending behind the presentation delay.
    Performing,
    SeasonOver,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
            Self::Performing => "performing",
            Self::SeasonOver => "season_over",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful action.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: CareerState,
    pub events: Vec<CareerEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CareerState {
    /// Season week in `[1, 52]`.
    pub week: u32,
    pub money: i64,
    pub fans: u64,
    pub stats: PerformerStats,
    pub plan: WeekPlan,
    pub concept: Option<SongConcept>,
    pub concept_locked: bool,
    /// Most recent release first.
    pub history: Vec<ReleaseRecord>,
    pub dice_best: DiceBest,
    pub finished_ready: bool,
    /// Cosmetic unlock flags owned by other layers; carried through saves untouched.
    pub flags: BTreeMap<String, bool>,
    /// Venue of the release in flight. Never persisted.
    pub performing: Option<VenueId>,
}

impl Default for CareerState {
    fn default() -> Self {
        Self::new()
    }
}

impl CareerState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            week: 1,
            money: 0,
            fans: 0,
            stats: PerformerStats::default(),
            plan: WeekPlan::default(),
            concept: None,
            concept_locked: false,
            history: Vec::new(),
            dice_best: DiceBest::default(),
            finished_ready: false,
            flags: BTreeMap::new(),
            performing: None,
        }
    }

    /// The season ends once the final week's release is in.
    #[must_use]
    pub fn is_season_over(&self) -> bool {
        self.history
            .first()
            .is_some_and(|record| record.week >= SEASON_LENGTH)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.is_season_over() {
            Phase::SeasonOver
        } else if self.performing.is_some() {
            Phase::Performing
        } else if !self.concept_locked {
            Phase::Planning
        } else if self.finished_ready {
            Phase::Finished
        } else {
            Phase::InProgress
        }
    }

    #[must_use]
    pub fn days_remaining(&self) -> usize {
        self.plan.days_remaining()
    }

    #[must_use]
    pub fn release(&self, release_week: u32) -> Option<&ReleaseRecord> {
        self.history
            .iter()
            .find(|record| record.release_week == release_week)
    }

    /// Venues the current audience can book.
    #[must_use]
    pub fn open_venues(&self, rules: &CareerRules) -> Vec<VenueId> {
        rules
            .config
            .venues
            .iter()
            .filter(|(_, venue)| venue.is_open_to(self.fans))
            .map(|(id, _)| id)
            .collect()
    }

    /// Deterministic score preview for releasing now at `venue`.
    #[must_use]
    pub fn forecast(&self, rules: &CareerRules, venue: VenueId) -> Option<Forecast> {
        let concept = self.concept.as_ref()?;
        let venue = rules.config.venues.get(venue)?;
        Some(forecast(&self.score_inputs(rules, concept, venue)))
    }

    fn score_inputs<'a>(
        &'a self,
        rules: &CareerRules,
        concept: &SongConcept,
        venue: &'a Venue,
    ) -> ScoreInputs<'a> {
        ScoreInputs {
            mode: rules.config.scoring_mode,
            dice: &self.dice_best,
            triad_total: self.plan.triad_total(),
            week: self.week,
            rating: rules.compat.rating(concept.genre, concept.theme),
            venue,
            fans: self.fans,
        }
    }

    fn ensure_active(&self) -> Result<(), ActionError> {
        if self.is_season_over() {
            return Err(ActionError::SeasonOver);
        }
        if self.performing.is_some() {
            return Err(ActionError::ReleaseInFlight);
        }
        Ok(())
    }

    fn ensure_day_available(&self) -> Result<(), ActionError> {
        self.ensure_active()?;
        if !self.concept_locked {
            return Err(ActionError::ConceptNotLocked);
        }
        if self.finished_ready {
            return Err(ActionError::AlreadyFinished);
        }
        if self.plan.days_remaining() == 0 {
            return Err(ActionError::NoDaysLeft);
        }
        Ok(())
    }

    fn open_venue<'r>(&self, rules: &'r CareerRules, id: VenueId) -> Result<&'r Venue, ActionError> {
        let venue = rules
            .config
            .venues
            .get(id)
            .ok_or(ActionError::UnknownVenue(id))?;
        if !venue.is_open_to(self.fans) {
            return Err(ActionError::VenueLocked {
                venue: id,
                required: venue.fan_requirement,
                fans: self.fans,
            });
        }
        Ok(venue)
    }

    /// Pick the week's genre, theme and title.
    ///
    /// # Errors
    ///
    /// Rejected once the concept is locked or the season is over.
    pub fn choose_concept(
        &self,
        genre: Genre,
        theme: Theme,
        name: &str,
    ) -> Result<Transition, ActionError> {
        self.ensure_active()?;
        if self.concept_locked {
            return Err(ActionError::ConceptLocked);
        }
        let mut next = self.clone();
        next.concept = Some(SongConcept::new(genre, theme, name));
        Ok(Transition {
            state: next,
            events: Vec::new(),
        })
    }

    /// Commit to the chosen concept and open the week's day budget.
    ///
    /// # Errors
    ///
    /// Rejected without a concept, when already locked, or after the season.
    pub fn lock_concept(&self) -> Result<Transition, ActionError> {
        self.ensure_active()?;
        if self.concept_locked {
            return Err(ActionError::ConceptLocked);
        }
        if self.concept.is_none() {
            return Err(ActionError::NoConcept);
        }
        let mut next = self.clone();
        next.concept_locked = true;
        Ok(Transition {
            state: next,
            events: vec![CareerEvent::toast(ToastLevel::Info, TOAST_CONCEPT_LOCKED)],
        })
    }

    /// Spend one day training. In dice mode the trained skill is checked
    /// with the die for its post-gain value.
    ///
    /// # Errors
    ///
    /// Rejected unless the week is in progress with a day to spare.
    pub fn train<R: Roller + ?Sized>(
        &self,
        rules: &CareerRules,
        activity: Activity,
        roller: &mut R,
    ) -> Result<Transition, ActionError> {
        self.ensure_day_available()?;
        let mut next = self.clone();
        let mut events = Vec::new();

        let ordinal = u32::try_from(next.plan.count_of(activity) + 1).unwrap_or(u32::MAX);
        let entry = apply_training(&mut next.stats, activity, ordinal);
        next.plan.push(entry);
        if !entry.delta.is_zero() {
            events.push(CareerEvent::StatsChanged { delta: entry.delta });
        }

        if rules.config.scoring_mode == ScoringMode::Dice {
            let skill = activity.skill();
            let result = roll_check(next.stats.get(skill), roller);
            next.dice_best
                .record(skill, result, rules.config.dice_retention);
            debug!(
                "week {} {activity} #{ordinal}: d{} rolled {}",
                next.week, result.faces, result.value
            );
        }

        if next.plan.days_remaining() == 0 {
            events.push(CareerEvent::toast(ToastLevel::Info, TOAST_WEEK_DONE));
        }
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Wrap up the week's song once every day is spent.
    ///
    /// # Errors
    ///
    /// Rejected while days remain or when the song is already finished.
    pub fn finish_song(&self) -> Result<Transition, ActionError> {
        self.ensure_active()?;
        if !self.concept_locked {
            return Err(ActionError::ConceptNotLocked);
        }
        if self.finished_ready {
            return Err(ActionError::AlreadyFinished);
        }
        let remaining = self.plan.days_remaining();
        if remaining > 0 {
            return Err(ActionError::DaysRemaining { remaining });
        }
        let mut next = self.clone();
        next.finished_ready = true;
        Ok(Transition {
            state: next,
            events: vec![CareerEvent::toast(ToastLevel::Success, TOAST_SONG_FINISHED)],
        })
    }

    /// Choose a venue and enter the performing state.
    ///
    /// # Errors
    ///
    /// Rejected unless the song is finished and the venue is open to the
    /// current audience.
    pub fn begin_release(
        &self,
        rules: &CareerRules,
        venue: VenueId,
    ) -> Result<Transition, ActionError> {
        self.ensure_active()?;
        if self.phase() != Phase::Finished {
            return Err(ActionError::NotFinished);
        }
        self.open_venue(rules, venue)?;
        let mut next = self.clone();
        next.performing = Some(venue);
        Ok(Transition {
            state: next,
            events: vec![CareerEvent::PerformanceStarted { venue }],
        })
    }

    /// Score the release in flight, settle the venue economics and roll the
    /// week over.
    ///
    /// # Errors
    ///
    /// Rejected when nothing is being performed.
    pub fn resolve_release<R: Roller + ?Sized>(
        &self,
        rules: &CareerRules,
        roller: &mut R,
    ) -> Result<Transition, ActionError> {
        let venue_id = self.performing.ok_or(ActionError::NotPerforming)?;
        let venue = rules
            .config
            .venues
            .get(venue_id)
            .ok_or(ActionError::UnknownVenue(venue_id))?;
        let concept = self.concept.as_ref().ok_or(ActionError::NoConcept)?;

        let inputs = self.score_inputs(rules, concept, venue);
        let breakdown = score_release(&inputs, roller);
        let payout = venue_payout(venue, breakdown.score, breakdown.grade, self.fans, self.week);
        debug!(
            "week {} release at {venue_id}: quality {:.1} bonus {} noise {}/{} -> {:.1} ({}) chart #{}",
            self.week,
            breakdown.quality,
            breakdown.compat_bonus,
            breakdown.base_noise,
            breakdown.venue_noise,
            breakdown.score,
            breakdown.grade,
            breakdown.chart_pos,
        );

        let mut next = self.clone();
        let mut events = Vec::new();

        if venue.stage_bonus > 0.0 {
            let applied = next.stats.raise(Skill::Perform, venue.stage_bonus);
            if applied > 0.0 {
                events.push(CareerEvent::StatsChanged {
                    delta: StatDelta::only(Skill::Perform, applied),
                });
            }
        }
        next.credit(rules, &payout, &mut events);

        let record = ReleaseRecord {
            week: self.week,
            release_week: self.week,
            song_name: concept.name.clone(),
            genre: concept.genre,
            theme: concept.theme,
            venue: venue_id,
            score: breakdown.score,
            grade: breakdown.grade,
            chart_pos: breakdown.chart_pos,
            money_gain: payout.money,
            fans_gain: payout.fans,
            feedback: compose_feedback(concept, &breakdown, &self.dice_best, inputs.rating),
            gigs: Vec::new(),
        };
        info!(
            "week {} released \"{}\" at {venue_id}: {} ({:.1}), money {:+}, fans +{}",
            record.week, record.song_name, record.grade, record.score, record.money_gain, record.fans_gain
        );
        next.history.insert(0, record.clone());
        events.push(CareerEvent::ReleaseCompleted {
            record: Box::new(record),
        });

        next.plan.clear();
        next.dice_best.clear();
        next.concept_locked = false;
        next.finished_ready = false;
        next.performing = None;
        if next.week >= SEASON_LENGTH {
            info!("season over: money {} fans {}", next.money, next.fans);
            events.push(CareerEvent::toast(ToastLevel::Success, TOAST_SEASON_OVER));
            events.push(CareerEvent::SeasonOver {
                money: next.money,
                fans: next.fans,
            });
        } else {
            next.week += 1;
        }

        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Choose a venue and resolve the release in one step.
    ///
    /// # Errors
    ///
    /// Same guards as [`CareerState::begin_release`].
    pub fn perform_release<R: Roller + ?Sized>(
        &self,
        rules: &CareerRules,
        venue: VenueId,
        roller: &mut R,
    ) -> Result<Transition, ActionError> {
        let started = self.begin_release(rules, venue)?;
        let mut resolved = started.state.resolve_release(rules, roller)?;
        let mut events = started.events;
        events.append(&mut resolved.events);
        resolved.events = events;
        Ok(resolved)
    }

    /// Spend a day replaying the release from `release_week` at `venue`.
    ///
    /// # Errors
    ///
    /// Rejected unless a day is available, the weekly gig cap has room, the
    /// release exists and the venue is open.
    pub fn book_gig(
        &self,
        rules: &CareerRules,
        release_week: u32,
        venue_id: VenueId,
    ) -> Result<Transition, ActionError> {
        self.ensure_day_available()?;
        let weekly_gig = self.plan.gigs_this_week() + 1;
        if weekly_gig > MAX_GIGS_PER_WEEK {
            return Err(ActionError::GigCapReached);
        }
        let index = self
            .history
            .iter()
            .position(|record| record.release_week == release_week)
            .ok_or(ActionError::UnknownRelease(release_week))?;
        let venue = self.open_venue(rules, venue_id)?;

        let song_play = self.plan.gigs_for(release_week) + 1;
        let modifiers = GigModifiers::for_booking(self.week, release_week, song_play, weekly_gig);
        let payout = gig_payout(venue, &self.history[index], self.fans, self.week, &modifiers);

        let mut next = self.clone();
        let mut events = Vec::new();

        let applied = next.stats.apply(gig_stat_gain(venue, weekly_gig));
        next.plan.push(DayEntry {
            kind: DayKind::Gig,
            delta: applied,
            triad_contribution: 0.0,
            gig_release: Some(release_week),
        });
        if !applied.is_zero() {
            events.push(CareerEvent::StatsChanged { delta: applied });
        }
        next.credit(rules, &payout, &mut events);

        let gig = GigEvent {
            week: self.week,
            venue: venue_id,
            money_gain: payout.money,
            fans_gain: payout.fans,
        };
        next.history[index].gigs.push(gig);
        info!(
            "week {} gig of week-{release_week} release at {venue_id} (x{:.2}): money {:+}, fans +{}",
            self.week,
            modifiers.multiplier(),
            gig.money_gain,
            gig.fans_gain
        );
        events.push(CareerEvent::GigCompleted { release_week, gig });
        if modifiers.soft_capped() {
            events.push(CareerEvent::toast(ToastLevel::Warning, TOAST_GIG_SOFT_CAP));
        }
        if next.plan.days_remaining() == 0 {
            events.push(CareerEvent::toast(ToastLevel::Info, TOAST_WEEK_DONE));
        }
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Start a new season. Cosmetic flags survive.
    ///
    /// # Errors
    ///
    /// Rejected while a release is being performed.
    pub fn restart(&self) -> Result<Transition, ActionError> {
        if self.performing.is_some() {
            return Err(ActionError::ReleaseInFlight);
        }
        let mut next = Self::new();
        next.flags = self.flags.clone();
        info!("career restarted from week {}", self.week);
        Ok(Transition {
            state: next,
            events: vec![CareerEvent::Restarted],
        })
    }

    fn credit(&mut self, rules: &CareerRules, payout: &Payout, events: &mut Vec<CareerEvent>) {
        let fans_before = self.fans;
        self.money = self.money.saturating_add(payout.money);
        self.fans = self.fans.saturating_add(payout.fans);
        if payout.guardrail_applied {
            events.push(CareerEvent::toast(ToastLevel::Warning, TOAST_GUARDRAIL));
        }
        if payout.tip_floor_applied {
            events.push(CareerEvent::toast(ToastLevel::Info, TOAST_TIP_FLOOR));
        }
        for venue in rules.config.venues.newly_unlocked(fans_before, self.fans) {
            info!("{venue} unlocked at {} fans", self.fans);
            events.push(CareerEvent::VenueUnlocked { venue });
        }
    }
}
