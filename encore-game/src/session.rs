//! Stateful façade for hosts.
//!
//! Wraps the pure transitions with an RNG bundle, a save slot and a
//! scheduler. Rejected actions are silent no-ops: the state is untouched
//! and the method reports `false`/`None`. Every accepted action replaces
//! the save blob.
use log::{debug, warn};

use crate::compat::{Genre, Theme};
use crate::events::CareerEvent;
use crate::release::{GigEvent, ReleaseRecord};
use crate::rng::RngBundle;
use crate::save::{SaveStore, load_state, serialize_state};
use crate::schedule::{ScheduledTask, Scheduler};
use crate::scoring::Forecast;
use crate::state::{ActionError, CareerRules, CareerState, Phase, Transition};
use crate::stats::Activity;
use crate::venue::VenueId;

type EventHook = Box<dyn FnMut(&CareerEvent)>;

pub struct CareerSession<S: SaveStore, C: Scheduler> {
    rules: CareerRules,
    state: CareerState,
    rng: RngBundle,
    store: S,
    scheduler: C,
    slot: String,
    outbox: Vec<CareerEvent>,
    hook: Option<EventHook>,
}

impl<S: SaveStore, C: Scheduler> CareerSession<S, C> {
    /// Start a fresh career in `slot`. Nothing is written until the first action.
    #[must_use]
    pub fn new(rules: CareerRules, seed: u64, store: S, scheduler: C, slot: &str) -> Self {
        Self::from_state(rules, CareerState::new(), seed, store, scheduler, slot)
    }

    #[must_use]
    pub fn from_state(
        rules: CareerRules,
        state: CareerState,
        seed: u64,
        store: S,
        scheduler: C,
        slot: &str,
    ) -> Self {
        Self {
            rules,
            state,
            rng: RngBundle::from_user_seed(seed),
            store,
            scheduler,
            slot: slot.to_string(),
            outbox: Vec::new(),
            hook: None,
        }
    }

    /// Restore the career saved in `slot`. Missing, unreadable or corrupt
    /// saves start a fresh career.
    #[must_use]
    pub fn load(rules: CareerRules, seed: u64, store: S, scheduler: C, slot: &str) -> Self {
        let state = match store.read(slot) {
            Ok(Some(blob)) => load_state(&blob),
            Ok(None) => CareerState::new(),
            Err(err) => {
                warn!("could not read save slot {slot}: {err}");
                CareerState::new()
            }
        };
        Self::from_state(rules, state, seed, store, scheduler, slot)
    }

    #[must_use]
    pub const fn state(&self) -> &CareerState {
        &self.state
    }

    #[must_use]
    pub const fn rules(&self) -> &CareerRules {
        &self.rules
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn scheduler_mut(&mut self) -> &mut C {
        &mut self.scheduler
    }

    /// Register a callback invoked for every emitted event.
    pub fn on_event(&mut self, hook: impl FnMut(&CareerEvent) + 'static) {
        self.hook = Some(Box::new(hook));
    }

    /// Events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<CareerEvent> {
        std::mem::take(&mut self.outbox)
    }

    #[must_use]
    pub fn forecast(&self, venue: VenueId) -> Option<Forecast> {
        self.state.forecast(&self.rules, venue)
    }

    pub fn choose_concept(&mut self, genre: Genre, theme: Theme, name: &str) -> bool {
        let result = self.state.choose_concept(genre, theme, name);
        self.apply("choose_concept", result)
    }

    pub fn lock_concept(&mut self) -> bool {
        let result = self.state.lock_concept();
        self.apply("lock_concept", result)
    }

    pub fn train(&mut self, activity: Activity) -> bool {
        let result = self.state.train(&self.rules, activity, &mut self.rng);
        self.apply("train", result)
    }

    pub fn finish_song(&mut self) -> bool {
        let result = self.state.finish_song();
        self.apply("finish_song", result)
    }

    /// Choose a venue. The outcome arrives through [`CareerSession::poll`]
    /// once the presentation delay has elapsed.
    pub fn perform_release(&mut self, venue: VenueId) -> bool {
        let result = self.state.begin_release(&self.rules, venue);
        let accepted = self.apply("perform_release", result);
        if accepted {
            self.scheduler.schedule_after(
                self.rules.config.presentation_delay(),
                ScheduledTask::ResolveRelease,
            );
        }
        accepted
    }

    /// Run every due task. Returns the release completed by this poll, if any.
    pub fn poll(&mut self) -> Option<ReleaseRecord> {
        let mut completed = None;
        for task in self.scheduler.take_due() {
            match task {
                ScheduledTask::ResolveRelease => {
                    let result = self.state.resolve_release(&self.rules, &mut self.rng);
                    if self.apply("resolve_release", result) {
                        completed = self.state.history.first().cloned();
                    }
                }
            }
        }
        completed
    }

    /// Replay the release from `release_week` at `venue`.
    pub fn book_gig(&mut self, release_week: u32, venue: VenueId) -> Option<GigEvent> {
        let result = self.state.book_gig(&self.rules, release_week, venue);
        if !self.apply("book_gig", result) {
            return None;
        }
        self.state
            .release(release_week)
            .and_then(|record| record.gigs.last().copied())
    }

    pub fn restart(&mut self) -> bool {
        let result = self.state.restart();
        self.apply("restart", result)
    }

    /// Write the current state to the slot. Failures are logged, never raised.
    pub fn save(&self) {
        match serialize_state(&self.state) {
            Ok(blob) => {
                if let Err(err) = self.store.write(&self.slot, &blob) {
                    warn!("could not write save slot {}: {err}", self.slot);
                }
            }
            Err(err) => warn!("could not encode save: {err}"),
        }
    }

    /// Remove the slot's save. The in-memory career is kept.
    pub fn clear_save(&self) {
        if let Err(err) = self.store.remove(&self.slot) {
            warn!("could not clear save slot {}: {err}", self.slot);
        }
    }

    fn apply(&mut self, action: &str, result: Result<Transition, ActionError>) -> bool {
        match result {
            Ok(Transition { state, events }) => {
                self.state = state;
                for event in &events {
                    if let Some(hook) = self.hook.as_mut() {
                        hook(event);
                    }
                }
                self.outbox.extend(events);
                self.save();
                true
            }
            Err(err) => {
                debug!("{action} ignored in phase {}: {err}", self.state.phase());
                false
            }
        }
    }
}
