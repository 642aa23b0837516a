use std::collections::BTreeMap;

use anyhow::{Context, Result};
use encore_game::{
    CareerConfig, CareerEngine, CareerEvent, CareerRules, CareerState, DiceRetention, Genre, Grade,
    ImmediateScheduler, Phase, ReleaseRecord, SaveStore, ScoringMode, Theme, VenueId, serialize_state,
};
use log::debug;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::logic::policy::GameplayStrategy;

const SEASON_WEEKS: u32 = 52;
const STAT_CEILING: f64 = 10.0;
const ONBOARDING_WEEKS: u32 = 3;
const ONBOARDING_FLOOR: i64 = -20;

/// Configuration for a simulated season.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub mode: ScoringMode,
    pub retention: DiceRetention,
    pub strategy: GameplayStrategy,
    pub verify_saves: bool,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(mode: ScoringMode, strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            mode,
            retention: DiceRetention::Last,
            strategy,
            verify_saves: true,
        }
    }

    #[must_use]
    pub fn with_retention(mut self, retention: DiceRetention) -> Self {
        self.retention = retention;
        self
    }

    #[must_use]
    pub fn with_save_verification(mut self, verify: bool) -> Self {
        self.verify_saves = verify;
        self
    }

    fn career_config(&self) -> CareerConfig {
        CareerConfig::default_config()
            .with_scoring_mode(self.mode)
            .with_dice_retention(self.retention)
    }
}

/// One simulated week.
#[derive(Debug, Clone, Serialize)]
pub struct WeekRecord {
    pub week: u32,
    pub song: String,
    pub venue: VenueId,
    pub score: f64,
    pub grade: Grade,
    pub chart_pos: u32,
    pub money_gain: i64,
    pub gigs: usize,
}

/// Outcome of a full simulated season.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub mode: ScoringMode,
    pub strategy: GameplayStrategy,
    pub weeks: Vec<WeekRecord>,
    pub final_money: i64,
    pub final_fans: u64,
    pub final_stats: [f64; 3],
    pub unlocks: Vec<VenueId>,
    pub toasts: BTreeMap<String, usize>,
    pub gigs_played: usize,
    pub season_completed: bool,
    pub violations: Vec<String>,
    pub save_digest: String,
}

impl SimulationSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.season_completed && self.violations.is_empty()
    }

    #[must_use]
    pub fn grade_counts(&self) -> BTreeMap<Grade, usize> {
        let mut counts = BTreeMap::new();
        for week in &self.weeks {
            *counts.entry(week.grade).or_insert(0) += 1;
        }
        counts
    }

    #[must_use]
    pub fn best_chart(&self) -> Option<u32> {
        self.weeks.iter().map(|w| w.chart_pos).min()
    }
}

/// Play one full season with `config.strategy`, checking invariants after
/// every week.
///
/// # Errors
///
/// Returns an error if the engine rejects the configuration or the store
/// cannot be read back.
pub fn run_season<S: SaveStore>(
    store: S,
    slot: &str,
    config: &SimulationConfig,
) -> Result<SimulationSummary> {
    let engine = CareerEngine::new(config.career_config(), store)
        .context("default career config rejected")?;
    let mut policy = config.strategy.create_policy(config.seed);
    let mut session = engine.create_session(slot, config.seed, ImmediateScheduler::default());
    let mut weeks = Vec::new();
    let mut violations = Vec::new();
    let mut events = Vec::new();
    let mut gigs_played = 0;

    while session.phase() != Phase::SeasonOver && weeks.len() < SEASON_WEEKS as usize {
        let rules = session.rules().clone();
        let before = session.state().clone();

        let concept = policy.pick_concept(session.state(), &rules);
        if !session.choose_concept(concept.genre, concept.theme, &concept.name)
            || !session.lock_concept()
        {
            violations.push(format!("week {}: concept rejected", before.week));
            break;
        }

        let mut weekly_gigs = 0;
        while let Some((release_week, venue)) = policy.pick_gig(session.state(), &rules) {
            if session.book_gig(release_week, venue).is_none() {
                break;
            }
            weekly_gigs += 1;
        }
        gigs_played += weekly_gigs;

        while session.state().days_remaining() > 0 {
            let activity = policy.pick_activity(session.state());
            if !session.train(activity) {
                violations.push(format!("week {}: {activity} rejected", before.week));
                break;
            }
        }
        if !session.finish_song() {
            violations.push(format!("week {}: finish rejected", before.week));
            break;
        }

        let venue = policy.pick_venue(session.state(), &rules);
        if !session.perform_release(venue) {
            violations.push(format!("week {}: release at {venue} rejected", before.week));
            break;
        }
        let Some(record) = session.poll() else {
            violations.push(format!("week {}: release never resolved", before.week));
            break;
        };
        debug!(
            "{} seed {} week {}: {} at {venue} -> {:.1} ({})",
            policy.name(),
            config.seed,
            record.week,
            record.song_name,
            record.score,
            record.grade
        );

        violations.extend(check_week(&before, session.state(), &record, weekly_gigs));
        if config.verify_saves {
            match engine.load_state(slot) {
                Ok(Some(saved)) if &saved == session.state() => {}
                Ok(Some(_)) => violations.push(format!("week {}: save drifted", record.week)),
                Ok(None) => violations.push(format!("week {}: save missing", record.week)),
                Err(err) => return Err(err.context("reading back save slot")),
            }
        }

        weeks.push(WeekRecord {
            week: record.week,
            song: record.song_name.clone(),
            venue: record.venue,
            score: record.score,
            grade: record.grade,
            chart_pos: record.chart_pos,
            money_gain: record.money_gain,
            gigs: weekly_gigs,
        });
        events.extend(session.drain_events());
    }

    let state = session.state();
    let blob = serialize_state(state).context("encoding final state")?;
    let season_completed = state.phase() == Phase::SeasonOver;
    if season_completed {
        violations.extend(check_season(state, &events));
    }

    Ok(SimulationSummary {
        seed: config.seed,
        mode: config.mode,
        strategy: config.strategy,
        weeks,
        final_money: state.money,
        final_fans: state.fans,
        final_stats: [state.stats.vocals, state.stats.writing, state.stats.stage],
        unlocks: unlocks(&events),
        toasts: tally_toasts(&events),
        gigs_played,
        season_completed,
        violations,
        save_digest: digest_hex(blob.as_bytes()),
    })
}

/// Invariants that must hold after every completed week.
fn check_week(
    before: &CareerState,
    after: &CareerState,
    record: &ReleaseRecord,
    weekly_gigs: usize,
) -> Vec<String> {
    let mut problems = Vec::new();
    let week = before.week;
    for (label, value) in [
        ("vocals", after.stats.vocals),
        ("writing", after.stats.writing),
        ("stage", after.stats.stage),
    ] {
        if !(0.0..=STAT_CEILING).contains(&value) {
            problems.push(format!("week {week}: {label} out of range ({value})"));
        }
    }
    if !(1..=SEASON_WEEKS).contains(&after.week) {
        problems.push(format!("week {week}: week counter {}", after.week));
    }
    if after.fans < before.fans {
        problems.push(format!("week {week}: fans fell {} -> {}", before.fans, after.fans));
    }
    if !(0.0..=100.0).contains(&record.score) {
        problems.push(format!("week {week}: score {}", record.score));
    }
    if !(1..=100).contains(&record.chart_pos) {
        problems.push(format!("week {week}: chart {}", record.chart_pos));
    }
    if record.grade != Grade::from_score(record.score) {
        problems.push(format!("week {week}: grade {} for {}", record.grade, record.score));
    }
    if week <= ONBOARDING_WEEKS && record.money_gain < ONBOARDING_FLOOR {
        problems.push(format!("week {week}: onboarding loss {}", record.money_gain));
    }
    if weekly_gigs > 3 {
        problems.push(format!("week {week}: {weekly_gigs} gigs booked"));
    }
    if !after.plan.entries().is_empty() || after.concept_locked || after.dice_best.sing.is_some() {
        problems.push(format!("week {week}: weekly state not reset"));
    }
    problems
}

fn check_season(state: &CareerState, events: &[CareerEvent]) -> Vec<String> {
    let mut problems = Vec::new();
    if state.history.len() != SEASON_WEEKS as usize {
        problems.push(format!("season ended with {} releases", state.history.len()));
    }
    if !state.history.windows(2).all(|w| w[0].week > w[1].week) {
        problems.push("history not newest first".to_string());
    }
    let season_over = events
        .iter()
        .filter(|e| matches!(e, CareerEvent::SeasonOver { .. }))
        .count();
    if season_over != 1 {
        problems.push(format!("season-over announced {season_over} times"));
    }
    let found = unlocks(events);
    let mut distinct = found.clone();
    distinct.sort();
    distinct.dedup();
    if distinct.len() != found.len() {
        problems.push("venue unlocked more than once".to_string());
    }
    let rules = CareerRules::default();
    if state.choose_concept(Genre::Pop, Theme::Love, "x").is_ok() {
        problems.push("actions accepted after season end".to_string());
    }
    if state.book_gig(&rules, SEASON_WEEKS, VenueId::Street).is_ok() {
        problems.push("gig accepted after season end".to_string());
    }
    problems
}

fn unlocks(events: &[CareerEvent]) -> Vec<VenueId> {
    events
        .iter()
        .filter_map(|event| match event {
            CareerEvent::VenueUnlocked { venue } => Some(*venue),
            _ => None,
        })
        .collect()
}

fn tally_toasts(events: &[CareerEvent]) -> BTreeMap<String, usize> {
    let mut toasts = BTreeMap::new();
    for event in events {
        if let CareerEvent::Toast { key, .. } = event {
            *toasts.entry(key.clone()).or_insert(0) += 1;
        }
    }
    toasts
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(64), |mut out, byte| {
            use std::fmt::Write as _;
            let _ = write!(out, "{byte:02x}");
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_game::MemoryStore;

    #[test]
    fn every_strategy_completes_a_clean_season() {
        for strategy in GameplayStrategy::ALL {
            let store = MemoryStore::new();
            let config = SimulationConfig::new(ScoringMode::Dice, strategy, 2024);
            let summary = run_season(&store, "sim", &config).unwrap();
            assert!(summary.season_completed, "{strategy} did not finish");
            assert!(summary.violations.is_empty(), "{strategy}: {:?}", summary.violations);
            assert_eq!(summary.weeks.len(), 52);
            assert_eq!(summary.grade_counts().values().sum::<usize>(), 52);
        }
    }

    #[test]
    fn identical_seeds_produce_identical_saves() {
        let config = SimulationConfig::new(ScoringMode::Legacy, GameplayStrategy::Gambler, 77)
            .with_save_verification(false);
        let first = run_season(MemoryStore::new(), "a", &config).unwrap();
        let second = run_season(MemoryStore::new(), "b", &config).unwrap();
        assert_eq!(first.save_digest, second.save_digest);
        assert_eq!(first.save_digest.len(), 64);
    }

    #[test]
    fn grinder_books_gigs_after_first_release() {
        let config = SimulationConfig::new(ScoringMode::Dice, GameplayStrategy::Grinder, 3)
            .with_retention(DiceRetention::Best);
        let summary = run_season(MemoryStore::new(), "grind", &config).unwrap();
        assert_eq!(summary.weeks[0].gigs, 0);
        assert!(summary.weeks[1..].iter().all(|w| w.gigs == 3));
        assert!(summary.toasts.contains_key("toast.gig.soft-cap"));
    }
}
