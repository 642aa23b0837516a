use std::fmt;
use std::str::FromStr;

use encore_game::{
    Activity, CareerRules, CareerState, CompatibilityRating, Genre, Skill, Theme, VenueId,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Serialize, Serializer};

/// Concept chosen for the coming week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptChoice {
    pub genre: Genre,
    pub theme: Theme,
    pub name: String,
}

/// Policy interface for automated careers.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    fn pick_concept(&mut self, state: &CareerState, rules: &CareerRules) -> ConceptChoice;

    /// Gig to book before training, if any. Called until it returns `None`
    /// or the booking is rejected.
    fn pick_gig(&mut self, state: &CareerState, rules: &CareerRules) -> Option<(u32, VenueId)>;

    fn pick_activity(&mut self, state: &CareerState) -> Activity;

    fn pick_venue(&mut self, state: &CareerState, rules: &CareerRules) -> VenueId;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameplayStrategy {
    Safe,
    Gambler,
    Grinder,
    Balanced,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Safe, Self::Gambler, Self::Grinder, Self::Balanced];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Gambler => "Gambler",
            Self::Grinder => "Grinder",
            Self::Balanced => "Balanced",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Gambler => "gambler",
            Self::Grinder => "grinder",
            Self::Balanced => "balanced",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Safe => "Good pairings, venues whose worst case breaks even, no gigs",
            Self::Gambler => "Random pairings and the biggest open venue every week",
            Self::Grinder => "Trains the weakest skill and fills the gig cap at street corners",
            Self::Balanced => "Rotating practice, best expected net venue, one gig per week",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Safe => Box::new(SafePolicy),
            Self::Gambler => Box::new(GamblerPolicy::new(seed)),
            Self::Grinder => Box::new(GrinderPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for GameplayStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl FromStr for GameplayStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key() == key)
            .ok_or(())
    }
}

struct SafePolicy;
struct GrinderPolicy;
struct BalancedPolicy;

struct GamblerPolicy {
    rng: ChaCha20Rng,
}

impl GamblerPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0x6A4D_B1E5),
        }
    }
}

fn song_name(prefix: &str, week: u32) -> String {
    format!("{prefix} No. {week}")
}

/// First pairing with the requested rating, scanning from a week-dependent offset
/// so the catalogue varies.
fn pairing_with(
    rules: &CareerRules,
    week: u32,
    wanted: CompatibilityRating,
) -> Option<(Genre, Theme)> {
    let offset = week as usize;
    let total = Genre::ALL.len() * Theme::ALL.len();
    (0..total)
        .map(|i| {
            let n = (i + offset * 7) % total;
            (Genre::ALL[n / Theme::ALL.len()], Theme::ALL[n % Theme::ALL.len()])
        })
        .find(|(genre, theme)| rules.compat.rating(*genre, *theme) == wanted)
}

fn good_concept(state: &CareerState, rules: &CareerRules, prefix: &str) -> ConceptChoice {
    let (genre, theme) = pairing_with(rules, state.week, CompatibilityRating::Good)
        .or_else(|| pairing_with(rules, state.week, CompatibilityRating::Neutral))
        .unwrap_or((Genre::Pop, Theme::Love));
    ConceptChoice {
        genre,
        theme,
        name: song_name(prefix, state.week),
    }
}

fn rotation(state: &CareerState) -> Activity {
    Activity::ALL[state.plan.days_used() % Activity::ALL.len()]
}

fn weakest_skill(state: &CareerState) -> Activity {
    Activity::ALL
        .into_iter()
        .min_by(|a, b| {
            state
                .stats
                .get(a.skill())
                .total_cmp(&state.stats.get(b.skill()))
        })
        .unwrap_or(Activity::Practice)
}

/// Open venue with the best expected net that still passes `accept`.
fn best_venue_by<F>(state: &CareerState, rules: &CareerRules, mut accept: F) -> VenueId
where
    F: FnMut(VenueId, f64, f64) -> bool,
{
    let mut best: Option<(VenueId, f64)> = None;
    for id in state.open_venues(rules) {
        let (Some(preview), Some(venue)) = (state.forecast(rules, id), rules.config.venues.get(id))
        else {
            continue;
        };
        let expected_net = venue.raw_net(preview.expected);
        if !accept(id, preview.low, venue.break_even) {
            continue;
        }
        if best.is_none_or(|(_, net)| expected_net > net) {
            best = Some((id, expected_net));
        }
    }
    best.map_or(VenueId::Street, |(id, _)| id)
}

fn latest_release(state: &CareerState) -> Option<u32> {
    state.history.first().map(|record| record.release_week)
}

fn best_release(state: &CareerState) -> Option<u32> {
    state
        .history
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|record| record.release_week)
}

impl PlayerPolicy for SafePolicy {
    fn name(&self) -> &'static str {
        "Safe"
    }

    fn pick_concept(&mut self, state: &CareerState, rules: &CareerRules) -> ConceptChoice {
        good_concept(state, rules, "Steady")
    }

    fn pick_gig(&mut self, _state: &CareerState, _rules: &CareerRules) -> Option<(u32, VenueId)> {
        None
    }

    fn pick_activity(&mut self, state: &CareerState) -> Activity {
        rotation(state)
    }

    fn pick_venue(&mut self, state: &CareerState, rules: &CareerRules) -> VenueId {
        best_venue_by(state, rules, |_, low, break_even| low >= break_even)
    }
}

impl PlayerPolicy for GamblerPolicy {
    fn name(&self) -> &'static str {
        "Gambler"
    }

    fn pick_concept(&mut self, state: &CareerState, _rules: &CareerRules) -> ConceptChoice {
        let genre = *Genre::ALL.choose(&mut self.rng).unwrap_or(&Genre::Rock);
        let theme = *Theme::ALL.choose(&mut self.rng).unwrap_or(&Theme::Rebellion);
        ConceptChoice {
            genre,
            theme,
            name: song_name("Long Shot", state.week),
        }
    }

    fn pick_gig(&mut self, state: &CareerState, _rules: &CareerRules) -> Option<(u32, VenueId)> {
        if state.plan.gigs_this_week() > 0 || !self.rng.gen_bool(0.3) {
            return None;
        }
        latest_release(state).map(|week| (week, VenueId::OpenMic))
    }

    fn pick_activity(&mut self, _state: &CareerState) -> Activity {
        Activity::ALL[self.rng.gen_range(0..Activity::ALL.len())]
    }

    fn pick_venue(&mut self, state: &CareerState, rules: &CareerRules) -> VenueId {
        state
            .open_venues(rules)
            .into_iter()
            .max()
            .unwrap_or(VenueId::Street)
    }
}

impl PlayerPolicy for GrinderPolicy {
    fn name(&self) -> &'static str {
        "Grinder"
    }

    fn pick_concept(&mut self, state: &CareerState, rules: &CareerRules) -> ConceptChoice {
        good_concept(state, rules, "Shift")
    }

    fn pick_gig(&mut self, state: &CareerState, _rules: &CareerRules) -> Option<(u32, VenueId)> {
        best_release(state).map(|week| (week, VenueId::Street))
    }

    fn pick_activity(&mut self, state: &CareerState) -> Activity {
        weakest_skill(state)
    }

    fn pick_venue(&mut self, state: &CareerState, rules: &CareerRules) -> VenueId {
        if state.stats.get(Skill::Perform) < 2.0 {
            return VenueId::Street;
        }
        best_venue_by(state, rules, |_, low, break_even| low >= break_even)
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_concept(&mut self, state: &CareerState, rules: &CareerRules) -> ConceptChoice {
        good_concept(state, rules, "Set")
    }

    fn pick_gig(&mut self, state: &CareerState, rules: &CareerRules) -> Option<(u32, VenueId)> {
        if state.plan.gigs_this_week() > 0 {
            return None;
        }
        let venue = state
            .open_venues(rules)
            .into_iter()
            .filter(|id| {
                rules
                    .config
                    .venues
                    .get(*id)
                    .is_some_and(encore_game::Venue::is_no_risk)
            })
            .max()
            .unwrap_or(VenueId::Street);
        latest_release(state).map(|week| (week, venue))
    }

    fn pick_activity(&mut self, state: &CareerState) -> Activity {
        rotation(state)
    }

    fn pick_venue(&mut self, state: &CareerState, rules: &CareerRules) -> VenueId {
        best_venue_by(state, rules, |_, _, _| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_parse_from_keys() {
        for strategy in GameplayStrategy::ALL {
            assert_eq!(strategy.key().parse::<GameplayStrategy>(), Ok(strategy));
        }
        assert_eq!(" Gambler ".parse::<GameplayStrategy>(), Ok(GameplayStrategy::Gambler));
        assert!("reckless".parse::<GameplayStrategy>().is_err());
    }

    #[test]
    fn safe_policy_prefers_good_pairings() {
        let rules = CareerRules::default();
        let state = CareerState::new();
        let mut policy = GameplayStrategy::Safe.create_policy(1);
        let concept = policy.pick_concept(&state, &rules);
        assert_eq!(
            rules.compat.rating(concept.genre, concept.theme),
            CompatibilityRating::Good
        );
        assert_eq!(concept.name, "Steady No. 1");
    }

    #[test]
    fn newcomers_only_reach_open_venues() {
        let rules = CareerRules::default();
        let state = CareerState::new();
        for strategy in GameplayStrategy::ALL {
            let mut policy = strategy.create_policy(5);
            let venue = policy.pick_venue(&state, &rules);
            assert!(
                state.open_venues(&rules).contains(&venue),
                "{strategy} picked {venue}"
            );
        }
    }

    #[test]
    fn gambler_is_reproducible_per_seed() {
        let rules = CareerRules::default();
        let state = CareerState::new();
        let mut first = GameplayStrategy::Gambler.create_policy(42);
        let mut second = GameplayStrategy::Gambler.create_policy(42);
        for _ in 0..10 {
            assert_eq!(
                first.pick_concept(&state, &rules),
                second.pick_concept(&state, &rules)
            );
            assert_eq!(first.pick_activity(&state), second.pick_activity(&state));
        }
    }

    #[test]
    fn grinder_trains_weakest_skill() {
        let mut state = CareerState::new();
        state.stats.vocals = 3.0;
        state.stats.writing = 1.0;
        state.stats.stage = 2.0;
        let mut policy = GameplayStrategy::Grinder.create_policy(0);
        assert_eq!(policy.pick_activity(&state), Activity::Write);
    }
}
