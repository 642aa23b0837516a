//! Genre and theme pairing.
//!
//! Each pairing has a rating of -1, 0 or +1. A good pairing always pays a
//! flat bonus; a risky pairing is a gamble with a small chance of a large
//! upside and a negative expected value.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    COMPAT_GOOD_BONUS, COMPAT_RISKY_LOSS, COMPAT_RISKY_ODDS, COMPAT_RISKY_WIN,
    COMPAT_RISKY_WIN_CHANCE,
};
use crate::numbers::round_f64_to_i64;
use crate::rng::{RollDomain, Roller};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Pop,
    Rock,
    HipHop,
    Electronic,
    Folk,
    Jazz,
    Country,
    Punk,
}

impl Genre {
    pub const ALL: [Self; 8] = [
        Self::Pop,
        Self::Rock,
        Self::HipHop,
        Self::Electronic,
        Self::Folk,
        Self::Jazz,
        Self::Country,
        Self::Punk,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pop => "pop",
            Self::Rock => "rock",
            Self::HipHop => "hiphop",
            Self::Electronic => "electronic",
            Self::Folk => "folk",
            Self::Jazz => "jazz",
            Self::Country => "country",
            Self::Punk => "punk",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|genre| genre.as_str() == wanted)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Love,
    Heartbreak,
    Party,
    Rebellion,
    Nostalgia,
    Hope,
    Hustle,
    Roadtrip,
}

impl Theme {
    pub const ALL: [Self; 8] = [
        Self::Love,
        Self::Heartbreak,
        Self::Party,
        Self::Rebellion,
        Self::Nostalgia,
        Self::Hope,
        Self::Hustle,
        Self::Roadtrip,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Love => "love",
            Self::Heartbreak => "heartbreak",
            Self::Party => "party",
            Self::Rebellion => "rebellion",
            Self::Nostalgia => "nostalgia",
            Self::Hope => "hope",
            Self::Hustle => "hustle",
            Self::Roadtrip => "roadtrip",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == wanted)
            .ok_or(())
    }
}

/// Pairing signal for a genre/theme combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum CompatibilityRating {
    Risky,
    Neutral,
    Good,
}

impl CompatibilityRating {
    #[must_use]
    pub const fn value(self) -> i8 {
        match self {
            Self::Risky => -1,
            Self::Neutral => 0,
            Self::Good => 1,
        }
    }

    /// Rating from any integer by sign.
    #[must_use]
    pub const fn from_signum(value: i64) -> Self {
        if value > 0 {
            Self::Good
        } else if value < 0 {
            Self::Risky
        } else {
            Self::Neutral
        }
    }
}

impl From<CompatibilityRating> for i8 {
    fn from(value: CompatibilityRating) -> Self {
        value.value()
    }
}

impl TryFrom<i8> for CompatibilityRating {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Risky),
            0 => Ok(Self::Neutral),
            1 => Ok(Self::Good),
            other => Err(format!("compatibility rating out of range: {other}")),
        }
    }
}

/// Sparse pairing table; unlisted pairs are neutral.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompatibilityTable {
    ratings: HashMap<(Genre, Theme), CompatibilityRating>,
}

impl CompatibilityTable {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in balance table.
    #[must_use]
    pub fn default_table() -> Self {
        use CompatibilityRating::{Good, Risky};
        use Genre::{Country, Electronic, Folk, HipHop, Jazz, Pop, Punk, Rock};
        use Theme::{Heartbreak, Hope, Hustle, Love, Nostalgia, Party, Rebellion, Roadtrip};

        let entries = [
            (Pop, Love, Good),
            (Pop, Party, Good),
            (Pop, Rebellion, Risky),
            (Pop, Hustle, Risky),
            (Rock, Rebellion, Good),
            (Rock, Roadtrip, Good),
            (Rock, Love, Risky),
            (HipHop, Hustle, Good),
            (HipHop, Party, Good),
            (HipHop, Nostalgia, Risky),
            (HipHop, Roadtrip, Risky),
            (Electronic, Party, Good),
            (Electronic, Hope, Good),
            (Electronic, Heartbreak, Risky),
            (Electronic, Nostalgia, Risky),
            (Folk, Nostalgia, Good),
            (Folk, Roadtrip, Good),
            (Folk, Party, Risky),
            (Folk, Hustle, Risky),
            (Jazz, Heartbreak, Good),
            (Jazz, Love, Good),
            (Jazz, Rebellion, Risky),
            (Country, Heartbreak, Good),
            (Country, Roadtrip, Good),
            (Country, Party, Risky),
            (Punk, Rebellion, Good),
            (Punk, Hustle, Good),
            (Punk, Love, Risky),
            (Punk, Nostalgia, Risky),
        ];

        let mut table = Self::empty();
        for (genre, theme, rating) in entries {
            table.set(genre, theme, rating);
        }
        table
    }

    pub fn set(&mut self, genre: Genre, theme: Theme, rating: CompatibilityRating) {
        if rating == CompatibilityRating::Neutral {
            self.ratings.remove(&(genre, theme));
        } else {
            self.ratings.insert((genre, theme), rating);
        }
    }

    #[must_use]
    pub fn rating(&self, genre: Genre, theme: Theme) -> CompatibilityRating {
        self.ratings
            .get(&(genre, theme))
            .copied()
            .unwrap_or(CompatibilityRating::Neutral)
    }
}

/// Deterministic bonus used for forecasts.
#[must_use]
pub fn expected_bonus(rating: CompatibilityRating) -> i32 {
    match rating {
        CompatibilityRating::Good => COMPAT_GOOD_BONUS,
        CompatibilityRating::Neutral => 0,
        CompatibilityRating::Risky => {
            let win = COMPAT_RISKY_WIN_CHANCE * f64::from(COMPAT_RISKY_WIN);
            let loss = (1.0 - COMPAT_RISKY_WIN_CHANCE) * f64::from(COMPAT_RISKY_LOSS);
            i32::try_from(round_f64_to_i64(win + loss)).unwrap_or(COMPAT_RISKY_LOSS)
        }
    }
}

/// Randomized bonus used when a release is actually scored. Only risky
/// pairings draw from the RNG: a roll of 1 on a d4 wins.
pub fn realized_bonus<R: Roller + ?Sized>(rating: CompatibilityRating, roller: &mut R) -> i32 {
    match rating {
        CompatibilityRating::Good => COMPAT_GOOD_BONUS,
        CompatibilityRating::Neutral => 0,
        CompatibilityRating::Risky => {
            if roller.roll(RollDomain::Pairing, 1, COMPAT_RISKY_ODDS) == 1 {
                COMPAT_RISKY_WIN
            } else {
                COMPAT_RISKY_LOSS
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedRoller, StreamRoller};

    #[test]
    fn unlisted_pairs_are_neutral() {
        let table = CompatibilityTable::default_table();
        assert_eq!(
            table.rating(Genre::Jazz, Theme::Party),
            CompatibilityRating::Neutral
        );
        assert_eq!(
            table.rating(Genre::Pop, Theme::Love),
            CompatibilityRating::Good
        );
        assert_eq!(
            table.rating(Genre::Pop, Theme::Rebellion),
            CompatibilityRating::Risky
        );
    }

    #[test]
    fn forecast_bonus_values() {
        assert_eq!(expected_bonus(CompatibilityRating::Good), 8);
        assert_eq!(expected_bonus(CompatibilityRating::Neutral), 0);
        assert_eq!(expected_bonus(CompatibilityRating::Risky), -3);
    }

    #[test]
    fn risky_pairing_wins_only_on_one_in_four() {
        let mut roller = ScriptedRoller::new([1, 2, 3, 4]);
        let outcomes: Vec<i32> = (0..4)
            .map(|_| realized_bonus(CompatibilityRating::Risky, &mut roller))
            .collect();
        assert_eq!(outcomes, vec![12, -8, -8, -8]);
    }

    #[test]
    fn safe_pairings_never_draw() {
        let mut roller = ScriptedRoller::new([]);
        assert_eq!(realized_bonus(CompatibilityRating::Good, &mut roller), 8);
        assert_eq!(realized_bonus(CompatibilityRating::Neutral, &mut roller), 0);
        assert!(roller.history().is_empty());
    }

    #[test]
    fn risky_gamble_wins_about_a_quarter_of_the_time() {
        let mut roller = StreamRoller::small(0xFEED);
        let trials = 4000;
        let wins = (0..trials)
            .filter(|_| realized_bonus(CompatibilityRating::Risky, &mut roller) > 0)
            .count();
        let rate = f64::from(u32::try_from(wins).unwrap()) / f64::from(trials);
        assert!((rate - 0.25).abs() < 0.03, "win rate drifted: {rate:.3}");
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("HipHop".parse::<Genre>(), Ok(Genre::HipHop));
        assert_eq!(" roadtrip ".parse::<Theme>(), Ok(Theme::Roadtrip));
        assert!("polka".parse::<Genre>().is_err());
    }

    #[test]
    fn rating_serializes_as_integer() {
        let json = serde_json::to_string(&CompatibilityRating::Risky).unwrap();
        assert_eq!(json, "-1");
        assert!(serde_json::from_str::<CompatibilityRating>("2").is_err());
    }
}
