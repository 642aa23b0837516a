//! Performer stats and the training activities that raise them.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{STAT_MAX, STAT_MIN};

/// One leg of the production triad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    /// Melody; trained by practice, checked by the `sing` roll.
    Sing,
    /// Lyrics; trained by writing, checked by the `write` roll.
    Write,
    /// Performance; trained on stage, checked by the `perform` roll.
    Perform,
}

impl Skill {
    pub const ALL: [Self; 3] = [Self::Sing, Self::Write, Self::Perform];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sing => "sing",
            Self::Write => "write",
            Self::Perform => "perform",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A day-consuming training instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Practice,
    Write,
    Perform,
}

impl Activity {
    pub const ALL: [Self; 3] = [Self::Practice, Self::Write, Self::Perform];

    #[must_use]
    pub const fn skill(self) -> Skill {
        match self {
            Self::Practice => Skill::Sing,
            Self::Write => Skill::Write,
            Self::Perform => Skill::Perform,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Write => "write",
            Self::Perform => "perform",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practice" | "sing" => Ok(Self::Practice),
            "write" => Ok(Self::Write),
            "perform" | "stage" => Ok(Self::Perform),
            _ => Err(()),
        }
    }
}

/// Trained performer ability, each stat within `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformerStats {
    #[serde(default)]
    pub vocals: f64,
    #[serde(default)]
    pub writing: f64,
    #[serde(default)]
    pub stage: f64,
}

impl PerformerStats {
    #[must_use]
    pub const fn new(vocals: f64, writing: f64, stage: f64) -> Self {
        Self {
            vocals,
            writing,
            stage,
        }
    }

    #[must_use]
    pub const fn get(&self, skill: Skill) -> f64 {
        match skill {
            Skill::Sing => self.vocals,
            Skill::Write => self.writing,
            Skill::Perform => self.stage,
        }
    }

    /// Add `delta` to one stat and return the change actually applied after clamping.
    pub fn raise(&mut self, skill: Skill, delta: f64) -> f64 {
        let slot = match skill {
            Skill::Sing => &mut self.vocals,
            Skill::Write => &mut self.writing,
            Skill::Perform => &mut self.stage,
        };
        let before = *slot;
        *slot = clamp_stat(before + delta.max(0.0));
        *slot - before
    }

    /// Apply every component of a delta, returning the clamped change.
    pub fn apply(&mut self, delta: StatDelta) -> StatDelta {
        StatDelta {
            vocals: self.raise(Skill::Sing, delta.vocals),
            writing: self.raise(Skill::Write, delta.writing),
            stage: self.raise(Skill::Perform, delta.stage),
        }
    }

    /// Force every stat back into range; non-finite values become zero.
    pub fn clamp(&mut self) {
        self.vocals = clamp_stat(self.vocals);
        self.writing = clamp_stat(self.writing);
        self.stage = clamp_stat(self.stage);
    }
}

#[must_use]
pub fn clamp_stat(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(STAT_MIN, STAT_MAX)
    } else {
        STAT_MIN
    }
}

/// Stat change reported to the player.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatDelta {
    #[serde(default)]
    pub vocals: f64,
    #[serde(default)]
    pub writing: f64,
    #[serde(default)]
    pub stage: f64,
}

impl StatDelta {
    #[must_use]
    pub const fn only(skill: Skill, amount: f64) -> Self {
        match skill {
            Skill::Sing => Self {
                vocals: amount,
                writing: 0.0,
                stage: 0.0,
            },
            Skill::Write => Self {
                vocals: 0.0,
                writing: amount,
                stage: 0.0,
            },
            Skill::Perform => Self {
                vocals: 0.0,
                writing: 0.0,
                stage: amount,
            },
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.vocals.abs() < f64::EPSILON
            && self.writing.abs() < f64::EPSILON
            && self.stage.abs() < f64::EPSILON
    }

    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self {
            vocals: self.vocals + other.vocals,
            writing: self.writing + other.writing,
            stage: self.stage + other.stage,
        }
    }
}
