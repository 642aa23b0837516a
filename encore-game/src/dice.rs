//! Skill checks.
//!
//! A stat maps to a die; fewer faces is better, and a low roll is a good
//! outcome. The week keeps one result per skill.
use serde::{Deserialize, Serialize};

use crate::constants::{DIE_FALLBACK_FACES, DIE_TIERS};
use crate::rng::{RollDomain, Roller};
use crate::stats::Skill;

/// Faces of the die rolled for a stat value.
#[must_use]
pub fn die_faces(stat: f64) -> u32 {
    DIE_TIERS
        .iter()
        .find(|(threshold, _)| stat >= *threshold)
        .map_or(DIE_FALLBACK_FACES, |(_, faces)| *faces)
}

/// The next stat threshold and the die it unlocks, for progress hints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DieUpgrade {
    pub threshold: f64,
    pub faces: u32,
}

/// Next die improvement above `stat`, or `None` once the best die is reached.
#[must_use]
pub fn next_upgrade(stat: f64) -> Option<DieUpgrade> {
    let current = die_faces(stat);
    DIE_TIERS
        .iter()
        .rev()
        .find(|(threshold, faces)| *faces < current && stat < *threshold)
        .map(|(threshold, faces)| DieUpgrade {
            threshold: *threshold,
            faces: *faces,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceResult {
    pub faces: u32,
    pub value: u32,
}

impl DiceResult {
    /// Normalized quality in `(0, 1]`; rolling a 1 on any die yields `1.0`.
    #[must_use]
    pub fn quality(&self) -> f64 {
        if self.faces == 0 {
            return 0.0;
        }
        let faces = f64::from(self.faces);
        let value = f64::from(self.value.clamp(1, self.faces));
        (faces + 1.0 - value) / faces
    }

    /// Whether `self` is a better outcome than `other`: the lower face value
    /// wins, and on equal values the smaller die wins.
    #[must_use]
    pub fn beats(&self, other: &Self) -> bool {
        (self.value, self.faces) < (other.value, other.faces)
    }
}

/// Roll the die for `stat`.
pub fn roll_check<R: Roller + ?Sized>(stat: f64, roller: &mut R) -> DiceResult {
    let faces = die_faces(stat);
    let high = i32::try_from(faces).unwrap_or(i32::MAX);
    let rolled = roller.roll(RollDomain::Dice, 1, high);
    DiceResult {
        faces,
        value: u32::try_from(rolled).unwrap_or(1).clamp(1, faces),
    }
}

/// Which roll the week keeps when a skill is checked more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiceRetention {
    /// The most recent roll overwrites earlier ones.
    #[default]
    Last,
    /// The best roll of the week is kept.
    Best,
}

/// Per-week skill-check cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiceBest {
    #[serde(default)]
    pub sing: Option<DiceResult>,
    #[serde(default)]
    pub write: Option<DiceResult>,
    #[serde(default)]
    pub perform: Option<DiceResult>,
}

impl DiceBest {
    #[must_use]
    pub const fn get(&self, skill: Skill) -> Option<DiceResult> {
        match skill {
            Skill::Sing => self.sing,
            Skill::Write => self.write,
            Skill::Perform => self.perform,
        }
    }

    /// Store a roll according to the retention policy. Returns whether the
    /// cache changed.
    pub fn record(&mut self, skill: Skill, result: DiceResult, retention: DiceRetention) -> bool {
        let slot = match skill {
            Skill::Sing => &mut self.sing,
            Skill::Write => &mut self.write,
            Skill::Perform => &mut self.perform,
        };
        let keep = match (retention, slot.as_ref()) {
            (DiceRetention::Last, _) | (DiceRetention::Best, None) => true,
            (DiceRetention::Best, Some(existing)) => result.beats(existing),
        };
        if keep {
            *slot = Some(result);
        }
        keep
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sing.is_none() && self.write.is_none() && self.perform.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRoller;

    #[test]
    fn tiers_match_thresholds() {
        assert_eq!(die_faces(10.0), 6);
        assert_eq!(die_faces(9.5), 6);
        assert_eq!(die_faces(9.49), 8);
        assert_eq!(die_faces(9.0), 8);
        assert_eq!(die_faces(8.99), 10);
        assert_eq!(die_faces(7.0), 10);
        assert_eq!(die_faces(6.99), 12);
        assert_eq!(die_faces(5.0), 12);
        assert_eq!(die_faces(4.99), 20);
        assert_eq!(die_faces(0.0), 20);
    }

    #[test]
    fn faces_never_increase_as_stat_grows() {
        let mut previous = die_faces(0.0);
        for step in 0..=1000 {
            let stat = f64::from(step) / 100.0;
            let faces = die_faces(stat);
            assert!([6, 8, 10, 12, 20].contains(&faces));
            assert!(faces <= previous);
            previous = faces;
        }
    }

    #[test]
    fn upgrade_hint_points_to_next_tier() {
        assert_eq!(
            next_upgrade(2.0),
            Some(DieUpgrade {
                threshold: 5.0,
                faces: 12
            })
        );
        assert_eq!(
            next_upgrade(7.5),
            Some(DieUpgrade {
                threshold: 9.0,
                faces: 8
            })
        );
        assert_eq!(
            next_upgrade(9.2),
            Some(DieUpgrade {
                threshold: 9.5,
                faces: 6
            })
        );
        assert_eq!(next_upgrade(9.7), None);
    }

    #[test]
    fn rolling_one_is_perfect_quality() {
        for faces in [6, 8, 10, 12, 20] {
            let best = DiceResult { faces, value: 1 };
            assert!((best.quality() - 1.0).abs() < 1e-12);
            let worst = DiceResult {
                faces,
                value: faces,
            };
            assert!((worst.quality() - 1.0 / f64::from(faces)).abs() < 1e-12);
        }
    }

    #[test]
    fn roll_check_uses_stat_die() {
        let mut roller = ScriptedRoller::new([7, 40]);
        assert_eq!(roll_check(2.0, &mut roller), DiceResult { faces: 20, value: 7 });
        assert_eq!(roll_check(9.6, &mut roller), DiceResult { faces: 6, value: 6 });
    }

    #[test]
    fn retention_policies_differ() {
        let good = DiceResult { faces: 20, value: 2 };
        let bad = DiceResult { faces: 20, value: 18 };

        let mut last = DiceBest::default();
        last.record(Skill::Sing, good, DiceRetention::Last);
        last.record(Skill::Sing, bad, DiceRetention::Last);
        assert_eq!(last.sing, Some(bad));

        let mut best = DiceBest::default();
        best.record(Skill::Sing, good, DiceRetention::Best);
        assert!(!best.record(Skill::Sing, bad, DiceRetention::Best));
        assert_eq!(best.sing, Some(good));
        assert!(best.write.is_none());
    }

    #[test]
    fn best_retention_ranks_by_value_then_die_size() {
        let d20_two = DiceResult { faces: 20, value: 2 };
        let d12_two = DiceResult { faces: 12, value: 2 };
        let d12_three = DiceResult { faces: 12, value: 3 };
        let d6_one = DiceResult { faces: 6, value: 1 };

        let mut best = DiceBest::default();
        assert!(best.record(Skill::Sing, d20_two, DiceRetention::Best));
        assert!(best.record(Skill::Sing, d12_two, DiceRetention::Best));
        assert_eq!(best.sing, Some(d12_two));
        assert!(!best.record(Skill::Sing, d20_two, DiceRetention::Best));
        assert_eq!(best.sing, Some(d12_two));

        let mut cache = DiceBest::default();
        cache.record(Skill::Write, d20_two, DiceRetention::Best);
        assert!(!cache.record(Skill::Write, d12_three, DiceRetention::Best));
        assert_eq!(cache.write, Some(d20_two));
        assert!(cache.record(Skill::Write, d6_one, DiceRetention::Best));
        assert_eq!(cache.write, Some(d6_one));

        assert!(!d12_two.beats(&d12_two));
    }
}
