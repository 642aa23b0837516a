//! Song concepts and the release history.
use serde::{Deserialize, Serialize};

use crate::compat::{CompatibilityRating, Genre, Theme};
use crate::constants::DEFAULT_SONG_NAME;
use crate::dice::DiceBest;
use crate::scoring::{Grade, ScoreBreakdown};
use crate::stats::Skill;
use crate::venue::VenueId;

/// The week's song: a genre, a theme and a working title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongConcept {
    pub genre: Genre,
    pub theme: Theme,
    pub name: String,
}

impl SongConcept {
    /// Build a concept, falling back to a default title for blank names.
    #[must_use]
    pub fn new(genre: Genre, theme: Theme, name: &str) -> Self {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            DEFAULT_SONG_NAME.to_string()
        } else {
            trimmed.to_string()
        };
        Self { genre, theme, name }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigEvent {
    pub week: u32,
    pub venue: VenueId,
    pub money_gain: i64,
    pub fans_gain: u64,
}

/// A completed release. Only `gigs` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    pub week: u32,
    pub release_week: u32,
    pub song_name: String,
    pub genre: Genre,
    pub theme: Theme,
    pub venue: VenueId,
    pub score: f64,
    pub grade: Grade,
    pub chart_pos: u32,
    pub money_gain: i64,
    pub fans_gain: u64,
    #[serde(default)]
    pub feedback: Vec<String>,
    #[serde(default)]
    pub gigs: Vec<GigEvent>,
}

impl ReleaseRecord {
    /// Total money earned by the release and every replay.
    #[must_use]
    pub fn lifetime_money(&self) -> i64 {
        self.gigs
            .iter()
            .fold(self.money_gain, |acc, gig| acc.saturating_add(gig.money_gain))
    }
}

const fn skill_noun(skill: Skill) -> &'static str {
    match skill {
        Skill::Sing => "vocals",
        Skill::Write => "lyrics",
        Skill::Perform => "stage show",
    }
}

/// Short critic lines describing a release.
#[must_use]
pub fn compose_feedback(
    concept: &SongConcept,
    breakdown: &ScoreBreakdown,
    dice: &DiceBest,
    rating: CompatibilityRating,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(4);

    let rolled: Vec<(Skill, f64)> = Skill::ALL
        .into_iter()
        .filter_map(|skill| dice.get(skill).map(|r| (skill, r.quality())))
        .collect();
    let strongest = rolled
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1));
    let weakest = rolled
        .iter()
        .copied()
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((skill, quality)) = strongest
        && quality >= 0.75
    {
        lines.push(format!("The {} carried the track.", skill_noun(skill)));
    }
    if let Some((skill, quality)) = weakest
        && quality < 0.5
    {
        lines.push(format!("The {} felt unfinished.", skill_noun(skill)));
    }
    if let Some(missing) = Skill::ALL.into_iter().find(|skill| dice.get(*skill).is_none())
        && !rolled.is_empty()
    {
        lines.push(format!(
            "Nobody worked on the {} this week.",
            skill_noun(missing)
        ));
    }

    let pairing = match rating {
        CompatibilityRating::Good => Some(format!(
            "A {} song about {} just makes sense.",
            concept.genre, concept.theme
        )),
        CompatibilityRating::Risky if breakdown.compat_bonus > 0 => Some(format!(
            "The daring {}/{} mix paid off.",
            concept.genre, concept.theme
        )),
        CompatibilityRating::Risky => Some(format!(
            "Critics found the {}/{} pairing jarring.",
            concept.genre, concept.theme
        )),
        CompatibilityRating::Neutral => None,
    };
    lines.extend(pairing);

    let verdict = match breakdown.grade {
        Grade::S => "A career-defining release.",
        Grade::A => "A standout single.",
        Grade::B => "Solid work with room to grow.",
        Grade::C => "A lukewarm reception.",
        Grade::D => "It barely registered.",
    };
    lines.push(verdict.to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DiceResult;

    fn breakdown(grade: Grade, compat_bonus: i32) -> ScoreBreakdown {
        ScoreBreakdown {
            quality: 70.0,
            compat_bonus,
            base_noise: 0,
            venue_noise: 0,
            score: 72.0,
            grade,
            chart_pos: 40,
        }
    }

    #[test]
    fn blank_titles_get_default_name() {
        let concept = SongConcept::new(Genre::Folk, Theme::Hope, "   ");
        assert_eq!(concept.name, "Untitled");
        let named = SongConcept::new(Genre::Folk, Theme::Hope, " Lanterns ");
        assert_eq!(named.name, "Lanterns");
    }

    #[test]
    fn feedback_mentions_strengths_pairing_and_verdict() {
        let concept = SongConcept::new(Genre::Pop, Theme::Rebellion, "Riot");
        let dice = DiceBest {
            sing: Some(DiceResult { faces: 20, value: 1 }),
            write: Some(DiceResult { faces: 20, value: 19 }),
            perform: None,
        };
        let lines = compose_feedback(
            &concept,
            &breakdown(Grade::B, 12),
            &dice,
            CompatibilityRating::Risky,
        );
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().any(|l| l.contains("vocals carried")));
        assert!(lines.iter().any(|l| l.contains("lyrics felt unfinished")));
        assert!(lines.iter().any(|l| l.contains("stage show")));
        assert!(lines.iter().any(|l| l.contains("paid off")));
        assert_eq!(lines.last().map(String::as_str), Some("Solid work with room to grow."));
    }

    #[test]
    fn neutral_pairing_without_dice_yields_only_verdict() {
        let concept = SongConcept::new(Genre::Jazz, Theme::Party, "Late Set");
        let lines = compose_feedback(
            &concept,
            &breakdown(Grade::D, 0),
            &DiceBest::default(),
            CompatibilityRating::Neutral,
        );
        assert_eq!(lines, vec!["It barely registered.".to_string()]);
    }

    #[test]
    fn lifetime_money_includes_gigs() {
        let record = ReleaseRecord {
            week: 2,
            release_week: 2,
            song_name: "Two".to_string(),
            genre: Genre::Rock,
            theme: Theme::Roadtrip,
            venue: VenueId::OpenMic,
            score: 64.0,
            grade: Grade::C,
            chart_pos: 70,
            money_gain: 9,
            fans_gain: 12,
            feedback: vec![],
            gigs: vec![
                GigEvent {
                    week: 3,
                    venue: VenueId::Street,
                    money_gain: 5,
                    fans_gain: 4,
                },
                GigEvent {
                    week: 3,
                    venue: VenueId::OpenMic,
                    money_gain: -2,
                    fans_gain: 6,
                },
            ],
        };
        assert_eq!(record.lifetime_money(), 12);
    }
}
