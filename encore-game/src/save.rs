//! Versioned save blobs.
//!
//! A save is one JSON object with camelCase keys, replaced whole on every
//! write. Loading never fails: older versions are migrated step by step,
//! malformed fields fall back to their defaults individually, and an
//! unreadable blob yields a fresh career.
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use thiserror::Error;

use crate::compat::{Genre, Theme};
use crate::constants::{DEFAULT_SONG_NAME, SAVE_VERSION, SEASON_LENGTH};
use crate::dice::{DiceBest, DiceResult};
use crate::numbers::{floor_f64_to_i64, round_f64_to_u64};
use crate::plan::{DayEntry, WeekPlan};
use crate::release::{ReleaseRecord, SongConcept};
use crate::state::CareerState;
use crate::stats::{PerformerStats, StatDelta};

/// Key-value persistence for save blobs.
pub trait SaveStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error>;

    /// Delete the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be removed.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

impl<T: SaveStore + ?Sized> SaveStore for &T {
    type Error = T::Error;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).read(key)
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        (**self).write(key, blob)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        (**self).remove(key)
    }
}

/// In-process store for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.borrow().is_empty()
    }
}

impl SaveStore for MemoryStore {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to encode save: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveBlob<'a> {
    version: u32,
    week: u32,
    money: i64,
    fans: u64,
    vocals: f64,
    writing: f64,
    stage: f64,
    genre: Option<Genre>,
    theme: Option<Theme>,
    song_name: Option<&'a str>,
    concept_locked: bool,
    plan: &'a WeekPlan,
    weekly_gains: StatDelta,
    dice_best: &'a DiceBest,
    history: &'a [ReleaseRecord],
    finished_ready: bool,
    flags: &'a BTreeMap<String, bool>,
}

/// Encode a state at the current format version.
///
/// # Errors
///
/// Returns `SaveError::Encode` if serialization fails.
pub fn serialize_state(state: &CareerState) -> Result<String, SaveError> {
    let concept = state.concept.as_ref();
    let blob = SaveBlob {
        version: SAVE_VERSION,
        week: state.week,
        money: state.money,
        fans: state.fans,
        vocals: state.stats.vocals,
        writing: state.stats.writing,
        stage: state.stats.stage,
        genre: concept.map(|c| c.genre),
        theme: concept.map(|c| c.theme),
        song_name: concept.map(|c| c.name.as_str()),
        concept_locked: state.concept_locked,
        plan: &state.plan,
        weekly_gains: state.plan.weekly_gains(),
        dice_best: &state.dice_best,
        history: &state.history,
        finished_ready: state.finished_ready,
        flags: &state.flags,
    };
    Ok(serde_json::to_string(&blob)?)
}

/// What happened while loading a blob.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub state: CareerState,
    /// Version found in the blob, if any.
    pub from_version: Option<u32>,
    /// Keys (or `key[index]` entries) dropped as malformed.
    pub discarded: Vec<String>,
}

/// Load a blob, never failing. See [`load_with_report`].
#[must_use]
pub fn load_state(blob: &str) -> CareerState {
    load_with_report(blob).state
}

/// Load a blob and describe the repairs applied.
#[must_use]
pub fn load_with_report(blob: &str) -> LoadReport {
    let mut map = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("save blob is not an object; starting fresh");
            return fresh_report();
        }
        Err(err) => {
            warn!("save blob unreadable ({err}); starting fresh");
            return fresh_report();
        }
    };

    let from_version = map
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok());
    let version = from_version.unwrap_or(1);
    if version > SAVE_VERSION {
        warn!("save version {version} is newer than {SAVE_VERSION}; loading known fields only");
    } else if version < SAVE_VERSION {
        migrate(&mut map, version);
    }

    let mut reader = FieldReader {
        map: &map,
        discarded: Vec::new(),
    };
    let state = reader.read_state();
    if !reader.discarded.is_empty() {
        warn!("save repaired; discarded {}", reader.discarded.join(", "));
    }
    LoadReport {
        state,
        from_version,
        discarded: reader.discarded,
    }
}

fn fresh_report() -> LoadReport {
    LoadReport {
        state: CareerState::new(),
        from_version: None,
        discarded: Vec::new(),
    }
}

/// Upgrade an older blob in place to the current version.
fn migrate(map: &mut Map<String, Value>, from: u32) {
    let mut version = from;
    while version < SAVE_VERSION {
        match version {
            1 => migrate_v1_to_v2(map),
            2 => migrate_v2_to_v3(map),
            _ => {}
        }
        version += 1;
        info!("save migrated to version {version}");
    }
    map.insert("version".to_string(), Value::from(SAVE_VERSION));
}

fn migrate_v1_to_v2(map: &mut Map<String, Value>) {
    map.entry("finishedReady").or_insert(Value::Bool(false));
}

fn migrate_v2_to_v3(map: &mut Map<String, Value>) {
    map.entry("diceBest").or_insert(Value::Null);

    if let Some(Value::Array(entries)) = map.get_mut("plan") {
        for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
            entry
                .entry("triadContribution")
                .or_insert(Value::from(0.0));
            let kind = entry
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if let Some(amount) = entry.get("delta").and_then(Value::as_f64) {
                entry.insert("delta".to_string(), numeric_delta(&kind, amount));
            }
        }
    }

    if let Some(Value::Array(records)) = map.get_mut("history") {
        for record in records.iter_mut().filter_map(Value::as_object_mut) {
            if !record.contains_key("releaseWeek")
                && let Some(week) = record.get("week").cloned()
            {
                record.insert("releaseWeek".to_string(), week);
            }
            record
                .entry("gigs")
                .or_insert_with(|| Value::Array(Vec::new()));
        }
    }
}

/// Older plans stored a single number; attribute it to the day's skill.
fn numeric_delta(kind: &str, amount: f64) -> Value {
    let key = match kind {
        "practice" => "vocals",
        "write" => "writing",
        _ => "stage",
    };
    let mut delta = Map::new();
    delta.insert(key.to_string(), Value::from(amount));
    Value::Object(delta)
}

struct FieldReader<'a> {
    map: &'a Map<String, Value>,
    discarded: Vec<String>,
}

impl<'a> FieldReader<'a> {
    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    fn field<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.raw(key)?;
        match T::deserialize(value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                debug!("save field {key} discarded: {err}");
                self.discarded.push(key.to_string());
                None
            }
        }
    }

    fn number(&mut self, key: &str) -> Option<f64> {
        let value = self.raw(key)?;
        match value.as_f64().filter(|n| n.is_finite()) {
            Some(n) => Some(n),
            None => {
                self.discarded.push(key.to_string());
                None
            }
        }
    }

    fn list<T: DeserializeOwned>(&mut self, key: &str) -> Vec<T> {
        let Some(value) = self.raw(key) else {
            return Vec::new();
        };
        let Some(items) = value.as_array() else {
            self.discarded.push(key.to_string());
            return Vec::new();
        };
        let mut parsed = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match T::deserialize(item) {
                Ok(entry) => parsed.push(entry),
                Err(err) => {
                    debug!("save entry {key}[{index}] discarded: {err}");
                    self.discarded.push(format!("{key}[{index}]"));
                }
            }
        }
        parsed
    }

    fn read_state(&mut self) -> CareerState {
        let mut state = CareerState::new();

        if let Some(week) = self.number("week") {
            let clamped = week.clamp(1.0, f64::from(SEASON_LENGTH));
            state.week = u32::try_from(floor_f64_to_i64(clamped)).unwrap_or(1);
        }
        if let Some(money) = self.number("money") {
            state.money = floor_f64_to_i64(money);
        }
        if let Some(fans) = self.number("fans") {
            state.fans = round_f64_to_u64(fans);
        }
        let mut stats = PerformerStats::new(
            self.number("vocals").unwrap_or_default(),
            self.number("writing").unwrap_or_default(),
            self.number("stage").unwrap_or_default(),
        );
        stats.clamp();
        state.stats = stats;

        let genre = self.field::<Genre>("genre");
        let theme = self.field::<Theme>("theme");
        let name = self
            .field::<String>("songName")
            .unwrap_or_else(|| DEFAULT_SONG_NAME.to_string());
        state.concept = match (genre, theme) {
            (Some(genre), Some(theme)) => Some(SongConcept::new(genre, theme, &name)),
            _ => None,
        };
        state.concept_locked =
            state.concept.is_some() && self.field::<bool>("conceptLocked").unwrap_or(false);

        if state.concept_locked {
            let mut plan = WeekPlan::default();
            for entry in self.list::<DayEntry>("plan") {
                plan.push(entry);
            }
            plan.truncate_to_budget();
            state.plan = plan;
            state.dice_best = self.dice_best();
            state.finished_ready = state.plan.days_remaining() == 0
                && self.field::<bool>("finishedReady").unwrap_or(false);
        }

        state.history = self.list::<ReleaseRecord>("history");
        state.history.retain(|record| {
            (0.0..=100.0).contains(&record.score) && (1..=100).contains(&record.chart_pos)
        });
        state.flags = self.flags();
        state
    }

    fn dice_best(&mut self) -> DiceBest {
        let mut dice = self.field::<DiceBest>("diceBest").unwrap_or_default();
        for slot in [&mut dice.sing, &mut dice.write, &mut dice.perform] {
            if slot.is_some_and(|r: DiceResult| r.faces == 0 || !(1..=r.faces).contains(&r.value)) {
                self.discarded.push("diceBest".to_string());
                *slot = None;
            }
        }
        dice
    }

    fn flags(&mut self) -> BTreeMap<String, bool> {
        let Some(Value::Object(raw)) = self.raw("flags") else {
            return BTreeMap::new();
        };
        raw.iter()
            .filter_map(|(key, value)| value.as_bool().map(|flag| (key.clone(), flag)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRoller;
    use crate::state::CareerRules;
    use crate::stats::Activity;
    use crate::venue::VenueId;
    use serde_json::json;

    fn played_state() -> CareerState {
        let rules = CareerRules::default();
        let mut roller = ScriptedRoller::new([3, 7, 2, 9]);
        let mut state = CareerState::new()
            .choose_concept(Genre::Rock, Theme::Rebellion, "Static")
            .unwrap()
            .state
            .lock_concept()
            .unwrap()
            .state;
        for activity in [Activity::Write; 7] {
            state = state.train(&rules, activity, &mut roller).unwrap().state;
        }
        state = state
            .finish_song()
            .unwrap()
            .state
            .perform_release(&rules, VenueId::OpenMic, &mut roller)
            .unwrap()
            .state;
        state = state.lock_concept().unwrap().state;
        state = state.book_gig(&rules, 1, VenueId::Street).unwrap().state;
        state = state
            .train(&rules, Activity::Practice, &mut roller)
            .unwrap()
            .state;
        state.flags.insert("lore.cassette".to_string(), true);
        state
    }

    #[test]
    fn round_trip_preserves_state() {
        let state = played_state();
        let blob = serialize_state(&state).unwrap();
        let report = load_with_report(&blob);
        assert_eq!(report.from_version, Some(SAVE_VERSION));
        assert!(report.discarded.is_empty());
        assert_eq!(report.state, state);
    }

    #[test]
    fn blob_uses_documented_keys() {
        let blob = serialize_state(&played_state()).unwrap();
        let value: Value = serde_json::from_str(&blob).unwrap();
        for key in [
            "version",
            "week",
            "money",
            "fans",
            "vocals",
            "writing",
            "stage",
            "genre",
            "theme",
            "songName",
            "conceptLocked",
            "plan",
            "weeklyGains",
            "diceBest",
            "history",
            "finishedReady",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["plan"][0]["type"], "gig");
        assert_eq!(value["history"][0]["releaseWeek"], 1);
    }

    #[test]
    fn garbage_loads_defaults() {
        for blob in ["", "not json", "[1,2,3]", "42", "null"] {
            assert_eq!(load_state(blob), CareerState::new());
        }
    }

    #[test]
    fn malformed_fields_are_dropped_individually() {
        let blob = json!({
            "version": 3,
            "week": "eleven",
            "money": 120,
            "fans": -4,
            "vocals": 42.0,
            "writing": 3.5,
            "genre": "polka",
            "theme": "love",
            "history": [
                {"week": 1, "releaseWeek": 1, "songName": "Ok", "genre": "pop", "theme": "love",
                 "venue": "street", "score": 50.0, "grade": "D", "chartPos": 80,
                 "moneyGain": 10, "fansGain": 3},
                {"week": "?"}
            ],
            "flags": {"seen.intro": true, "bad": 3}
        })
        .to_string();
        let report = load_with_report(&blob);
        let state = report.state;
        assert_eq!(state.week, 1);
        assert_eq!(state.money, 120);
        assert_eq!(state.fans, 0);
        assert!((state.stats.vocals - 10.0).abs() < f64::EPSILON);
        assert!((state.stats.writing - 3.5).abs() < f64::EPSILON);
        assert!(state.concept.is_none());
        assert_eq!(state.history.len(), 1);
        assert!(state.history[0].gigs.is_empty());
        assert_eq!(state.flags.len(), 1);
        assert!(report.discarded.contains(&"week".to_string()));
        assert!(report.discarded.contains(&"genre".to_string()));
        assert!(report.discarded.contains(&"history[1]".to_string()));
    }

    #[test]
    fn version_one_blob_migrates() {
        let blob = json!({
            "week": 4,
            "money": 33.7,
            "fans": 61,
            "vocals": 1.2,
            "writing": 0.9,
            "stage": 0.4,
            "genre": "folk",
            "theme": "roadtrip",
            "songName": "Mile Markers",
            "conceptLocked": true,
            "plan": [
                {"type": "write", "delta": 0.15},
                {"type": "practice", "delta": 0.15}
            ],
            "history": [
                {"week": 3, "songName": "Exit", "genre": "folk", "theme": "hope",
                 "venue": "open_mic", "score": 71.0, "grade": "B", "chartPos": 35,
                 "moneyGain": 16, "fansGain": 26, "feedback": ["Solid."]}
            ]
        })
        .to_string();
        let report = load_with_report(&blob);
        assert_eq!(report.from_version, None);
        assert!(report.discarded.is_empty(), "{:?}", report.discarded);
        let state = report.state;
        assert_eq!(state.week, 4);
        assert_eq!(state.money, 33);
        assert!(state.concept_locked);
        assert!(!state.finished_ready);
        assert!(state.dice_best.is_empty());
        let entries = state.plan.entries();
        assert_eq!(entries.len(), 2);
        assert!((entries[0].delta.writing - 0.15).abs() < f64::EPSILON);
        assert!((entries[1].delta.vocals - 0.15).abs() < f64::EPSILON);
        assert!(entries[0].triad_contribution.abs() < f64::EPSILON);
        assert_eq!(state.history[0].release_week, 3);
        assert!(state.history[0].gigs.is_empty());
    }

    #[test]
    fn unlocked_concept_drops_week_progress() {
        let blob = json!({
            "version": 2,
            "genre": "pop",
            "theme": "party",
            "conceptLocked": false,
            "finishedReady": true,
            "plan": [{"type": "write", "delta": 0.15}]
        })
        .to_string();
        let state = load_state(&blob);
        assert!(state.concept.is_some());
        assert!(state.plan.entries().is_empty());
        assert!(!state.finished_ready);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.read("slot").unwrap(), None);
        store.write("slot", "{}").unwrap();
        assert_eq!(store.read("slot").unwrap().as_deref(), Some("{}"));
        assert_eq!(store.len(), 1);
        store.remove("slot").unwrap();
        assert!(store.is_empty());
    }
}
