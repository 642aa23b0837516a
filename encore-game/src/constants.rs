//! Centralized balance and tuning constants for Encore career logic.
//!
//! These values define the deterministic math for the progression engine.
//! Keeping them together ensures that balance can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Notification keys --------------------------------------------------------
pub(crate) const TOAST_CONCEPT_LOCKED: &str = "toast.concept.locked";
pub(crate) const TOAST_WEEK_DONE: &str = "toast.week.days-spent";
pub(crate) const TOAST_SONG_FINISHED: &str = "toast.song.finished";
pub(crate) const TOAST_SEASON_OVER: &str = "toast.season.over";
pub(crate) const TOAST_GIG_SOFT_CAP: &str = "toast.gig.soft-cap";
pub(crate) const TOAST_GUARDRAIL: &str = "toast.money.guardrail";
pub(crate) const TOAST_TIP_FLOOR: &str = "toast.money.tip-floor";

// Season --------------------------------------------------------------------
pub(crate) const SEASON_LENGTH: u32 = 52;
pub(crate) const DAYS_PER_WEEK: usize = 7;
pub(crate) const MAX_GIGS_PER_WEEK: usize = 3;
pub(crate) const DEFAULT_SONG_NAME: &str = "Untitled";

// Performer stats -----------------------------------------------------------
pub(crate) const STAT_MIN: f64 = 0.0;
pub(crate) const STAT_MAX: f64 = 10.0;

// Training ------------------------------------------------------------------
pub(crate) const TRAINING_BASE_GAIN: f64 = 0.15;
pub(crate) const TRAINING_DECAY: f64 = 0.85;
pub(crate) const TRAINING_FLOOR: f64 = 0.3;
pub(crate) const TRIAD_STAT_DIVISOR: f64 = 8.0;

// Dice tiers (stat threshold, faces), best first ---------------------------
pub(crate) const DIE_TIERS: [(f64, u32); 4] = [(9.5, 6), (9.0, 8), (7.0, 10), (5.0, 12)];
pub(crate) const DIE_FALLBACK_FACES: u32 = 20;

// Skill weights for dice quality --------------------------------------------
pub(crate) const WEIGHT_SING: f64 = 0.34;
pub(crate) const WEIGHT_WRITE: f64 = 0.33;
pub(crate) const WEIGHT_PERFORM: f64 = 0.33;

// Legacy triad scoring ------------------------------------------------------
pub(crate) const LEGACY_TRIAD_SCALE: f64 = 5.0;
pub(crate) const LEGACY_DAMPENER_START: f64 = 0.75;
pub(crate) const LEGACY_DAMPENER_STEP: f64 = 0.05;

// Compatibility ---------------------------------------------------------------
pub(crate) const COMPAT_GOOD_BONUS: i32 = 8;
pub(crate) const COMPAT_RISKY_WIN: i32 = 12;
pub(crate) const COMPAT_RISKY_LOSS: i32 = -8;
pub(crate) const COMPAT_RISKY_WIN_CHANCE: f64 = 0.25;
pub(crate) const COMPAT_RISKY_ODDS: i32 = 4;

// Release scoring -----------------------------------------------------------
pub(crate) const SCORE_MIN: f64 = 0.0;
pub(crate) const SCORE_MAX: f64 = 100.0;
pub(crate) const BASE_NOISE: i32 = 5;
pub(crate) const CHART_BASE: f64 = 120.0;
pub(crate) const CHART_JITTER: i32 = 3;
pub(crate) const CHART_MIN: u32 = 1;
pub(crate) const CHART_MAX: u32 = 100;
pub(crate) const FAN_BOOST_CAP: f64 = 40.0;
pub(crate) const FAN_BOOST_SCALE: f64 = 14.0;
pub(crate) const FAN_BOOST_OFFSET: f64 = 10.0;

// Grade thresholds ----------------------------------------------------------
pub(crate) const GRADE_S: f64 = 90.0;
pub(crate) const GRADE_A: f64 = 80.0;
pub(crate) const GRADE_B: f64 = 70.0;
pub(crate) const GRADE_C: f64 = 60.0;

// Venue economy ---------------------------------------------------------------
pub(crate) const FANS_GAIN_S: f64 = 60.0;
pub(crate) const FANS_GAIN_A: f64 = 40.0;
pub(crate) const FANS_GAIN_B: f64 = 25.0;
pub(crate) const FANS_GAIN_C: f64 = 12.0;
pub(crate) const FANS_GAIN_D: f64 = 5.0;
pub(crate) const FAN_CARRY_RATE: f64 = 0.05;
pub(crate) const ONBOARDING_WEEKS: u32 = 3;
pub(crate) const ONBOARDING_MONEY_FLOOR: i64 = -20;
pub(crate) const BUSK_STAGE_BONUS: f64 = 0.05;

// Gig economy ---------------------------------------------------------------
pub(crate) const GIG_FRESHNESS_DECAY: f64 = 0.1;
pub(crate) const GIG_FRESHNESS_FLOOR: f64 = 0.5;
pub(crate) const GIG_REPETITION: [f64; 3] = [1.0, 0.8, 0.6];
pub(crate) const GIG_REPETITION_FLOOR: f64 = 0.5;
pub(crate) const GIG_SOFT_CAP: f64 = 0.5;
pub(crate) const GIG_STAGE_GAIN: f64 = 0.08;
pub(crate) const GIG_VOCAL_GAIN: f64 = 0.04;
pub(crate) const GIG_NO_RISK_BOOST: f64 = 1.5;

// Presentation ----------------------------------------------------------------
pub(crate) const PRESENTATION_DELAY_MS: u64 = 1_200;

// Persistence -----------------------------------------------------------------
pub(crate) const SAVE_VERSION: u32 = 3;
pub(crate) const SAVE_KEY: &str = "encore.career";
