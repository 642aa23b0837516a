use anyhow::{Result, anyhow, bail};
use encore_game::seed::WORD_LIST;
use encore_game::{ScoringMode, encode_friendly, parse_share_code};
use std::collections::BTreeMap;

/// Share-code prefixes and the scoring mode each one pins.
pub const MODE_PREFIXES: [(&str, ScoringMode); 2] =
    [("DC", ScoringMode::Dice), ("LG", ScoringMode::Legacy)];

const FALLBACK_SEED: u64 = 1337;

/// Seed metadata resolved from the command line.
#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    /// Scoring mode pinned by a share code; `None` for numeric seeds.
    pub source_mode: Option<ScoringMode>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_mode: None,
        }
    }

    #[must_use]
    pub fn from_share_code(seed: u64, mode: ScoringMode, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_mode: Some(mode),
        }
    }

    /// Share code to print for a run in `mode`. Reuses the code the seed came
    /// from when the modes agree, so reports echo what the user typed.
    #[must_use]
    pub fn share_code_for_mode(&self, mode: ScoringMode) -> String {
        match (&self.code, self.source_mode) {
            (Some(code), Some(pinned)) if pinned == mode => code.clone(),
            _ => encode_friendly(mode, self.seed),
        }
    }
}

/// One classified `--seeds` token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SeedToken {
    Numeric(u64),
    ShareCode {
        code: String,
        mode: ScoringMode,
        seed: u64,
    },
    AllCodes,
}

impl SeedToken {
    fn classify(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("all") {
            return Some(Self::AllCodes);
        }
        if let Ok(value) = token.parse::<i64>() {
            return Some(Self::Numeric(value.unsigned_abs()));
        }
        if let Ok(value) = token.parse::<u64>() {
            return Some(Self::Numeric(value));
        }
        let code = token.to_ascii_uppercase();
        parse_share_code(&code).map(|(mode, seed)| Self::ShareCode { code, mode, seed })
    }

    fn into_seeds(self) -> Result<Vec<SeedInfo>> {
        match self {
            Self::Numeric(seed) => Ok(vec![SeedInfo::from_numeric(seed)]),
            Self::ShareCode { code, mode, seed } => {
                Ok(vec![SeedInfo::from_share_code(seed, mode, code)])
            }
            Self::AllCodes => every_share_code(),
        }
    }
}

/// Resolve CLI seed tokens into canonical seed metadata.
///
/// Accepts integers, share codes, and `all` which expands to every share code.
/// Seeds repeat-collapse per pinned mode; a share code wins over a bare number
/// for the same seed and mode. No usable token yields the fallback seed.
///
/// # Errors
///
/// Returns an error for tokens that are neither numbers nor share codes.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut order: Vec<(u64, Option<ScoringMode>)> = Vec::new();
    let mut by_key: BTreeMap<(u64, Option<ScoringMode>), SeedInfo> = BTreeMap::new();

    for token in tokens.iter().filter(|t| !t.is_empty()) {
        let Some(classified) = SeedToken::classify(token) else {
            bail!("Unrecognized seed token: {token}");
        };
        for info in classified.into_seeds()? {
            let key = (info.seed, info.source_mode);
            match by_key.get_mut(&key) {
                Some(kept) if kept.code.is_none() => *kept = info,
                Some(_) => {}
                None => {
                    order.push(key);
                    by_key.insert(key, info);
                }
            }
        }
    }

    let resolved: Vec<SeedInfo> = order.iter().filter_map(|key| by_key.remove(key)).collect();
    if resolved.is_empty() {
        return Ok(vec![SeedInfo::from_numeric(FALLBACK_SEED)]);
    }
    Ok(resolved)
}

/// Every `PREFIX-WORDNN` code, grouped by mode prefix.
fn every_share_code() -> Result<Vec<SeedInfo>> {
    let mut seeds = Vec::with_capacity(MODE_PREFIXES.len() * WORD_LIST.len() * 100);
    for (prefix, mode) in MODE_PREFIXES {
        for word in WORD_LIST {
            for suffix in 0..100_u32 {
                let code = format!("{prefix}-{word}{suffix:02}");
                let (parsed_mode, seed) = parse_share_code(&code)
                    .ok_or_else(|| anyhow!("share code does not parse: {code}"))?;
                if parsed_mode != mode {
                    bail!("share code {code} parsed as {parsed_mode:?}, expected {mode:?}");
                }
                seeds.push(SeedInfo::from_share_code(seed, mode, code));
            }
        }
    }
    Ok(seeds)
}
