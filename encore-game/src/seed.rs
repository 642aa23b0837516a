//! Reversible season share codes.
//! Code format: <MODE>-<WORD><NN>, e.g., DC-ENCORE42, LG-VINYL07

use crate::scoring::ScoringMode;

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub const WORD_LIST: [&str; 64] = [
    "ENCORE", "VINYL", "CHORUS", "BRIDGE", "RIFF", "TEMPO", "GROOVE", "ANTHEM", "BALLAD", "BASS",
    "SNARE", "CYMBAL", "FADER", "REVERB", "ECHO", "TAPE", "DEMO", "SINGLE", "ALBUM", "LINER",
    "STAGE", "AMP", "CABLE", "TOUR", "VENUE", "CROWD", "MOSH", "LIGHTS", "STROBE", "FOG",
    "ROADIE", "SETLIST", "SOUNDCK", "LOOP", "SAMPLE", "DRUM", "KEYS", "SYNTH", "PICK", "CAPO",
    "FRET", "STRING", "BUSKER", "MIC", "MONITOR", "TUNER", "MIXTAPE", "RADIO", "CHART", "HOOK",
    "VERSE", "OUTRO", "INTRO", "BEAT", "METRO", "OCTAVE", "CHORD", "MELODY", "LYRIC", "NEON",
    "GOLD", "PLATINUM", "HEADLN", "AFTERPT",
];

const WORD_MASK: u16 = 0x003F;

const fn mode_tag(mode: ScoringMode) -> &'static str {
    match mode {
        ScoringMode::Dice => "DC",
        ScoringMode::Legacy => "LG",
    }
}

fn mode_from_tag(tag: &str) -> Option<ScoringMode> {
    match tag.to_ascii_uppercase().as_str() {
        "DC" => Some(ScoringMode::Dice),
        "LG" => Some(ScoringMode::Legacy),
        _ => None,
    }
}

fn pack(word_index: u16, nn: u8) -> u16 {
    (word_index & WORD_MASK) | (u16::from(nn % 100) << 6)
}

fn unpack(packed: u16) -> (usize, u8) {
    let nn = u8::try_from((packed >> 6) % 100).unwrap_or(0);
    (usize::from(packed & WORD_MASK), nn)
}

fn compose_seed(mode: ScoringMode, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let [lo, hi] = packed.to_le_bytes();
    let mut buf = [0u8; 10];
    buf[..6].copy_from_slice(b"ENCOR-");
    buf[6..8].copy_from_slice(mode_tag(mode).as_bytes());
    buf[8] = lo;
    buf[9] = hi;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render a seed as a share code. Only the low 16 bits select the code.
#[must_use]
pub fn encode_friendly(mode: ScoringMode, seed: u64) -> String {
    let (word_index, nn) = unpack(u16::try_from(seed & 0xFFFF).unwrap_or(0));
    let word = WORD_LIST.get(word_index).copied().unwrap_or(WORD_LIST[0]);
    format!("{}-{word}{nn:02}", mode_tag(mode))
}

/// Parse a share code into its scoring mode and run seed. Case-insensitive.
#[must_use]
pub fn parse_share_code(code: &str) -> Option<(ScoringMode, u64)> {
    let (tag, rest) = code.trim().split_once('-')?;
    let mode = mode_from_tag(tag)?;
    if rest.len() < 3 || !rest.is_char_boundary(rest.len() - 2) {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let index = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let word_index = u16::try_from(index).ok()?;
    Some((mode, compose_seed(mode, word_index, nn)))
}

/// Fresh share code from arbitrary entropy.
#[must_use]
pub fn generate_code_from_entropy(mode: ScoringMode, entropy: u64) -> String {
    let word_index = u16::try_from(entropy % 64).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode_friendly(mode, compose_seed(mode, word_index, nn))
}
