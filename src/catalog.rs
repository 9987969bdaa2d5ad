use serde::{Deserialize, Serialize};

use crate::error::TrainerError;
use crate::spelling::AccidentalPref;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    Treble,
    Bass,
}

impl Clef {
    /// Token the notation renderer expects ("treble" / "bass").
    pub fn token(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
        }
    }
}

/// Named contiguous span of eligible pitches plus its clef.
#[derive(Serialize, Clone, Copy, Debug)]
pub struct RangePreset {
    pub id: &'static str,
    pub label: &'static str,
    pub clef: Clef,
    pub min_midi: u8,
    pub max_midi: u8,
}

/// Named key signature: renderer token plus the spelling preference it
/// implies for accidentals outside the signature.
#[derive(Serialize, Clone, Copy, Debug)]
pub struct KeySignature {
    pub id: &'static str,
    pub label: &'static str,
    pub vex: &'static str,
    pub pref: AccidentalPref,
}

const RANGES: [RangePreset; 4] = [
    RangePreset {
        id: "treble-easy",
        label: "C4–B4 (easy)",
        clef: Clef::Treble,
        min_midi: 60,
        max_midi: 71,
    },
    RangePreset {
        id: "treble-octave",
        label: "C4–C5",
        clef: Clef::Treble,
        min_midi: 60,
        max_midi: 72,
    },
    RangePreset {
        id: "treble-wide",
        label: "C4–C6",
        clef: Clef::Treble,
        min_midi: 60,
        max_midi: 84,
    },
    RangePreset {
        id: "bass",
        label: "E2–C4",
        clef: Clef::Bass,
        min_midi: 40,
        max_midi: 60,
    },
];

const KEY_SIGNATURES: [KeySignature; 7] = [
    KeySignature {
        id: "c",
        label: "C major",
        vex: "C",
        pref: AccidentalPref::Sharps,
    },
    KeySignature {
        id: "g",
        label: "G major",
        vex: "G",
        pref: AccidentalPref::Sharps,
    },
    KeySignature {
        id: "d",
        label: "D major",
        vex: "D",
        pref: AccidentalPref::Sharps,
    },
    KeySignature {
        id: "a",
        label: "A major",
        vex: "A",
        pref: AccidentalPref::Sharps,
    },
    KeySignature {
        id: "f",
        label: "F major",
        vex: "F",
        pref: AccidentalPref::Flats,
    },
    KeySignature {
        id: "bb",
        label: "Bb major",
        vex: "Bb",
        pref: AccidentalPref::Flats,
    },
    KeySignature {
        id: "eb",
        label: "Eb major",
        vex: "Eb",
        pref: AccidentalPref::Flats,
    },
];

pub fn ranges() -> &'static [RangePreset] {
    &RANGES
}

pub fn key_signatures() -> &'static [KeySignature] {
    &KEY_SIGNATURES
}

/// Resolve a range id. Unknown ids fall back to the first preset: persisted
/// settings can outlive a catalog reshuffle, and that drift is recoverable.
pub fn range_by_id(id: &str) -> &'static RangePreset {
    RANGES.iter().find(|r| r.id == id).unwrap_or_else(|| {
        log::warn!("unknown range id '{}', falling back to '{}'", id, RANGES[0].id);
        &RANGES[0]
    })
}

pub fn key_signature_by_id(id: &str) -> &'static KeySignature {
    KEY_SIGNATURES.iter().find(|k| k.id == id).unwrap_or_else(|| {
        log::warn!(
            "unknown key signature id '{}', falling back to '{}'",
            id,
            KEY_SIGNATURES[0].id
        );
        &KEY_SIGNATURES[0]
    })
}

/// First id that appears more than once, if any.
fn first_duplicate_id<'a>(ids: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for id in ids {
        if seen.contains(&id) {
            return Some(id);
        }
        seen.push(id);
    }
    None
}

/// Structural check run once at session start so bad configuration fails
/// loudly at load time instead of inside trial selection: tables non-empty,
/// ids unique, every range well-formed.
pub fn validate_catalog() -> Result<(), TrainerError> {
    if RANGES.is_empty() {
        return Err(TrainerError::InvalidCatalog("no range presets".to_string()));
    }
    if KEY_SIGNATURES.is_empty() {
        return Err(TrainerError::InvalidCatalog("no key signatures".to_string()));
    }
    if let Some(id) = first_duplicate_id(RANGES.iter().map(|r| r.id)) {
        return Err(TrainerError::InvalidCatalog(format!(
            "duplicate range id '{}'",
            id
        )));
    }
    if let Some(id) = first_duplicate_id(KEY_SIGNATURES.iter().map(|k| k.id)) {
        return Err(TrainerError::InvalidCatalog(format!(
            "duplicate key signature id '{}'",
            id
        )));
    }
    for range in &RANGES {
        if range.min_midi > range.max_midi {
            return Err(TrainerError::InvalidRange {
                id: range.id.to_string(),
                min: range.min_midi,
                max: range.max_midi,
            });
        }
        if range.max_midi > 127 {
            return Err(TrainerError::PitchOutOfRange(range.max_midi));
        }
    }
    Ok(())
}
