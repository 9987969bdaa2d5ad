use serde::{Deserialize, Serialize};

use crate::error::TrainerError;

/// Natural letter names, cycle position relative to C.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Letter {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Letter {
    /// Semitone offset of the natural letter within an octave (C=0, B=11).
    pub fn semitone(self) -> u8 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::A => 'A',
            Letter::B => 'B',
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Accidental {
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    /// Textual suffix used in labels and notation key tokens.
    pub fn suffix(self) -> &'static str {
        match self {
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        }
    }

    /// Semitone alteration applied to the natural letter.
    pub fn alter(self) -> i8 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

/// Whether black-key pitches are spelled with sharps or flats.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccidentalPref {
    Sharps,
    Flats,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PitchSpelling {
    pub letter: Letter,
    pub accidental: Accidental,
}

impl PitchSpelling {
    /// Semitone class 0-11 this spelling names.
    pub fn pitch_class(&self) -> u8 {
        (self.letter.semitone() as i8 + self.accidental.alter()).rem_euclid(12) as u8
    }
}

/// A display-ready note: canonical pitch value plus its current spelling.
/// The spelling is always derived from (midi, preference), never stored
/// independently.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    pub midi: u8,
    pub spelling: PitchSpelling,
}

// Pitch-class spelling tables, index = midi % 12.
const SHARP_SPELLINGS: [(Letter, Accidental); 12] = [
    (Letter::C, Accidental::Natural),
    (Letter::C, Accidental::Sharp),
    (Letter::D, Accidental::Natural),
    (Letter::D, Accidental::Sharp),
    (Letter::E, Accidental::Natural),
    (Letter::F, Accidental::Natural),
    (Letter::F, Accidental::Sharp),
    (Letter::G, Accidental::Natural),
    (Letter::G, Accidental::Sharp),
    (Letter::A, Accidental::Natural),
    (Letter::A, Accidental::Sharp),
    (Letter::B, Accidental::Natural),
];

const FLAT_SPELLINGS: [(Letter, Accidental); 12] = [
    (Letter::C, Accidental::Natural),
    (Letter::D, Accidental::Flat),
    (Letter::D, Accidental::Natural),
    (Letter::E, Accidental::Flat),
    (Letter::E, Accidental::Natural),
    (Letter::F, Accidental::Natural),
    (Letter::G, Accidental::Flat),
    (Letter::G, Accidental::Natural),
    (Letter::A, Accidental::Flat),
    (Letter::A, Accidental::Natural),
    (Letter::B, Accidental::Flat),
    (Letter::B, Accidental::Natural),
];

/// True for pitch classes that sit on a white key (no accidental needed).
pub fn is_white_key(midi: u8) -> bool {
    matches!(midi % 12, 0 | 2 | 4 | 5 | 7 | 9 | 11)
}

/// Octave number under the MIDI convention (60 = C4).
pub fn octave_of(midi: u8) -> i32 {
    midi as i32 / 12 - 1
}

/// Spell a pitch value for the given accidental preference.
/// Values above 127 are rejected, not clamped.
pub fn spell(midi: u8, pref: AccidentalPref) -> Result<PitchSpelling, TrainerError> {
    if midi > 127 {
        return Err(TrainerError::PitchOutOfRange(midi));
    }
    let (letter, accidental) = match pref {
        AccidentalPref::Sharps => SHARP_SPELLINGS[(midi % 12) as usize],
        AccidentalPref::Flats => FLAT_SPELLINGS[(midi % 12) as usize],
    };
    Ok(PitchSpelling { letter, accidental })
}

impl Note {
    pub fn from_midi(midi: u8, pref: AccidentalPref) -> Result<Note, TrainerError> {
        Ok(Note {
            midi,
            spelling: spell(midi, pref)?,
        })
    }

    /// Feedback/hint text, e.g. "C#4".
    pub fn label(&self) -> String {
        format!(
            "{}{}{}",
            self.spelling.letter.as_char(),
            self.spelling.accidental.suffix(),
            octave_of(self.midi)
        )
    }

    /// Key string for the notation renderer, e.g. "c#/4".
    pub fn render_key_token(&self) -> String {
        format!(
            "{}{}/{}",
            self.spelling.letter.as_char().to_ascii_lowercase(),
            self.spelling.accidental.suffix(),
            octave_of(self.midi)
        )
    }
}
