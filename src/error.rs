use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TrainerError {
    /// A pitch value outside 0-127 reached the core. This is a caller bug:
    /// pitches are rejected, never clamped, so selection bugs surface.
    #[error("pitch value {0} is outside the MIDI range 0-127")]
    PitchOutOfRange(u8),

    /// The active range/difficulty combination yields no pitches at all.
    /// Catalog validation should make this unreachable in practice.
    #[error("no eligible pitches to select from")]
    EmptyEligibleSet,

    #[error("invalid range preset '{id}': min {min} exceeds max {max}")]
    InvalidRange { id: String, min: u8, max: u8 },

    #[error("catalog is misconfigured: {0}")]
    InvalidCatalog(String),

    #[error("no active session")]
    NoSession,
}
