use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::Clef;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

// Persisted difficulty strings parse leniently: an unrecognized value
// degrades to Easy instead of poisoning the whole settings record.
impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Difficulty::from_str(&raw))
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Easy
    }
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Lenient parse for persisted values; anything unrecognized is Easy.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "medium" => Self::Medium,
            "hard" => Self::Hard,
            _ => Self::Easy,
        }
    }

    /// Easy drills naturals only; above that, black keys join the pool.
    pub fn include_accidentals(&self) -> bool {
        !matches!(self, Self::Easy)
    }
}

/// Flat settings record persisted by the frontend. Every field carries a
/// serde default so a partially corrupt record degrades field-by-field
/// instead of failing startup.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub range_id: String,
    /// Clef preference remembered for the settings UI. The rendered clef
    /// always comes from the active range preset; this field only seeds
    /// the picker next time the settings panel opens.
    pub clef: Clef,
    pub key_signature_id: String,
    #[serde(rename = "difficultyLevel")]
    pub difficulty: Difficulty,
    pub show_hints: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            range_id: "treble-easy".to_string(),
            clef: Clef::Treble,
            key_signature_id: "c".to_string(),
            difficulty: Difficulty::Easy,
            show_hints: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.range_id, "treble-easy");
        assert_eq!(settings.key_signature_id, "c");
        assert_eq!(settings.difficulty, Difficulty::Easy);
        assert!(settings.show_hints);
    }

    #[test]
    fn test_difficulty_policy() {
        assert!(!Difficulty::Easy.include_accidentals());
        assert!(Difficulty::Medium.include_accidentals());
        assert!(Difficulty::Hard.include_accidentals());
    }

    #[test]
    fn test_lenient_difficulty_parse() {
        assert_eq!(Difficulty::from_str("HARD"), Difficulty::Hard);
        assert_eq!(Difficulty::from_str("medium"), Difficulty::Medium);
        assert_eq!(Difficulty::from_str("banana"), Difficulty::Easy);
        assert_eq!(Difficulty::from_str(""), Difficulty::Easy);
    }

    #[test]
    fn test_partial_record_fills_in_defaults() {
        // A record persisted before a format change: missing fields take
        // defaults, present ones are honored.
        let settings: Settings =
            serde_json::from_str(r#"{ "rangeId": "bass", "difficultyLevel": "hard" }"#).unwrap();
        assert_eq!(settings.range_id, "bass");
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.key_signature_id, "c");
        assert!(settings.show_hints);
    }

    #[test]
    fn test_unknown_difficulty_degrades_to_easy() {
        let settings: Settings =
            serde_json::from_str(r#"{ "difficultyLevel": "nightmare" }"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Easy);
        assert_eq!(settings.difficulty.as_str(), "easy");
    }

    #[test]
    fn test_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("difficultyLevel"));
        let restored: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
    }

    #[test]
    fn test_default_ids_resolve_without_fallback() {
        let settings = Settings::default();
        assert_eq!(
            crate::catalog::range_by_id(&settings.range_id).id,
            settings.range_id
        );
        assert_eq!(
            crate::catalog::key_signature_by_id(&settings.key_signature_id).id,
            settings.key_signature_id
        );
    }
}
