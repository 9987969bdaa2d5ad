use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// EMA smoothing factor: how much the latest answer moves the accuracy.
pub const EMA_ALPHA: f64 = 0.3;

/// Accuracy assumed for a pitch before any observation.
pub const NEUTRAL_ACCURACY: f64 = 0.5;

/// Selection weight for a never-seen pitch. Chosen to sit above the weight
/// of any well-practiced pitch (which tends to 1.0 at perfect accuracy) so
/// new material gets priority.
pub const UNSEEN_WEIGHT: f64 = 3.0;

/// Running statistics for a single pitch. Invariant: seen == correct + wrong.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct NoteStatistic {
    pub seen: u32,
    pub correct: u32,
    pub wrong: u32,
    pub ema_accuracy: f64,
}

impl Default for NoteStatistic {
    fn default() -> Self {
        NoteStatistic {
            seen: 0,
            correct: 0,
            wrong: 0,
            ema_accuracy: NEUTRAL_ACCURACY,
        }
    }
}

/// Per-pitch performance history. Pitches appear only once presented;
/// an absent key means the neutral statistic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerformanceLedger {
    stats: BTreeMap<u8, NoteStatistic>,
}

// The wire shape is a plain string-keyed record ({"60": {...}}) so the
// persistence collaborator can round-trip it through local storage as JSON.
impl Serialize for PerformanceLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.stats.iter().map(|(k, v)| (k.to_string(), v)))
    }
}

impl NoteStatistic {
    /// True when the record could have been produced by `record_outcome`:
    /// consistent counts and an EMA inside [0, 1]. Anything else is corrupt
    /// persisted data and must not reach the weight computation, where an
    /// out-of-range EMA would yield a non-positive weight.
    fn is_consistent(&self) -> bool {
        self.seen == self.correct + self.wrong
            && self.ema_accuracy.is_finite()
            && (0.0..=1.0).contains(&self.ema_accuracy)
    }
}

// Unparseable pitch keys and inconsistent stat bodies in persisted data
// are dropped with a warning rather than failing the whole load.
impl<'de> Deserialize<'de> for PerformanceLedger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, NoteStatistic>::deserialize(deserializer)?;
        let mut stats = BTreeMap::new();
        for (key, stat) in raw {
            match key.parse::<u8>() {
                Ok(midi) if midi <= 127 => {
                    if stat.is_consistent() {
                        stats.insert(midi, stat);
                    } else {
                        log::warn!("dropping corrupt ledger entry for pitch {}", midi);
                    }
                }
                _ => log::warn!("dropping ledger entry with bad pitch key '{}'", key),
            }
        }
        Ok(PerformanceLedger { stats })
    }
}

impl PerformanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistic for a pitch, neutral if never seen.
    pub fn stat_for(&self, midi: u8) -> NoteStatistic {
        self.stats.get(&midi).copied().unwrap_or_default()
    }

    /// Record one answered trial. Returns a fresh snapshot; the previous
    /// ledger is left untouched so readers never observe a partial update.
    pub fn record_outcome(&self, midi: u8, was_correct: bool) -> PerformanceLedger {
        let mut next = self.clone();
        let entry = next.stats.entry(midi).or_default();
        entry.seen += 1;
        if was_correct {
            entry.correct += 1;
        } else {
            entry.wrong += 1;
        }
        let observation = if was_correct { 1.0 } else { 0.0 };
        entry.ema_accuracy = EMA_ALPHA * observation + (1.0 - EMA_ALPHA) * entry.ema_accuracy;
        next
    }

    /// Selection weight for a pitch. Never seen: fixed high default.
    /// Seen: grows as accuracy drops and while the pitch is under-practiced.
    /// Always strictly positive, so every eligible pitch stays selectable.
    pub fn weight_for(&self, midi: u8) -> f64 {
        match self.stats.get(&midi) {
            None => UNSEEN_WEIGHT,
            Some(stat) => {
                let weakness = 2.0 * (1.0 - stat.ema_accuracy);
                let under_practice = 1.0 / (1.0 + stat.seen as f64);
                1.0 + weakness + under_practice
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Wholesale reset back to the empty ledger.
    pub fn reset(&mut self) {
        self.stats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_after_n_outcomes() {
        let mut ledger = PerformanceLedger::new();
        for i in 0..10 {
            ledger = ledger.record_outcome(60, i % 3 == 0);
        }
        let stat = ledger.stat_for(60);
        assert_eq!(stat.seen, 10);
        assert_eq!(stat.correct + stat.wrong, 10);
        assert_eq!(stat.correct, 4);
    }

    #[test]
    fn test_ema_moves_toward_outcome() {
        let ledger = PerformanceLedger::new();
        let before = ledger.stat_for(72).ema_accuracy;
        assert_eq!(before, NEUTRAL_ACCURACY);

        // A correct answer never decreases the EMA.
        let after_good = ledger.record_outcome(72, true).stat_for(72).ema_accuracy;
        assert!(after_good >= before);

        // A wrong answer never increases it.
        let after_bad = ledger.record_outcome(72, false).stat_for(72).ema_accuracy;
        assert!(after_bad <= before);

        // And it stays inside [0, 1] under a long streak either way.
        let mut streak = ledger.clone();
        for _ in 0..50 {
            streak = streak.record_outcome(72, false);
        }
        let acc = streak.stat_for(72).ema_accuracy;
        assert!((0.0..=1.0).contains(&acc));
        assert!(acc < 0.01);
    }

    #[test]
    fn test_snapshot_update_leaves_original_untouched() {
        let ledger = PerformanceLedger::new();
        let updated = ledger.record_outcome(64, true);
        assert!(ledger.is_empty());
        assert_eq!(updated.stat_for(64).seen, 1);
    }

    #[test]
    fn test_weight_positive_everywhere() {
        let mut ledger = PerformanceLedger::new();
        for midi in 0u8..=127 {
            assert!(ledger.weight_for(midi) > 0.0);
        }
        // Even a pitch with a long perfect record keeps positive weight.
        for _ in 0..100 {
            ledger = ledger.record_outcome(69, true);
        }
        assert!(ledger.weight_for(69) > 0.0);
    }

    #[test]
    fn test_unseen_outweighs_mastered() {
        let mut ledger = PerformanceLedger::new();
        for _ in 0..100 {
            ledger = ledger.record_outcome(60, true);
        }
        assert!(ledger.weight_for(62) >= ledger.weight_for(60));
        assert_eq!(ledger.weight_for(62), UNSEEN_WEIGHT);
    }

    #[test]
    fn test_struggling_pitch_outweighs_unseen() {
        let mut ledger = PerformanceLedger::new();
        for _ in 0..10 {
            ledger = ledger.record_outcome(60, false);
        }
        assert!(ledger.weight_for(60) > ledger.weight_for(62));
    }

    #[test]
    fn test_weight_non_increasing_in_accuracy() {
        let weak = PerformanceLedger::new().record_outcome(60, false);
        let strong = PerformanceLedger::new().record_outcome(60, true);
        assert!(weak.weight_for(60) > strong.weight_for(60));
    }

    #[test]
    fn test_json_round_trip() {
        let mut ledger = PerformanceLedger::new();
        ledger = ledger.record_outcome(60, true);
        ledger = ledger.record_outcome(60, false);
        ledger = ledger.record_outcome(61, false);

        let json = serde_json::to_string(&ledger).unwrap();
        // Wire shape is a plain pitch-keyed record.
        assert!(json.contains("\"60\""));
        let restored: PerformanceLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ledger);
    }

    #[test]
    fn test_bad_pitch_keys_are_dropped_not_fatal() {
        let json = r#"{
            "60": { "seen": 2, "correct": 1, "wrong": 1, "ema_accuracy": 0.5 },
            "banana": { "seen": 1, "correct": 0, "wrong": 1, "ema_accuracy": 0.35 },
            "300": { "seen": 1, "correct": 1, "wrong": 0, "ema_accuracy": 0.65 }
        }"#;
        let ledger: PerformanceLedger = serde_json::from_str(json).unwrap();
        assert_eq!(ledger.stat_for(60).seen, 2);
        assert_eq!(ledger.stat_for(61).seen, 0);
    }

    #[test]
    fn test_corrupt_stat_bodies_are_dropped_not_fatal() {
        // Hand-edited or bit-rotted storage: EMA outside [0, 1], counts
        // that do not add up, non-finite values. None of it may survive
        // into weight computation, where it would break strict positivity.
        let json = r#"{
            "60": { "seen": 3, "correct": 1, "wrong": 2, "ema_accuracy": 9.9 },
            "61": { "seen": 5, "correct": 1, "wrong": 1, "ema_accuracy": 0.4 },
            "62": { "seen": 2, "correct": 2, "wrong": 0, "ema_accuracy": -0.3 },
            "63": { "seen": 1, "correct": 1, "wrong": 0, "ema_accuracy": 0.65 }
        }"#;
        let ledger: PerformanceLedger = serde_json::from_str(json).unwrap();

        // Only the consistent record survives.
        assert_eq!(ledger.stat_for(63).seen, 1);
        assert_eq!(ledger.stat_for(60).seen, 0);
        assert_eq!(ledger.stat_for(61).seen, 0);
        assert_eq!(ledger.stat_for(62).seen, 0);

        // And every weight stays strictly positive, so selection cannot
        // end up drawing from a non-positive total.
        for midi in 0u8..=127 {
            assert!(ledger.weight_for(midi) > 0.0);
        }
    }

    #[test]
    fn test_unparseable_ema_fails_the_load() {
        let json = r#"{ "60": { "seen": 1, "correct": 0, "wrong": 1, "ema_accuracy": null } }"#;
        // null is not a float: the whole parse fails, and the boundary
        // handles that by falling back to the empty ledger.
        assert!(serde_json::from_str::<PerformanceLedger>(json).is_err());
    }

    #[test]
    fn test_wildly_out_of_range_ema_is_dropped() {
        let json = r#"{ "60": { "seen": 1, "correct": 0, "wrong": 1, "ema_accuracy": 1e308 } }"#;
        let ledger: PerformanceLedger = serde_json::from_str(json).unwrap();
        assert_eq!(ledger.stat_for(60).seen, 0);
        assert!(ledger.weight_for(60) > 0.0);
    }

    #[test]
    fn test_reset_restores_default_weight() {
        let mut ledger = PerformanceLedger::new();
        for midi in [60u8, 61, 62] {
            ledger = ledger.record_outcome(midi, false);
        }
        ledger.reset();
        assert!(ledger.is_empty());
        for midi in 0u8..=127 {
            assert_eq!(ledger.weight_for(midi), UNSEEN_WEIGHT);
        }
    }
}
