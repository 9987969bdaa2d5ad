use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::catalog::{self, KeySignature, RangePreset};
use crate::error::TrainerError;
use crate::ledger::PerformanceLedger;
use crate::selector::{build_eligible_set, pick_next};
use crate::settings::Settings;
use crate::spelling::{Accidental, Note};

/// Trial lifecycle. Presenting is momentary (a card is being dealt);
/// AnswerSubmitted is accepted only in AwaitingAnswer and
/// AdvanceTimerElapsed only in ShowingFeedback, so a trial can neither be
/// answered twice nor advanced twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialPhase {
    Presenting,
    AwaitingAnswer,
    ShowingFeedback,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Neutral,
    Good,
    Bad,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Feedback {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub text: String,
}

impl Feedback {
    fn neutral() -> Self {
        Feedback {
            kind: FeedbackKind::Neutral,
            text: "What note is this?".to_string(),
        }
    }
}

/// Everything the staff renderer needs for the current trial.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Card {
    pub midi: u8,
    /// Notation key token, e.g. "f#/4".
    pub vex_key: String,
    pub clef: &'static str,
    pub key_signature: &'static str,
    /// The renderer must attach an explicit accidental glyph.
    pub needs_accidental: bool,
    /// Label shown to the learner when hints are on.
    pub hint: Option<String>,
}

/// Result of one answered trial, handed back to the UI.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub feedback: Feedback,
    pub score: u32,
    pub streak: u32,
    /// Pitch the audio collaborator should play (after its own
    /// gesture-gated ensure-ready step).
    pub play_midi: u8,
    /// Echo this back via `advance` once the feedback delay elapses.
    pub advance_token: u32,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Scoreboard {
    pub score: u32,
    pub streak: u32,
    pub feedback: Feedback,
}

/// One learner's trial loop: owns the ledger snapshot, the rng, and all
/// score/streak/feedback state. Single writer; every ledger update swaps
/// in a whole new snapshot.
pub struct Session {
    settings: Settings,
    range: &'static RangePreset,
    key: &'static KeySignature,
    eligible: Vec<u8>,
    ledger: PerformanceLedger,
    rng: Pcg32,
    phase: TrialPhase,
    current: Option<Note>,
    score: u32,
    streak: u32,
    feedback: Feedback,
    // Generation counter: a pending advance timer from a superseded trial
    // carries a stale token and lands as a no-op.
    generation: u32,
}

impl Session {
    pub fn new(
        settings: Settings,
        ledger: PerformanceLedger,
        seed: u64,
    ) -> Result<Session, TrainerError> {
        catalog::validate_catalog()?;
        let range = catalog::range_by_id(&settings.range_id);
        let key = catalog::key_signature_by_id(&settings.key_signature_id);
        let eligible = build_eligible_set(range, settings.difficulty.include_accidentals());
        if eligible.is_empty() {
            return Err(TrainerError::EmptyEligibleSet);
        }

        let mut session = Session {
            settings,
            range,
            key,
            eligible,
            ledger,
            rng: Pcg32::seed_from_u64(seed),
            phase: TrialPhase::Presenting,
            current: None,
            score: 0,
            streak: 0,
            feedback: Feedback::neutral(),
            generation: 0,
        };
        session.deal_next()?;
        Ok(session)
    }

    /// Deal a new trial: weighted pick avoiding an immediate repeat,
    /// fresh Note spelled for the active key signature.
    fn deal_next(&mut self) -> Result<Card, TrainerError> {
        self.phase = TrialPhase::Presenting;
        let avoid = self.current.map(|n| n.midi);
        let midi = pick_next(&self.eligible, &self.ledger, avoid, &mut self.rng)?;
        let note = Note::from_midi(midi, self.key.pref)?;
        self.current = Some(note);
        self.generation = self.generation.wrapping_add(1);
        self.feedback = Feedback::neutral();
        self.phase = TrialPhase::AwaitingAnswer;
        Ok(self.card_for(note))
    }

    fn card_for(&self, note: Note) -> Card {
        Card {
            midi: note.midi,
            vex_key: note.render_key_token(),
            clef: self.range.clef.token(),
            key_signature: self.key.vex,
            needs_accidental: note.spelling.accidental != Accidental::Natural,
            hint: if self.settings.show_hints {
                Some(note.label())
            } else {
                None
            },
        }
    }

    pub fn current_card(&self) -> Option<Card> {
        self.current.map(|n| self.card_for(n))
    }

    /// AnswerSubmitted event. Returns Ok(None) when no trial is awaiting an
    /// answer (already answered, mid-deal), so a double key press cannot
    /// double-count. Correctness is pitch-class equality: the on-screen
    /// keyboard spans one octave, the staff may span two.
    pub fn submit_answer(&mut self, answer: u8) -> Result<Option<AnswerOutcome>, TrainerError> {
        if answer > 127 {
            return Err(TrainerError::PitchOutOfRange(answer));
        }
        if self.phase != TrialPhase::AwaitingAnswer {
            return Ok(None);
        }
        let note = match self.current {
            Some(note) => note,
            None => return Ok(None),
        };

        let correct = answer % 12 == note.midi % 12;
        self.ledger = self.ledger.record_outcome(note.midi, correct);

        if correct {
            self.score += 1;
            self.streak += 1;
            self.feedback = Feedback {
                kind: FeedbackKind::Good,
                text: format!("Correct: {}", note.label()),
            };
        } else {
            self.streak = 0;
            self.feedback = Feedback {
                kind: FeedbackKind::Bad,
                text: format!("Not quite, it was {}", note.label()),
            };
        }
        self.phase = TrialPhase::ShowingFeedback;

        Ok(Some(AnswerOutcome {
            correct,
            feedback: self.feedback.clone(),
            score: self.score,
            streak: self.streak,
            play_midi: note.midi,
            advance_token: self.generation,
        }))
    }

    /// AdvanceTimerElapsed event. A stale token (superseded trial) or a
    /// phase other than ShowingFeedback is a no-op.
    pub fn advance(&mut self, token: u32) -> Result<Option<Card>, TrainerError> {
        if self.phase != TrialPhase::ShowingFeedback || token != self.generation {
            return Ok(None);
        }
        self.deal_next().map(Some)
    }

    /// The "Next" button: deal a fresh trial immediately without recording
    /// an outcome. Supersedes any pending advance timer.
    pub fn skip(&mut self) -> Result<Card, TrainerError> {
        self.deal_next()
    }

    /// Swap in new settings mid-session; score, streak and ledger survive,
    /// the current trial is replaced.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<Card, TrainerError> {
        let range = catalog::range_by_id(&settings.range_id);
        let key = catalog::key_signature_by_id(&settings.key_signature_id);
        let eligible = build_eligible_set(range, settings.difficulty.include_accidentals());
        if eligible.is_empty() {
            return Err(TrainerError::EmptyEligibleSet);
        }
        self.settings = settings;
        self.range = range;
        self.key = key;
        self.eligible = eligible;
        self.current = None;
        self.deal_next()
    }

    pub fn ledger(&self) -> &PerformanceLedger {
        &self.ledger
    }

    pub fn reset_ledger(&mut self) {
        self.ledger.reset();
    }

    pub fn scoreboard(&self) -> Scoreboard {
        Scoreboard {
            score: self.score,
            streak: self.streak,
            feedback: self.feedback.clone(),
        }
    }

    #[cfg(test)]
    fn phase(&self) -> TrialPhase {
        self.phase
    }
}
