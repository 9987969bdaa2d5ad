//! Adaptive note-trainer core for the staff-reading flashcard frontend.
//!
//! Internal warnings (catalog drift, corrupt persisted state) go through
//! the `log` facade. The crate installs no backend of its own; a host that
//! wants these warnings in the browser console wires up a `log`-to-console
//! logger before calling `start_session`. Without one the warnings are
//! silently discarded, which is safe: every logged condition is already
//! recovered locally.

use wasm_bindgen::prelude::*;

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod selector;
pub mod session;
pub mod settings;
pub mod spelling;

use serde::Serialize;

use error::TrainerError;
use ledger::PerformanceLedger;
use session::Session;
use settings::Settings;
use spelling::{AccidentalPref, Note};

use std::cell::RefCell;

thread_local! {
    static SESSION: RefCell<Option<Session>> = RefCell::new(None);
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> Result<T, TrainerError>) -> Result<T, JsValue> {
    SESSION
        .with(|cell| {
            let mut borrow = cell.borrow_mut();
            let session = borrow.as_mut().ok_or(TrainerError::NoSession)?;
            f(session)
        })
        .map_err(js_err)
}

/// Serialize to a JSON-compatible JsValue (plain objects, not JS Maps) so
/// the frontend can JSON.stringify results straight into local storage.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(js_err)
}

/// Range presets for the settings UI.
#[wasm_bindgen]
pub fn list_ranges() -> Result<JsValue, JsValue> {
    to_js(&catalog::ranges())
}

/// Key signatures for the settings UI.
#[wasm_bindgen]
pub fn list_key_signatures() -> Result<JsValue, JsValue> {
    to_js(&catalog::key_signatures())
}

#[wasm_bindgen]
pub fn default_settings() -> Result<JsValue, JsValue> {
    to_js(&Settings::default())
}

/// Start (or restart) the trainer session and return the first card.
///
/// `settings` and `ledger` come from local storage; malformed or missing
/// values fall back to defaults / the empty ledger rather than failing
/// startup. `seed` is optional; without one the RNG seeds from the clock.
#[wasm_bindgen]
pub fn start_session(
    settings: JsValue,
    ledger: JsValue,
    seed: Option<f64>,
) -> Result<JsValue, JsValue> {
    let settings: Settings = serde_wasm_bindgen::from_value(settings).unwrap_or_else(|e| {
        log::warn!("persisted settings unreadable ({}), using defaults", e);
        Settings::default()
    });
    let ledger: PerformanceLedger = serde_wasm_bindgen::from_value(ledger).unwrap_or_else(|e| {
        log::warn!("persisted ledger unreadable ({}), starting empty", e);
        PerformanceLedger::new()
    });
    let seed = seed.unwrap_or_else(js_sys::Date::now) as u64;

    let session = Session::new(settings, ledger, seed).map_err(js_err)?;
    let card = session.current_card();
    SESSION.with(|cell| *cell.borrow_mut() = Some(session));
    to_js(&card)
}

/// AnswerSubmitted event: one pitch value from the on-screen keyboard.
/// Returns the answer outcome, or null when no trial is awaiting an answer
/// (a repeated key press on an already-answered trial).
#[wasm_bindgen]
pub fn submit_answer(midi: u8) -> Result<JsValue, JsValue> {
    let outcome = with_session(|s| s.submit_answer(midi))?;
    match outcome {
        Some(outcome) => to_js(&outcome),
        None => Ok(JsValue::NULL),
    }
}

/// AdvanceTimerElapsed event. Pass the token from the answer outcome; a
/// stale token is a no-op and returns null.
#[wasm_bindgen]
pub fn advance_trial(token: u32) -> Result<JsValue, JsValue> {
    let card = with_session(|s| s.advance(token))?;
    match card {
        Some(card) => to_js(&card),
        None => Ok(JsValue::NULL),
    }
}

/// Deal a fresh trial immediately, recording nothing (the "Next" button).
#[wasm_bindgen]
pub fn skip_trial() -> Result<JsValue, JsValue> {
    let card = with_session(|s| s.skip())?;
    to_js(&card)
}

#[wasm_bindgen]
pub fn current_card() -> Result<JsValue, JsValue> {
    let card = with_session(|s| Ok(s.current_card()))?;
    to_js(&card)
}

/// Apply new settings mid-session; returns the replacement card.
#[wasm_bindgen]
pub fn apply_settings(settings: JsValue) -> Result<JsValue, JsValue> {
    let settings: Settings = serde_wasm_bindgen::from_value(settings).map_err(js_err)?;
    let card = with_session(|s| s.apply_settings(settings))?;
    to_js(&card)
}

#[wasm_bindgen]
pub fn scoreboard() -> Result<JsValue, JsValue> {
    let board = with_session(|s| Ok(s.scoreboard()))?;
    to_js(&board)
}

/// The ledger as a plain pitch-keyed record for the persistence collaborator.
#[wasm_bindgen]
pub fn export_ledger() -> Result<JsValue, JsValue> {
    SESSION.with(|cell| {
        let borrow = cell.borrow();
        let session = borrow
            .as_ref()
            .ok_or_else(|| js_err(TrainerError::NoSession))?;
        to_js(session.ledger())
    })
}

/// Wipe all per-pitch history.
#[wasm_bindgen]
pub fn reset_ledger() -> Result<(), JsValue> {
    with_session(|s| {
        s.reset_ledger();
        Ok(())
    })
}

/// Stateless label helper for keyboard-widget keys, e.g. (61, false) -> "C#4".
#[wasm_bindgen]
pub fn pitch_label(midi: u8, prefer_flats: bool) -> Result<String, JsValue> {
    let pref = if prefer_flats {
        AccidentalPref::Flats
    } else {
        AccidentalPref::Sharps
    };
    Note::from_midi(midi, pref)
        .map(|n| n.label())
        .map_err(js_err)
}
