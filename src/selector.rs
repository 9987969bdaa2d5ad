use rand::Rng;

use crate::catalog::RangePreset;
use crate::error::TrainerError;
use crate::ledger::PerformanceLedger;
use crate::spelling::is_white_key;

/// Every pitch the current range/difficulty can present, ascending.
/// The order is load-bearing: the weighted draw walks cumulative weights
/// in candidate order, so it must be stable between calls.
pub fn build_eligible_set(range: &RangePreset, include_accidentals: bool) -> Vec<u8> {
    (range.min_midi..=range.max_midi)
        .filter(|&midi| include_accidentals || is_white_key(midi))
        .collect()
}

/// Weighted draw of the next pitch to present.
///
/// `avoid` (the just-answered pitch) is excluded whenever an alternative
/// exists; with a single eligible pitch the exclusion is waived. An empty
/// eligible set is a caller bug — the active range must always yield at
/// least one pitch.
pub fn pick_next(
    eligible: &[u8],
    ledger: &PerformanceLedger,
    avoid: Option<u8>,
    rng: &mut impl Rng,
) -> Result<u8, TrainerError> {
    if eligible.is_empty() {
        return Err(TrainerError::EmptyEligibleSet);
    }
    if eligible.len() == 1 {
        return Ok(eligible[0]);
    }

    let candidates: Vec<u8> = match avoid {
        Some(skip) => eligible.iter().copied().filter(|&m| m != skip).collect(),
        None => eligible.to_vec(),
    };
    // avoid can only remove one element, so candidates is non-empty here.

    let total: f64 = candidates.iter().map(|&m| ledger.weight_for(m)).sum();
    let mut roll = rng.gen_range(0.0..total);
    for &midi in &candidates {
        let weight = ledger.weight_for(midi);
        if roll < weight {
            return Ok(midi);
        }
        roll -= weight;
    }
    // Floating-point edge: roll landed exactly on total.
    Ok(*candidates.last().unwrap())
}
