//! Instruction timing, side and pair synthesis
//!
//! Only `orderType`, `side`, `ts` and `pair` are set here; price and size
//! come later from the fill pass.

use rand::seq::SliceRandom;
use rand::Rng;
use types::errors::{CatalogueError, FixtureError};
use types::ids::Pair;
use types::instruction::{Instruction, OrderType, Side};
use types::window::{BacktestWindow, TICK_MS};

use crate::random::jittered;

/// Relative jitter applied to the mean inter-arrival time.
pub const ARRIVAL_JITTER: f64 = 0.5;

/// Instruction timestamps from window start to window end, inclusive.
///
/// Gaps are whole seconds, `round(sec_per_inst * (1 + U(-0.5, 0.5)))`, and
/// never zero. A gap past the end of the timestamp range ends the schedule.
pub fn arrival_times<R: Rng + ?Sized>(
    rng: &mut R,
    window: &BacktestWindow,
    sec_per_inst: f64,
) -> Vec<i64> {
    let mut times = Vec::new();
    let mut t = window.start;
    while t <= window.end {
        times.push(t);
        let gap = jittered(rng, sec_per_inst, ARRIVAL_JITTER).round().max(1.0) as i64;
        match TICK_MS.checked_mul(gap).and_then(|step| t.checked_add(step)) {
            Some(next) => t = next,
            None => break,
        }
    }
    times
}

/// Raw market instructions spread over `window` and `pairs`.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    window: &BacktestWindow,
    pairs: &[Pair],
    sec_per_inst: f64,
) -> Result<Vec<Instruction>, FixtureError> {
    if pairs.is_empty() {
        return Err(CatalogueError::NotEnoughPairs {
            requested: 1,
            available: 0,
        }
        .into());
    }

    let mut insts = Vec::new();
    for ts in arrival_times(rng, window, sec_per_inst) {
        let side = if rng.gen_bool(0.5) { Side::BUY } else { Side::SELL };
        let mut inst = Instruction::new(OrderType::MARKET, side, ts);
        if let Some(pair) = pairs.choose(rng) {
            inst.assign_pair(pair.clone())?;
        }
        insts.push(inst);
    }
    Ok(insts)
}
