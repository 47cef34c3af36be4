//! Mid-price path synthesis
//!
//! Multiplicative random walk with one price per tick:
//! `p[i] = p[i-1] * (1 + clamp(N(0, sigma), -0.03, 0.03))`.

use rand::Rng;
use types::errors::FixtureError;
use types::window::BacktestWindow;

use crate::random::normal;

/// Largest relative move between two consecutive ticks.
pub const MAX_TICK_MOVE: f64 = 0.03;

/// One mid price per tick of `window`, starting at `p0`.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    window: &BacktestWindow,
    p0: f64,
    sigma: f64,
) -> Result<Vec<f64>, FixtureError> {
    if !(p0.is_finite() && p0 > 0.0) {
        return Err(FixtureError::Config {
            message: format!("opening price must be positive, got {p0}"),
        });
    }

    let ticks = window.tick_count();
    let mut path = Vec::with_capacity(ticks);
    path.push(p0);
    for i in 1..ticks {
        let delta = normal(rng, 0.0, sigma)?.clamp(-MAX_TICK_MOVE, MAX_TICK_MOVE);
        path.push(path[i - 1] * (1.0 + delta));
    }
    Ok(path)
}
