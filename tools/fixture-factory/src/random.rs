//! Random draws shared by the synthesis stages
//!
//! Every function takes the generator explicitly; the factory owns a seeded
//! `ChaCha8Rng` and lends it to each stage in turn.

use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Normal;
use types::errors::FixtureError;

/// One draw from N(mean, std_dev).
pub fn normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> Result<f64, FixtureError> {
    let dist = Normal::new(mean, std_dev).map_err(|e| FixtureError::Config {
        message: format!("normal({mean}, {std_dev}): {e}"),
    })?;
    Ok(dist.sample(rng))
}

/// One draw from the half-normal |N(mean, std_dev)|.
pub fn half_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> Result<f64, FixtureError> {
    Ok(normal(rng, mean, std_dev)?.abs())
}

/// `base` scaled by a uniform factor in `[1 - spread, 1 + spread)`.
pub fn jittered<R: Rng + ?Sized>(rng: &mut R, base: f64, spread: f64) -> f64 {
    base * (1.0 + rng.gen_range(-spread..spread))
}
