//! Factory configuration
//!
//! Every knob of the generator lives here. Defaults reproduce the reference
//! behaviour: a fixed 5000 s window, one instruction every ~10 s, 1000 USD of
//! each currency in the initial balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use types::errors::FixtureError;

/// Fixed start of every backtest window (2023-05-15T12:37:13Z). Where the
/// window sits in time has no influence on a backtest, so it is pinned.
pub const DEFAULT_WINDOW_START: i64 = 1_684_154_233_000;

/// Configuration for the test factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FactoryConfig {
    /// Number of test cases produced by a batch
    pub test_num: usize,
    /// Longest sampled window length in seconds
    pub max_sec: u64,
    /// Shortest sampled window length in seconds
    pub min_sec: u64,
    /// Fixed window length in seconds; overrides sampling when set
    pub window_sec: Option<u64>,
    /// Start of the window in epoch milliseconds
    pub window_start: i64,
    /// Mean interval between two instructions in seconds
    pub sec_per_inst: f64,
    /// Upper bound on sampled pair count
    pub max_pairs: usize,
    /// Lower bound on sampled pair count
    pub min_pairs: usize,
    /// Target fraction of instructions that trade (not used by the generator)
    pub success_rate: f64,
    /// Directory test cases are written to
    pub dest_path: PathBuf,
    /// USD value of each currency in the initial balance
    pub value_per_ccy: Decimal,
    /// Standard deviation of the per-tick relative price move
    pub volatility: f64,
    /// Levels per book side
    pub depth: usize,
    /// Mean size of a synthetic level, in base currency
    pub depth_size_mean: f64,
    /// Largest gap between two synthetic levels, in ticks
    pub max_step_ticks: u32,
    /// Symbol fragments excluded from pair selection
    pub pair_exclusions: Vec<String>,
    /// Further fragments excluded from the pairs instructions trade
    pub instruction_pair_exclusions: Vec<String>,
    /// RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            test_num: 100,
            max_sec: 86_400,
            min_sec: 1_000,
            window_sec: Some(5_000),
            window_start: DEFAULT_WINDOW_START,
            sec_per_inst: 10.0,
            max_pairs: usize::MAX,
            min_pairs: 0,
            success_rate: 0.001,
            dest_path: PathBuf::from("./"),
            value_per_ccy: Decimal::from(1000),
            volatility: 1.0,
            depth: 20,
            depth_size_mean: 1.0,
            max_step_ticks: 3,
            pair_exclusions: vec!["-USDC".to_string()],
            instruction_pair_exclusions: vec!["USDT-".to_string(), "USDC-".to_string()],
            seed: None,
        }
    }
}

impl FactoryConfig {
    /// Load from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// All exclusion fragments applied when sampling scenario pairs.
    pub fn all_pair_exclusions(&self) -> Vec<String> {
        self.pair_exclusions
            .iter()
            .chain(self.instruction_pair_exclusions.iter())
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> Result<(), FixtureError> {
        let fail = |message: String| Err(FixtureError::Config { message });

        if !(self.sec_per_inst.is_finite() && self.sec_per_inst > 0.0) {
            return fail(format!("secPerInst must be positive, got {}", self.sec_per_inst));
        }
        if !(self.volatility.is_finite() && self.volatility > 0.0) {
            return fail(format!("volatility must be positive, got {}", self.volatility));
        }
        if !(self.depth_size_mean.is_finite() && self.depth_size_mean > 0.0) {
            return fail(format!(
                "depthSizeMean must be positive, got {}",
                self.depth_size_mean
            ));
        }
        if self.depth == 0 {
            return fail("depth must be at least 1".to_string());
        }
        if self.max_step_ticks == 0 {
            return fail("maxStepTicks must be at least 1".to_string());
        }
        if self.min_sec > self.max_sec {
            return fail(format!(
                "minSec {} exceeds maxSec {}",
                self.min_sec, self.max_sec
            ));
        }
        if self.min_pairs > self.max_pairs {
            return fail(format!(
                "minPairs {} exceeds maxPairs {}",
                self.min_pairs, self.max_pairs
            ));
        }
        if self.value_per_ccy <= Decimal::ZERO {
            return fail(format!("valuePerCcy must be positive, got {}", self.value_per_ccy));
        }
        Ok(())
    }
}
