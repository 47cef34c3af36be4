//! Backtest Fixture Factory
//!
//! Synthesizes self-consistent test cases for a spot backtest engine: a
//! window, a stream of market instructions, per-pair order book histories
//! that agree with every fill, and the balance history those fills produce.
//! Everything is drawn from one seeded generator, so a seed reproduces a
//! batch exactly.
//!
//! # Modules
//! - `config`: Factory configuration and validation
//! - `prices`: Reference price sources
//! - `random`: Normal, half-normal and jittered draws
//! - `price_path`: Bounded multiplicative random walk
//! - `schedule`: Instruction arrival times, sides and pairs
//! - `depth`: Top-of-book quotes and full book synthesis
//! - `fill`: Instruction price and size fill pass
//! - `ledger`: Initial balance and balance history replay
//! - `case`: Test case aggregate
//! - `factory`: Scenario orchestration and batch output
//! - `export`: JSON document import/export

pub mod config;
pub mod prices;
pub mod random;
pub mod price_path;
pub mod schedule;
pub mod depth;
pub mod fill;
pub mod ledger;
pub mod case;
pub mod factory;
pub mod export;

pub use case::TestCase;
pub use config::FactoryConfig;
pub use factory::TestFactory;
pub use prices::{PriceSource, StaticPriceSource};

/// Crate version constant
pub const VERSION: &str = "1.0.0";
