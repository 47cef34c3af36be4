//! Types library for backtest fixture synthesis
//!
//! Core data model shared by the fixture factory: validated identifiers,
//! the balance ledger, order book snapshots, trading instructions and the
//! instrument catalogue. All prices, sizes and balances are `Decimal`.
//!
//! # Modules
//! - `ids`: Currency codes and trading pairs
//! - `numeric`: Tick/lot precision helpers
//! - `timeline`: Point-in-time snapshot store
//! - `balance`: Balance ledger and balance history
//! - `book`: Order book levels, slices and per-pair history
//! - `instruction`: Trading instructions
//! - `fee`: Commission schedule
//! - `instrument`: Instrument metadata and catalogue
//! - `window`: Backtest window
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod timeline;
pub mod balance;
pub mod book;
pub mod instruction;
pub mod fee;
pub mod instrument;
pub mod window;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::timeline::*;
    pub use crate::balance::*;
    pub use crate::book::*;
    pub use crate::instruction::*;
    pub use crate::fee::*;
    pub use crate::instrument::*;
    pub use crate::window::*;
    pub use crate::errors::*;
}
