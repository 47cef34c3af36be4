//! Error types for fixture synthesis
//!
//! Comprehensive error taxonomy using thiserror. Every variant aborts the
//! scenario that raised it; insufficient funds is not represented here since
//! the ledger replay skips such instructions instead of failing.

use thiserror::Error;

/// Top-level fixture error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FixtureError {
    #[error("Balance error: {0}")]
    Balance(#[from] BalanceError),

    #[error("Book error: {0}")]
    Book(#[from] BookError),

    #[error("Instruction error: {0}")]
    Instruction(#[from] InstructionError),

    #[error("Catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),

    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Numeric conversion failed: {message}")]
    Numeric { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },
}

/// Balance ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BalanceError {
    #[error("Invalid currency code: {code:?}")]
    InvalidCurrency { code: String },

    #[error("Invalid balance for {currency}: {value} is negative")]
    InvalidBalance { currency: String, value: String },
}

/// Order book level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("Invalid book level: price {price}, size {size}")]
    InvalidBookLevel { price: String, size: String },

    #[error("Malformed book level token: {token:?}")]
    MalformedLevel { token: String },
}

/// Instruction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstructionError {
    #[error("Unsupported instruction type: {0}")]
    UnsupportedInstructionType(String),

    #[error("Unknown side: {0}")]
    UnknownSide(String),

    #[error("Invalid pair: {0:?} (expected BASE-QUOTE)")]
    InvalidPair(String),

    #[error("Instruction at {timestamp} is already filled")]
    AlreadyFilled { timestamp: i64 },

    #[error("Instruction at {timestamp} has no pair assigned")]
    MissingPair { timestamp: i64 },

    #[error("Instruction at {timestamp} has not been filled")]
    NotFilled { timestamp: i64 },
}

/// Instrument catalogue and reference price errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogueError {
    #[error("Unknown instrument: {symbol}")]
    UnknownInstrument { symbol: String },

    #[error("Malformed instrument {symbol}: field {field} = {value:?}")]
    MalformedInstrument {
        symbol: String,
        field: String,
        value: String,
    },

    #[error("No reference price for {symbol}")]
    MissingPrice { symbol: String },

    #[error("Not enough eligible pairs: requested {requested}, available {available}")]
    NotEnoughPairs { requested: usize, available: usize },
}

/// Temporal snapshot store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("Timestamp {timestamp} is out of range (first entry at {first:?})")]
    OutOfRange { timestamp: i64, first: Option<i64> },
}

impl From<serde_json::Error> for FixtureError {
    fn from(err: serde_json::Error) -> Self {
        FixtureError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for FixtureError {
    fn from(err: std::io::Error) -> Self {
        FixtureError::Io {
            message: err.to_string(),
        }
    }
}
