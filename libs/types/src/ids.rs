//! Identifier types for currencies and trading pairs
//!
//! Both are validated at construction so that every `Currency` and `Pair`
//! held by the rest of the workspace is well formed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{BalanceError, InstructionError};

/// Separator between base and quote currency in a pair symbol.
pub const PAIR_SEPARATOR: char = '-';

/// Currency code such as `BTC` or `USDT`.
///
/// Valid iff non-empty and every character is ASCII alphanumeric. Case is
/// preserved as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validate and wrap a currency code.
    pub fn new(code: impl Into<String>) -> Result<Self, BalanceError> {
        let code = code.into();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BalanceError::InvalidCurrency { code });
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable coins are valued 1:1 against USD.
    pub fn is_stable(&self) -> bool {
        matches!(self.0.to_ascii_uppercase().as_str(), "USDT" | "USDC")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = BalanceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

/// Trading pair identifier
///
/// Format: "BASE-QUOTE" (e.g., "BTC-USDT", "ETH-BTC")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    symbol: String,
    base: Currency,
    quote: Currency,
}

impl Pair {
    /// Parse a `BASE-QUOTE` symbol.
    pub fn new(symbol: impl Into<String>) -> Result<Self, InstructionError> {
        let symbol = symbol.into();
        let mut parts = symbol.split(PAIR_SEPARATOR);
        let (base, quote) = match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) => (base, quote),
            _ => return Err(InstructionError::InvalidPair(symbol)),
        };
        let base = Currency::new(base).map_err(|_| InstructionError::InvalidPair(symbol.clone()))?;
        let quote =
            Currency::new(quote).map_err(|_| InstructionError::InvalidPair(symbol.clone()))?;
        Ok(Self {
            symbol,
            base,
            quote,
        })
    }

    /// Build a pair from its two legs.
    pub fn from_legs(base: &Currency, quote: &Currency) -> Self {
        Self {
            symbol: format!("{base}{PAIR_SEPARATOR}{quote}"),
            base: base.clone(),
            quote: quote.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.symbol
    }

    pub fn base(&self) -> &Currency {
        &self.base
    }

    pub fn quote(&self) -> &Currency {
        &self.quote
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

impl FromStr for Pair {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Pair {
    type Error = InstructionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Pair> for String {
    fn from(value: Pair) -> Self {
        value.symbol
    }
}
