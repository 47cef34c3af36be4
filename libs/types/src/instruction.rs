//! Trading instructions issued by the strategy under test
//!
//! An instruction is created with its type, side and timestamp, gets its
//! pair during generation and its execution price and size once from the
//! fill pass. After the fill it is frozen.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::InstructionError;
use crate::ids::{Currency, Pair};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Side {
    /// Buy: consumes asks, pays quote currency
    BUY,
    /// Sell: consumes bids, pays base currency
    SELL,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::BUY => "BUY",
            Side::SELL => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Side::BUY),
            "SELL" => Ok(Side::SELL),
            other => Err(InstructionError::UnknownSide(other.to_string())),
        }
    }
}

impl TryFrom<String> for Side {
    type Error = InstructionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Instruction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum OrderType {
    LIMIT,
    MARKET,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::LIMIT => "LIMIT",
            OrderType::MARKET => "MARKET",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIMIT" => Ok(OrderType::LIMIT),
            "MARKET" => Ok(OrderType::MARKET),
            other => Err(InstructionError::UnsupportedInstructionType(other.to_string())),
        }
    }
}

impl TryFrom<String> for OrderType {
    type Error = InstructionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A trading command at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    order_type: OrderType,
    side: Side,
    ts: i64,
    pair: Option<Pair>,
    price: Option<Decimal>,
    size: Option<Decimal>,
}

impl Instruction {
    /// Create an unassigned, unfilled instruction.
    pub fn new(order_type: OrderType, side: Side, ts: i64) -> Self {
        Self {
            order_type,
            side,
            ts,
            pair: None,
            price: None,
            size: None,
        }
    }

    /// Create an instruction that is already complete, e.g. when reading an
    /// exported document back.
    pub fn filled(
        order_type: OrderType,
        side: Side,
        ts: i64,
        pair: Pair,
        price: Decimal,
        size: Decimal,
    ) -> Self {
        Self {
            order_type,
            side,
            ts,
            pair: Some(pair),
            price: Some(price),
            size: Some(size),
        }
    }

    /// Assign the traded pair. Fails once the instruction is filled.
    pub fn assign_pair(&mut self, pair: Pair) -> Result<(), InstructionError> {
        if self.is_filled() {
            return Err(InstructionError::AlreadyFilled { timestamp: self.ts });
        }
        self.pair = Some(pair);
        Ok(())
    }

    /// Set execution price and size. Can only happen once.
    pub fn fill(&mut self, price: Decimal, size: Decimal) -> Result<(), InstructionError> {
        if self.is_filled() {
            return Err(InstructionError::AlreadyFilled { timestamp: self.ts });
        }
        if self.pair.is_none() {
            return Err(InstructionError::MissingPair { timestamp: self.ts });
        }
        self.price = Some(price);
        self.size = Some(size);
        Ok(())
    }

    pub fn is_filled(&self) -> bool {
        self.price.is_some() && self.size.is_some()
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn ts(&self) -> i64 {
        self.ts
    }

    pub fn pair(&self) -> Option<&Pair> {
        self.pair.as_ref()
    }

    /// Pair, failing if none was assigned yet.
    pub fn require_pair(&self) -> Result<&Pair, InstructionError> {
        self.pair
            .as_ref()
            .ok_or(InstructionError::MissingPair { timestamp: self.ts })
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn size(&self) -> Option<Decimal> {
        self.size
    }

    /// `(price, size)` of a filled instruction.
    pub fn execution(&self) -> Result<(Decimal, Decimal), InstructionError> {
        match (self.price, self.size) {
            (Some(price), Some(size)) => Ok((price, size)),
            _ => Err(InstructionError::NotFilled { timestamp: self.ts }),
        }
    }

    pub fn base_ccy(&self) -> Result<&Currency, InstructionError> {
        Ok(self.require_pair()?.base())
    }

    pub fn quote_ccy(&self) -> Result<&Currency, InstructionError> {
        Ok(self.require_pair()?.quote())
    }
}
