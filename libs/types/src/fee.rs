//! Commission schedule
//!
//! Rates are keyed by instruction type. Every synthesized instruction takes
//! liquidity, so only the taker rate is charged today; the maker rate is
//! carried for completeness.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::InstructionError;
use crate::instruction::OrderType;

/// Maker/taker rate pair for one instruction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub maker_rate: Decimal,
    pub taker_rate: Decimal,
}

impl FeeRates {
    /// Fee charged on `trade_value` when removing liquidity
    pub fn calculate_taker_fee(&self, trade_value: Decimal) -> Decimal {
        trade_value * self.taker_rate
    }
}

/// Rates per instruction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSchedule {
    rates: BTreeMap<OrderType, FeeRates>,
}

impl CommissionSchedule {
    pub fn new() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    pub fn with_rates(mut self, order_type: OrderType, rates: FeeRates) -> Self {
        self.rates.insert(order_type, rates);
        self
    }

    /// Rates for `order_type`; types without a schedule are unsupported.
    pub fn rates(&self, order_type: OrderType) -> Result<&FeeRates, InstructionError> {
        self.rates
            .get(&order_type)
            .ok_or_else(|| InstructionError::UnsupportedInstructionType(order_type.to_string()))
    }
}

impl Default for CommissionSchedule {
    /// Spot market-order rates: 0.08% maker, 0.10% taker.
    fn default() -> Self {
        Self::new().with_rates(
            OrderType::MARKET,
            FeeRates {
                maker_rate: Decimal::new(8, 4),
                taker_rate: Decimal::new(10, 4),
            },
        )
    }
}
