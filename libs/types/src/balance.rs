//! Account balance ledger
//!
//! Maps currency codes to non-negative quantities. Every access validates
//! the currency code and every write validates the amount, so a stored
//! `Balance` can never hold a negative entry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{BalanceError, CatalogueError};
use crate::ids::Currency;
use crate::timeline::Timeline;

/// Per-currency holdings.
///
/// Absent currencies read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Currency, Decimal>", into = "BTreeMap<Currency, Decimal>")]
pub struct Balance {
    holdings: BTreeMap<Currency, Decimal>,
}

/// Every entry goes through [`Balance::set_amount`].
impl TryFrom<BTreeMap<Currency, Decimal>> for Balance {
    type Error = BalanceError;

    fn try_from(holdings: BTreeMap<Currency, Decimal>) -> Result<Self, Self::Error> {
        let mut balance = Balance::new();
        for (ccy, qty) in &holdings {
            balance.set_amount(ccy, *qty)?;
        }
        Ok(balance)
    }
}

impl From<Balance> for BTreeMap<Currency, Decimal> {
    fn from(balance: Balance) -> Self {
        balance.holdings
    }
}

/// Balances over time; the ground truth a backtest run is checked against.
pub type BalanceHistory = Timeline<Balance>;

impl Balance {
    /// Create an empty balance
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity held for `code`.
    pub fn get(&self, code: &str) -> Result<Decimal, BalanceError> {
        let ccy = Currency::new(code)?;
        Ok(self.amount(&ccy))
    }

    /// Set the quantity held for `code`.
    pub fn set(&mut self, code: &str, value: Decimal) -> Result<(), BalanceError> {
        let ccy = Currency::new(code)?;
        self.set_amount(&ccy, value)
    }

    /// Quantity held for an already validated currency.
    pub fn amount(&self, ccy: &Currency) -> Decimal {
        self.holdings.get(ccy).copied().unwrap_or(Decimal::ZERO)
    }

    /// Set the quantity for an already validated currency.
    ///
    /// Fails with `InvalidBalance` if `value` is negative; the entry is left
    /// untouched in that case.
    pub fn set_amount(&mut self, ccy: &Currency, value: Decimal) -> Result<(), BalanceError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(BalanceError::InvalidBalance {
                currency: ccy.to_string(),
                value: value.to_string(),
            });
        }
        self.holdings.insert(ccy.clone(), value);
        Ok(())
    }

    /// Add `amount` to the holding of `ccy`.
    pub fn credit(&mut self, ccy: &Currency, amount: Decimal) -> Result<(), BalanceError> {
        let next = self.amount(ccy) + amount;
        self.set_amount(ccy, next)
    }

    /// Remove `amount` from the holding of `ccy`.
    pub fn debit(&mut self, ccy: &Currency, amount: Decimal) -> Result<(), BalanceError> {
        let next = self.amount(ccy) - amount;
        self.set_amount(ccy, next)
    }

    pub fn contains(&self, ccy: &Currency) -> bool {
        self.holdings.contains_key(ccy)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.holdings.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Currency, &Decimal)> {
        self.holdings.iter()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Total value in USD.
    ///
    /// Stable coins count 1:1; every other currency is priced through
    /// `usd_price`, which must know it.
    pub fn in_usd<F>(&self, usd_price: F) -> Result<Decimal, CatalogueError>
    where
        F: Fn(&Currency) -> Option<Decimal>,
    {
        let mut total = Decimal::ZERO;
        for (ccy, qty) in &self.holdings {
            if qty.is_zero() {
                continue;
            }
            let price = if ccy.is_stable() {
                Decimal::ONE
            } else {
                usd_price(ccy).ok_or_else(|| CatalogueError::MissingPrice {
                    symbol: ccy.to_string(),
                })?
            };
            total += *qty * price;
        }
        Ok(total)
    }
}
