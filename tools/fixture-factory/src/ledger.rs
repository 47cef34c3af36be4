//! Balance ledger replay
//!
//! Replays filled instructions against an initial balance and records the
//! balance after every trade. An instruction the working balance cannot
//! cover is skipped: it stays in the instruction list but leaves no history
//! entry.

use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};
use types::balance::{Balance, BalanceHistory};
use types::errors::FixtureError;
use types::fee::CommissionSchedule;
use types::ids::{Currency, Pair};
use types::instruction::{Instruction, Side};
use types::instrument::Catalogue;
use types::numeric::round_to_step;

use crate::prices::price_of;

/// Timestamp of the seed entry of every balance history.
pub const GENESIS_TS: i64 = 0;

/// Quote currency initial holdings are valued against.
pub const VALUATION_QUOTE: &str = "USDT";

/// Initial holdings: every currency of `pairs` worth `value_per_ccy`.
///
/// Stable coins are taken 1:1. Any other currency is converted through its
/// `CCY-USDT` reference price and rounded to that instrument's lot size.
pub fn initial_balance(
    pairs: &[Pair],
    catalogue: &Catalogue,
    prices: &HashMap<String, Decimal>,
    value_per_ccy: Decimal,
) -> Result<Balance, FixtureError> {
    let currencies: BTreeSet<&Currency> = pairs.iter().flat_map(|p| [p.base(), p.quote()]).collect();

    let mut balance = Balance::new();
    for ccy in currencies {
        if ccy.is_stable() {
            balance.set_amount(ccy, value_per_ccy)?;
            continue;
        }
        let symbol = format!("{ccy}-{VALUATION_QUOTE}");
        let lot = catalogue.lot_size(&symbol)?;
        let price = price_of(prices, &symbol)?;
        balance.set_amount(ccy, round_to_step(value_per_ccy / price, lot))?;
    }
    Ok(balance)
}

/// Outcome of applying one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Committed,
    /// Insufficient funds; nothing changed
    Rejected,
}

/// Traded and rejected counts of one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerReport {
    pub traded: usize,
    pub rejected: usize,
}

/// Working balance plus the history of committed states.
#[derive(Debug)]
pub struct Ledger<'a> {
    balance: Balance,
    history: BalanceHistory,
    report: LedgerReport,
    catalogue: &'a Catalogue,
    fees: &'a CommissionSchedule,
}

impl<'a> Ledger<'a> {
    /// Start a ledger; the initial balance is recorded at [`GENESIS_TS`].
    pub fn new(initial: Balance, catalogue: &'a Catalogue, fees: &'a CommissionSchedule) -> Self {
        let mut history = BalanceHistory::new();
        history.append(GENESIS_TS, initial.clone());
        Self {
            balance: initial,
            history,
            report: LedgerReport::default(),
            catalogue,
            fees,
        }
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn report(&self) -> LedgerReport {
        self.report
    }

    /// Apply one filled instruction.
    ///
    /// BUY pays `price * size` quote and receives `size * (1 - taker)` base,
    /// rounded to lot precision. SELL pays `size` base and receives
    /// `size * price * (1 - taker)` quote, unrounded.
    pub fn apply(&mut self, inst: &Instruction) -> Result<Execution, FixtureError> {
        let (price, size) = inst.execution()?;
        let pair = inst.require_pair()?;
        let (base, quote) = (pair.base(), pair.quote());
        let rates = self.fees.rates(inst.order_type())?;

        let mut next = self.balance.clone();
        match inst.side() {
            Side::BUY => {
                let remaining = next.amount(quote) - price * size;
                if remaining < Decimal::ZERO {
                    return Ok(self.reject(inst, quote, remaining));
                }
                let lot = self.catalogue.lot_size(pair.as_str())?;
                next.set_amount(quote, remaining)?;
                let received = size - rates.calculate_taker_fee(size);
                next.set_amount(base, round_to_step(next.amount(base) + received, lot))?;
            }
            Side::SELL => {
                let remaining = next.amount(base) - size;
                if remaining < Decimal::ZERO {
                    return Ok(self.reject(inst, base, remaining));
                }
                next.set_amount(base, remaining)?;
                let notional = size * price;
                next.credit(quote, notional - rates.calculate_taker_fee(notional))?;
            }
        }

        self.history.append(inst.ts(), next.clone());
        self.balance = next;
        self.report.traded += 1;
        Ok(Execution::Committed)
    }

    fn reject(&mut self, inst: &Instruction, ccy: &Currency, shortfall: Decimal) -> Execution {
        debug!(ts = inst.ts(), side = %inst.side(), currency = %ccy, %shortfall, "Instruction rejected");
        self.report.rejected += 1;
        Execution::Rejected
    }

    pub fn into_history(self) -> (BalanceHistory, LedgerReport) {
        (self.history, self.report)
    }
}

/// Replay `insts` in order from `initial`.
pub fn simulate(
    insts: &[Instruction],
    initial: Balance,
    catalogue: &Catalogue,
    fees: &CommissionSchedule,
) -> Result<(BalanceHistory, LedgerReport), FixtureError> {
    let mut ledger = Ledger::new(initial, catalogue, fees);
    for inst in insts {
        ledger.apply(inst)?;
    }
    let (history, report) = ledger.into_history();
    if report.rejected > 0 {
        warn!(
            traded = report.traded,
            rejected = report.rejected,
            "Some instructions exceeded the available balance"
        );
    }
    Ok((history, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use types::instruction::OrderType;
    use types::instrument::Instrument;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn pair(s: &str) -> Pair {
        Pair::new(s).unwrap()
    }

    fn catalogue() -> Catalogue {
        Catalogue::new(vec![
            Instrument::new(pair("BTC-USDT"), d("0.1"), d("0.0001"), d("0.0001")),
            Instrument::new(pair("ETH-USDT"), d("0.01"), d("0.001"), d("0.001")),
            Instrument::new(pair("ETH-BTC"), d("0.00001"), d("0.001"), d("0.001")),
        ])
    }

    fn market(side: Side, ts: i64, symbol: &str, price: &str, size: &str) -> Instruction {
        Instruction::filled(OrderType::MARKET, side, ts, pair(symbol), d(price), d(size))
    }

    fn balance(entries: &[(&str, &str)]) -> Balance {
        let mut b = Balance::new();
        for (ccy, qty) in entries {
            b.set(ccy, d(qty)).unwrap();
        }
        b
    }

    #[test]
    fn test_buy_beyond_quote_is_rejected() {
        let cat = catalogue();
        let fees = CommissionSchedule::default();
        let insts = [market(Side::BUY, 1_000, "BTC-USDT", "100", "1")];
        let (history, report) = simulate(&insts, balance(&[("USDT", "50")]), &cat, &fees).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history.at(1_000).unwrap().get("USDT").unwrap(), d("50"));
        assert_eq!(report, LedgerReport { traded: 0, rejected: 1 });
    }

    #[test]
    fn test_sell_credits_quote_net_of_fee() {
        let cat = catalogue();
        let fees = CommissionSchedule::default();
        let insts = [market(Side::SELL, 1_000, "BTC-USDT", "100", "1")];
        let initial = balance(&[("BTC", "2"), ("USDT", "0")]);
        let (history, report) = simulate(&insts, initial, &cat, &fees).unwrap();

        assert_eq!(history.len(), 2);
        let after = history.at(1_000).unwrap();
        assert_eq!(after.get("BTC").unwrap(), d("1"));
        assert_eq!(after.get("USDT").unwrap(), d("99.9"));
        assert_eq!(report.traded, 1);
    }

    #[test]
    fn test_buy_rounds_base_to_lot() {
        let cat = catalogue();
        let fees = CommissionSchedule::default();
        let insts = [market(Side::BUY, 5_000, "BTC-USDT", "27000.1", "0.0123")];
        let initial = balance(&[("BTC", "0.5"), ("USDT", "1000")]);
        let (history, _) = simulate(&insts, initial, &cat, &fees).unwrap();

        let after = history.at(5_000).unwrap();
        // 0.5 + 0.0123 * 0.999 = 0.5122877 -> 0.5123
        assert_eq!(after.get("BTC").unwrap(), d("0.5123"));
        assert_eq!(after.get("USDT").unwrap(), d("1000") - d("27000.1") * d("0.0123"));
    }

    #[test]
    fn test_history_matches_instruction_order() {
        let cat = catalogue();
        let fees = CommissionSchedule::default();
        let insts = [
            market(Side::SELL, 1_000, "BTC-USDT", "100", "1"),
            market(Side::BUY, 2_000, "BTC-USDT", "100", "10"),
            market(Side::BUY, 3_000, "ETH-USDT", "10", "1"),
        ];
        let initial = balance(&[("BTC", "1"), ("USDT", "0")]);
        let (history, report) = simulate(&insts, initial, &cat, &fees).unwrap();

        assert_eq!(history.timestamps().collect::<Vec<_>>(), vec![0, 1_000, 3_000]);
        assert_eq!(report, LedgerReport { traded: 2, rejected: 1 });
        let last = history.at(3_000).unwrap();
        assert_eq!(last.get("ETH").unwrap(), d("0.999"));
        assert_eq!(last.get("BTC").unwrap(), Decimal::ZERO);
        // The rejected BUY in between left no trace
        assert_eq!(history.at(2_500).unwrap(), history.at(1_000).unwrap());
    }

    #[test]
    fn test_balances_never_negative() {
        let cat = catalogue();
        let fees = CommissionSchedule::default();
        let insts: Vec<_> = (0..50)
            .map(|i| {
                let side = if i % 3 == 0 { Side::BUY } else { Side::SELL };
                market(side, 1_000 * (i + 1), "ETH-BTC", "0.065", "0.4")
            })
            .collect();
        let initial = balance(&[("ETH", "3"), ("BTC", "0.1")]);
        let (history, report) = simulate(&insts, initial, &cat, &fees).unwrap();

        assert_eq!(report.traded + report.rejected, 50);
        for (_, b) in &history {
            assert!(b.iter().all(|(_, qty)| *qty >= Decimal::ZERO));
        }
    }

    #[test]
    fn test_unfilled_instruction_fails() {
        let cat = catalogue();
        let fees = CommissionSchedule::default();
        let mut inst = Instruction::new(OrderType::MARKET, Side::BUY, 1_000);
        inst.assign_pair(pair("BTC-USDT")).unwrap();
        assert!(simulate(&[inst], Balance::new(), &cat, &fees).is_err());
    }

    #[test]
    fn test_unsupported_order_type() {
        let cat = catalogue();
        let fees = CommissionSchedule::new();
        let insts = [market(Side::SELL, 1_000, "BTC-USDT", "100", "1")];
        let err = simulate(&insts, balance(&[("BTC", "1")]), &cat, &fees).unwrap_err();
        assert!(matches!(err, FixtureError::Instruction(_)));
    }

    #[test]
    fn test_initial_balance_values() {
        let cat = catalogue();
        let prices = HashMap::from([
            ("BTC-USDT".to_string(), d("27000")),
            ("ETH-USDT".to_string(), d("1800")),
        ]);
        let pairs = [pair("BTC-USDT"), pair("ETH-BTC")];
        let b = initial_balance(&pairs, &cat, &prices, d("1000")).unwrap();

        assert_eq!(b.len(), 3);
        assert_eq!(b.get("USDT").unwrap(), d("1000"));
        // 1000 / 27000 = 0.037037.. -> 0.0370
        assert_eq!(b.get("BTC").unwrap(), d("0.037"));
        // 1000 / 1800 = 0.5555.. -> 0.556
        assert_eq!(b.get("ETH").unwrap(), d("0.556"));
    }

    #[test]
    fn test_initial_balance_needs_usdt_price() {
        let cat = catalogue();
        let err = initial_balance(&[pair("ETH-BTC")], &cat, &HashMap::new(), d("1000")).unwrap_err();
        assert!(matches!(err, FixtureError::Catalogue(_)));
    }
}
