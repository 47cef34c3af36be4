//! Instruction fill pass
//!
//! Prices come from the quotes the book is later built around, so the
//! reserved book level and the instruction always agree.

use rand::Rng;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use types::errors::{FixtureError, TimelineError};
use types::ids::Pair;
use types::instruction::Instruction;
use types::instrument::{Catalogue, Instrument};
use types::numeric::{decimal_from_f64, round_to_step};
use types::window::BacktestWindow;

use crate::depth::Quote;
use crate::prices::price_of;
use crate::random::normal;

/// Mean order value in quote currency.
pub const NOTIONAL_MEAN: f64 = 10.0;
/// Standard deviation of the order value.
pub const NOTIONAL_STD_DEV: f64 = 5.0;
/// Smallest order value drawn.
pub const NOTIONAL_FLOOR: f64 = 1.0;

/// Base-currency size of an order worth about `NOTIONAL_MEAN` quote units:
/// `max(size_floor, round(max(N(10, 5), 1) / reference_price))`.
pub fn order_size<R: Rng + ?Sized>(
    rng: &mut R,
    reference_price: Decimal,
    instrument: &Instrument,
) -> Result<Decimal, FixtureError> {
    let notional = normal(rng, NOTIONAL_MEAN, NOTIONAL_STD_DEV)?.max(NOTIONAL_FLOOR);
    let size = round_to_step(decimal_from_f64(notional)? / reference_price, instrument.lot_size);
    Ok(size.max(instrument.size_floor()))
}

/// Set price and size on every instruction.
///
/// Each instruction trades at its pair's quote for its own tick.
pub fn fill_instructions<R: Rng + ?Sized>(
    rng: &mut R,
    insts: &mut [Instruction],
    quotes: &BTreeMap<Pair, Vec<Quote>>,
    window: &BacktestWindow,
    catalogue: &Catalogue,
    prices: &HashMap<String, Decimal>,
) -> Result<(), FixtureError> {
    for inst in insts.iter_mut() {
        let pair = inst.require_pair()?.clone();
        let instrument = catalogue.get(pair.as_str())?;
        let out_of_range = || TimelineError::OutOfRange {
            timestamp: inst.ts(),
            first: Some(window.start),
        };
        let quote = window
            .tick_index(inst.ts())
            .and_then(|i| quotes.get(&pair).and_then(|q| q.get(i)))
            .ok_or_else(out_of_range)?;

        let reference = price_of(prices, pair.as_str())?;
        let size = order_size(rng, reference, instrument)?;
        inst.fill(quote.price_for(inst.side()), size)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::quotes as make_quotes;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::str::FromStr;
    use types::instruction::{OrderType, Side};

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn btc() -> Instrument {
        Instrument::new(Pair::new("BTC-USDT").unwrap(), d("0.1"), d("0.0001"), d("0.0001"))
    }

    #[test]
    fn test_order_size_floor_and_precision() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..500 {
            let size = order_size(&mut rng, d("27000"), &btc()).unwrap();
            assert!(size >= d("0.0001"));
            assert!(size.scale() <= 4);
        }
    }

    #[test]
    fn test_order_size_floors_expensive_assets() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let pricey = Instrument::new(Pair::new("BTC-USDT").unwrap(), d("0.1"), d("0.1"), d("0.5"));
        for _ in 0..100 {
            assert_eq!(order_size(&mut rng, d("1000000"), &pricey).unwrap(), d("0.5"));
        }
    }

    #[test]
    fn test_fill_uses_ask_for_buy_and_bid_for_sell() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let window = BacktestWindow::from_length(1_684_154_233_000, 10).unwrap();
        let pair = Pair::new("BTC-USDT").unwrap();
        let path = vec![27_000.0; window.tick_count()];
        let qs = make_quotes(&mut rng, &window, &path, &btc()).unwrap();

        let mut buy = Instruction::new(OrderType::MARKET, Side::BUY, window.tick_at(2));
        buy.assign_pair(pair.clone()).unwrap();
        let mut sell = Instruction::new(OrderType::MARKET, Side::SELL, window.tick_at(7));
        sell.assign_pair(pair.clone()).unwrap();
        let mut insts = vec![buy, sell];

        let catalogue = Catalogue::new(vec![btc()]);
        let prices = HashMap::from([("BTC-USDT".to_string(), d("27000"))]);
        let quotes = BTreeMap::from([(pair, qs.clone())]);
        fill_instructions(&mut rng, &mut insts, &quotes, &window, &catalogue, &prices).unwrap();

        assert_eq!(insts[0].price(), Some(qs[2].ask));
        assert_eq!(insts[1].price(), Some(qs[7].bid));
        assert!(insts.iter().all(|i| i.size().unwrap() >= d("0.0001")));
    }

    #[test]
    fn test_missing_reference_price() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let window = BacktestWindow::from_length(0, 2).unwrap();
        let pair = Pair::new("BTC-USDT").unwrap();
        let qs = make_quotes(&mut rng, &window, &[100.0, 100.0, 100.0], &btc()).unwrap();
        let mut inst = Instruction::new(OrderType::MARKET, Side::BUY, 0);
        inst.assign_pair(pair.clone()).unwrap();

        let err = fill_instructions(
            &mut rng,
            std::slice::from_mut(&mut inst),
            &BTreeMap::from([(pair, qs)]),
            &window,
            &Catalogue::new(vec![btc()]),
            &HashMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, FixtureError::Catalogue(_)));
        assert!(!inst.is_filled());
    }

    #[test]
    fn test_instruction_outside_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let window = BacktestWindow::from_length(0, 1).unwrap();
        let pair = Pair::new("BTC-USDT").unwrap();
        let qs = make_quotes(&mut rng, &window, &[100.0, 100.0], &btc()).unwrap();
        let mut inst = Instruction::new(OrderType::MARKET, Side::SELL, 5_000);
        inst.assign_pair(pair.clone()).unwrap();

        let err = fill_instructions(
            &mut rng,
            std::slice::from_mut(&mut inst),
            &BTreeMap::from([(pair, qs)]),
            &window,
            &Catalogue::new(vec![btc()]),
            &HashMap::from([("BTC-USDT".to_string(), d("100"))]),
        )
        .unwrap_err();
        assert!(matches!(err, FixtureError::Timeline(_)));
    }
}
