//! Order book synthesis
//!
//! Two steps per pair. [`quotes`] turns the mid-price path into a best ask /
//! best bid per tick; the fill pass prices instructions from these. Then
//! [`synthesize_book`] expands every quote into a full slice: the level an
//! instruction consumes is reserved at the best price with the
//! instruction's size, the rest of each side is a random ladder walking away
//! from the best price.

use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use types::book::Book;
use types::errors::FixtureError;
use types::instruction::{Instruction, Side};
use types::instrument::Instrument;
use types::numeric::{decimal_from_f64, round_to_step};
use types::window::BacktestWindow;

use crate::random::half_normal;

/// Upper bound of the uniform spread draw, relative to mid.
pub const MAX_RELATIVE_SPREAD: f64 = 0.01;

/// Top of book at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub ts: i64,
    pub ask: Decimal,
    pub bid: Decimal,
}

impl Quote {
    /// Price an instruction on `side` trades at.
    pub fn price_for(&self, side: Side) -> Decimal {
        match side {
            Side::BUY => self.ask,
            Side::SELL => self.bid,
        }
    }
}

/// Shape of synthetic depth.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthModel {
    /// Levels per side
    pub depth: usize,
    /// Mean level size in base currency
    pub size_mean: f64,
    /// Largest gap between neighbouring levels, in ticks
    pub max_step_ticks: u32,
}

impl Default for DepthModel {
    fn default() -> Self {
        Self {
            depth: 20,
            size_mean: 1.0,
            max_step_ticks: 3,
        }
    }
}

/// Best ask and bid per tick around the mid path.
///
/// `spread = max(tick, round(U(0, 0.01) * mid))`, ask = mid + spread,
/// bid = mid - spread, all at tick precision. The bid never drops below one
/// tick and the ask stays at least one tick above it.
pub fn quotes<R: Rng + ?Sized>(
    rng: &mut R,
    window: &BacktestWindow,
    path: &[f64],
    instrument: &Instrument,
) -> Result<Vec<Quote>, FixtureError> {
    let tick = instrument.tick_size;
    let mut out = Vec::with_capacity(path.len());
    for (i, mid) in path.iter().enumerate() {
        let gap = round_to_step(decimal_from_f64(rng.gen_range(0.0..MAX_RELATIVE_SPREAD) * mid)?, tick);
        let spread = gap.max(tick);
        let mid = round_to_step(decimal_from_f64(*mid)?, tick);
        let bid = (mid - spread).max(tick);
        out.push(Quote {
            ts: window.tick_at(i),
            ask: (mid + spread).max(bid + tick),
            bid,
        });
    }
    Ok(out)
}

/// Level prices walking away from `best`: ascending for asks, descending
/// for bids. Each step is 1..=`max_step_ticks` ticks. With `skip_best` the
/// ladder starts one step beyond `best`. Bid ladders end before reaching
/// zero.
pub fn price_ladder<R: Rng + ?Sized>(
    rng: &mut R,
    best: Decimal,
    count: usize,
    tick: Decimal,
    max_step_ticks: u32,
    ascending: bool,
    skip_best: bool,
) -> Vec<Decimal> {
    let step = |rng: &mut R| tick * Decimal::from(rng.gen_range(1..=max_step_ticks.max(1)));
    let mut prices = Vec::with_capacity(count);
    let mut price = best;
    for i in 0..count {
        if i > 0 || skip_best {
            let delta = step(rng);
            price = if ascending { price + delta } else { price - delta };
        }
        if price <= Decimal::ZERO {
            break;
        }
        prices.push(price);
    }
    prices
}

/// Half-normal level sizes |N(mean, mean/3)|, at lot precision and never
/// below the instrument's size floor.
pub fn level_sizes<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    mean: f64,
    instrument: &Instrument,
) -> Result<Vec<Decimal>, FixtureError> {
    let floor = instrument.size_floor();
    (0..count)
        .map(|_| {
            let raw = decimal_from_f64(half_normal(rng, mean, mean / 3.0)?)?;
            Ok(round_to_step(raw, instrument.lot_size).max(floor))
        })
        .collect()
}

/// One ladder side: reserved level first (if any), then synthetic levels.
fn side_levels<R: Rng + ?Sized>(
    rng: &mut R,
    best: Decimal,
    reserved: Option<(Decimal, Decimal)>,
    ascending: bool,
    instrument: &Instrument,
    model: &DepthModel,
) -> Result<Vec<(Decimal, Decimal)>, FixtureError> {
    let mut levels: Vec<(Decimal, Decimal)> = reserved.into_iter().collect();
    let count = model.depth.saturating_sub(levels.len());
    let prices = price_ladder(
        rng,
        best,
        count,
        instrument.tick_size,
        model.max_step_ticks,
        ascending,
        reserved.is_some(),
    );
    let sizes = level_sizes(rng, prices.len(), model.size_mean, instrument)?;
    levels.extend(prices.into_iter().zip(sizes));
    Ok(levels)
}

/// Book for `instrument` with one slice per quote.
///
/// `insts` may span several pairs; only those on this instrument's pair
/// reserve a level, and they must already be filled.
pub fn synthesize_book<R: Rng + ?Sized>(
    rng: &mut R,
    instrument: &Instrument,
    quotes: &[Quote],
    insts: &[Instruction],
    model: &DepthModel,
) -> Result<Book, FixtureError> {
    let mut at_tick: HashMap<i64, &Instruction> = HashMap::new();
    for inst in insts.iter().filter(|i| i.pair() == Some(&instrument.pair)) {
        at_tick.insert(inst.ts(), inst);
    }

    let mut book = Book::new(instrument.pair.clone());
    for quote in quotes {
        let mut reserved_ask = None;
        let mut reserved_bid = None;
        if let Some(inst) = at_tick.get(&quote.ts) {
            let level = inst.execution()?;
            match inst.side() {
                Side::BUY => reserved_ask = Some(level),
                Side::SELL => reserved_bid = Some(level),
            }
        }

        let asks = side_levels(rng, quote.ask, reserved_ask, true, instrument, model)?;
        let bids = side_levels(rng, quote.bid, reserved_bid, false, instrument, model)?;
        book.add_slice(quote.ts, &asks, &bids)?;
    }
    Ok(book)
}
