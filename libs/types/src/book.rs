//! Order book snapshots
//!
//! A `BookSlice` is a full two-sided snapshot at one instant; a `Book` is the
//! history of slices for one pair. Consecutive slices are linked by
//! [`BookSlice::overlay`]: levels of the previous slice that are still
//! present are carried forward with size zero (stale), and the new levels
//! are merged on top. A stale level renders as `price:0` and tells a
//! consumer the level disappeared at that instant.
//!
//! Equal prices are never coalesced: inserting a level at a price that is
//! already present yields two entries at that price, ordered by arrival.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::{BookError, TimelineError};
use crate::ids::Pair;
use crate::timeline::Timeline;

/// A single price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookItem {
    price: Decimal,
    size: Decimal,
}

impl BookItem {
    /// Create a level. Price must be >= 0 and size > 0.
    pub fn new(price: Decimal, size: Decimal) -> Result<Self, BookError> {
        if price < Decimal::ZERO || size <= Decimal::ZERO {
            return Err(BookError::InvalidBookLevel {
                price: price.to_string(),
                size: size.to_string(),
            });
        }
        Ok(Self { price, size })
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn size(&self) -> Decimal {
        self.size
    }

    /// Whether this level was faded by a later snapshot.
    pub fn is_stale(&self) -> bool {
        self.size.is_zero()
    }

    fn fade(&mut self) {
        self.size = Decimal::ZERO;
    }
}

impl fmt::Display for BookItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.price, self.size)
    }
}

/// Parses the `price:size` token form. A zero size is accepted here since
/// exported slices contain faded levels.
impl FromStr for BookItem {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || BookError::MalformedLevel {
            token: s.to_string(),
        };
        let (price, size) = s.split_once(':').ok_or_else(malformed)?;
        let price = Decimal::from_str(price.trim()).map_err(|_| malformed())?;
        let size = Decimal::from_str(size.trim()).map_err(|_| malformed())?;
        if price < Decimal::ZERO || size < Decimal::ZERO {
            return Err(BookError::InvalidBookLevel {
                price: price.to_string(),
                size: size.to_string(),
            });
        }
        Ok(Self { price, size })
    }
}

/// Two-sided book snapshot.
///
/// Asks ascending by price (best first), bids descending by price (best
/// first). Both sides are re-sorted after every insert; the sort is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookSlice {
    asks: Vec<BookItem>,
    bids: Vec<BookItem>,
}

impl BookSlice {
    /// Build a slice solely from the given `(price, size)` levels.
    pub fn new(asks: &[(Decimal, Decimal)], bids: &[(Decimal, Decimal)]) -> Result<Self, BookError> {
        let mut slice = Self::default();
        slice.add_many_asks(asks)?;
        slice.add_many_bids(bids)?;
        Ok(slice)
    }

    /// Rebuild a slice from already validated levels, e.g. parsed tokens.
    pub fn from_items(mut asks: Vec<BookItem>, mut bids: Vec<BookItem>) -> Self {
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        Self { asks, bids }
    }

    /// Carry `prev` forward and merge new levels on top.
    ///
    /// Zero-size levels of `prev` are dropped, the remaining ones are faded
    /// to zero, then `asks`/`bids` are inserted. `prev` is not modified.
    pub fn overlay(
        prev: &BookSlice,
        asks: &[(Decimal, Decimal)],
        bids: &[(Decimal, Decimal)],
    ) -> Result<Self, BookError> {
        let mut next = prev.clone();
        next.remove_zero_size();
        next.set_zero();
        next.add_many_asks(asks)?;
        next.add_many_bids(bids)?;
        Ok(next)
    }

    pub fn add_ask(&mut self, price: Decimal, size: Decimal) -> Result<(), BookError> {
        self.asks.push(BookItem::new(price, size)?);
        self.asks.sort_by(|a, b| a.price.cmp(&b.price));
        Ok(())
    }

    pub fn add_many_asks(&mut self, asks: &[(Decimal, Decimal)]) -> Result<(), BookError> {
        for (price, size) in asks {
            self.add_ask(*price, *size)?;
        }
        Ok(())
    }

    pub fn add_bid(&mut self, price: Decimal, size: Decimal) -> Result<(), BookError> {
        self.bids.push(BookItem::new(price, size)?);
        self.bids.sort_by(|a, b| b.price.cmp(&a.price));
        Ok(())
    }

    pub fn add_many_bids(&mut self, bids: &[(Decimal, Decimal)]) -> Result<(), BookError> {
        for (price, size) in bids {
            self.add_bid(*price, *size)?;
        }
        Ok(())
    }

    /// Drop every level whose size is zero.
    pub fn remove_zero_size(&mut self) {
        self.asks.retain(|item| !item.is_stale());
        self.bids.retain(|item| !item.is_stale());
    }

    /// Fade every level to size zero.
    pub fn set_zero(&mut self) {
        self.asks.iter_mut().for_each(BookItem::fade);
        self.bids.iter_mut().for_each(BookItem::fade);
    }

    pub fn asks(&self) -> &[BookItem] {
        &self.asks
    }

    pub fn bids(&self) -> &[BookItem] {
        &self.bids
    }

    /// Lowest ask with a non-zero size.
    pub fn best_ask(&self) -> Option<&BookItem> {
        self.asks.iter().find(|item| !item.is_stale())
    }

    /// Highest bid with a non-zero size.
    pub fn best_bid(&self) -> Option<&BookItem> {
        self.bids.iter().find(|item| !item.is_stale())
    }

    /// Levels rendered as `price:size` tokens.
    pub fn ask_tokens(&self) -> Vec<String> {
        self.asks.iter().map(ToString::to_string).collect()
    }

    pub fn bid_tokens(&self) -> Vec<String> {
        self.bids.iter().map(ToString::to_string).collect()
    }
}

/// Order book history for one pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pair: Pair,
    slices: Timeline<BookSlice>,
}

impl Book {
    pub fn new(pair: Pair) -> Self {
        Self {
            pair,
            slices: Timeline::new(),
        }
    }

    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    /// Record a snapshot at `timestamp`.
    ///
    /// The first slice is built from the given levels alone; every later one
    /// is an overlay of the latest slice held.
    pub fn add_slice(
        &mut self,
        timestamp: i64,
        asks: &[(Decimal, Decimal)],
        bids: &[(Decimal, Decimal)],
    ) -> Result<(), BookError> {
        let slice = match self.slices.last() {
            Some((_, prev)) => BookSlice::overlay(prev, asks, bids)?,
            None => BookSlice::new(asks, bids)?,
        };
        self.slices.append(timestamp, slice);
        Ok(())
    }

    /// Record a snapshot built from the given levels only.
    pub fn add_fresh_slice(
        &mut self,
        timestamp: i64,
        asks: &[(Decimal, Decimal)],
        bids: &[(Decimal, Decimal)],
    ) -> Result<(), BookError> {
        self.slices.append(timestamp, BookSlice::new(asks, bids)?);
        Ok(())
    }

    /// Insert an already built slice as is.
    pub fn insert_slice(&mut self, timestamp: i64, slice: BookSlice) {
        self.slices.append(timestamp, slice);
    }

    /// Snapshot in force at `timestamp`.
    pub fn at(&self, timestamp: i64) -> Result<&BookSlice, TimelineError> {
        self.slices.at(timestamp)
    }

    pub fn slices(&self) -> &Timeline<BookSlice> {
        &self.slices
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}
