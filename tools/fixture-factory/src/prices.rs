//! Reference price lookup
//!
//! The factory asks its [`PriceSource`] once per scenario for the last traded
//! price of every symbol in a product class. Live exchange access is left to
//! callers; [`StaticPriceSource`] serves prices loaded from a tickers file.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use types::errors::{CatalogueError, FixtureError};
use types::instrument::ProductClass;

/// Source of last traded prices keyed by symbol.
pub trait PriceSource {
    fn last_prices(&self, class: ProductClass) -> Result<HashMap<String, Decimal>, FixtureError>;
}

impl<P: PriceSource + ?Sized> PriceSource for &P {
    fn last_prices(&self, class: ProductClass) -> Result<HashMap<String, Decimal>, FixtureError> {
        (**self).last_prices(class)
    }
}

/// Price of `symbol` in `prices`, or `MissingPrice`.
pub fn price_of(prices: &HashMap<String, Decimal>, symbol: &str) -> Result<Decimal, CatalogueError> {
    prices
        .get(symbol)
        .copied()
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| CatalogueError::MissingPrice {
            symbol: symbol.to_string(),
        })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    inst_id: String,
    last: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TickersFile {
    Response { data: Vec<Ticker> },
    Map(HashMap<String, String>),
}

/// Fixed spot prices.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    prices: HashMap<String, Decimal>,
}

impl StaticPriceSource {
    pub fn new(prices: HashMap<String, Decimal>) -> Self {
        Self { prices }
    }

    /// Parse either an exchange tickers response
    /// (`{"data": [{"instId": .., "last": ..}]}`) or a plain
    /// `{"BTC-USDT": "27000.1"}` map.
    pub fn from_tickers_json(json: &str) -> Result<Self, FixtureError> {
        let file: TickersFile = serde_json::from_str(json)?;
        let entries: Vec<(String, String)> = match file {
            TickersFile::Response { data } => data.into_iter().map(|t| (t.inst_id, t.last)).collect(),
            TickersFile::Map(map) => map.into_iter().collect(),
        };

        let mut prices = HashMap::with_capacity(entries.len());
        for (symbol, last) in entries {
            let price = Decimal::from_str(last.trim()).map_err(|_| {
                CatalogueError::MalformedInstrument {
                    symbol: symbol.clone(),
                    field: "last".to_string(),
                    value: last.clone(),
                }
            })?;
            prices.insert(symbol, price);
        }
        Ok(Self { prices })
    }

    pub fn insert(&mut self, symbol: impl Into<String>, price: Decimal) {
        self.prices.insert(symbol.into(), price);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceSource for StaticPriceSource {
    fn last_prices(&self, class: ProductClass) -> Result<HashMap<String, Decimal>, FixtureError> {
        match class {
            ProductClass::SPOT => Ok(self.prices.clone()),
            other => Err(FixtureError::Config {
                message: format!("no {other} prices loaded"),
            }),
        }
    }
}
