//! Instrument metadata and the instrument catalogue
//!
//! Exchange metadata arrives with string-typed numeric fields (`tickSz`,
//! `lotSz`, `minSz`). They are parsed once, at ingestion, into a fixed-shape
//! [`Instrument`]; malformed records are rejected eagerly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::errors::{CatalogueError, FixtureError};
use crate::ids::{Currency, Pair};
use crate::numeric::decimal_places;

/// Product classes an exchange lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductClass {
    /// Spot (currency against currency)
    SPOT,
    /// Perpetual swap
    SWAP,
    /// Dated futures
    FUTURES,
    /// Options
    OPTION,
}

impl fmt::Display for ProductClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProductClass::SPOT => "SPOT",
            ProductClass::SWAP => "SWAP",
            ProductClass::FUTURES => "FUTURES",
            ProductClass::OPTION => "OPTION",
        };
        f.write_str(s)
    }
}

/// Listing state of an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentState {
    Live,
    Suspend,
    Preopen,
    Test,
    #[serde(other)]
    Unknown,
}

/// `listTime` is a string in exchange responses and a number in extracts.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ListTime {
    Millis(i64),
    Text(String),
}

/// Instrument record as found in exchange metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstrument {
    inst_id: String,
    #[serde(default)]
    base_ccy: String,
    #[serde(default)]
    quote_ccy: String,
    tick_sz: String,
    lot_sz: String,
    min_sz: String,
    #[serde(default)]
    list_time: Option<ListTime>,
    #[serde(default = "default_state")]
    state: InstrumentState,
}

fn default_state() -> InstrumentState {
    InstrumentState::Live
}

/// Tradeable pair with its price and size granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instrument {
    pub pair: Pair,
    pub tick_size: Decimal,
    pub lot_size: Decimal,
    pub min_size: Decimal,
    pub list_time: i64,
    pub state: InstrumentState,
}

impl Instrument {
    /// Build an instrument directly from parsed values.
    pub fn new(pair: Pair, tick_size: Decimal, lot_size: Decimal, min_size: Decimal) -> Self {
        Self {
            pair,
            tick_size,
            lot_size,
            min_size,
            list_time: 0,
            state: InstrumentState::Live,
        }
    }

    /// Decimal places of the tick size.
    pub fn price_precision(&self) -> u32 {
        decimal_places(self.tick_size)
    }

    /// Decimal places of the lot size.
    pub fn size_precision(&self) -> u32 {
        decimal_places(self.lot_size)
    }

    /// Smallest strictly positive order size the instrument accepts.
    pub fn size_floor(&self) -> Decimal {
        self.min_size.max(self.lot_size)
    }

    pub fn is_live(&self) -> bool {
        self.state == InstrumentState::Live
    }
}

impl TryFrom<RawInstrument> for Instrument {
    type Error = CatalogueError;

    fn try_from(raw: RawInstrument) -> Result<Self, Self::Error> {
        let symbol = raw.inst_id.clone();
        let malformed = |field: &str, value: &str| CatalogueError::MalformedInstrument {
            symbol: symbol.clone(),
            field: field.to_string(),
            value: value.to_string(),
        };

        let pair = Pair::new(raw.inst_id.as_str()).map_err(|_| malformed("instId", &raw.inst_id))?;
        for (field, declared, leg) in [
            ("baseCcy", &raw.base_ccy, pair.base()),
            ("quoteCcy", &raw.quote_ccy, pair.quote()),
        ] {
            if !declared.is_empty() && Currency::new(declared.as_str()).ok().as_ref() != Some(leg) {
                return Err(malformed(field, declared));
            }
        }

        let positive = |field: &str, value: &str| -> Result<Decimal, CatalogueError> {
            match Decimal::from_str(value.trim()) {
                Ok(v) if v > Decimal::ZERO => Ok(v),
                _ => Err(malformed(field, value)),
            }
        };
        let tick_size = positive("tickSz", &raw.tick_sz)?;
        let lot_size = positive("lotSz", &raw.lot_sz)?;
        let min_size = match Decimal::from_str(raw.min_sz.trim()) {
            Ok(v) if v >= Decimal::ZERO => v,
            _ => return Err(malformed("minSz", &raw.min_sz)),
        };
        let list_time = match raw.list_time {
            None => 0,
            Some(ListTime::Millis(ms)) => ms,
            Some(ListTime::Text(text)) if text.is_empty() => 0,
            Some(ListTime::Text(text)) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| malformed("listTime", &text))?,
        };

        Ok(Self {
            pair,
            tick_size,
            lot_size,
            min_size,
            list_time,
            state: raw.state,
        })
    }
}

/// Wrapper accepted by [`Catalogue::from_json`]: either an extract file
/// (`{"instruments": [...]}`) or a raw exchange response (`{"data": [...]}`).
#[derive(Debug, Deserialize)]
struct CatalogueFile {
    #[serde(alias = "data")]
    instruments: Vec<RawInstrument>,
}

/// Ordered collection of instruments with lookup by symbol.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    instruments: Vec<Instrument>,
    index: HashMap<String, usize>,
}

impl Catalogue {
    /// Build a catalogue, keeping the given order. Later duplicates of a
    /// symbol replace earlier ones in lookups.
    pub fn new(instruments: Vec<Instrument>) -> Self {
        let index = instruments
            .iter()
            .enumerate()
            .map(|(i, inst)| (inst.pair.to_string(), i))
            .collect();
        Self { instruments, index }
    }

    /// Parse raw records; the first malformed record fails the whole load.
    pub fn from_raw(records: Vec<RawInstrument>) -> Result<Self, CatalogueError> {
        let instruments = records
            .into_iter()
            .map(Instrument::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(instruments))
    }

    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        let file: CatalogueFile = serde_json::from_str(json)?;
        Ok(Self::from_raw(file.instruments)?)
    }

    pub fn get(&self, symbol: &str) -> Result<&Instrument, CatalogueError> {
        self.index
            .get(symbol)
            .map(|&i| &self.instruments[i])
            .ok_or_else(|| CatalogueError::UnknownInstrument {
                symbol: symbol.to_string(),
            })
    }

    pub fn tick_size(&self, symbol: &str) -> Result<Decimal, CatalogueError> {
        Ok(self.get(symbol)?.tick_size)
    }

    pub fn lot_size(&self, symbol: &str) -> Result<Decimal, CatalogueError> {
        Ok(self.get(symbol)?.lot_size)
    }

    pub fn min_size(&self, symbol: &str) -> Result<Decimal, CatalogueError> {
        Ok(self.get(symbol)?.min_size)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Live pairs whose symbol contains none of `exclusions`, in catalogue
    /// order.
    pub fn pairs_excluding(&self, exclusions: &[String]) -> Vec<Pair> {
        self.instruments
            .iter()
            .filter(|inst| inst.is_live())
            .filter(|inst| {
                let symbol = inst.pair.as_str();
                !exclusions.iter().any(|pattern| symbol.contains(pattern.as_str()))
            })
            .map(|inst| inst.pair.clone())
            .collect()
    }

    /// Every currency appearing in a pair that passes `exclusions`.
    pub fn currencies(&self, exclusions: &[String]) -> BTreeSet<Currency> {
        self.pairs_excluding(exclusions)
            .iter()
            .flat_map(|pair| [pair.base().clone(), pair.quote().clone()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTRACT: &str = r#"{
        "instruments": [
            {"instId": "BTC-USDT", "baseCcy": "BTC", "quoteCcy": "USDT", "listTime": 1548133413000,
             "tickSz": "0.1", "lotSz": "0.00000001", "minSz": "0.00001", "state": "live"},
            {"instId": "ETH-USDC", "baseCcy": "ETH", "quoteCcy": "USDC", "listTime": 1548133413000,
             "tickSz": "0.01", "lotSz": "0.000001", "minSz": "0.0001", "state": "live"},
            {"instId": "USDC-USDT", "baseCcy": "USDC", "quoteCcy": "USDT", "listTime": 1548133413000,
             "tickSz": "0.0001", "lotSz": "0.000001", "minSz": "1", "state": "live"},
            {"instId": "LUNA-USDT", "baseCcy": "LUNA", "quoteCcy": "USDT", "listTime": 1548133413000,
             "tickSz": "0.0001", "lotSz": "0.000001", "minSz": "1", "state": "suspend"}
        ]
    }"#;

    #[test]
    fn test_load_extract_file() {
        let cat = Catalogue::from_json(EXTRACT).unwrap();
        assert_eq!(cat.len(), 4);
        let btc = cat.get("BTC-USDT").unwrap();
        assert_eq!(btc.tick_size, Decimal::new(1, 1));
        assert_eq!(btc.size_precision(), 8);
        assert_eq!(btc.price_precision(), 1);
        assert_eq!(btc.list_time, 1_548_133_413_000);
        assert!(!cat.get("LUNA-USDT").unwrap().is_live());
    }

    #[test]
    fn test_load_raw_response_with_string_list_time() {
        let raw = r#"{"code": "0", "data": [
            {"instId": "SOL-USDT", "baseCcy": "SOL", "quoteCcy": "USDT", "listTime": "1611916800000",
             "tickSz": "0.001", "lotSz": "0.0001", "minSz": "0.01", "state": "live", "instType": "SPOT"}
        ]}"#;
        let cat = Catalogue::from_json(raw).unwrap();
        assert_eq!(cat.get("SOL-USDT").unwrap().list_time, 1_611_916_800_000);
    }

    #[test]
    fn test_malformed_record_rejected() {
        let raw = r#"{"data": [
            {"instId": "SOL-USDT", "tickSz": "n/a", "lotSz": "0.0001", "minSz": "0.01"}
        ]}"#;
        let err = Catalogue::from_json(raw).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::Catalogue(CatalogueError::MalformedInstrument { ref field, .. }) if field == "tickSz"
        ));
    }

    #[test]
    fn test_mismatched_legs_rejected() {
        let raw = r#"{"data": [
            {"instId": "SOL-USDT", "baseCcy": "ETH", "tickSz": "0.001", "lotSz": "0.0001", "minSz": "0.01"}
        ]}"#;
        assert!(Catalogue::from_json(raw).is_err());
    }

    #[test]
    fn test_unknown_instrument() {
        let cat = Catalogue::from_json(EXTRACT).unwrap();
        assert_eq!(
            cat.get("DOGE-USDT").unwrap_err(),
            CatalogueError::UnknownInstrument {
                symbol: "DOGE-USDT".to_string()
            }
        );
    }

    #[test]
    fn test_pairs_excluding() {
        let cat = Catalogue::from_json(EXTRACT).unwrap();
        let pairs = cat.pairs_excluding(&["-USDC".to_string(), "USDC-".to_string()]);
        let symbols: Vec<&str> = pairs.iter().map(Pair::as_str).collect();
        assert_eq!(symbols, vec!["BTC-USDT"]);
    }

    #[test]
    fn test_currencies() {
        let cat = Catalogue::from_json(EXTRACT).unwrap();
        let ccys: Vec<String> = cat
            .currencies(&["-USDC".to_string()])
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(ccys, vec!["BTC", "USDC", "USDT"]);
    }
}
