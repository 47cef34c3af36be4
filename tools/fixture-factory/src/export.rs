//! Test case export
//!
//! Serializes a [`TestCase`] to the JSON document backtest engines consume:
//!
//! ```text
//! {
//!   "btPeriod": [startMs, endMs],
//!   "books": {"BTC-USDT": {"pair": "BTC-USDT", "slices": {"<tsMs>": {"asks": ["price:size"], "bids": [..]}}}},
//!   "insts": [{"orderType", "side", "ts", "price", "size", "pair"}],
//!   "referredBalance": {"<tsMs>": {"BTC": "0.5", ..}}
//! }
//! ```
//!
//! Reading a document back yields an equal `TestCase`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use types::balance::{Balance, BalanceHistory};
use types::book::{Book, BookItem, BookSlice};
use types::errors::{BookError, FixtureError, InstructionError};
use types::ids::Pair;
use types::instruction::{Instruction, OrderType, Side};
use types::window::BacktestWindow;

use crate::case::TestCase;

/// Snapshot with levels as `price:size` tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceDocument {
    pub asks: Vec<String>,
    pub bids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDocument {
    pub pair: String,
    pub slices: BTreeMap<i64, SliceDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionDocument {
    pub order_type: OrderType,
    pub side: Side,
    pub ts: i64,
    pub price: Decimal,
    pub size: Decimal,
    pub pair: String,
}

/// Serialized form of a test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseDocument {
    pub bt_period: [i64; 2],
    pub books: BTreeMap<String, BookDocument>,
    pub insts: Vec<InstructionDocument>,
    pub referred_balance: BTreeMap<i64, BTreeMap<String, Decimal>>,
}

/// Build the document; every instruction must be filled.
pub fn to_document(case: &TestCase) -> Result<TestCaseDocument, FixtureError> {
    let window = case.window();

    let books = case
        .books()
        .iter()
        .map(|(pair, book)| {
            let slices = book
                .slices()
                .iter()
                .map(|(ts, slice)| {
                    let doc = SliceDocument {
                        asks: slice.ask_tokens(),
                        bids: slice.bid_tokens(),
                    };
                    (*ts, doc)
                })
                .collect();
            let doc = BookDocument {
                pair: pair.to_string(),
                slices,
            };
            (pair.to_string(), doc)
        })
        .collect();

    let insts = case
        .insts()
        .iter()
        .map(|inst| {
            let (price, size) = inst.execution()?;
            Ok(InstructionDocument {
                order_type: inst.order_type(),
                side: inst.side(),
                ts: inst.ts(),
                price,
                size,
                pair: inst.require_pair()?.to_string(),
            })
        })
        .collect::<Result<Vec<_>, FixtureError>>()?;

    let referred_balance = case
        .referred_balance()
        .iter()
        .map(|(ts, balance)| {
            let holdings = balance.iter().map(|(ccy, qty)| (ccy.to_string(), *qty)).collect();
            (*ts, holdings)
        })
        .collect();

    Ok(TestCaseDocument {
        bt_period: [window.start, window.end],
        books,
        insts,
        referred_balance,
    })
}

fn parse_levels(tokens: &[String]) -> Result<Vec<BookItem>, BookError> {
    tokens.iter().map(|t| BookItem::from_str(t)).collect()
}

/// Rebuild a test case from its document.
pub fn from_document(doc: TestCaseDocument) -> Result<TestCase, FixtureError> {
    let [start, end] = doc.bt_period;
    let window = BacktestWindow::new(start, end)?;

    let mut books = BTreeMap::new();
    for (symbol, book_doc) in doc.books {
        if book_doc.pair != symbol {
            return Err(InstructionError::InvalidPair(book_doc.pair).into());
        }
        let pair = Pair::new(symbol)?;
        let mut book = Book::new(pair.clone());
        for (ts, slice) in book_doc.slices {
            let asks = parse_levels(&slice.asks)?;
            let bids = parse_levels(&slice.bids)?;
            book.insert_slice(ts, BookSlice::from_items(asks, bids));
        }
        books.insert(pair, book);
    }

    let insts = doc
        .insts
        .into_iter()
        .map(|i| {
            let pair = Pair::new(i.pair)?;
            Ok(Instruction::filled(i.order_type, i.side, i.ts, pair, i.price, i.size))
        })
        .collect::<Result<Vec<_>, FixtureError>>()?;

    let mut referred_balance = BalanceHistory::new();
    for (ts, holdings) in doc.referred_balance {
        let mut balance = Balance::new();
        for (code, qty) in holdings {
            balance.set(&code, qty)?;
        }
        referred_balance.append(ts, balance);
    }

    Ok(TestCase::new(window, books, insts, referred_balance))
}

/// Pretty-printed JSON of `case`.
pub fn to_json(case: &TestCase) -> Result<String, FixtureError> {
    Ok(serde_json::to_string_pretty(&to_document(case)?)?)
}

pub fn from_json(json: &str) -> Result<TestCase, FixtureError> {
    from_document(serde_json::from_str(json)?)
}

/// Write `case` as JSON to `path`.
pub fn write_to_file(case: &TestCase, path: &Path) -> Result<(), FixtureError> {
    std::fs::write(path, to_json(case)?)?;
    Ok(())
}

pub fn read_from_file(path: &Path) -> Result<TestCase, FixtureError> {
    from_json(&std::fs::read_to_string(path)?)
}
