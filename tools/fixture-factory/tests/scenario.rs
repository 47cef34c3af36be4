//! End-to-end scenario tests for the fixture factory
//!
//! Tests include:
//! - Ten-second single-pair scenario
//! - Book/instruction/ledger consistency over many seeds
//! - Document round trip and determinism
//! - Catalogue and tickers file ingestion

use fixture_factory::export;
use fixture_factory::ledger::{simulate, GENESIS_TS};
use fixture_factory::{FactoryConfig, PriceSource, StaticPriceSource, TestCase, TestFactory};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use types::balance::Balance;
use types::fee::CommissionSchedule;
use types::instruction::{OrderType, Side};
use types::instrument::{Catalogue, ProductClass};

const INSTRUMENTS: &str = r#"{
    "instruments": [
        {"instId": "BTC-USDT", "baseCcy": "BTC", "quoteCcy": "USDT", "listTime": 1548133413000,
         "tickSz": "0.1", "lotSz": "0.0001", "minSz": "0.0001", "state": "live"},
        {"instId": "ETH-USDT", "baseCcy": "ETH", "quoteCcy": "USDT", "listTime": "1548133413000",
         "tickSz": "0.01", "lotSz": "0.0001", "minSz": "0.001", "state": "live"},
        {"instId": "ETH-BTC", "baseCcy": "ETH", "quoteCcy": "BTC", "listTime": 1548133413000,
         "tickSz": "0.00001", "lotSz": "0.0001", "minSz": "0.001", "state": "live"},
        {"instId": "BTC-USDC", "baseCcy": "BTC", "quoteCcy": "USDC", "listTime": 1548133413000,
         "tickSz": "0.1", "lotSz": "0.0001", "minSz": "0.0001", "state": "live"},
        {"instId": "USDT-TRY", "baseCcy": "USDT", "quoteCcy": "TRY", "listTime": 1548133413000,
         "tickSz": "0.001", "lotSz": "0.01", "minSz": "1", "state": "live"},
        {"instId": "LUNA-USDT", "baseCcy": "LUNA", "quoteCcy": "USDT", "listTime": 1548133413000,
         "tickSz": "0.0001", "lotSz": "0.01", "minSz": "1", "state": "suspend"}
    ]
}"#;

const TICKERS: &str = r#"{"code": "0", "msg": "", "data": [
    {"instType": "SPOT", "instId": "BTC-USDT", "last": "27012.3"},
    {"instType": "SPOT", "instId": "ETH-USDT", "last": "1821.45"},
    {"instType": "SPOT", "instId": "ETH-BTC", "last": "0.06743"},
    {"instType": "SPOT", "instId": "USDT-TRY", "last": "19.62"}
]}"#;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn catalogue() -> Catalogue {
    Catalogue::from_json(INSTRUMENTS).unwrap()
}

fn prices() -> StaticPriceSource {
    StaticPriceSource::from_tickers_json(TICKERS).unwrap()
}

fn factory(config: FactoryConfig) -> TestFactory<StaticPriceSource> {
    TestFactory::new(config, catalogue(), prices()).unwrap()
}

fn ten_second_btc(seed: u64) -> TestCase {
    let config = FactoryConfig {
        seed: Some(seed),
        window_sec: Some(10),
        sec_per_inst: 5.0,
        pair_exclusions: vec!["-USDC".to_string(), "ETH-".to_string()],
        ..Default::default()
    };
    factory(config).produce(Some(1)).unwrap()
}

fn assert_consistent(case: &TestCase) {
    let window = case.window();
    let catalogue = catalogue();

    let ts: Vec<i64> = case.insts().iter().map(|i| i.ts()).collect();
    assert!(ts.windows(2).all(|w| w[0] < w[1]), "timestamps not increasing: {ts:?}");

    for inst in case.insts() {
        assert!(window.contains(inst.ts()));
        assert_eq!(inst.order_type(), OrderType::MARKET);
        let pair = inst.pair().unwrap();
        let (price, size) = inst.execution().unwrap();
        assert!(size >= catalogue.min_size(pair.as_str()).unwrap());

        let slice = case.book(pair).unwrap().at(inst.ts()).unwrap();
        let best = match inst.side() {
            Side::BUY => slice.best_ask().unwrap(),
            Side::SELL => slice.best_bid().unwrap(),
        };
        assert_eq!((best.price(), best.size()), (price, size));
    }

    for book in case.books().values() {
        assert_eq!(book.len(), window.tick_count());
        for (_, slice) in book.slices() {
            assert!(slice.asks().windows(2).all(|w| w[0].price() <= w[1].price()));
            assert!(slice.bids().windows(2).all(|w| w[0].price() >= w[1].price()));
        }
    }

    let history = case.referred_balance();
    assert_eq!(history.first_timestamp(), Some(GENESIS_TS));
    for (_, balance) in history {
        assert!(balance.iter().all(|(_, qty)| *qty >= Decimal::ZERO));
    }
}

#[test]
fn test_ten_second_btc_scenario() {
    for seed in 0..50 {
        let case = ten_second_btc(seed);
        assert_eq!(case.window().start, 1_684_154_233_000);
        assert_eq!(case.window().end, 1_684_154_243_000);
        assert!((1..=4).contains(&case.insts().len()), "seed {seed}");
        assert_eq!(case.pairs().map(|p| p.as_str()).collect::<Vec<_>>(), vec!["BTC-USDT"]);
        for inst in case.insts() {
            let (price, size) = inst.execution().unwrap();
            assert!(price > Decimal::ZERO);
            assert!(size >= d("0.0001"));
        }
        assert_consistent(&case);
    }
}

#[test]
fn test_excluded_and_suspended_pairs_never_traded() {
    let config = FactoryConfig {
        seed: Some(11),
        window_sec: Some(300),
        ..Default::default()
    };
    let mut f = factory(config);
    for _ in 0..5 {
        let case = f.produce(None).unwrap();
        for pair in case.pairs() {
            assert!(["BTC-USDT", "ETH-USDT", "ETH-BTC"].contains(&pair.as_str()), "{pair}");
        }
    }
}

#[test]
fn test_referred_balance_replays() {
    let config = FactoryConfig {
        seed: Some(3),
        window_sec: Some(600),
        sec_per_inst: 2.0,
        ..Default::default()
    };
    let case = factory(config).produce(Some(3)).unwrap();
    let history = case.referred_balance();
    let initial: Balance = history.at(GENESIS_TS).unwrap().clone();

    let (replayed, report) =
        simulate(case.insts(), initial, &catalogue(), &CommissionSchedule::default()).unwrap();
    assert_eq!(&replayed, history);
    assert_eq!(report.traded + 1, history.len());
    assert_eq!(report.traded + report.rejected, case.insts().len());
}

#[test]
fn test_initial_balance_worth_value_per_ccy() {
    let config = FactoryConfig {
        seed: Some(4),
        window_sec: Some(30),
        value_per_ccy: d("500"),
        ..Default::default()
    };
    let case = factory(config).produce(Some(3)).unwrap();
    let initial = case.referred_balance().at(GENESIS_TS).unwrap();
    let spot = prices().last_prices(ProductClass::SPOT).unwrap();

    assert_eq!(initial.get("USDT").unwrap(), d("500"));
    let worth = initial
        .in_usd(|ccy| spot.get(&format!("{ccy}-USDT")).copied())
        .unwrap();
    // 500 USDT plus BTC and ETH each worth about 500
    assert!((worth - d("1500")).abs() < d("5"), "{worth}");
}

#[test]
fn test_document_round_trip() {
    let case = ten_second_btc(42);
    let json = export::to_json(&case).unwrap();
    assert_eq!(export::from_json(&json).unwrap(), case);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["btPeriod"][1], 1_684_154_243_000i64);
    assert!(value["books"]["BTC-USDT"]["slices"]["1684154233000"]["asks"].is_array());
}

#[test]
fn test_same_seed_same_document() {
    let a = export::to_json(&ten_second_btc(9)).unwrap();
    let b = export::to_json(&ten_second_btc(9)).unwrap();
    assert_eq!(a, b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_cases_are_consistent(
        seed in any::<u64>(),
        window_sec in 1u64..180,
        sec_per_inst in 1.0f64..20.0,
        num_pairs in 1usize..=3,
    ) {
        let config = FactoryConfig {
            seed: Some(seed),
            window_sec: Some(window_sec),
            sec_per_inst,
            ..Default::default()
        };
        let case = factory(config).produce(Some(num_pairs)).unwrap();
        prop_assert!(!case.insts().is_empty());
        assert_consistent(&case);
    }
}
