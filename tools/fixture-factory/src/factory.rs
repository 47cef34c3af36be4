//! Scenario orchestration
//!
//! [`TestFactory::produce`] runs the whole pipeline for one scenario:
//!
//! 1. pick the backtest window
//! 2. sample pairs from the catalogue, minus the excluded denominations
//! 3. generate raw instructions over those pairs
//! 4. collect the pairs instructions actually trade
//! 5. fetch reference prices once
//! 6. build a mid-price path and top-of-book quotes per traded pair
//! 7. fill instruction prices and sizes from the quotes
//! 8. build each traded pair's book around the quotes and fills
//! 9. size the initial balance and replay the instructions
//! 10. package everything as a [`TestCase`]
//!
//! All randomness comes from one `ChaCha8Rng`; a fixed seed reproduces the
//! batch exactly.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::{debug, info};
use types::book::Book;
use types::errors::{CatalogueError, FixtureError};
use types::fee::CommissionSchedule;
use types::ids::Pair;
use types::instrument::{Catalogue, ProductClass};
use types::numeric::decimal_to_f64;
use types::window::BacktestWindow;

use crate::case::TestCase;
use crate::config::FactoryConfig;
use crate::depth::{self, DepthModel, Quote};
use crate::export;
use crate::fill::fill_instructions;
use crate::ledger::{initial_balance, simulate};
use crate::price_path;
use crate::prices::{price_of, PriceSource};
use crate::schedule;

/// Generator of backtest test cases.
pub struct TestFactory<P: PriceSource> {
    config: FactoryConfig,
    catalogue: Catalogue,
    prices: P,
    fees: CommissionSchedule,
    rng: ChaCha8Rng,
}

impl<P: PriceSource> TestFactory<P> {
    /// Create a factory. The configuration is validated; without a seed the
    /// generator is seeded from the OS.
    pub fn new(config: FactoryConfig, catalogue: Catalogue, prices: P) -> Result<Self, FixtureError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            config,
            catalogue,
            prices,
            fees: CommissionSchedule::default(),
            rng,
        })
    }

    /// Replace the default commission schedule.
    pub fn with_fees(mut self, fees: CommissionSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    fn depth_model(&self) -> DepthModel {
        DepthModel {
            depth: self.config.depth,
            size_mean: self.config.depth_size_mean,
            max_step_ticks: self.config.max_step_ticks,
        }
    }

    /// Window starting at the configured epoch. Its length is `windowSec`
    /// when set, otherwise uniform in `[minSec, maxSec]`.
    pub fn gen_backtest_period(&mut self) -> Result<BacktestWindow, FixtureError> {
        let seconds = match self.config.window_sec {
            Some(seconds) => seconds,
            None => self.rng.gen_range(self.config.min_sec..=self.config.max_sec),
        };
        BacktestWindow::from_length(self.config.window_start, seconds)
    }

    /// Pairs eligible for a scenario, in catalogue order.
    pub fn eligible_pairs(&self) -> Vec<Pair> {
        self.catalogue.pairs_excluding(&self.config.all_pair_exclusions())
    }

    /// Sample `num` distinct eligible pairs, or a count in
    /// `[max(minPairs, 1), maxPairs]` when `num` is `None`. The result is
    /// sorted by symbol.
    pub fn gen_pairs(&mut self, num: Option<usize>) -> Result<Vec<Pair>, FixtureError> {
        let eligible = self.eligible_pairs();
        let available = eligible.len();
        let count = match num {
            Some(n) => n.max(1),
            None => {
                let lo = self.config.min_pairs.max(1);
                let hi = self.config.max_pairs.min(available);
                if lo > hi {
                    return Err(CatalogueError::NotEnoughPairs {
                        requested: lo,
                        available,
                    }
                    .into());
                }
                self.rng.gen_range(lo..=hi)
            }
        };
        if count > available {
            return Err(CatalogueError::NotEnoughPairs {
                requested: count,
                available,
            }
            .into());
        }

        let mut pairs: Vec<Pair> = eligible.choose_multiple(&mut self.rng, count).cloned().collect();
        pairs.sort();
        Ok(pairs)
    }

    /// Produce one test case over `num_pairs` pairs (sampled when `None`).
    pub fn produce(&mut self, num_pairs: Option<usize>) -> Result<TestCase, FixtureError> {
        let window = self.gen_backtest_period()?;
        let pairs = self.gen_pairs(num_pairs)?;
        info!(
            window = %window,
            ticks = window.tick_count(),
            pairs = pairs.len(),
            "Producing test case"
        );

        let mut insts = schedule::generate(&mut self.rng, &window, &pairs, self.config.sec_per_inst)?;
        let traded: BTreeSet<Pair> = insts.iter().filter_map(|i| i.pair().cloned()).collect();
        let prices: HashMap<String, Decimal> = self.prices.last_prices(ProductClass::SPOT)?;

        let mut quotes: BTreeMap<Pair, Vec<Quote>> = BTreeMap::new();
        for pair in &traded {
            let instrument = self.catalogue.get(pair.as_str())?;
            let p0 = decimal_to_f64(price_of(&prices, pair.as_str())?);
            let path = price_path::generate(&mut self.rng, &window, p0, self.config.volatility)?;
            quotes.insert(pair.clone(), depth::quotes(&mut self.rng, &window, &path, instrument)?);
        }

        fill_instructions(&mut self.rng, &mut insts, &quotes, &window, &self.catalogue, &prices)?;

        let model = self.depth_model();
        let mut books: BTreeMap<Pair, Book> = BTreeMap::new();
        for (pair, pair_quotes) in &quotes {
            let instrument = self.catalogue.get(pair.as_str())?;
            let book = depth::synthesize_book(&mut self.rng, instrument, pair_quotes, &insts, &model)?;
            debug!(pair = %pair, slices = book.len(), "Book synthesized");
            books.insert(pair.clone(), book);
        }

        let initial = initial_balance(&pairs, &self.catalogue, &prices, self.config.value_per_ccy)?;
        let (history, report) = simulate(&insts, initial, &self.catalogue, &self.fees)?;
        info!(
            instructions = insts.len(),
            traded = report.traded,
            rejected = report.rejected,
            books = books.len(),
            "Test case produced"
        );

        Ok(TestCase::new(window, books, insts, history))
    }

    /// Produce `testNum` test cases.
    pub fn produce_batch(&mut self) -> Result<Vec<TestCase>, FixtureError> {
        (0..self.config.test_num).map(|_| self.produce(None)).collect()
    }

    /// Produce `testNum` test cases and write each to
    /// `destPath/testcase-NNNN.json`. Returns the written paths.
    pub fn write_batch(&mut self) -> Result<Vec<PathBuf>, FixtureError> {
        std::fs::create_dir_all(&self.config.dest_path)?;
        let mut written = Vec::with_capacity(self.config.test_num);
        for index in 0..self.config.test_num {
            let case = self.produce(None)?;
            let path = self.config.dest_path.join(format!("testcase-{index:04}.json"));
            export::write_to_file(&case, &path)?;
            info!(path = %path.display(), "Test case written");
            written.push(path);
        }
        Ok(written)
    }
}
