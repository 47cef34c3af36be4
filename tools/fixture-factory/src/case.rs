//! Test case aggregate

use std::collections::BTreeMap;
use types::balance::BalanceHistory;
use types::book::Book;
use types::ids::Pair;
use types::instruction::Instruction;
use types::window::BacktestWindow;

/// One self-consistent backtest fixture.
///
/// Built once by the factory (or read back from a document) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    window: BacktestWindow,
    books: BTreeMap<Pair, Book>,
    insts: Vec<Instruction>,
    referred_balance: BalanceHistory,
}

impl TestCase {
    pub fn new(
        window: BacktestWindow,
        books: BTreeMap<Pair, Book>,
        insts: Vec<Instruction>,
        referred_balance: BalanceHistory,
    ) -> Self {
        Self {
            window,
            books,
            insts,
            referred_balance,
        }
    }

    pub fn window(&self) -> &BacktestWindow {
        &self.window
    }

    pub fn books(&self) -> &BTreeMap<Pair, Book> {
        &self.books
    }

    pub fn book(&self, pair: &Pair) -> Option<&Book> {
        self.books.get(pair)
    }

    pub fn insts(&self) -> &[Instruction] {
        &self.insts
    }

    /// Expected balance history a backtest run must reproduce.
    pub fn referred_balance(&self) -> &BalanceHistory {
        &self.referred_balance
    }

    /// Pairs with a book, in symbol order.
    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.books.keys()
    }
}
