//! Backtest window in epoch milliseconds

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

use crate::errors::FixtureError;

/// Milliseconds between two consecutive ticks.
pub const TICK_MS: i64 = 1000;

/// Closed interval `[start, end]`, sampled once per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BacktestWindow {
    pub start: i64,
    pub end: i64,
}

impl BacktestWindow {
    pub fn new(start: i64, end: i64) -> Result<Self, FixtureError> {
        if end < start {
            return Err(FixtureError::Config {
                message: format!("window end {end} precedes start {start}"),
            });
        }
        Ok(Self { start, end })
    }

    /// Window of `seconds` length starting at `start`.
    pub fn from_length(start: i64, seconds: u64) -> Result<Self, FixtureError> {
        let length = i64::try_from(seconds)
            .ok()
            .and_then(|s| s.checked_mul(TICK_MS))
            .ok_or_else(|| FixtureError::Config {
                message: format!("window length {seconds}s overflows"),
            })?;
        Self::new(start, start + length)
    }

    /// Number of one-second ticks, both ends included.
    pub fn tick_count(&self) -> usize {
        ((self.end - self.start) / TICK_MS) as usize + 1
    }

    /// Timestamp of tick `index`.
    pub fn tick_at(&self, index: usize) -> i64 {
        self.start + index as i64 * TICK_MS
    }

    /// Index of the tick at `ts`, if `ts` falls exactly on one.
    pub fn tick_index(&self, ts: i64) -> Option<usize> {
        if !self.contains(ts) || (ts - self.start) % TICK_MS != 0 {
            return None;
        }
        Some(((ts - self.start) / TICK_MS) as usize)
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts <= self.end
    }

    pub fn start_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.start).single()
    }

    pub fn end_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.end).single()
    }
}

impl fmt::Display for BacktestWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start_datetime(), self.end_datetime()) {
            (Some(start), Some(end)) => write!(f, "{} .. {}", start.to_rfc3339(), end.to_rfc3339()),
            _ => write!(f, "{} .. {}", self.start, self.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_count_includes_both_ends() {
        let w = BacktestWindow::new(1_684_154_233_000, 1_684_154_243_000).unwrap();
        assert_eq!(w.tick_count(), 11);
        assert_eq!(w.tick_at(10), w.end);
    }

    #[test]
    fn test_tick_index() {
        let w = BacktestWindow::from_length(1_000_000, 10).unwrap();
        assert_eq!(w.tick_index(1_000_000), Some(0));
        assert_eq!(w.tick_index(1_003_000), Some(3));
        assert_eq!(w.tick_index(1_003_500), None);
        assert_eq!(w.tick_index(1_011_000), None);
    }

    #[test]
    fn test_rejects_inverted_window() {
        assert!(BacktestWindow::new(10, 5).is_err());
    }

    #[test]
    fn test_display_rfc3339() {
        let w = BacktestWindow::from_length(1_684_154_233_000, 10).unwrap();
        assert_eq!(
            w.to_string(),
            "2023-05-15T12:37:13+00:00 .. 2023-05-15T12:37:23+00:00"
        );
    }
}
