//! Point-in-time snapshot store
//!
//! Shared by the balance history and the per-pair order book history.
//! Entries stay sorted ascending by timestamp; equal timestamps keep their
//! insertion order, so the most recently appended one wins in `at`.

use serde::Serialize;

use crate::errors::TimelineError;

/// Append-only sequence of `(timestamp, value)` snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline<T> {
    entries: Vec<(i64, T)>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a snapshot, keeping timestamps sorted.
    pub fn append(&mut self, timestamp: i64, value: T) {
        let pos = self.entries.partition_point(|(ts, _)| *ts <= timestamp);
        self.entries.insert(pos, (timestamp, value));
    }

    /// Value of the latest entry with timestamp <= `timestamp`.
    pub fn at(&self, timestamp: i64) -> Result<&T, TimelineError> {
        let pos = self.entries.partition_point(|(ts, _)| *ts <= timestamp);
        if pos == 0 {
            return Err(TimelineError::OutOfRange {
                timestamp,
                first: self.first_timestamp(),
            });
        }
        Ok(&self.entries[pos - 1].1)
    }

    pub fn first(&self) -> Option<&(i64, T)> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&(i64, T)> {
        self.entries.last()
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.entries.first().map(|(ts, _)| *ts)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(i64, T)> {
        self.entries.iter()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|(ts, _)| *ts)
    }
}

impl<'a, T> IntoIterator for &'a Timeline<T> {
    type Item = &'a (i64, T);
    type IntoIter = std::slice::Iter<'a, (i64, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
