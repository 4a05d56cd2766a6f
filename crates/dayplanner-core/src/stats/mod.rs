//! Completion counters.
//!
//! The schedule store reports every change to the number of total and
//! completed tasks as a [`CounterDelta`]. Persisting those counters is left to
//! whoever implements [`StatsSink`]; [`MonthlyStats`] is the in-memory
//! aggregate used by the CLI and tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Change in completed/total task counts for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDelta {
    pub date: NaiveDate,
    pub completed_delta: i32,
    pub total_delta: i32,
}

/// Receiver of counter deltas. Fire-and-forget.
pub trait StatsSink: Send + Sync {
    fn record(&self, delta: CounterDelta);
}

/// Completed and total task counts for a month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCounts {
    pub completed: u32,
    pub total: u32,
}

impl MonthCounts {
    /// 0.0 .. 100.0; an empty month counts as fully done.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        f64::from(self.completed) * 100.0 / f64::from(self.total)
    }
}

/// In-memory monthly counters keyed by `YYYY-MM`.
///
/// Counts never go below zero even if deltas arrive for tasks created before
/// the counters were loaded.
#[derive(Debug, Default)]
pub struct MonthlyStats {
    months: Mutex<BTreeMap<String, MonthCounts>>,
}

impl MonthlyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from previously persisted counters.
    pub fn from_counts(counts: BTreeMap<String, MonthCounts>) -> Self {
        Self {
            months: Mutex::new(counts),
        }
    }

    pub fn month_key(date: NaiveDate) -> String {
        format!("{}-{:02}", date.year(), date.month())
    }

    pub fn get(&self, date: NaiveDate) -> MonthCounts {
        let months = self.months.lock().unwrap_or_else(|e| e.into_inner());
        months
            .get(&Self::month_key(date))
            .copied()
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, MonthCounts> {
        self.months
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl StatsSink for MonthlyStats {
    fn record(&self, delta: CounterDelta) {
        let mut months = self.months.lock().unwrap_or_else(|e| e.into_inner());
        let entry = months.entry(Self::month_key(delta.date)).or_default();
        entry.completed = apply(entry.completed, delta.completed_delta);
        entry.total = apply(entry.total, delta.total_delta);
        tracing::debug!(
            date = %delta.date,
            completed = entry.completed,
            total = entry.total,
            "monthly counters updated"
        );
    }
}

fn apply(current: u32, delta: i32) -> u32 {
    (i64::from(current) + i64::from(delta)).max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn delta(d: NaiveDate, completed: i32, total: i32) -> CounterDelta {
        CounterDelta {
            date: d,
            completed_delta: completed,
            total_delta: total,
        }
    }

    #[test]
    fn month_key_is_zero_padded() {
        assert_eq!(MonthlyStats::month_key(date(2025, 3, 9)), "2025-03");
    }

    #[test]
    fn deltas_accumulate_per_month() {
        let stats = MonthlyStats::new();
        stats.record(delta(date(2025, 3, 1), 0, 1));
        stats.record(delta(date(2025, 3, 20), 1, 1));
        stats.record(delta(date(2025, 4, 2), 0, 1));

        assert_eq!(
            stats.get(date(2025, 3, 31)),
            MonthCounts {
                completed: 1,
                total: 2
            }
        );
        assert_eq!(stats.get(date(2025, 4, 1)).total, 1);
        assert_eq!(stats.snapshot().len(), 2);
    }

    #[test]
    fn counters_clamp_at_zero() {
        let stats = MonthlyStats::new();
        stats.record(delta(date(2025, 5, 1), -1, -1));
        assert_eq!(stats.get(date(2025, 5, 1)), MonthCounts::default());
    }

    #[test]
    fn percent_of_empty_month_is_full() {
        assert_eq!(MonthCounts::default().percent(), 100.0);
        let half = MonthCounts {
            completed: 1,
            total: 2,
        };
        assert_eq!(half.percent(), 50.0);
    }
}
