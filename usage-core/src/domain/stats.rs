use serde::{Deserialize, Serialize};
use time::Date;

/// Inclusive span of calendar days, constructed by the caller and passed
/// into aggregation by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Endpoints in ascending order. A reversed range is treated as its
    /// swapped equivalent so the date filter and the period computation
    /// agree on the same span.
    pub fn normalized(self) -> Self {
        if self.start > self.end {
            Self {
                start: self.end,
                end: self.start,
            }
        } else {
            self
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        let r = self.normalized();
        r.start <= date && date <= r.end
    }
}

/// One chart entry per distinct date; only utilities with a reading on that
/// date are populated. Ephemeral, recomputed on every aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub date: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electricity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water: Option<f64>,
}

impl ChartDataPoint {
    pub fn empty(date: Date) -> Self {
        Self {
            date,
            electricity: None,
            gas: None,
            water: None,
        }
    }
}

/// Derived per-period totals and daily averages. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_electricity: f64,
    pub total_gas: f64,
    pub total_water: f64,
    pub avg_electricity: f64,
    pub avg_gas: f64,
    pub avg_water: f64,
    pub period_days: i64,
}
