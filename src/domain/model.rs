use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetched set of exchange rates for a single base currency at a single instant.
///
/// Built only by the parser, so `rates` is non-empty with distinct keys and
/// positive values. Fields are private to keep the snapshot immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    base_currency: String,
    timestamp: DateTime<Utc>,
    date: String,
    rates: Vec<(String, f64)>,
}

impl RateSnapshot {
    pub(crate) fn new(
        base_currency: String,
        timestamp: DateTime<Utc>,
        date: String,
        rates: Vec<(String, f64)>,
    ) -> Self {
        Self {
            base_currency,
            timestamp,
            date,
            rates,
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Calendar date exactly as provided upstream.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Target currency rates in upstream order.
    pub fn rates(&self) -> &[(String, f64)] {
        &self.rates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRow {
    pub date: String,
    pub timestamp: String,
    pub base_currency: String,
    pub target_currency: String,
    pub exchange_rate: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl RateRow {
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

/// Field order gives the ascending (year, month, day) ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl PartitionKey {
    pub fn artifact_path(&self, prefix: &str, hour: u32) -> String {
        format!(
            "{}/year={}/month={:02}/day={:02}/currency_rates_{:02}.parquet",
            prefix.trim_end_matches('/'),
            self.year,
            self.month,
            self.day,
            hour
        )
    }
}

/// Result of one orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlSummary {
    pub row_count: usize,
    pub written_paths: Vec<String>,
}
