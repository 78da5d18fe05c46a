use crate::domain::model::{RateRow, RateSnapshot};
use chrono::{Datelike, Timelike};

/// Flattens a snapshot into one row per target currency, in upstream rate order.
///
/// Partition fields come from the snapshot timestamp in UTC, so every row of
/// one snapshot shares `date`, `timestamp`, `base_currency` and the
/// year/month/day/hour columns.
pub fn expand(snapshot: &RateSnapshot) -> Vec<RateRow> {
    let timestamp = snapshot.timestamp();
    let iso_timestamp = timestamp.to_rfc3339();

    snapshot
        .rates()
        .iter()
        .map(|(currency, rate)| RateRow {
            date: snapshot.date().to_string(),
            timestamp: iso_timestamp.clone(),
            base_currency: snapshot.base_currency().to_string(),
            target_currency: currency.clone(),
            exchange_rate: *rate,
            year: timestamp.year(),
            month: timestamp.month(),
            day: timestamp.day(),
            hour: timestamp.hour(),
        })
        .collect()
}
