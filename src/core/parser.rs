use crate::domain::model::RateSnapshot;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Wire shape of a rate snapshot. Unknown keys (`success`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct RawSnapshot {
    base: String,
    timestamp: serde_json::Value,
    date: String,
    rates: serde_json::Map<String, serde_json::Value>,
}

/// Decodes raw bytes into a validated [`RateSnapshot`]. Pure, no side effects.
pub fn parse(raw: &[u8]) -> Result<RateSnapshot> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| EtlError::malformed(format!("input is not valid UTF-8: {}", e)))?;

    let snapshot: RawSnapshot = serde_json::from_str(text)
        .map_err(|e| EtlError::malformed(format!("invalid rate snapshot JSON: {}", e)))?;

    let seconds = snapshot.timestamp.as_i64().ok_or_else(|| {
        EtlError::malformed(format!(
            "timestamp must be an integer number of epoch seconds, got {}",
            snapshot.timestamp
        ))
    })?;
    // epoch 秒一律視為 UTC
    let timestamp: DateTime<Utc> = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        EtlError::malformed(format!("timestamp {} is out of range", seconds))
    })?;

    if snapshot.rates.is_empty() {
        return Err(EtlError::malformed("rates must not be empty"));
    }

    let mut rates = Vec::with_capacity(snapshot.rates.len());
    for (currency, value) in snapshot.rates {
        let rate = value.as_f64().ok_or_else(|| {
            EtlError::malformed(format!("rate for {} is not a number: {}", currency, value))
        })?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(EtlError::malformed(format!(
                "rate for {} must be positive, got {}",
                currency, rate
            )));
        }
        rates.push((currency, rate));
    }

    tracing::debug!(
        "Parsed snapshot: base={}, timestamp={}, {} rates",
        snapshot.base,
        timestamp,
        rates.len()
    );

    Ok(RateSnapshot::new(snapshot.base, timestamp, snapshot.date, rates))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14","rates":{"EUR":0.92,"GBP":0.80}}"#;

    fn assert_malformed(raw: &[u8]) {
        match parse(raw) {
            Err(EtlError::MalformedInput { .. }) => {}
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_snapshot() {
        let snapshot = parse(SAMPLE.as_bytes()).unwrap();

        assert_eq!(snapshot.base_currency(), "USD");
        assert_eq!(snapshot.date(), "2023-11-14");
        assert_eq!(snapshot.timestamp().timestamp(), 1_700_000_000);
        assert_eq!(
            snapshot.rates(),
            &[("EUR".to_string(), 0.92), ("GBP".to_string(), 0.80)]
        );
    }

    #[test]
    fn test_parse_keeps_upstream_rate_order() {
        let raw = r#"{"base":"EUR","timestamp":1700000000,"date":"2023-11-14","rates":{"ZAR":20.1,"AUD":1.66,"MXN":18.9}}"#;
        let snapshot = parse(raw.as_bytes()).unwrap();
        let codes: Vec<&str> = snapshot.rates().iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, vec!["ZAR", "AUD", "MXN"]);
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let raw = r#"{"success":true,"base":"EUR","timestamp":1700000000,"date":"2023-11-14","rates":{"USD":1.08}}"#;
        assert!(parse(raw.as_bytes()).is_ok());
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        assert_malformed(&[0x7b, 0xff, 0xfe, 0x7d]);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert_malformed(b"{\"base\": \"USD\",");
    }

    #[test]
    fn test_parse_rejects_missing_rates() {
        assert_malformed(br#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14"}"#);
    }

    #[test]
    fn test_parse_rejects_missing_base() {
        assert_malformed(br#"{"timestamp":1700000000,"date":"2023-11-14","rates":{"EUR":0.92}}"#);
    }

    #[test]
    fn test_parse_rejects_missing_timestamp() {
        assert_malformed(br#"{"base":"USD","date":"2023-11-14","rates":{"EUR":0.92}}"#);
    }

    #[test]
    fn test_parse_rejects_missing_date() {
        assert_malformed(br#"{"base":"USD","timestamp":1700000000,"rates":{"EUR":0.92}}"#);
    }

    #[test]
    fn test_parse_rejects_empty_rates() {
        assert_malformed(br#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14","rates":{}}"#);
    }

    #[test]
    fn test_parse_rejects_non_integer_timestamp() {
        assert_malformed(br#"{"base":"USD","timestamp":"1700000000","date":"2023-11-14","rates":{"EUR":0.92}}"#);
        assert_malformed(br#"{"base":"USD","timestamp":1700000000.5,"date":"2023-11-14","rates":{"EUR":0.92}}"#);
    }

    #[test]
    fn test_parse_rejects_non_positive_rate() {
        assert_malformed(br#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14","rates":{"EUR":0}}"#);
        assert_malformed(br#"{"base":"USD","timestamp":1700000000,"date":"2023-11-14","rates":{"EUR":"0.9"}}"#);
    }
}
