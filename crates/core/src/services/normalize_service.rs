use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::capital::CapitalPoint;
use crate::models::orderbook::OrderbookRow;
use crate::models::signal::{coerce_f64, Signal, StrategyResults};

/// Timestamp keys in lookup order.
const TIME_KEYS: [&str; 3] = ["time", "timestamp", "date"];

/// Root-level finance keys of a strategy results file.
const FINANCE_KEYS: [&str; 8] = [
    "starting",
    "gross",
    "fees",
    "net",
    "exposure",
    "available",
    "unrealized",
    "projected",
];

/// Turns loosely typed log records into canonical, time-sorted rows.
///
/// Pure data shaping, no I/O. Offending records are dropped; the rest of the
/// dataset survives. Naive timestamps (no offset) are read as UTC.
pub struct NormalizeService;

impl NormalizeService {
    pub fn new() -> Self {
        Self
    }

    /// Parse a timestamp value: epoch milliseconds or a date/time string.
    pub fn parse_timestamp(&self, value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
            Value::String(s) => self.parse_timestamp_str(s),
            _ => None,
        }
    }

    /// Native parse, then with the space separator replaced by `T`, then (for
    /// exact `YYYY-MM-DD HH:MM` strings) with `:00` seconds appended.
    pub fn parse_timestamp_str(&self, raw: &str) -> Option<i64> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if let Some(ts) = parse_native(s) {
            return Some(ts);
        }
        let with_t = s.replacen(' ', "T", 1);
        if let Some(ts) = parse_native(&with_t) {
            return Some(ts);
        }
        if is_minute_precision(s) {
            return parse_native(&format!("{with_t}:00"));
        }
        None
    }

    /// First non-blank timestamp field of a record, with its display label.
    pub fn record_time(&self, record: &Map<String, Value>) -> Option<(i64, String)> {
        let raw = TIME_KEYS
            .iter()
            .filter_map(|k| record.get(*k))
            .find(|v| !is_blank(v))?;
        let ts = self.parse_timestamp(raw)?;
        let label = match raw {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some((ts, label))
    }

    /// Normalize a `capital_log` document. Non-arrays yield no rows.
    pub fn normalize_capital(&self, data: &Value) -> Vec<CapitalPoint> {
        let Some(rows) = data.as_array() else {
            return Vec::new();
        };

        let mut points: Vec<CapitalPoint> = rows
            .iter()
            .filter_map(|row| {
                let record = row.as_object()?;
                let (timestamp, time) = self.record_time(record)?;
                let capital = record.get("capital").and_then(coerce_f64)?;
                if !capital.is_finite() {
                    return None;
                }
                let metrics = record.get("metrics").and_then(Value::as_object).cloned();
                Some(CapitalPoint {
                    timestamp,
                    time,
                    capital,
                    metrics,
                })
            })
            .collect();

        if points.len() < rows.len() {
            debug!(dropped = rows.len() - points.len(), "capital rows dropped");
        }
        points.sort_by_key(|p| p.timestamp);
        points
    }

    /// Normalize a `strategy_results` document.
    ///
    /// Returns `None` unless the root is an object with a `signals` array;
    /// individual signals that fail to parse are dropped.
    pub fn normalize_strategy(&self, data: &Value) -> Option<StrategyResults> {
        let root = data.as_object()?;
        let raw_signals = root.get("signals")?.as_array()?;

        let signals: Vec<Signal> = raw_signals
            .iter()
            .filter_map(|s| serde_json::from_value::<Signal>(s.clone()).ok())
            .collect();
        if signals.len() < raw_signals.len() {
            debug!(dropped = raw_signals.len() - signals.len(), "signals dropped");
        }

        let field = |key: &str| root.get(key).filter(|v| !v.is_null()).cloned();
        let [starting, gross, fees, net, exposure, available, unrealized, projected] =
            FINANCE_KEYS.map(field);

        Some(StrategyResults {
            signals,
            starting,
            gross,
            fees,
            net,
            exposure,
            available,
            unrealized,
            projected,
        })
    }

    /// Normalize an order-book document into time-sorted rows with
    /// per-bucket and cumulative deltas.
    pub fn normalize_orderbook(&self, data: &Value) -> Vec<OrderbookRow> {
        let Some(rows) = data.as_array() else {
            return Vec::new();
        };

        let mut out: Vec<OrderbookRow> = rows
            .iter()
            .filter_map(|row| {
                let record = row.as_object()?;
                let (timestamp, _) = self.record_time(record)?;
                let buy = first_number(record, &["buy_volume", "buy"])?;
                let sell = first_number(record, &["sell_volume", "sell"])?;
                Some(OrderbookRow {
                    timestamp,
                    time: format_minute(timestamp),
                    buy,
                    sell,
                    delta: 0.0,
                    cumulative: 0.0,
                })
            })
            .collect();

        out.sort_by_key(|r| r.timestamp);
        let mut cumulative = 0.0;
        for row in &mut out {
            row.delta = row.buy - row.sell;
            cumulative += row.delta;
            row.cumulative = cumulative;
        }
        out
    }

    /// Market logs are arrays of snapshots; a bare object counts as one snapshot.
    pub fn normalize_market(&self, data: &Value) -> Vec<Value> {
        match data {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            Value::Object(_) => vec![data.clone()],
            _ => Vec::new(),
        }
    }
}

impl Default for NormalizeService {
    fn default() -> Self {
        Self::new()
    }
}

/// `YYYY-MM-DD HH:MM` in UTC.
pub fn format_minute(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn parse_native(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Exactly `DDDD-DD-DD DD:DD`.
fn is_minute_precision(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 16
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            10 => *c == b' ',
            13 => *c == b':',
            _ => c.is_ascii_digit(),
        })
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// First present, non-null key coerced to a finite number.
fn first_number(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
        .and_then(coerce_f64)
        .filter(|f| f.is_finite())
}
