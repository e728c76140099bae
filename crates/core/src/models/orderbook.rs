use serde::{Deserialize, Serialize};

/// One normalized 30-minute order-book bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookRow {
    pub timestamp: i64,
    /// `YYYY-MM-DD HH:MM` (UTC).
    pub time: String,
    pub buy: f64,
    pub sell: f64,
    /// `buy - sell`.
    pub delta: f64,
    /// Running sum of `delta` in time order.
    pub cumulative: f64,
}

/// Summary strip above the order-book chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookStats {
    pub total_buy: f64,
    pub total_sell: f64,
    pub net: f64,
    /// Bucket with the largest buy volume (latest one wins ties).
    pub max_buy: OrderbookRow,
    /// Bucket with the largest sell volume (latest one wins ties).
    pub max_sell: OrderbookRow,
}

/// A newest-first page of order-book rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookPage {
    /// Zero-based, clamped into `0..total_pages`.
    pub index: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub rows: Vec<OrderbookRow>,
}
