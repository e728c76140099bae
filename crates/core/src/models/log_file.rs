use chrono::NaiveDate;
use std::fmt;

/// The daily log families the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// `capital_log_<date>.json`
    Capital,
    /// `strategy_results_<date>.json`
    Strategy,
    /// `BTC_log_<date>.json`
    Market,
    /// `orderbook_30m_<date>.json`
    Orderbook30m,
    /// `orderbook_<date>.json`
    Orderbook,
}

impl LogKind {
    pub fn prefix(self) -> &'static str {
        match self {
            LogKind::Capital => "capital_log",
            LogKind::Strategy => "strategy_results",
            LogKind::Market => "BTC_log",
            LogKind::Orderbook30m => "orderbook_30m",
            LogKind::Orderbook => "orderbook",
        }
    }

    /// File name for `date`, e.g. `capital_log_2025-01-01.json`.
    pub fn file_name(self, date: NaiveDate) -> String {
        format!("{}_{}.json", self.prefix(), ymd(date))
    }

    /// Order-book variants in lookup order (30-minute buckets first).
    pub fn orderbook_names(date: NaiveDate) -> Vec<String> {
        vec![
            LogKind::Orderbook30m.file_name(date),
            LogKind::Orderbook.file_name(date),
        ]
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// `YYYY-MM-DD`.
pub fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Which day answered a today/yesterday fallback fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySource {
    Today,
    Yesterday,
}
