use crate::models::kpi::{ResultFilter, SideFilter, StatusFilter, TradeFilter, TradePage, TradeRow};
use crate::models::market::Tone;
use crate::models::signal::{Side, Signal, SignalStatus};
use crate::services::normalize_service::NormalizeService;

/// Filtering, ordering and paging for the trades table.
pub struct TradesService {
    normalize: NormalizeService,
}

impl TradesService {
    pub fn new() -> Self {
        Self {
            normalize: NormalizeService::new(),
        }
    }

    pub fn matches(&self, signal: &Signal, filter: &TradeFilter) -> bool {
        let status_ok = match filter.status {
            StatusFilter::All => true,
            StatusFilter::Open => signal.status == SignalStatus::Open,
            StatusFilter::Closed => signal.status == SignalStatus::Closed,
        };
        let side_ok = match filter.side {
            SideFilter::All => true,
            SideFilter::Long => signal.side == Some(Side::Long),
            SideFilter::Short => signal.side == Some(Side::Short),
        };
        let result_ok = match filter.result {
            ResultFilter::All => true,
            ResultFilter::Tp => signal.outcome_label().contains("TP"),
            ResultFilter::Sl => signal.outcome_label().contains("SL"),
        };
        status_ok && side_ok && result_ok
    }

    /// Filtered signals, newest first. Signals without a parseable time go last.
    pub fn filtered(&self, signals: &[Signal], filter: &TradeFilter) -> Vec<TradeRow> {
        let mut rows: Vec<TradeRow> = signals
            .iter()
            .filter(|s| self.matches(s, filter))
            .map(|s| self.to_row(s))
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows
    }

    pub fn total_pages(&self, records: usize, page_size: usize) -> usize {
        records.div_ceil(page_size.max(1)).max(1)
    }

    /// One-based page of the filtered table; `page` is clamped into range.
    pub fn page(
        &self,
        signals: &[Signal],
        filter: &TradeFilter,
        page: usize,
        page_size: usize,
    ) -> TradePage {
        let rows = self.filtered(signals, filter);
        let size = page_size.max(1);
        let total_pages = self.total_pages(rows.len(), size);
        let page = page.clamp(1, total_pages);
        let total_records = rows.len();

        let rows = rows.into_iter().skip((page - 1) * size).take(size).collect();
        TradePage {
            page,
            total_pages,
            total_records,
            rows,
        }
    }

    /// Status text and tone: `OPEN / LONG`, `CLOSED / TP`, ...
    pub fn status_label(&self, signal: &Signal) -> (String, Tone) {
        let base = match &signal.status {
            SignalStatus::Other(s) if s.is_empty() => "—".to_string(),
            other => other.to_string(),
        };
        match signal.status {
            SignalStatus::Open => match signal.side {
                Some(Side::Long) => (format!("{base} / LONG"), Tone::Positive),
                Some(Side::Short) => (format!("{base} / SHORT"), Tone::Negative),
                None => (base, Tone::Neutral),
            },
            SignalStatus::Closed => {
                let outcome = signal.outcome_label();
                if outcome.contains("TP") {
                    (format!("{base} / TP"), Tone::Positive)
                } else if outcome.contains("SL") {
                    (format!("{base} / SL"), Tone::Negative)
                } else {
                    (base, Tone::Neutral)
                }
            }
            SignalStatus::Other(_) => (base, Tone::Neutral),
        }
    }

    fn to_row(&self, signal: &Signal) -> TradeRow {
        let (status_label, status_tone) = self.status_label(signal);
        TradeRow {
            timestamp: signal
                .raw_time()
                .and_then(|v| self.normalize.parse_timestamp(v)),
            status_label,
            status_tone,
            signal: signal.clone(),
        }
    }
}

impl Default for TradesService {
    fn default() -> Self {
        Self::new()
    }
}
