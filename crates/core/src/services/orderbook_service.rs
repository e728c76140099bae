use crate::models::orderbook::{OrderbookPage, OrderbookRow, OrderbookStats};

/// Summary and paging over normalized order-book rows.
pub struct OrderbookService;

impl OrderbookService {
    pub fn new() -> Self {
        Self
    }

    /// Totals and extremes; `None` for an empty day.
    pub fn stats(&self, rows: &[OrderbookRow]) -> Option<OrderbookStats> {
        let first = rows.first()?;
        let total_buy: f64 = rows.iter().map(|r| r.buy).sum();
        let total_sell: f64 = rows.iter().map(|r| r.sell).sum();

        let mut max_buy = first;
        let mut max_sell = first;
        for row in rows {
            if row.buy >= max_buy.buy {
                max_buy = row;
            }
            if row.sell >= max_sell.sell {
                max_sell = row;
            }
        }

        Some(OrderbookStats {
            total_buy,
            total_sell,
            net: total_buy - total_sell,
            max_buy: max_buy.clone(),
            max_sell: max_sell.clone(),
        })
    }

    pub fn total_pages(&self, records: usize, page_size: usize) -> usize {
        records.div_ceil(page_size.max(1)).max(1)
    }

    /// Zero-based page of rows, newest first; `index` is clamped into range.
    pub fn page(&self, rows: &[OrderbookRow], index: usize, page_size: usize) -> OrderbookPage {
        let size = page_size.max(1);
        let total_pages = self.total_pages(rows.len(), size);
        let index = index.min(total_pages - 1);

        let mut newest_first: Vec<&OrderbookRow> = rows.iter().collect();
        newest_first.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        OrderbookPage {
            index,
            total_pages,
            total_records: rows.len(),
            rows: newest_first
                .into_iter()
                .skip(index * size)
                .take(size)
                .cloned()
                .collect(),
        }
    }
}

impl Default for OrderbookService {
    fn default() -> Self {
        Self::new()
    }
}
