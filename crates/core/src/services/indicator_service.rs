use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::indicator::{GroupTotals, IndicatorGroup, IndicatorReport, IndicatorRow, IndicatorTable};
use crate::models::signal::Signal;

/// Aggregates CLOSED signals into per-indicator take-profit / stop-loss tables.
///
/// Tables always start from the full catalog of the group, so indicators that
/// never fired still show up with zero counts.
pub struct IndicatorService;

impl IndicatorService {
    pub fn new() -> Self {
        Self
    }

    /// Debug flags of `signal` for `group`, as an object.
    ///
    /// Accepts an object, an array (keyed by index) or either one encoded as
    /// a JSON string; anything else (including malformed JSON) yields an
    /// empty map.
    pub fn parse_flags(&self, raw: Option<&Value>) -> Map<String, Value> {
        match raw {
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(parsed) => flag_map(&parsed),
                Err(_) => Map::new(),
            },
            Some(value) => flag_map(value),
            None => Map::new(),
        }
    }

    pub fn flags_for(&self, signal: &Signal, group: IndicatorGroup) -> Map<String, Value> {
        let raw = match group {
            IndicatorGroup::Core => signal.core_debug.as_ref(),
            IndicatorGroup::Support => signal.support_debug.as_ref(),
        };
        self.parse_flags(raw)
    }

    /// One row per catalog entry plus one per extra truthy key, sorted by
    /// activity desc, then `tp - sl` desc, then name asc.
    pub fn aggregate(&self, signals: &[Signal], group: IndicatorGroup) -> Vec<IndicatorRow> {
        let catalog = group.catalog();
        let mut rows: Vec<IndicatorRow> = catalog
            .iter()
            .map(|(key, name)| IndicatorRow::new(*key, *name))
            .collect();
        let mut by_name: HashMap<String, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();

        for signal in signals.iter().filter(|s| s.status.is_closed()) {
            let flags = self.flags_for(signal, group);
            let win = signal.is_win();

            for (key, name) in catalog {
                if flags.get(*key).is_some_and(is_truthy) {
                    bump(&mut rows[by_name[*name]], win);
                }
            }

            for (key, value) in &flags {
                if !is_truthy(value) || group.display_name(key).is_some() {
                    continue;
                }
                let name = if key.chars().all(|c| c.is_ascii_digit()) {
                    "Unknown".to_string()
                } else {
                    key.clone()
                };
                let idx = *by_name.entry(name.clone()).or_insert_with(|| {
                    rows.push(IndicatorRow::new(name.clone(), name.clone()));
                    rows.len() - 1
                });
                bump(&mut rows[idx], win);
            }
        }

        rows.sort_by(compare_rows);
        rows
    }

    /// Signals with at least one truthy flag in `group`, counted once each.
    pub fn donut_totals(&self, signals: &[Signal], group: IndicatorGroup) -> GroupTotals {
        let mut totals = GroupTotals::default();
        for signal in signals.iter().filter(|s| s.status.is_closed()) {
            if self.flags_for(signal, group).values().any(is_truthy) {
                if signal.is_win() {
                    totals.tp += 1;
                } else {
                    totals.sl += 1;
                }
            }
        }
        totals
    }

    pub fn table(&self, signals: &[Signal], group: IndicatorGroup) -> IndicatorTable {
        let rows = self.aggregate(signals, group);
        let row_totals = GroupTotals {
            tp: rows.iter().map(|r| r.tp).sum(),
            sl: rows.iter().map(|r| r.sl).sum(),
        };
        IndicatorTable {
            group,
            donut: self.donut_totals(signals, group),
            row_totals,
            rows,
        }
    }

    pub fn report(&self, signals: &[Signal]) -> IndicatorReport {
        IndicatorReport {
            core: self.table(signals, IndicatorGroup::Core),
            support: self.table(signals, IndicatorGroup::Support),
        }
    }
}

impl Default for IndicatorService {
    fn default() -> Self {
        Self::new()
    }
}

fn flag_map(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        _ => Map::new(),
    }
}

/// Loose truthiness of a flag value: `false`, `0`, `""` and `null` are off,
/// everything else is on.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn bump(row: &mut IndicatorRow, win: bool) {
    if win {
        row.tp += 1;
    } else {
        row.sl += 1;
    }
}

fn compare_rows(a: &IndicatorRow, b: &IndicatorRow) -> Ordering {
    b.total()
        .cmp(&a.total())
        .then_with(|| b.delta().cmp(&a.delta()))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}
