//! Aggregate counts over the order history.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::record::OrderRecord;

/// Counts of records by instrument type, action, status and order kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryStats {
    pub total_orders: usize,
    pub instruments: FxHashMap<String, usize>,
    pub actions: FxHashMap<String, usize>,
    pub statuses: FxHashMap<String, usize>,
    pub order_kinds: FxHashMap<String, usize>,
}

impl HistoryStats {
    pub fn from_records(records: &[OrderRecord]) -> Self {
        let mut stats = HistoryStats {
            total_orders: records.len(),
            ..Default::default()
        };

        for r in records {
            *stats
                .instruments
                .entry(r.draft.instrument.instrument_type().to_string())
                .or_insert(0) += 1;
            *stats.actions.entry(r.draft.action.to_string()).or_insert(0) += 1;
            let status = r.status().map_or("unknown", |s| s.as_str()).to_string();
            *stats.statuses.entry(status).or_insert(0) += 1;
            *stats
                .order_kinds
                .entry(r.draft.kind.name().to_string())
                .or_insert(0) += 1;
        }

        stats
    }
}

fn write_counts(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    counts: &FxHashMap<String, usize>,
) -> fmt::Result {
    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    writeln!(f, "  {title}:")?;
    for (name, count) in rows {
        writeln!(f, "    {name:<18} {count:>6}")?;
    }
    Ok(())
}

impl fmt::Display for HistoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ORDER STATISTICS:")?;
        writeln!(f, "  Total orders: {}", self.total_orders)?;
        if self.total_orders == 0 {
            return Ok(());
        }
        write_counts(f, "By instrument", &self.instruments)?;
        write_counts(f, "By action", &self.actions)?;
        write_counts(f, "By status", &self.statuses)?;
        write_counts(f, "By order kind", &self.order_kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SubmissionOutcome;
    use crate::status::{LocalStatus, OrderStatus};
    use crate::types::{Action, BrokerOrderId, Instrument, OrderDraft, OrderKind};
    use chrono::Utc;

    fn rec(id: u64, instrument: Instrument, action: Action, status: OrderStatus) -> OrderRecord {
        OrderRecord {
            id,
            timestamp: Utc::now(),
            draft: OrderDraft::new(instrument, action, 100.0, OrderKind::Market),
            outcome: SubmissionOutcome::acknowledged(BrokerOrderId(id as i64), status),
            updated_at: None,
        }
    }

    #[test]
    fn counts_by_dimension() {
        let records = vec![
            rec(1, Instrument::forex("EURUSD"), Action::Buy, OrderStatus::broker("Submitted")),
            rec(2, Instrument::forex("GBPUSD"), Action::Sell, OrderStatus::broker("Filled")),
            rec(
                3,
                Instrument::stock("AAPL", "SMART", "USD"),
                Action::Buy,
                LocalStatus::Error.into(),
            ),
        ];
        let stats = HistoryStats::from_records(&records);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.instruments["forex"], 2);
        assert_eq!(stats.instruments["stock"], 1);
        assert_eq!(stats.actions["BUY"], 2);
        assert_eq!(stats.statuses["ERROR"], 1);
        assert_eq!(stats.order_kinds["Market"], 3);
    }

    #[test]
    fn empty_display() {
        let s = HistoryStats::from_records(&[]).to_string();
        assert!(s.contains("Total orders: 0"));
    }
}
