//! Console tables for history, pending orders, quotes and results.

use orderdesk::{OrderKind, OrderRecord};
use orderdesk_broker::{ContractSummary, PendingOrder};
use orderdesk_risk::checks::group_thousands;

use crate::cancel::{CancelAllReport, CancelReport, RecordCancelReport, SyncReport};
use crate::desk::AccountOverview;
use crate::lifecycle::Submitted;
use crate::quotes::QuoteResult;

/// History rows shown by default.
pub const HISTORY_LIMIT: usize = 20;

fn price(p: Option<f64>) -> String {
    p.map_or_else(|| "-".to_string(), |p| format!("{p}"))
}

fn kind_prices(kind: &OrderKind) -> String {
    match kind {
        OrderKind::Bracket {
            limit_price,
            stop_loss_price,
            take_profit_price,
        } => format!(
            "{} SL {stop_loss_price} TP {take_profit_price}",
            price(*limit_price)
        ),
        other => match (other.limit_price(), other.stop_price()) {
            (Some(l), Some(s)) => format!("{l} / stop {s}"),
            (Some(l), None) => format!("{l}"),
            (None, Some(s)) => format!("stop {s}"),
            (None, None) => "MKT".to_string(),
        },
    }
}

pub fn record_row(r: &OrderRecord) -> String {
    let ids = r
        .gateway_ids()
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "  {:>4}  {:16} {:6} {:4} {:>12} {:9} {:24} {:>12}  {}",
        r.id,
        r.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        r.draft.instrument.instrument_type().as_str(),
        r.draft.action.to_string(),
        r.draft.quantity,
        r.draft.kind.name(),
        format!("{} {}", r.draft.symbol(), kind_prices(&r.draft.kind)),
        if ids.is_empty() { "-".to_string() } else { ids },
        r.status().map_or("-", |s| s.as_str()),
    )
}

pub fn display_history(records: &[OrderRecord], title: &str) {
    if records.is_empty() {
        println!("No orders in history.");
        return;
    }
    println!("{title}:");
    println!(
        "  {:>4}  {:16} {:6} {:4} {:>12} {:9} {:24} {:>12}  {}",
        "#", "Time (UTC)", "Type", "Side", "Qty", "Kind", "Symbol / Prices", "Gateway ID", "Status"
    );
    for r in records {
        println!("{}", record_row(r));
    }
}

/// Full detail of one record.
pub fn display_record(r: &OrderRecord) {
    println!("ORDER #{}", r.id);
    println!("  Time:        {}", r.timestamp.to_rfc3339());
    println!("  Instrument:  {}", r.draft.instrument);
    println!("  Action:      {}", r.draft.action);
    println!("  Quantity:    {}", r.draft.quantity);
    println!("  Order:       {}", r.draft.kind);
    if let Some(id) = r.outcome.gateway_order_id {
        println!("  Gateway ID:  {id}");
    }
    if let Some(bracket) = &r.outcome.bracket {
        println!(
            "  Legs:        parent {} / stop-loss {} / take-profit {}",
            bracket.parent.map_or("-".into(), |i| i.to_string()),
            bracket.stop_loss.map_or("-".into(), |i| i.to_string()),
            bracket.take_profit.map_or("-".into(), |i| i.to_string()),
        );
    }
    println!("  Status:      {}", r.status().map_or("-", |s| s.as_str()));
    if let Some(error) = &r.outcome.error {
        println!("  Error:       {error}");
    }
    if let Some(updated) = r.updated_at {
        println!("  Updated:     {}", updated.to_rfc3339());
    }
}

/// Forex contracts are listed by base currency; show the full pair.
fn contract_label(c: &ContractSummary) -> String {
    if c.security_type == "CASH" {
        format!("{}{}", c.symbol, c.currency)
    } else {
        c.symbol.clone()
    }
}

pub fn pending_row(index: usize, o: &PendingOrder) -> String {
    format!(
        "  {:>3}  {:>8} {:8} {:4} {:4} {:>12} {:8} {:>10} {:>10}  {}",
        index,
        o.order_id.to_string(),
        contract_label(&o.contract),
        o.contract.security_type,
        o.action.to_string(),
        o.quantity,
        o.order_type,
        price(o.limit_price),
        price(o.stop_price),
        o.status,
    )
}

pub fn display_pending(orders: &[PendingOrder]) {
    if orders.is_empty() {
        println!("No pending orders.");
        return;
    }
    println!("PENDING ORDERS ({}):", orders.len());
    println!(
        "  {:>3}  {:>8} {:8} {:4} {:4} {:>12} {:8} {:>10} {:>10}  {}",
        "#", "ID", "Symbol", "Type", "Side", "Qty", "Order", "Limit", "Stop", "Status"
    );
    for (i, o) in orders.iter().enumerate() {
        println!("{}", pending_row(i + 1, o));
    }
}

pub fn display_submitted(s: &Submitted) {
    for warning in &s.warnings {
        println!("  [INFO] {warning}");
    }
    match &s.bracket {
        Some(ids) => println!(
            "Bracket order #{} placed: parent {} / stop-loss {} / take-profit {} ({})",
            s.record_id,
            ids.parent.map_or("-".into(), |i| i.to_string()),
            ids.stop_loss.map_or("FAILED".into(), |i| i.to_string()),
            ids.take_profit.map_or("FAILED".into(), |i| i.to_string()),
            s.status,
        ),
        None => println!(
            "Order #{} placed: gateway id {} ({})",
            s.record_id, s.gateway_order_id, s.status
        ),
    }
    for error in &s.leg_errors {
        println!("  [WARN] {error}");
    }
}

pub fn display_cancel(r: &CancelReport) {
    println!("Order {} ({}): {}", r.order_id, r.symbol, r.outcome);
    if let Some(id) = r.record_id {
        println!("  History order #{id} marked CANCEL_REQUESTED");
    }
    if let Some(e) = &r.history_error {
        println!("  History NOT updated: {e}");
    }
}

pub fn display_cancel_all(r: &CancelAllReport) {
    for report in &r.reports {
        display_cancel(report);
    }
    println!(
        "\nRequested {}, failed {}, still open {}",
        r.requested(),
        r.failures().count(),
        r.still_open
    );
}

pub fn display_record_cancel(r: &RecordCancelReport) {
    for id in &r.accepted {
        println!("Cancel requested for order {id}");
    }
    for (id, e) in &r.failed {
        println!("Cancel FAILED for order {id}: {e}");
    }
    match &r.history_error {
        Some(e) => println!("History order #{} NOT updated: {e}", r.record_id),
        None if !r.accepted.is_empty() => {
            println!("History order #{} marked CANCEL_REQUESTED", r.record_id)
        }
        None => {}
    }
}

pub fn display_sync(r: &SyncReport) {
    if r.updated.is_empty() {
        println!("History is up to date.");
    }
    for (id, from, to) in &r.updated {
        let from = if from.is_empty() { "-" } else { from.as_str() };
        println!("  #{id}: {from} -> {to}");
    }
    if !r.unknown.is_empty() {
        println!("\nOpen orders not in history:");
        for (i, o) in r.unknown.iter().enumerate() {
            println!("{}", pending_row(i + 1, o));
        }
    }
}

pub fn display_account(overview: &AccountOverview) {
    println!("ACCOUNT SUMMARY:");
    for (tag, value) in overview.summary.rows() {
        println!("  {:20} {:>18}", tag, group_thousands(value, 2));
    }
    println!();
    if overview.positions.is_empty() {
        println!("No positions.");
        return;
    }
    println!("POSITIONS ({}):", overview.positions.len());
    println!(
        "  {:10} {:8} {:4} {:>14} {:>12} {:>16}",
        "Account", "Symbol", "Type", "Position", "Avg Cost", "Cost Basis"
    );
    for p in &overview.positions {
        println!(
            "  {:10} {:8} {:4} {:>14} {:>12.4} {:>16}",
            p.account,
            contract_label(&p.contract),
            p.contract.security_type,
            group_thousands(p.quantity, 0),
            p.avg_cost,
            group_thousands(p.cost_basis(), 2),
        );
    }
}

pub fn display_quotes(results: &[QuoteResult]) {
    println!(
        "  {:8} {:>10} {:>10} {:>10} {:>8}",
        "Pair", "Bid", "Ask", "Mid", "Spread"
    );
    for r in results {
        match &r.quote {
            Ok(q) => println!(
                "  {:8} {:>10} {:>10} {:>10} {:>8}",
                r.symbol,
                q.bid.map_or("-".into(), |v| format!("{v:.5}")),
                q.ask.map_or("-".into(), |v| format!("{v:.5}")),
                q.mid().map_or("-".into(), |v| format!("{v:.5}")),
                q.spread().map_or("-".into(), |v| format!("{v:.5}")),
            ),
            Err(e) => println!("  {:8} error: {e}", r.symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderdesk::{
        Action, BrokerOrderId, Instrument, OrderDraft, OrderStatus, SubmissionOutcome,
    };

    #[test]
    fn record_row_shows_ids_and_status() {
        let r = OrderRecord {
            id: 1,
            timestamp: Utc::now(),
            draft: OrderDraft::new(
                Instrument::forex("EURUSD"),
                Action::Buy,
                10_000.0,
                OrderKind::Limit { limit_price: 1.08 },
            ),
            outcome: SubmissionOutcome::acknowledged(
                BrokerOrderId(42),
                OrderStatus::broker("Submitted"),
            ),
            updated_at: None,
        };
        let row = record_row(&r);
        assert!(row.contains("EURUSD 1.08"));
        assert!(row.contains("42"));
        assert!(row.ends_with("Submitted"));
    }

    #[test]
    fn pending_row_joins_forex_legs() {
        let o = PendingOrder {
            order_id: BrokerOrderId(7),
            contract: ContractSummary::from(&Instrument::forex("GBPUSD")),
            action: Action::Sell,
            quantity: 20_000.0,
            order_type: "STP".into(),
            status: "PreSubmitted".into(),
            filled: 0.0,
            remaining: 20_000.0,
            avg_fill_price: 0.0,
            limit_price: None,
            stop_price: Some(1.25),
        };
        let row = pending_row(1, &o);
        assert!(row.contains("GBPUSD"));
        assert!(row.contains("1.25"));
        assert!(row.ends_with("PreSubmitted"));
    }

    #[test]
    fn contract_label_only_joins_cash_pairs() {
        assert_eq!(
            contract_label(&ContractSummary::from(&Instrument::forex("USDJPY"))),
            "USDJPY"
        );
        assert_eq!(
            contract_label(&ContractSummary::from(&Instrument::stock("MSFT", "SMART", "USD"))),
            "MSFT"
        );
    }

    #[test]
    fn bracket_prices() {
        let kind = OrderKind::Bracket {
            limit_price: None,
            stop_loss_price: 95.0,
            take_profit_price: 110.0,
        };
        assert_eq!(kind_prices(&kind), "- SL 95 TP 110");
    }
}
