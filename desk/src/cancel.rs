//! Pending orders, cancellation and history reconciliation.
//!
//! The gateway's open-order list is authoritative for what is pending; the
//! local history is only updated to reflect requests that were accepted.

use std::fmt;

use log::{info, warn};
use orderdesk::{BrokerOrderId, LocalStatus, OrderRecord, OrderStatus};
use orderdesk_broker::{OrderGateway, PendingOrder, Session, rate_limit_delay};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::desk::OrderDesk;
use crate::error::{Error, Result};

/// How a single cancel request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The order no longer appears as open after the settle delay.
    Cancelled,
    /// Request accepted but the order is still listed as open.
    InProgress,
    /// The gateway refused the request.
    Failed(String),
}

impl CancelOutcome {
    pub fn accepted(&self) -> bool {
        !matches!(self, CancelOutcome::Failed(_))
    }
}

impl fmt::Display for CancelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelOutcome::Cancelled => write!(f, "cancelled"),
            CancelOutcome::InProgress => write!(f, "cancellation in progress"),
            CancelOutcome::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancelReport {
    pub order_id: BrokerOrderId,
    pub symbol: String,
    pub outcome: CancelOutcome,
    /// History record marked `CANCEL_REQUESTED`, if one carries this id.
    pub record_id: Option<u64>,
    /// Set when the request reached the gateway but the history update failed.
    pub history_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CancelAllReport {
    pub reports: Vec<CancelReport>,
    /// Open orders left after the final re-query.
    pub still_open: usize,
}

impl CancelAllReport {
    pub fn requested(&self) -> usize {
        self.reports.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CancelReport> {
        self.reports.iter().filter(|r| !r.outcome.accepted())
    }

    /// Accepted cancels whose history record could not be updated.
    pub fn history_errors(&self) -> impl Iterator<Item = &CancelReport> {
        self.reports.iter().filter(|r| r.history_error.is_some())
    }
}

/// Cancellation of every leg a history record knows about.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCancelReport {
    pub record_id: u64,
    pub accepted: Vec<BrokerOrderId>,
    pub failed: Vec<(BrokerOrderId, String)>,
    /// Set when requests were accepted but the record could not be marked.
    pub history_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// `(record id, previous status, live status)` for every record changed.
    pub updated: Vec<(u64, String, String)>,
    /// Open gateway orders no history record refers to.
    pub unknown: Vec<PendingOrder>,
}

fn still_open(orders: &[PendingOrder], order_id: BrokerOrderId) -> bool {
    orders.iter().any(|o| o.order_id == order_id && o.is_open())
}

impl<G: OrderGateway> OrderDesk<G> {
    /// Orders the gateway currently reports as open.
    pub fn get_pending(&mut self) -> Result<Vec<PendingOrder>> {
        let session = Session::open(&mut self.gateway)?;
        let orders: Vec<PendingOrder> = session
            .open_orders()?
            .into_iter()
            .filter(PendingOrder::is_open)
            .collect();
        info!("{} open order(s) at the gateway", orders.len());
        Ok(orders)
    }

    /// Records whose cached status is not terminal. Offline, may be stale.
    pub fn local_open(&self) -> Vec<OrderRecord> {
        self.store.open_records()
    }

    /// Cancel one live order and check once whether it is gone.
    pub fn cancel_one(&mut self, order: &PendingOrder) -> Result<CancelReport> {
        let order_id = order.order_id;
        let session = Session::open(&mut self.gateway)?;

        let outcome = match session.cancel(order_id) {
            Ok(()) => {
                info!("Cancel requested for order {order_id}");
                rate_limit_delay(self.pacing.cancel_settle_ms);
                match session.open_orders() {
                    Ok(orders) if still_open(&orders, order_id) => CancelOutcome::InProgress,
                    Ok(_) => CancelOutcome::Cancelled,
                    Err(e) => {
                        warn!("Could not confirm cancellation of {order_id}: {e}");
                        CancelOutcome::InProgress
                    }
                }
            }
            Err(e) => {
                warn!("Cancel failed for order {order_id}: {e}");
                CancelOutcome::Failed(e.to_string())
            }
        };
        drop(session);

        Ok(self.settle_cancel(order, outcome))
    }

    /// Cancel every order in `orders`, paced, collecting individual failures.
    pub fn cancel_all(&mut self, orders: &[PendingOrder]) -> Result<CancelAllReport> {
        if orders.is_empty() {
            return Ok(CancelAllReport::default());
        }
        let session = Session::open(&mut self.gateway)?;

        let mut requested = Vec::with_capacity(orders.len());
        for (i, order) in orders.iter().enumerate() {
            if i > 0 {
                rate_limit_delay(self.pacing.cancel_interval_ms);
            }
            let result = session.cancel(order.order_id).map_err(|e| e.to_string());
            if let Err(e) = &result {
                warn!("Cancel failed for order {}: {e}", order.order_id);
            }
            requested.push((order, result));
        }

        rate_limit_delay(self.pacing.cancel_settle_ms);
        let remaining = match session.open_orders() {
            Ok(list) => Some(list),
            Err(e) => {
                warn!("Could not re-query open orders: {e}");
                None
            }
        };
        drop(session);

        let still_open_count = remaining
            .as_ref()
            .map_or(orders.len(), |list| list.iter().filter(|o| o.is_open()).count());

        let mut report = CancelAllReport {
            reports: Vec::with_capacity(requested.len()),
            still_open: still_open_count,
        };
        for (order, result) in requested {
            let outcome = match result {
                Err(e) => CancelOutcome::Failed(e),
                Ok(()) => match &remaining {
                    Some(list) if !still_open(list, order.order_id) => CancelOutcome::Cancelled,
                    _ => CancelOutcome::InProgress,
                },
            };
            report.reports.push(self.settle_cancel(order, outcome));
        }
        info!(
            "Cancel all: {} requested, {} failed, {} still open, {} history update(s) failed",
            report.requested(),
            report.failures().count(),
            report.still_open,
            report.history_errors().count()
        );
        Ok(report)
    }

    /// Cancel by gateway id. The id must be in the live pending set.
    pub fn cancel_by_id(&mut self, order_id: BrokerOrderId) -> Result<CancelReport> {
        let pending = self.get_pending()?;
        let Some(order) = pending.into_iter().find(|o| o.order_id == order_id) else {
            return Err(Error::NotFound(order_id));
        };
        self.cancel_one(&order)
    }

    /// Cancel every gateway order a history record refers to, bracket legs
    /// included.
    pub fn cancel_record(&mut self, record_id: u64) -> Result<RecordCancelReport> {
        let record = self
            .store
            .find_by_id(record_id)
            .ok_or(Error::RecordNotFound(record_id))?;
        let ids = record.gateway_ids();
        if ids.is_empty() {
            return Err(Error::NotCancellable {
                record_id,
                reason: "no gateway order id was recorded".into(),
            });
        }
        if let Some(status) = record.status().filter(|s| s.is_terminal()) {
            return Err(Error::NotCancellable {
                record_id,
                reason: format!("status is {status}"),
            });
        }

        let session = Session::open(&mut self.gateway)?;
        let mut report = RecordCancelReport {
            record_id,
            accepted: Vec::new(),
            failed: Vec::new(),
            history_error: None,
        };
        for (i, id) in ids.into_iter().enumerate() {
            if i > 0 {
                rate_limit_delay(self.pacing.cancel_interval_ms);
            }
            match session.cancel(id) {
                Ok(()) => {
                    self.audit.cancel_requested(id, true, "requested");
                    report.accepted.push(id);
                }
                Err(e) => {
                    warn!("Cancel failed for order {id} (record #{record_id}): {e}");
                    self.audit.cancel_requested(id, false, &e.to_string());
                    report.failed.push((id, e.to_string()));
                }
            }
        }
        drop(session);

        if !report.accepted.is_empty() {
            match self
                .store
                .update_status(record_id, LocalStatus::CancelRequested.into())
            {
                Ok(_) => info!("Order #{record_id} marked CANCEL_REQUESTED"),
                Err(e) => {
                    warn!("Cancel sent but order #{record_id} could not be marked: {e}");
                    report.history_error = Some(e.to_string());
                }
            }
        }
        Ok(report)
    }

    /// Copy live statuses onto matching history records and list live orders
    /// the history does not know.
    pub fn sync_history(&mut self) -> Result<SyncReport> {
        let session = Session::open(&mut self.gateway)?;
        let live = session.open_orders()?;
        drop(session);

        let by_id: FxHashMap<BrokerOrderId, &PendingOrder> =
            live.iter().map(|o| (o.order_id, o)).collect();
        let records = self.store.load_all();
        let mut known: FxHashSet<BrokerOrderId> = FxHashSet::default();
        let mut report = SyncReport::default();

        for record in &records {
            known.extend(record.gateway_ids());
            if record.outcome.bracket.is_some() {
                continue;
            }
            let Some(order) = record
                .outcome
                .gateway_order_id
                .and_then(|id| by_id.get(&id))
            else {
                continue;
            };
            let current = record.status().map_or("", |s| s.as_str());
            if current == order.status {
                continue;
            }
            if self
                .store
                .update_status(record.id, OrderStatus::broker(order.status.clone()))?
            {
                report
                    .updated
                    .push((record.id, current.to_string(), order.status.clone()));
            }
        }

        report.unknown = live
            .iter()
            .filter(|o| o.is_open() && !known.contains(&o.order_id))
            .cloned()
            .collect();
        info!(
            "Sync: {} record(s) updated, {} unknown open order(s)",
            report.updated.len(),
            report.unknown.len()
        );
        Ok(report)
    }

    /// Audit one cancel outcome and, when accepted, mark its record. A history
    /// failure is carried on the report since the request already went out.
    fn settle_cancel(&mut self, order: &PendingOrder, outcome: CancelOutcome) -> CancelReport {
        let order_id = order.order_id;
        self.audit
            .cancel_requested(order_id, outcome.accepted(), &outcome.to_string());
        let (record_id, history_error) = if outcome.accepted() {
            match self.mark_cancel_requested(order_id) {
                Ok(id) => (id, None),
                Err(e) => {
                    warn!("Cancel of {order_id} sent but history update failed: {e}");
                    (None, Some(e.to_string()))
                }
            }
        } else {
            (None, None)
        };
        CancelReport {
            order_id,
            symbol: order.contract.symbol.clone(),
            outcome,
            record_id,
            history_error,
        }
    }

    /// Mark the newest record referring to `order_id` as `CANCEL_REQUESTED`.
    fn mark_cancel_requested(&self, order_id: BrokerOrderId) -> Result<Option<u64>> {
        let Some(record) = self
            .store
            .load_all()
            .into_iter()
            .rev()
            .find(|r| r.references(order_id))
        else {
            return Ok(None);
        };
        self.store
            .update_status(record.id, LocalStatus::CancelRequested.into())?;
        Ok(Some(record.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_acceptance() {
        assert!(CancelOutcome::Cancelled.accepted());
        assert!(CancelOutcome::InProgress.accepted());
        assert!(!CancelOutcome::Failed("x".into()).accepted());
        assert_eq!(CancelOutcome::Failed("x".into()).to_string(), "failed: x");
    }
}
