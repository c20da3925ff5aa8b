//! Re-submit a historical order, optionally with changed fields.

use log::info;
use orderdesk::{Action, OrderDraft, OrderKind, OrderRecord};
use orderdesk_broker::OrderGateway;
use orderdesk_risk::ValidationReport;

use crate::desk::OrderDesk;
use crate::error::{Error, Result};
use crate::lifecycle::Submitted;

/// Fields to change on the cloned order. `None` keeps the source value.
///
/// `kind` replaces the order kind wholesale; the price overrides are applied
/// afterwards to whichever kind results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloneOverrides {
    pub symbol: Option<String>,
    pub action: Option<Action>,
    pub quantity: Option<f64>,
    pub kind: Option<OrderKind>,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
}

impl CloneOverrides {
    pub fn is_empty(&self) -> bool {
        *self == CloneOverrides::default()
    }
}

fn price_mismatch(which: &str, kind: &OrderKind) -> Error {
    Error::Validation(ValidationReport {
        errors: vec![format!("{which} does not apply to a {} order", kind.name())],
        warnings: Vec::new(),
    })
}

/// Build the draft a clone would submit. Identity and outcome fields of the
/// source are never carried over.
pub fn clone_draft(source: &OrderRecord, overrides: &CloneOverrides) -> Result<OrderDraft> {
    let mut draft = source.draft.clone();

    if let Some(symbol) = &overrides.symbol {
        draft.instrument = draft.instrument.with_symbol(symbol);
    }
    if let Some(action) = overrides.action {
        draft.action = action;
    }
    if let Some(quantity) = overrides.quantity {
        draft.quantity = quantity;
    }
    if let Some(kind) = &overrides.kind {
        draft.kind = kind.clone();
    }

    if let Some(price) = overrides.limit_price {
        match &mut draft.kind {
            OrderKind::Limit { limit_price } | OrderKind::StopLimit { limit_price, .. } => {
                *limit_price = price;
            }
            OrderKind::Bracket { limit_price, .. } => *limit_price = Some(price),
            other => return Err(price_mismatch("limit price", other)),
        }
    }
    if let Some(price) = overrides.stop_price {
        match &mut draft.kind {
            OrderKind::Stop { stop_price } | OrderKind::StopLimit { stop_price, .. } => {
                *stop_price = price;
            }
            OrderKind::Bracket {
                stop_loss_price, ..
            } => *stop_loss_price = price,
            other => return Err(price_mismatch("stop price", other)),
        }
    }
    Ok(draft)
}

impl<G: OrderGateway> OrderDesk<G> {
    /// Clone history record `record_id` with `overrides` and submit it as a
    /// new order. The source record is left untouched.
    pub fn clone_order(&mut self, record_id: u64, overrides: &CloneOverrides) -> Result<Submitted> {
        let source = self
            .store
            .find_by_id(record_id)
            .ok_or(Error::RecordNotFound(record_id))?;
        let draft = clone_draft(&source, overrides)?;
        info!("Cloning order #{record_id}: {draft}");
        self.submit_order(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderdesk::{BrokerOrderId, Instrument, OrderStatus, SubmissionOutcome};

    fn source() -> OrderRecord {
        OrderRecord {
            id: 3,
            timestamp: Utc::now(),
            draft: OrderDraft::new(
                Instrument::forex("EURUSD"),
                Action::Buy,
                10_000.0,
                OrderKind::Limit { limit_price: 1.08 },
            ),
            outcome: SubmissionOutcome::acknowledged(
                BrokerOrderId(42),
                OrderStatus::broker("Filled"),
            ),
            updated_at: None,
        }
    }

    #[test]
    fn no_overrides_copies_draft() {
        let draft = clone_draft(&source(), &CloneOverrides::default()).unwrap();
        assert_eq!(draft, source().draft);
    }

    #[test]
    fn overrides_apply() {
        let overrides = CloneOverrides {
            symbol: Some("gbpusd".into()),
            action: Some(Action::Sell),
            quantity: Some(20_000.0),
            limit_price: Some(1.27),
            ..Default::default()
        };
        let draft = clone_draft(&source(), &overrides).unwrap();
        assert_eq!(draft.symbol(), "GBPUSD");
        assert_eq!(draft.action, Action::Sell);
        assert_eq!(draft.quantity, 20_000.0);
        assert_eq!(draft.kind, OrderKind::Limit { limit_price: 1.27 });
    }

    #[test]
    fn kind_then_price() {
        let overrides = CloneOverrides {
            kind: Some(OrderKind::Stop { stop_price: 1.0 }),
            stop_price: Some(1.05),
            ..Default::default()
        };
        let draft = clone_draft(&source(), &overrides).unwrap();
        assert_eq!(draft.kind, OrderKind::Stop { stop_price: 1.05 });
    }

    #[test]
    fn price_for_market_order_is_rejected() {
        let overrides = CloneOverrides {
            kind: Some(OrderKind::Market),
            limit_price: Some(1.1),
            ..Default::default()
        };
        assert!(matches!(
            clone_draft(&source(), &overrides),
            Err(Error::Validation(_))
        ));
    }
}
