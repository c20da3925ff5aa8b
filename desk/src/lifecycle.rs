//! Order submission: validate, qualify, place, persist.
//!
//! Validation failures, connection failures and unknown instruments are
//! reported without touching history. Once an order reaches the gateway the
//! attempt is always persisted, successful or not.

use log::{error, info, warn};
use orderdesk::{
    BracketIds, BrokerOrderId, LocalStatus, NewOrder, OrderDraft, OrderKind, OrderStatus,
    SubmissionOutcome,
};
use orderdesk_broker::{
    ContractRef, LegRole, OrderGateway, OrderRequest, OrderType, Session, rate_limit_delay,
};

use crate::audit::AuditTrail;
use crate::desk::OrderDesk;
use crate::error::{Error, Result};

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub record_id: u64,
    pub gateway_order_id: BrokerOrderId,
    /// Legs captured for a bracket order.
    pub bracket: Option<BracketIds>,
    pub status: OrderStatus,
    /// Non-blocking validation findings, e.g. the computed order value.
    pub warnings: Vec<String>,
    /// Protective legs the gateway refused.
    pub leg_errors: Vec<String>,
}

/// Gateway order type for a non-bracket kind.
pub fn order_type_for(kind: &OrderKind) -> Option<OrderType> {
    match *kind {
        OrderKind::Market => Some(OrderType::Market),
        OrderKind::Limit { limit_price } => Some(OrderType::Limit(limit_price)),
        OrderKind::Stop { stop_price } => Some(OrderType::Stop(stop_price)),
        OrderKind::StopLimit {
            stop_price,
            limit_price,
        } => Some(OrderType::StopLimit {
            stop: stop_price,
            limit: limit_price,
        }),
        OrderKind::Bracket { .. } => None,
    }
}

/// Symbol trimmed and upper-cased; everything else untouched.
fn normalize(mut draft: OrderDraft) -> OrderDraft {
    let symbol = draft.symbol().trim().to_ascii_uppercase();
    if symbol != draft.symbol() {
        draft.instrument = draft.instrument.with_symbol(&symbol);
    }
    draft
}

struct BracketPlacement {
    ids: BracketIds,
    leg_errors: Vec<String>,
}

/// Parent first, then the protective legs on the opposite side, each
/// carrying the parent id. A failed parent stops the sequence.
fn place_bracket<G: OrderGateway>(
    gateway: &G,
    contract: &ContractRef,
    draft: &OrderDraft,
    leg_interval_ms: u64,
    audit: &mut AuditTrail,
) -> std::result::Result<BracketPlacement, String> {
    let OrderKind::Bracket {
        limit_price: entry,
        stop_loss_price: stop_loss,
        take_profit_price: take_profit,
    } = draft.kind
    else {
        return Err(format!("{} is not a bracket order", draft.kind.name()));
    };
    let (action, quantity) = (draft.action, draft.quantity);
    let entry_type = entry.map_or(OrderType::Market, OrderType::Limit);
    let parent = OrderRequest::leg(LegRole::Parent, action, quantity, entry_type, None);
    let parent_id = match gateway.submit(contract, &parent) {
        Ok(ack) => {
            info!("Bracket parent placed: {} ({})", ack.order_id, ack.status);
            ack.order_id
        }
        Err(e) => return Err(format!("parent order failed: {e}")),
    };

    let mut placement = BracketPlacement {
        ids: BracketIds {
            parent: Some(parent_id),
            ..BracketIds::default()
        },
        leg_errors: Vec::new(),
    };

    let exit = action.opposite();
    let legs = [
        (LegRole::StopLoss, OrderType::Stop(stop_loss)),
        (LegRole::TakeProfit, OrderType::Limit(take_profit)),
    ];
    for (role, order_type) in legs {
        rate_limit_delay(leg_interval_ms);
        let request = OrderRequest::leg(role, exit, quantity, order_type, Some(parent_id));
        match gateway.submit(contract, &request) {
            Ok(ack) => {
                info!("Bracket {role} placed: {} ({})", ack.order_id, ack.status);
                match role {
                    LegRole::StopLoss => placement.ids.stop_loss = Some(ack.order_id),
                    _ => placement.ids.take_profit = Some(ack.order_id),
                }
            }
            Err(e) => {
                let message = format!("{role} leg failed: {e}");
                warn!("Bracket {parent_id}: {message}");
                audit.leg_failed(&role.to_string(), Some(parent_id), &e.to_string());
                placement.leg_errors.push(message);
            }
        }
    }
    Ok(placement)
}

impl<G: OrderGateway> OrderDesk<G> {
    /// Validate and place an order, then persist the attempt.
    ///
    /// A gateway rejection is persisted as `ERROR` (or `FAILED` for a bracket
    /// whose parent never reached the gateway) before
    /// [`Error::Submission`] is returned.
    pub fn submit_order(&mut self, draft: OrderDraft) -> Result<Submitted> {
        let draft = normalize(draft);
        let report = self.validator.validate_order(&draft);
        if !report.is_ok() {
            warn!("Order rejected by validation: {}", report.summary());
            self.audit.validation_failed(&draft, &report.errors);
            return Err(Error::Validation(report));
        }
        let warnings = report.warnings;

        let session = match Session::open(&mut self.gateway) {
            Ok(s) => s,
            Err(e) => {
                error!("Cannot connect to gateway: {e}");
                self.audit.connection_failed(&draft, &e.to_string());
                return Err(e.into());
            }
        };

        let contract = match session.qualify(&draft.instrument) {
            Ok(c) => c,
            Err(e) => {
                error!("Cannot qualify {}: {e}", draft.instrument);
                self.audit.instrument_not_found(&draft, &e.to_string());
                return Err(e.into());
            }
        };
        info!("Submitting {draft}");

        if draft.kind.is_bracket() {
            let placed = place_bracket(
                &*session,
                &contract,
                &draft,
                self.pacing.bracket_leg_interval_ms,
                &mut self.audit,
            );
            drop(session);
            return match placed {
                Ok(placement) => self.persist_bracket(draft, placement, warnings),
                Err(message) => self.persist_failure(draft, LocalStatus::Failed, message),
            };
        }

        let Some(order_type) = order_type_for(&draft.kind) else {
            return Err(Error::Gateway(format!("unsupported order kind {}", draft.kind)));
        };
        let request = OrderRequest::single(draft.action, draft.quantity, order_type);
        let placed = session.submit(&contract, &request);
        drop(session);

        match placed {
            Ok(ack) => {
                let status = OrderStatus::broker(ack.status);
                let outcome = SubmissionOutcome::acknowledged(ack.order_id, status.clone());
                let record_id = self.persist(draft, outcome)?;
                info!("Order #{record_id} placed as {} ({status})", ack.order_id);
                Ok(Submitted {
                    record_id,
                    gateway_order_id: ack.order_id,
                    bracket: None,
                    status,
                    warnings,
                    leg_errors: Vec::new(),
                })
            }
            Err(e) => self.persist_failure(draft, LocalStatus::Error, e.to_string()),
        }
    }

    fn persist(&mut self, draft: OrderDraft, outcome: SubmissionOutcome) -> Result<u64> {
        let record_id = self.store.append(NewOrder { draft, outcome })?;
        if let Some(record) = self.store.find_by_id(record_id) {
            self.audit.order_submitted(&record);
        }
        Ok(record_id)
    }

    fn persist_bracket(
        &mut self,
        draft: OrderDraft,
        placement: BracketPlacement,
        warnings: Vec<String>,
    ) -> Result<Submitted> {
        let BracketPlacement { ids, leg_errors } = placement;
        let Some(parent) = ids.parent else {
            return self.persist_failure(draft, LocalStatus::Failed, "no parent id captured".into());
        };
        let status = OrderStatus::from(LocalStatus::BracketSubmitted);
        let mut outcome = SubmissionOutcome::acknowledged(parent, status.clone());
        outcome.bracket = Some(ids.clone());
        let record_id = self.persist(draft, outcome)?;
        if leg_errors.is_empty() {
            info!("Bracket order #{record_id} placed: {:?}", ids.ids());
        } else {
            warn!(
                "Bracket order #{record_id} partially placed ({} leg(s) failed)",
                leg_errors.len()
            );
        }
        Ok(Submitted {
            record_id,
            gateway_order_id: parent,
            bracket: Some(ids),
            status,
            warnings,
            leg_errors,
        })
    }

    fn persist_failure(
        &mut self,
        draft: OrderDraft,
        status: LocalStatus,
        message: String,
    ) -> Result<Submitted> {
        error!("Order submission failed: {message}");
        let outcome = SubmissionOutcome::failed(status.into(), message.clone());
        let record_id = self.store.append(NewOrder {
            draft: draft.clone(),
            outcome,
        })?;
        self.audit
            .order_failed(record_id, &draft, status.as_str(), &message);
        Err(Error::Submission { record_id, message })
    }
}
