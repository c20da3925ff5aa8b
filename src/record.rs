//! Persisted order records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;
use crate::types::{BrokerOrderId, OrderDraft};

/// Gateway identifiers of the three legs of a bracket order.
///
/// A leg whose submission failed is left `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<BrokerOrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<BrokerOrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<BrokerOrderId>,
}

impl BracketIds {
    /// Captured ids in parent, stop-loss, take-profit order.
    pub fn ids(&self) -> Vec<BrokerOrderId> {
        [self.parent, self.stop_loss, self.take_profit]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_none() && self.stop_loss.is_none() && self.take_profit.is_none()
    }
}

/// What the gateway interaction produced. All fields are absent before submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<BrokerOrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket: Option<BracketIds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionOutcome {
    /// Accepted by the gateway with an initial broker status.
    pub fn acknowledged(order_id: BrokerOrderId, status: OrderStatus) -> Self {
        Self {
            gateway_order_id: Some(order_id),
            status: Some(status),
            ..Self::default()
        }
    }

    /// Terminal failure state (`ERROR` or `FAILED`) with its message.
    pub fn failed(status: OrderStatus, error: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// A record handed to the store; id and timestamp are assigned on append.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub draft: OrderDraft,
    pub outcome: SubmissionOutcome,
}

/// The durable unit of order history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub draft: OrderDraft,
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderRecord {
    pub fn status(&self) -> Option<&OrderStatus> {
        self.outcome.status.as_ref()
    }

    /// Every gateway id this record knows about, bracket legs included.
    pub fn gateway_ids(&self) -> Vec<BrokerOrderId> {
        let mut ids: Vec<BrokerOrderId> = self.outcome.gateway_order_id.into_iter().collect();
        if let Some(bracket) = &self.outcome.bracket {
            for id in bracket.ids() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    pub fn references(&self, order_id: BrokerOrderId) -> bool {
        self.gateway_ids().contains(&order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::LocalStatus;
    use crate::types::{Action, Instrument, OrderKind};

    fn record(outcome: SubmissionOutcome) -> OrderRecord {
        OrderRecord {
            id: 7,
            timestamp: Utc::now(),
            draft: OrderDraft::new(
                Instrument::forex("EURUSD"),
                Action::Buy,
                10_000.0,
                OrderKind::Limit { limit_price: 1.08 },
            ),
            outcome,
            updated_at: None,
        }
    }

    #[test]
    fn json_layout_is_flat() {
        let rec = record(SubmissionOutcome::acknowledged(
            BrokerOrderId(42),
            OrderStatus::broker("Submitted"),
        ));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["action"], "BUY");
        assert_eq!(json["gateway_order_id"], 42);
        assert_eq!(json["status"], "Submitted");
        assert_eq!(json["instrument"]["symbol"], "EURUSD");
        assert!(json.get("error").is_none());
        assert!(json.get("updated_at").is_none());

        let back: OrderRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn gateway_ids_merge_bracket_legs() {
        let mut outcome = SubmissionOutcome::acknowledged(
            BrokerOrderId(10),
            OrderStatus::from(LocalStatus::BracketSubmitted),
        );
        outcome.bracket = Some(BracketIds {
            parent: Some(BrokerOrderId(10)),
            stop_loss: None,
            take_profit: Some(BrokerOrderId(12)),
        });
        let rec = record(outcome);
        assert_eq!(rec.gateway_ids(), vec![BrokerOrderId(10), BrokerOrderId(12)]);
        assert!(rec.references(BrokerOrderId(12)));
        assert!(!rec.references(BrokerOrderId(11)));
    }

    #[test]
    fn failed_outcome_carries_error() {
        let outcome = SubmissionOutcome::failed(LocalStatus::Error.into(), "socket closed");
        assert_eq!(outcome.error.as_deref(), Some("socket closed"));
        assert!(outcome.gateway_order_id.is_none());
    }
}
