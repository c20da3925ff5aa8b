//! Order status: local terminal states plus opaque broker-native states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broker states for orders still working at the gateway.
pub const OPEN_BROKER_STATES: [&str; 4] =
    ["PendingSubmit", "PreSubmitted", "Submitted", "PendingCancel"];

/// Broker states after which no further transition is expected.
pub const TERMINAL_BROKER_STATES: [&str; 4] = ["Filled", "Cancelled", "ApiCancelled", "Inactive"];

/// States assigned locally by this crate, never by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocalStatus {
    /// The gateway raised an error while the order was being submitted.
    Error,
    /// No leg of a bracket reached the gateway.
    Failed,
    CancelRequested,
    BracketSubmitted,
}

impl LocalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LocalStatus::Error => "ERROR",
            LocalStatus::Failed => "FAILED",
            LocalStatus::CancelRequested => "CANCEL_REQUESTED",
            LocalStatus::BracketSubmitted => "BRACKET_SUBMITTED",
        }
    }

    fn parse(s: &str) -> Option<LocalStatus> {
        match s {
            "ERROR" => Some(LocalStatus::Error),
            "FAILED" => Some(LocalStatus::Failed),
            "CANCEL_REQUESTED" => Some(LocalStatus::CancelRequested),
            "BRACKET_SUBMITTED" => Some(LocalStatus::BracketSubmitted),
            _ => None,
        }
    }
}

/// Status stored on an order record.
///
/// Serialized as a single string: local states use their upper-case names,
/// broker states are stored verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Local(LocalStatus),
    Broker(String),
}

impl OrderStatus {
    pub fn broker(s: impl Into<String>) -> Self {
        let s = s.into();
        match LocalStatus::parse(&s) {
            Some(local) => OrderStatus::Local(local),
            None => OrderStatus::Broker(s),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Local(l) => l.as_str(),
            OrderStatus::Broker(s) => s,
        }
    }

    /// True while the broker still considers the order working.
    pub fn is_open(&self) -> bool {
        match self {
            OrderStatus::Local(_) => false,
            OrderStatus::Broker(s) => is_open_broker_state(s),
        }
    }

    /// True once no further transition is expected.
    ///
    /// `CANCEL_REQUESTED` and `BRACKET_SUBMITTED` are neither open nor terminal:
    /// only the live gateway can say how those orders ended.
    pub fn is_terminal(&self) -> bool {
        match self {
            OrderStatus::Local(l) => matches!(l, LocalStatus::Error | LocalStatus::Failed),
            OrderStatus::Broker(s) => TERMINAL_BROKER_STATES.contains(&s.as_str()),
        }
    }

    /// True for `ERROR` and `FAILED`, the states that carry an error message.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OrderStatus::Local(LocalStatus::Error | LocalStatus::Failed)
        )
    }
}

/// Whether a raw broker status string denotes a working order.
pub fn is_open_broker_state(status: &str) -> bool {
    OPEN_BROKER_STATES.contains(&status)
}

impl From<LocalStatus> for OrderStatus {
    fn from(l: LocalStatus) -> Self {
        OrderStatus::Local(l)
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        OrderStatus::broker(s)
    }
}

impl From<OrderStatus> for String {
    fn from(s: OrderStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_names_round_trip_through_strings() {
        for local in [
            LocalStatus::Error,
            LocalStatus::Failed,
            LocalStatus::CancelRequested,
            LocalStatus::BracketSubmitted,
        ] {
            let s: String = OrderStatus::Local(local).into();
            assert_eq!(OrderStatus::from(s), OrderStatus::Local(local));
        }
    }

    #[test]
    fn broker_states_pass_through() {
        let status = OrderStatus::broker("PreSubmitted");
        assert_eq!(status, OrderStatus::Broker("PreSubmitted".into()));
        assert!(status.is_open());
        assert!(!status.is_terminal());
    }

    #[test]
    fn terminal_classification() {
        assert!(OrderStatus::broker("Filled").is_terminal());
        assert!(OrderStatus::broker("Cancelled").is_terminal());
        assert!(OrderStatus::from(LocalStatus::Error).is_terminal());
        assert!(!OrderStatus::from(LocalStatus::CancelRequested).is_terminal());
        assert!(!OrderStatus::from(LocalStatus::BracketSubmitted).is_open());
    }

    #[test]
    fn pending_cancel_is_still_open() {
        assert!(is_open_broker_state("PendingCancel"));
        assert!(!is_open_broker_state("Filled"));
    }

    #[test]
    fn open_set_is_exactly_the_working_states() {
        for s in ["PendingSubmit", "PreSubmitted", "Submitted", "PendingCancel"] {
            assert!(is_open_broker_state(s), "{s}");
        }
        for s in ["ApiPending", "Inactive", "ApiCancelled", "Unknown"] {
            assert!(!is_open_broker_state(s), "{s}");
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&OrderStatus::from(LocalStatus::CancelRequested)).unwrap();
        assert_eq!(json, "\"CANCEL_REQUESTED\"");
        let back: OrderStatus = serde_json::from_str("\"Submitted\"").unwrap();
        assert_eq!(back, OrderStatus::Broker("Submitted".into()));
    }
}
