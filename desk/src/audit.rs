//! JSONL audit trail logging.
//!
//! Every submission attempt and cancellation request appends one event to an
//! audit.jsonl file, one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::warn;
use orderdesk::{BrokerOrderId, OrderDraft, OrderRecord};
use serde::Serialize;
use serde_json::json;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, json!({}))
    }
}

/// Optional audit log. Write failures are logged and never abort a workflow.
#[derive(Default)]
pub struct AuditTrail {
    log: Option<AuditLog>,
}

impl AuditTrail {
    pub fn new(log: AuditLog) -> Self {
        Self { log: Some(log) }
    }

    /// A trail that records nothing.
    pub fn disabled() -> Self {
        Self { log: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.log.is_some()
    }

    pub fn record(&mut self, event: &'static str, data: serde_json::Value) {
        if let Some(log) = &mut self.log {
            if let Err(e) = log.log(event, data) {
                warn!("Audit write failed for {event}: {e}");
            }
        }
    }

    pub fn validation_failed(&mut self, draft: &OrderDraft, errors: &[String]) {
        self.record(
            "validation_failed",
            json!({ "order": draft, "errors": errors }),
        );
    }

    pub fn order_submitted(&mut self, record: &OrderRecord) {
        self.record(
            "order_submitted",
            json!({
                "record_id": record.id,
                "symbol": record.draft.symbol(),
                "action": record.draft.action.to_string(),
                "quantity": record.draft.quantity,
                "kind": record.draft.kind.name(),
                "gateway_order_id": record.outcome.gateway_order_id,
                "bracket": record.outcome.bracket,
                "status": record.outcome.status,
            }),
        );
    }

    pub fn order_failed(&mut self, record_id: u64, draft: &OrderDraft, status: &str, error: &str) {
        self.record(
            "order_failed",
            json!({
                "record_id": record_id,
                "symbol": draft.symbol(),
                "kind": draft.kind.name(),
                "status": status,
                "error": error,
            }),
        );
    }

    /// A protective bracket leg that the gateway refused.
    pub fn leg_failed(&mut self, role: &str, parent: Option<BrokerOrderId>, error: &str) {
        self.record(
            "bracket_leg_failed",
            json!({ "role": role, "parent": parent, "error": error }),
        );
    }

    pub fn connection_failed(&mut self, draft: &OrderDraft, error: &str) {
        self.record(
            "connection_failed",
            json!({ "symbol": draft.symbol(), "error": error }),
        );
    }

    pub fn instrument_not_found(&mut self, draft: &OrderDraft, error: &str) {
        self.record(
            "instrument_not_found",
            json!({
                "symbol": draft.symbol(),
                "instrument": draft.instrument.to_string(),
                "error": error,
            }),
        );
    }

    pub fn cancel_requested(&mut self, order_id: BrokerOrderId, accepted: bool, detail: &str) {
        self.record(
            "cancel_requested",
            json!({ "order_id": order_id, "accepted": accepted, "detail": detail }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk::{Action, Instrument, OrderKind};

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log.log_simple("test_event").unwrap();
            log.log("test_data", json!({"key": "value"})).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }

        assert!(lines[0].contains("\"event\":\"test_event\""));
    }

    #[test]
    fn audit_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        let mut log = AuditLog::open(&path).unwrap();
        log.log_simple("test").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn trail_helpers_write_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let draft = OrderDraft::new(
            Instrument::forex("EURUSD"),
            Action::Buy,
            10_000.0,
            OrderKind::Market,
        );

        {
            let mut trail = AuditTrail::new(AuditLog::open(&path).unwrap());
            trail.validation_failed(&draft, &["Quantity must be positive".to_string()]);
            trail.cancel_requested(BrokerOrderId(42), true, "Cancelled");
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let events: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events[0]["event"], "validation_failed");
        assert_eq!(events[0]["order"]["instrument"]["symbol"], "EURUSD");
        assert_eq!(events[1]["order_id"], 42);
    }

    #[test]
    fn disabled_trail_is_silent() {
        let mut trail = AuditTrail::disabled();
        assert!(!trail.is_enabled());
        trail.record("ignored", json!({}));
    }
}
