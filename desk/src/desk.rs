//! The order desk context: gateway, history store, validator, pacing and
//! audit trail, owned together and passed to every workflow.

use log::info;
use orderdesk::OrderStore;
use orderdesk_broker::{AccountSummary, OrderGateway, Position, Session};
use orderdesk_risk::Validator;

use crate::audit::{AuditLog, AuditTrail};
use crate::config::{Config, ExecutionConfig};
use crate::error::Result;

/// Delays between consecutive gateway requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub bracket_leg_interval_ms: u64,
    pub cancel_interval_ms: u64,
    /// Wait before re-querying open orders after a cancel request.
    pub cancel_settle_ms: u64,
}

impl Pacing {
    /// No delays at all. Used against in-process gateways.
    pub fn none() -> Self {
        Self {
            bracket_leg_interval_ms: 0,
            cancel_interval_ms: 0,
            cancel_settle_ms: 0,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from(&ExecutionConfig::default())
    }
}

impl From<&ExecutionConfig> for Pacing {
    fn from(exec: &ExecutionConfig) -> Self {
        Self {
            bracket_leg_interval_ms: exec.bracket_leg_interval_ms,
            cancel_interval_ms: exec.cancel_interval_ms,
            cancel_settle_ms: exec.cancel_settle_ms,
        }
    }
}

/// Result of a bare connectivity check.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionStatus {
    pub client_id: i32,
    pub open_orders: usize,
}

/// Account values and held positions, read in one session.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountOverview {
    pub summary: AccountSummary,
    pub positions: Vec<Position>,
}

/// Owns everything an order workflow touches.
///
/// Each workflow opens its own [`Session`] on the gateway and releases it
/// before returning, whatever the outcome.
pub struct OrderDesk<G: OrderGateway> {
    pub(crate) gateway: G,
    pub(crate) store: OrderStore,
    pub(crate) validator: Validator,
    pub(crate) pacing: Pacing,
    pub(crate) audit: AuditTrail,
}

impl<G: OrderGateway> OrderDesk<G> {
    /// A desk with default pacing and no audit trail.
    pub fn new(gateway: G, store: OrderStore, validator: Validator) -> Self {
        Self {
            gateway,
            store,
            validator,
            pacing: Pacing::default(),
            audit: AuditTrail::disabled(),
        }
    }

    /// Wire a desk from configuration: history file, limits, pacing and
    /// audit log all come from `config`.
    pub fn from_config(gateway: G, config: &Config) -> Result<Self> {
        let audit = AuditLog::open(&config.audit_path())?;
        info!(
            "Order history at {}, audit log at {}",
            config.storage.history_file.display(),
            config.audit_path().display()
        );
        Ok(Self {
            gateway,
            store: OrderStore::open(config.storage.history_file.clone()),
            validator: Validator::new(config.limits.clone()),
            pacing: Pacing::from(&config.execution),
            audit: AuditTrail::new(audit),
        })
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_audit(mut self, audit: AuditTrail) -> Self {
        self.audit = audit;
        self
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Connect, count open orders, disconnect.
    pub fn check_connection(&mut self) -> Result<ConnectionStatus> {
        let session = Session::open(&mut self.gateway)?;
        let open_orders = session.open_orders()?.iter().filter(|o| o.is_open()).count();
        Ok(ConnectionStatus {
            client_id: session.client_id(),
            open_orders,
        })
    }

    /// Fetch the account summary and current positions.
    pub fn account_overview(&mut self) -> Result<AccountOverview> {
        let session = Session::open(&mut self.gateway)?;
        let summary = session.account_summary()?;
        let positions = session.positions()?;
        info!(
            "Account overview: {} positions, net liquidation {:.2}",
            positions.len(),
            summary.net_liquidation
        );
        Ok(AccountOverview { summary, positions })
    }
}
