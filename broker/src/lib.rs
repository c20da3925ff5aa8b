//! Order gateway trait and implementations for orderdesk.
//!
//! Provides the `OrderGateway` trait that abstracts over the broker's trading
//! gateway, plus a scoped [`Session`] that guarantees the connection is
//! released. Implementations:
//!
//! - **IBKR** (feature `ibkr`): Interactive Brokers via TWS / IB Gateway
//! - **Mock**: scripted in-process gateway for tests

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "ibkr")]
pub mod ibkr;

pub use error::BrokerError;
pub use types::*;

use std::ops::{Deref, DerefMut};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use orderdesk::{BrokerOrderId, Instrument};

/// A gateway connection that can resolve contracts, place and cancel orders,
/// list open orders, and report positions, account values and quotes.
pub trait OrderGateway {
    /// Connect to the gateway.
    fn connect(&mut self) -> Result<(), BrokerError>;

    /// Disconnect gracefully.
    fn disconnect(&mut self) -> Result<(), BrokerError>;

    fn is_connected(&self) -> bool;

    /// Client id this handle connects with.
    fn client_id(&self) -> i32;

    /// Resolve an instrument to a tradable contract.
    fn qualify(&self, instrument: &Instrument) -> Result<ContractRef, BrokerError>;

    /// Place one order and wait for its first status report.
    fn submit(&self, contract: &ContractRef, order: &OrderRequest)
    -> Result<SubmitAck, BrokerError>;

    /// Request cancellation. Returns once the request is sent, not when it
    /// takes effect.
    fn cancel(&self, order_id: BrokerOrderId) -> Result<(), BrokerError>;

    /// Every order the gateway reports as open for this account.
    fn open_orders(&self) -> Result<Vec<PendingOrder>, BrokerError>;

    /// Positions held across the connected accounts.
    fn positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Account summary values (net liquidation, cash, buying power).
    fn account_summary(&self) -> Result<AccountSummary, BrokerError>;

    /// Snapshot quote for a contract.
    fn quote(&self, contract: &ContractRef) -> Result<Quote, BrokerError>;
}

/// A connected gateway, disconnected when dropped.
pub struct Session<'a, G: OrderGateway> {
    gateway: &'a mut G,
}

impl<'a, G: OrderGateway> Session<'a, G> {
    /// Connect `gateway`. The connection lives as long as the returned guard.
    pub fn open(gateway: &'a mut G) -> Result<Self, BrokerError> {
        gateway.connect()?;
        debug!("Session opened (client_id={})", gateway.client_id());
        Ok(Self { gateway })
    }
}

impl<G: OrderGateway> Deref for Session<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        self.gateway
    }
}

impl<G: OrderGateway> DerefMut for Session<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        self.gateway
    }
}

impl<G: OrderGateway> Drop for Session<'_, G> {
    fn drop(&mut self) {
        if !self.gateway.is_connected() {
            return;
        }
        match self.gateway.disconnect() {
            Ok(()) => debug!("Session closed (client_id={})", self.gateway.client_id()),
            Err(e) => warn!("Disconnect failed: {e}"),
        }
    }
}

/// Sleep for a pacing interval between gateway requests.
pub fn rate_limit_delay(interval_ms: u64) {
    if interval_ms > 0 {
        thread::sleep(Duration::from_millis(interval_ms));
    }
}
