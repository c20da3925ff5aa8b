//! Interactive Brokers (IBKR) gateway implementation.

pub mod client;
pub mod orders;

use std::time::Duration;

use orderdesk::{BrokerOrderId, Instrument};

use crate::OrderGateway;
use crate::error::BrokerError;
use crate::types::*;
use client::IbkrClient;

/// Interactive Brokers gateway, wrapping the TWS/Gateway blocking API.
pub struct IbkrGateway {
    host: String,
    port: u16,
    client_id: i32,
    settle: Duration,
    client: Option<IbkrClient>,
}

impl IbkrGateway {
    /// Create a new IBKR gateway handle (not yet connected).
    pub fn new(host: &str, port: u16, client_id: i32) -> Self {
        Self {
            host: host.to_string(),
            port,
            client_id,
            settle: Duration::from_secs(2),
            client: None,
        }
    }

    /// How long `submit` waits for the first status report.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// A disconnected handle to the same gateway under another client id.
    pub fn with_client_id(&self, client_id: i32) -> Self {
        Self {
            host: self.host.clone(),
            port: self.port,
            client_id,
            settle: self.settle,
            client: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn require_client(&self) -> Result<&IbkrClient, BrokerError> {
        self.client.as_ref().ok_or(BrokerError::NotConnected)
    }
}

impl OrderGateway for IbkrGateway {
    fn connect(&mut self) -> Result<(), BrokerError> {
        let client = IbkrClient::connect(&self.host, self.port, self.client_id)?;
        self.client = Some(client);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        self.client = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn client_id(&self) -> i32 {
        self.client_id
    }

    fn qualify(&self, instrument: &Instrument) -> Result<ContractRef, BrokerError> {
        self.require_client()?.qualify(instrument)
    }

    fn submit(
        &self,
        contract: &ContractRef,
        order: &OrderRequest,
    ) -> Result<SubmitAck, BrokerError> {
        let client = self.require_client()?;
        orders::submit_order(client.inner(), contract, order, self.settle)
    }

    fn cancel(&self, order_id: BrokerOrderId) -> Result<(), BrokerError> {
        let client = self.require_client()?;
        orders::cancel_order(client.inner(), order_id)
    }

    fn open_orders(&self) -> Result<Vec<PendingOrder>, BrokerError> {
        let client = self.require_client()?;
        orders::open_orders(client.inner())
    }

    fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        self.require_client()?.positions()
    }

    fn account_summary(&self) -> Result<AccountSummary, BrokerError> {
        self.require_client()?.account_summary()
    }

    fn quote(&self, contract: &ContractRef) -> Result<Quote, BrokerError> {
        self.require_client()?.quote(contract)
    }
}
