//! Mock gateway for testing: implements `OrderGateway` with scripted behavior.
//!
//! Handles created with [`MockGateway::with_client_id`] share one simulated
//! gateway, so a test can keep a handle for assertions while the code under
//! test owns another.
//!
//! ```ignore
//! use orderdesk_broker::mock::MockGateway;
//!
//! let gateway = MockGateway::builder()
//!     .next_order_id(42)
//!     .initial_status("Submitted")
//!     .with_quote("EURUSD", 1.0850, 1.0852)
//!     .build();
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;
use orderdesk::{BrokerOrderId, Instrument};

use crate::OrderGateway;
use crate::error::BrokerError;
use crate::types::*;

/// A recorded order placement for assertion in tests.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedSubmission {
    pub order_id: BrokerOrderId,
    pub contract: ContractRef,
    pub request: OrderRequest,
}

#[derive(Debug)]
struct MockState {
    next_order_id: i64,
    next_contract_id: i64,
    initial_status: String,
    reject: Option<String>,
    /// Zero-based submission attempts that fail, with their message.
    failing_attempts: Vec<(usize, String)>,
    unknown_symbols: Vec<String>,
    connect_error: Option<String>,
    sticky_cancel: bool,
    cancel_errors: Vec<BrokerOrderId>,
    open: Vec<PendingOrder>,
    positions: Vec<Position>,
    account: AccountSummary,
    quotes: Vec<Quote>,
    attempts: usize,
    submitted: Vec<RecordedSubmission>,
    cancelled: Vec<BrokerOrderId>,
    live_sessions: Vec<i32>,
    connects: usize,
    disconnects: usize,
}

/// Builder for `MockGateway`.
pub struct MockGatewayBuilder {
    client_id: i32,
    state: MockState,
}

impl MockGatewayBuilder {
    pub fn client_id(mut self, id: i32) -> Self {
        self.client_id = id;
        self
    }

    /// First id handed out by `submit`; later ones count up from it.
    pub fn next_order_id(mut self, id: i64) -> Self {
        self.state.next_order_id = id;
        self
    }

    /// Status reported for every accepted order.
    pub fn initial_status(mut self, status: &str) -> Self {
        self.state.initial_status = status.to_string();
        self
    }

    /// Every submission is rejected with `message`.
    pub fn reject_all(mut self, message: &str) -> Self {
        self.state.reject = Some(message.to_string());
        self
    }

    /// The submission attempt at zero-based `index` is rejected.
    pub fn fail_submission(mut self, index: usize, message: &str) -> Self {
        self.state
            .failing_attempts
            .push((index, message.to_string()));
        self
    }

    /// `qualify` fails for this symbol.
    pub fn unknown_symbol(mut self, symbol: &str) -> Self {
        self.state.unknown_symbols.push(symbol.to_ascii_uppercase());
        self
    }

    pub fn fail_connect(mut self, message: &str) -> Self {
        self.state.connect_error = Some(message.to_string());
        self
    }

    /// Accept cancel requests but leave the orders open.
    pub fn sticky_cancel(mut self) -> Self {
        self.state.sticky_cancel = true;
        self
    }

    /// `cancel` fails for this order id.
    pub fn cancel_error(mut self, id: i64) -> Self {
        self.state.cancel_errors.push(BrokerOrderId(id));
        self
    }

    /// Seed an order that is already open at the gateway.
    pub fn with_open_order(mut self, order: PendingOrder) -> Self {
        self.state.open.push(order);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.state.positions.push(position);
        self
    }

    pub fn with_account(mut self, account: AccountSummary) -> Self {
        self.state.account = account;
        self
    }

    pub fn with_quote(mut self, symbol: &str, bid: f64, ask: f64) -> Self {
        self.state.quotes.push(Quote {
            symbol: symbol.to_ascii_uppercase(),
            bid: Some(bid),
            ask: Some(ask),
            last: Some((bid + ask) / 2.0),
        });
        self
    }

    pub fn build(self) -> MockGateway {
        MockGateway {
            client_id: self.client_id,
            connected: false,
            state: Arc::new(Mutex::new(self.state)),
        }
    }
}

/// A scripted gateway that records placements and cancellations.
#[derive(Debug)]
pub struct MockGateway {
    client_id: i32,
    connected: bool,
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    pub fn builder() -> MockGatewayBuilder {
        MockGatewayBuilder {
            client_id: 1,
            state: MockState {
                next_order_id: 1,
                next_contract_id: 100_001,
                initial_status: "Submitted".into(),
                reject: None,
                failing_attempts: Vec::new(),
                unknown_symbols: Vec::new(),
                connect_error: None,
                sticky_cancel: false,
                cancel_errors: Vec::new(),
                open: Vec::new(),
                positions: Vec::new(),
                account: AccountSummary::default(),
                quotes: Vec::new(),
                attempts: 0,
                submitted: Vec::new(),
                cancelled: Vec::new(),
                live_sessions: Vec::new(),
                connects: 0,
                disconnects: 0,
            },
        }
    }

    /// A disconnected handle on the same simulated gateway.
    pub fn with_client_id(&self, client_id: i32) -> Self {
        Self {
            client_id,
            connected: false,
            state: Arc::clone(&self.state),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn require_connected(&self) -> Result<(), BrokerError> {
        if self.connected {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }

    /// Orders accepted so far (for assertion in tests).
    pub fn submitted(&self) -> Vec<RecordedSubmission> {
        self.state().submitted.clone()
    }

    /// Submission attempts, accepted or not.
    pub fn submit_attempts(&self) -> usize {
        self.state().attempts
    }

    pub fn cancelled(&self) -> Vec<BrokerOrderId> {
        self.state().cancelled.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.state().connects
    }

    pub fn disconnect_count(&self) -> usize {
        self.state().disconnects
    }

    /// Client ids currently holding a session.
    pub fn live_sessions(&self) -> Vec<i32> {
        self.state().live_sessions.clone()
    }

    /// Move an order to a new broker status, as a fill or expiry would.
    pub fn set_status(&self, order_id: i64, status: &str) {
        let mut state = self.state();
        if let Some(order) = state
            .open
            .iter_mut()
            .find(|o| o.order_id == BrokerOrderId(order_id))
        {
            order.status = status.to_string();
        }
    }
}

impl OrderGateway for MockGateway {
    fn connect(&mut self) -> Result<(), BrokerError> {
        let mut state = self.state();
        if let Some(message) = &state.connect_error {
            return Err(BrokerError::Connection(message.clone()));
        }
        if state.live_sessions.contains(&self.client_id) {
            return Err(BrokerError::DuplicateSession(self.client_id));
        }
        state.live_sessions.push(self.client_id);
        state.connects += 1;
        drop(state);
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        if !self.connected {
            return Ok(());
        }
        let client_id = self.client_id;
        let mut state = self.state();
        state.live_sessions.retain(|id| *id != client_id);
        state.disconnects += 1;
        drop(state);
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn client_id(&self) -> i32 {
        self.client_id
    }

    fn qualify(&self, instrument: &Instrument) -> Result<ContractRef, BrokerError> {
        self.require_connected()?;
        let mut state = self.state();
        if state
            .unknown_symbols
            .iter()
            .any(|s| s.eq_ignore_ascii_case(instrument.symbol()))
        {
            return Err(BrokerError::InstrumentNotFound(instrument.to_string()));
        }
        let contract_id = state.next_contract_id;
        state.next_contract_id += 1;
        Ok(ContractRef {
            instrument: instrument.clone(),
            contract_id,
        })
    }

    fn submit(
        &self,
        contract: &ContractRef,
        order: &OrderRequest,
    ) -> Result<SubmitAck, BrokerError> {
        self.require_connected()?;
        let mut state = self.state();
        let attempt = state.attempts;
        state.attempts += 1;

        if let Some(message) = &state.reject {
            return Err(BrokerError::Order(message.clone()));
        }
        if let Some((_, message)) = state.failing_attempts.iter().find(|(i, _)| *i == attempt) {
            return Err(BrokerError::Order(message.clone()));
        }

        let order_id = BrokerOrderId(state.next_order_id);
        state.next_order_id += 1;
        let status = state.initial_status.clone();
        debug!("mock: accepted {} {} as {order_id}", order.role, order.order_type.code());

        state.submitted.push(RecordedSubmission {
            order_id,
            contract: contract.clone(),
            request: order.clone(),
        });
        let (limit_price, stop_price) = match order.order_type {
            OrderType::Market => (None, None),
            OrderType::Limit(p) => (Some(p), None),
            OrderType::Stop(p) => (None, Some(p)),
            OrderType::StopLimit { stop, limit } => (Some(limit), Some(stop)),
        };
        state.open.push(PendingOrder {
            order_id,
            contract: ContractSummary::from(&contract.instrument),
            action: order.action,
            quantity: order.quantity,
            order_type: order.order_type.code().to_string(),
            status: status.clone(),
            filled: 0.0,
            remaining: order.quantity,
            avg_fill_price: 0.0,
            limit_price,
            stop_price,
        });

        Ok(SubmitAck { order_id, status })
    }

    fn cancel(&self, order_id: BrokerOrderId) -> Result<(), BrokerError> {
        self.require_connected()?;
        let mut state = self.state();
        if state.cancel_errors.contains(&order_id) {
            return Err(BrokerError::Order(format!("cannot cancel order {order_id}")));
        }
        state.cancelled.push(order_id);
        if !state.sticky_cancel {
            if let Some(order) = state.open.iter_mut().find(|o| o.order_id == order_id) {
                order.status = "Cancelled".into();
            }
        }
        Ok(())
    }

    fn open_orders(&self) -> Result<Vec<PendingOrder>, BrokerError> {
        self.require_connected()?;
        Ok(self.state().open.clone())
    }

    fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        self.require_connected()?;
        Ok(self.state().positions.clone())
    }

    fn account_summary(&self) -> Result<AccountSummary, BrokerError> {
        self.require_connected()?;
        Ok(self.state().account.clone())
    }

    fn quote(&self, contract: &ContractRef) -> Result<Quote, BrokerError> {
        self.require_connected()?;
        let symbol = contract.instrument.symbol();
        self.state()
            .quotes
            .iter()
            .find(|q| q.symbol == symbol)
            .cloned()
            .ok_or_else(|| BrokerError::Other(format!("no market data for {symbol}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk::Action;

    fn eurusd() -> Instrument {
        Instrument::forex("EURUSD")
    }

    #[test]
    fn not_connected_errors() {
        let gateway = MockGateway::builder().build();
        assert!(matches!(
            gateway.qualify(&eurusd()),
            Err(BrokerError::NotConnected)
        ));
        assert!(gateway.open_orders().is_err());
        assert!(gateway.account_summary().is_err());
    }

    #[test]
    fn reports_seeded_account_and_positions() {
        let mut account = AccountSummary::default();
        account.apply("NetLiquidation", 100_000.0);
        let mut gateway = MockGateway::builder()
            .with_account(account.clone())
            .with_position(Position {
                account: "DU1".into(),
                contract: ContractSummary::from(&eurusd()),
                quantity: 20_000.0,
                avg_cost: 1.08,
            })
            .build();
        gateway.connect().unwrap();

        assert_eq!(gateway.account_summary().unwrap(), account);
        let positions = gateway.positions().unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].contract.symbol, "EUR");
    }

    #[test]
    fn submit_assigns_ids_and_lists_open() {
        let mut gateway = MockGateway::builder().next_order_id(42).build();
        gateway.connect().unwrap();

        let contract = gateway.qualify(&eurusd()).unwrap();
        let ack = gateway
            .submit(
                &contract,
                &OrderRequest::single(Action::Buy, 10_000.0, OrderType::Limit(1.08)),
            )
            .unwrap();
        assert_eq!(ack.order_id, BrokerOrderId(42));
        assert_eq!(ack.status, "Submitted");

        let open = gateway.open_orders().unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].contract.symbol, "EUR");
        assert_eq!(open[0].contract.currency, "USD");
        assert_eq!(open[0].order_type, "LMT");
        assert_eq!(open[0].limit_price, Some(1.08));
    }

    #[test]
    fn scripted_failure_hits_one_attempt() {
        let mut gateway = MockGateway::builder()
            .fail_submission(1, "rejected")
            .build();
        gateway.connect().unwrap();
        let contract = gateway.qualify(&eurusd()).unwrap();
        let req = OrderRequest::single(Action::Sell, 5_000.0, OrderType::Market);

        assert!(gateway.submit(&contract, &req).is_ok());
        assert!(gateway.submit(&contract, &req).is_err());
        assert!(gateway.submit(&contract, &req).is_ok());
        assert_eq!(gateway.submit_attempts(), 3);
        assert_eq!(gateway.submitted().len(), 2);
    }

    #[test]
    fn duplicate_client_id_is_refused() {
        let mut first = MockGateway::builder().client_id(7).build();
        let mut second = first.with_client_id(7);
        let mut third = first.with_client_id(8);

        first.connect().unwrap();
        assert!(matches!(
            second.connect(),
            Err(BrokerError::DuplicateSession(7))
        ));
        third.connect().unwrap();

        first.disconnect().unwrap();
        second.connect().unwrap();
        assert_eq!(first.live_sessions(), vec![8, 7]);
    }

    #[test]
    fn cancel_marks_order_cancelled() {
        let mut gateway = MockGateway::builder().build();
        gateway.connect().unwrap();
        let contract = gateway.qualify(&eurusd()).unwrap();
        let ack = gateway
            .submit(
                &contract,
                &OrderRequest::single(Action::Buy, 1_000.0, OrderType::Stop(1.1)),
            )
            .unwrap();

        gateway.cancel(ack.order_id).unwrap();
        let open = gateway.open_orders().unwrap();
        assert_eq!(open[0].status, "Cancelled");
        assert!(!open[0].is_open());
        assert_eq!(gateway.cancelled(), vec![ack.order_id]);
    }
}
