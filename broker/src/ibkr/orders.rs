//! Order placement with a settle wait, cancellation, and open-order listing.

use std::time::{Duration, Instant};

use ibapi::client::blocking::Client;
use ibapi::orders::order_builder::{limit_order, market_order, stop, stop_limit};
use ibapi::orders::{Action as IbAction, CancelOrder, Order, Orders, PlaceOrder};
use log::{debug, info, warn};
use orderdesk::{Action, BrokerOrderId};

use super::client::to_ib_contract;
use crate::error::BrokerError;
use crate::types::*;

/// Status recorded when no report arrives within the settle interval.
const UNREPORTED_STATUS: &str = "PendingSubmit";

/// Notice codes at or above this are informational, below it are errors.
const WARNING_CODE_FLOOR: i32 = 2000;

fn ib_action(action: Action) -> IbAction {
    match action {
        Action::Buy => IbAction::Buy,
        Action::Sell => IbAction::Sell,
    }
}

fn ib_order_id(order_id: BrokerOrderId) -> Result<i32, BrokerError> {
    i32::try_from(order_id.0)
        .map_err(|_| BrokerError::Order(format!("order id {order_id} out of range")))
}

/// Translate a request into an ibapi order.
pub fn build_order(request: &OrderRequest) -> Result<Order, BrokerError> {
    let action = ib_action(request.action);
    let qty = request.quantity;
    let mut order = match request.order_type {
        OrderType::Market => market_order(action, qty),
        OrderType::Limit(price) => limit_order(action, qty, price),
        OrderType::Stop(price) => stop(action, qty, price),
        OrderType::StopLimit { stop: s, limit } => stop_limit(action, qty, limit, s),
    };
    if let Some(parent) = request.parent_id {
        order.parent_id = ib_order_id(parent)?;
    }
    order.transmit = true;
    Ok(order)
}

/// Place an order and wait up to `settle` for its first status report.
pub fn submit_order(
    client: &Client,
    contract: &ContractRef,
    request: &OrderRequest,
    settle: Duration,
) -> Result<SubmitAck, BrokerError> {
    let ib_contract = to_ib_contract(contract);
    let ib_order = build_order(request)?;

    let order_id = client
        .next_valid_order_id()
        .map_err(|e| BrokerError::Order(format!("failed to get order id: {e}")))?;

    info!(
        "Submitting {}: {} {} {} {} (id={order_id})",
        request.role,
        request.action,
        request.quantity,
        contract.instrument.symbol(),
        request.order_type.code(),
    );

    let subscription = client
        .place_order(order_id, &ib_contract, &ib_order)
        .map_err(|e| BrokerError::Order(format!("failed to place order {order_id}: {e}")))?;

    let start = Instant::now();
    let mut status = None;
    while status.is_none() {
        let Some(remaining) = settle.checked_sub(start.elapsed()) else {
            break;
        };
        let Some(response) = subscription.next_timeout(remaining) else {
            break;
        };
        match response {
            PlaceOrder::OrderStatus(s) => {
                debug!("Order {order_id} status: {}", s.status);
                status = Some(s.status);
            }
            PlaceOrder::OpenOrder(data) => {
                debug!("Order {order_id} open: {}", data.order_state.status);
                status = Some(data.order_state.status);
            }
            PlaceOrder::Message(notice) => {
                if (0..WARNING_CODE_FLOOR).contains(&notice.code) {
                    return Err(BrokerError::Order(format!(
                        "order {order_id} rejected ({}): {}",
                        notice.code, notice.message
                    )));
                }
                debug!("Order {order_id} notice {}: {}", notice.code, notice.message);
            }
            _ => {}
        }
    }

    let status = status.unwrap_or_else(|| {
        warn!(
            "Order {order_id}: no status within {}ms, recording {UNREPORTED_STATUS}",
            settle.as_millis()
        );
        UNREPORTED_STATUS.to_string()
    });

    Ok(SubmitAck {
        order_id: BrokerOrderId(i64::from(order_id)),
        status,
    })
}

/// Send a cancel request. Only the request itself is checked.
pub fn cancel_order(client: &Client, order_id: BrokerOrderId) -> Result<(), BrokerError> {
    info!("Cancelling order {order_id}");
    let id = ib_order_id(order_id)?;

    let subscription = client
        .cancel_order(id, "")
        .map_err(|e| BrokerError::Order(format!("failed to cancel order {order_id}: {e}")))?;

    if let Some(response) = subscription.next_timeout(Duration::from_millis(500)) {
        match response {
            CancelOrder::OrderStatus(s) => debug!("Cancel status for {order_id}: {}", s.status),
            CancelOrder::Notice(notice) => {
                if (0..WARNING_CODE_FLOOR).contains(&notice.code) {
                    return Err(BrokerError::Order(format!(
                        "cancel of {order_id} refused ({}): {}",
                        notice.code, notice.message
                    )));
                }
                debug!("Cancel notice for {order_id}: {}", notice.message);
            }
        }
    }
    Ok(())
}

/// Every open order for the account, across client ids.
pub fn open_orders(client: &Client) -> Result<Vec<PendingOrder>, BrokerError> {
    let subscription = client
        .all_open_orders()
        .map_err(|e| BrokerError::Other(format!("failed to request open orders: {e}")))?;

    let mut orders: Vec<PendingOrder> = Vec::new();
    for response in subscription {
        match response {
            Orders::OrderData(data) => {
                let order = &data.order;
                let action = match order.action {
                    IbAction::Buy => Action::Buy,
                    _ => Action::Sell,
                };
                let c = &data.contract;
                orders.push(PendingOrder {
                    order_id: BrokerOrderId(i64::from(data.order_id)),
                    contract: ContractSummary {
                        symbol: c.symbol.to_string(),
                        security_type: c.security_type.to_string(),
                        exchange: c.exchange.to_string(),
                        currency: c.currency.to_string(),
                    },
                    action,
                    quantity: order.total_quantity,
                    order_type: order.order_type.clone(),
                    status: data.order_state.status.clone(),
                    filled: order.filled_quantity,
                    remaining: order.total_quantity - order.filled_quantity,
                    avg_fill_price: 0.0,
                    limit_price: order.limit_price,
                    stop_price: order.aux_price,
                });
            }
            Orders::OrderStatus(s) => {
                let id = BrokerOrderId(i64::from(s.order_id));
                if let Some(p) = orders.iter_mut().find(|p| p.order_id == id) {
                    p.status = s.status;
                    p.filled = s.filled;
                    p.remaining = s.remaining;
                    p.avg_fill_price = s.average_fill_price;
                }
            }
            Orders::Notice(notice) => {
                debug!("Open orders notice {}: {}", notice.code, notice.message);
            }
        }
    }

    info!("Fetched {} open orders", orders.len());
    Ok(orders)
}
