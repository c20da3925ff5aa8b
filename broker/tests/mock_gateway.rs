//! Session scoping and mock gateway behavior seen through the trait.

use orderdesk::{Action, BrokerOrderId, Instrument};
use orderdesk_broker::mock::MockGateway;
use orderdesk_broker::{
    BrokerError, LegRole, OrderGateway, OrderRequest, OrderType, PendingOrder, Quote, Session,
};

fn place_limit<G: OrderGateway>(gateway: &mut G) -> Result<BrokerOrderId, BrokerError> {
    let session = Session::open(gateway)?;
    let contract = session.qualify(&Instrument::forex("EURUSD"))?;
    let ack = session.submit(
        &contract,
        &OrderRequest::single(Action::Buy, 10_000.0, OrderType::Limit(1.08)),
    )?;
    Ok(ack.order_id)
}

#[test]
fn session_disconnects_on_success() {
    let mut gateway = MockGateway::builder().next_order_id(42).build();
    let observer = gateway.with_client_id(99);

    assert_eq!(place_limit(&mut gateway).unwrap(), BrokerOrderId(42));
    assert!(!gateway.is_connected());
    assert_eq!(observer.connect_count(), 1);
    assert_eq!(observer.disconnect_count(), 1);
    assert!(observer.live_sessions().is_empty());
}

#[test]
fn session_disconnects_on_error_paths() {
    let mut gateway = MockGateway::builder().unknown_symbol("EURUSD").build();
    let observer = gateway.with_client_id(99);
    assert!(matches!(
        place_limit(&mut gateway),
        Err(BrokerError::InstrumentNotFound(_))
    ));
    assert!(observer.live_sessions().is_empty());

    let mut rejecting = MockGateway::builder().reject_all("no permissions").build();
    let observer = rejecting.with_client_id(99);
    assert!(matches!(
        place_limit(&mut rejecting),
        Err(BrokerError::Order(_))
    ));
    assert_eq!(observer.disconnect_count(), 1);
}

#[test]
fn failed_connect_leaves_nothing_open() {
    let mut gateway = MockGateway::builder().fail_connect("refused").build();
    let err = place_limit(&mut gateway).unwrap_err();
    assert!(err.is_connection());
    assert_eq!(gateway.connect_count(), 0);
    assert_eq!(gateway.disconnect_count(), 0);
}

#[test]
fn sticky_cancel_keeps_order_open() {
    let seeded = PendingOrder {
        order_id: BrokerOrderId(7),
        contract: Default::default(),
        action: Action::Sell,
        quantity: 100.0,
        order_type: "LMT".into(),
        status: "Submitted".into(),
        filled: 0.0,
        remaining: 100.0,
        avg_fill_price: 0.0,
        limit_price: Some(190.0),
        stop_price: None,
    };
    let mut gateway = MockGateway::builder()
        .sticky_cancel()
        .with_open_order(seeded)
        .build();

    let session = Session::open(&mut gateway).unwrap();
    session.cancel(BrokerOrderId(7)).unwrap();
    let open = session.open_orders().unwrap();
    assert!(open[0].is_open());
    assert_eq!(session.cancelled(), vec![BrokerOrderId(7)]);
}

#[test]
fn bracket_children_carry_parent() {
    let mut gateway = MockGateway::builder().next_order_id(10).build();
    let session = Session::open(&mut gateway).unwrap();
    let contract = session.qualify(&Instrument::forex("GBPUSD")).unwrap();

    let parent = session
        .submit(
            &contract,
            &OrderRequest::leg(LegRole::Parent, Action::Buy, 20_000.0, OrderType::Limit(1.25), None),
        )
        .unwrap();
    session
        .submit(
            &contract,
            &OrderRequest::leg(
                LegRole::StopLoss,
                Action::Sell,
                20_000.0,
                OrderType::Stop(1.24),
                Some(parent.order_id),
            ),
        )
        .unwrap();

    let placed = session.submitted();
    assert_eq!(placed.len(), 2);
    assert_eq!(placed[1].request.parent_id, Some(BrokerOrderId(10)));
    assert_eq!(placed[1].request.role, LegRole::StopLoss);
    assert_eq!(placed[1].order_id, BrokerOrderId(11));
}

#[test]
fn quote_mid_and_spread() {
    let mut gateway = MockGateway::builder()
        .with_quote("EURUSD", 1.0850, 1.0852)
        .build();
    let session = Session::open(&mut gateway).unwrap();
    let contract = session.qualify(&Instrument::forex("eurusd")).unwrap();
    let quote = session.quote(&contract).unwrap();
    assert!((quote.mid().unwrap() - 1.0851).abs() < 1e-9);
    assert!((quote.spread().unwrap() - 0.0002).abs() < 1e-9);

    let one_sided = Quote {
        symbol: "X".into(),
        bid: None,
        ask: Some(2.0),
        last: Some(1.5),
    };
    assert_eq!(one_sided.mid(), Some(1.5));
    assert_eq!(one_sided.spread(), None);
}
