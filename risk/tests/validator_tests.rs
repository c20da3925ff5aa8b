//! Tests for Validator::validate_order and the individual checks.

use chrono::NaiveDate;
use orderdesk::{Action, Instrument, InstrumentType, OptionRight, OrderDraft, OrderKind};
use orderdesk_risk::{Limits, Validator, validate_symbol};
use proptest::prelude::*;

fn validator() -> Validator {
    Validator::new(Limits::default())
}

fn forex(symbol: &str, action: Action, qty: f64, kind: OrderKind) -> OrderDraft {
    OrderDraft::new(Instrument::forex(symbol), action, qty, kind)
}

fn stock(symbol: &str, action: Action, qty: f64, kind: OrderKind) -> OrderDraft {
    OrderDraft::new(Instrument::stock(symbol, "SMART", "USD"), action, qty, kind)
}

// ============================================================================
// Aggregate validation
// ============================================================================

#[test]
fn eurusd_limit_passes_with_value_info() {
    let report = validator().validate_order(&forex(
        "EURUSD",
        Action::Buy,
        10_000.0,
        OrderKind::Limit { limit_price: 1.08 },
    ));
    assert!(report.is_ok(), "{report}");
    assert_eq!(report.warnings, vec!["Order value: $10,800.00".to_string()]);
}

#[test]
fn market_order_skips_value_check() {
    let report = validator().validate_order(&stock("AAPL", Action::Buy, 10.0, OrderKind::Market));
    assert!(report.is_ok());
    assert!(report.warnings.is_empty());
}

#[test]
fn stop_price_is_used_for_value_when_no_limit() {
    let report = validator().validate_order(&stock(
        "AAPL",
        Action::Sell,
        1_000.0,
        OrderKind::Stop { stop_price: 180.0 },
    ));
    assert!(!report.is_ok());
    assert!(report.errors[0].starts_with("Order value $180,000.00 exceeds"));
}

#[test]
fn errors_are_collected_not_short_circuited() {
    let report = validator().validate_order(&forex(
        "EUR",
        Action::Buy,
        500.0,
        OrderKind::Limit { limit_price: -1.0 },
    ));
    assert_eq!(report.errors.len(), 3, "{report}");
    assert!(report.errors[0].starts_with("Symbol:"));
    assert!(report.errors[1].starts_with("Quantity:"));
    assert_eq!(report.errors[2], "Limit price must be positive");
}

#[test]
fn stop_limit_cross_checks() {
    let buy = validator().validate_order(&stock(
        "MSFT",
        Action::Buy,
        10.0,
        OrderKind::StopLimit {
            stop_price: 400.0,
            limit_price: 399.0,
        },
    ));
    assert!(buy.errors.iter().any(|e| e.contains("limit price must be higher")));

    let sell = validator().validate_order(&stock(
        "MSFT",
        Action::Sell,
        10.0,
        OrderKind::StopLimit {
            stop_price: 400.0,
            limit_price: 401.0,
        },
    ));
    assert!(sell.errors.iter().any(|e| e.contains("limit price must be lower")));

    let fine = validator().validate_order(&stock(
        "MSFT",
        Action::Sell,
        10.0,
        OrderKind::StopLimit {
            stop_price: 400.0,
            limit_price: 399.0,
        },
    ));
    assert!(fine.is_ok(), "{fine}");
}

#[test]
fn exotic_pair_warns() {
    let report = validator().validate_order(&forex(
        "USDTRY",
        Action::Buy,
        1_000.0,
        OrderKind::Market,
    ));
    assert!(report.is_ok());
    assert!(report.warnings[0].contains("verify availability"));
}

#[test]
fn option_strike_must_be_positive() {
    let draft = OrderDraft::new(
        Instrument::option(
            "AAPL",
            NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
            0.0,
            OptionRight::Put,
        ),
        Action::Buy,
        1.0,
        OrderKind::Limit { limit_price: 2.5 },
    );
    let report = validator().validate_order(&draft);
    assert_eq!(report.errors, vec!["Strike price must be positive".to_string()]);
}

#[test]
fn fractional_stock_quantity_fails() {
    let report = validator().validate_order(&stock("AAPL", Action::Buy, 1.5, OrderKind::Market));
    assert_eq!(
        report.errors,
        vec!["Quantity: Stock quantity must be a whole number".to_string()]
    );
}

#[test]
fn bracket_errors_and_risk_reward_warning() {
    let bad = validator().validate_order(&stock(
        "AAPL",
        Action::Buy,
        10.0,
        OrderKind::Bracket {
            limit_price: Some(100.0),
            stop_loss_price: 101.0,
            take_profit_price: 110.0,
        },
    ));
    assert!(
        bad.errors
            .iter()
            .any(|e| e.contains("stop loss must be below entry price"))
    );

    let poor = validator().validate_order(&stock(
        "AAPL",
        Action::Buy,
        10.0,
        OrderKind::Bracket {
            limit_price: Some(100.0),
            stop_loss_price: 90.0,
            take_profit_price: 105.0,
        },
    ));
    assert!(poor.is_ok(), "{poor}");
    assert!(poor.warnings.iter().any(|w| w.contains("below 1:1")));
}

#[test]
fn market_entry_bracket_has_no_value_check() {
    let report = validator().validate_order(&forex(
        "GBPUSD",
        Action::Sell,
        20_000.0,
        OrderKind::Bracket {
            limit_price: None,
            stop_loss_price: 1.30,
            take_profit_price: 1.20,
        },
    ));
    assert!(report.is_ok(), "{report}");
    assert!(report.warnings.is_empty());
}

#[test]
fn limits_deserialize_with_defaults() {
    let limits: Limits = toml::from_str("max_order_value = 250000.0").unwrap();
    assert_eq!(limits.max_order_value, 250_000.0);
    assert_eq!(limits.forex_min_quantity, 1_000.0);
    assert!(limits.validate().is_ok());

    let bad = Limits {
        forex_min_quantity: 5_000.0,
        forex_max_quantity: 1_000.0,
        ..Limits::default()
    };
    assert!(bad.validate().is_err());
}

#[test]
#[should_panic(expected = "invalid Limits")]
fn validator_rejects_nan_limits() {
    Validator::new(Limits {
        max_price: f64::NAN,
        ..Limits::default()
    });
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn six_letter_forex_symbols_are_valid(symbol in "[A-Za-z]{6}") {
        prop_assert!(validate_symbol(&symbol, InstrumentType::Forex).valid);
    }

    #[test]
    fn other_lengths_are_invalid(symbol in "[A-Z]{0,5}|[A-Z]{7,12}") {
        prop_assert!(!validate_symbol(&symbol, InstrumentType::Forex).valid);
    }

    #[test]
    fn non_letters_are_invalid(prefix in "[A-Z]{0,5}", bad in "[0-9_./-]") {
        let mut symbol = prefix.clone();
        symbol.push_str(&bad);
        while symbol.len() < 6 {
            symbol.push('X');
        }
        prop_assert!(!validate_symbol(&symbol, InstrumentType::Forex).valid);
    }

    #[test]
    fn non_positive_quantities_are_invalid(qty in -1e9f64..=0.0) {
        let v = validator();
        for t in [InstrumentType::Forex, InstrumentType::Stock, InstrumentType::Option] {
            prop_assert!(!v.validate_quantity(qty, t).valid);
        }
    }

    #[test]
    fn forex_band_is_valid(qty in 1_000f64..=10_000_000.0) {
        prop_assert!(validator().validate_quantity(qty, InstrumentType::Forex).valid);
    }

    #[test]
    fn outside_forex_band_is_invalid(
        qty in prop_oneof![0.01f64..999.99, 10_000_000.01f64..1e12]
    ) {
        prop_assert!(!validator().validate_quantity(qty, InstrumentType::Forex).valid);
    }
}
