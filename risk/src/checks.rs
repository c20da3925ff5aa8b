//! Individual validation checks.
//!
//! Every check is a pure function returning a [`Verdict`]. Symbols are trimmed
//! and upper-cased before they are examined.

use std::fmt;

use orderdesk::InstrumentType;

use crate::config::Limits;

/// Outcome of one check: pass or fail, with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub message: String,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Which price a check is looking at; only affects the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceKind {
    Limit,
    Stop,
    StopLoss,
    TakeProfit,
    Strike,
}

impl PriceKind {
    fn label(self) -> &'static str {
        match self {
            PriceKind::Limit => "Limit price",
            PriceKind::Stop => "Stop price",
            PriceKind::StopLoss => "Stop loss price",
            PriceKind::TakeProfit => "Take profit price",
            PriceKind::Strike => "Strike price",
        }
    }
}

/// Liquidity class of a forex pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairClass {
    Major,
    Cross,
    Exotic,
}

const MAJOR_PAIRS: &[&str] = &[
    "EURUSD", "USDJPY", "GBPUSD", "USDCHF", "AUDUSD", "USDCAD", "NZDUSD", "USDSGD",
];

const CROSS_PAIRS: &[&str] = &[
    "EURGBP", "EURJPY", "GBPJPY", "EURCHF", "GBPCHF", "EURAUD", "GBPAUD", "AUDCHF", "AUDJPY",
    "CHFJPY",
];

/// Format with thousands separators, e.g. `10800.5` -> `10,800.50`.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Parse prompt input as a number. Unparseable or non-finite input fails
/// with the same message as a non-numeric value would.
pub fn parse_number(raw: &str, what: &str) -> Result<f64, Verdict> {
    raw.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Verdict::fail(format!("{what} must be a number")))
}

pub fn validate_symbol(symbol: &str, instrument_type: InstrumentType) -> Verdict {
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Verdict::fail("Symbol must be a non-empty string");
    }
    let len = symbol.chars().count();

    match instrument_type {
        InstrumentType::Forex => {
            if len != 6 {
                return Verdict::fail("Forex symbols must be exactly 6 characters (e.g., EURUSD)");
            }
            if !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
                return Verdict::fail("Forex symbols must contain only letters");
            }
        }
        InstrumentType::Stock => {
            if !(1..=5).contains(&len) {
                return Verdict::fail("Stock symbols must be 1-5 characters");
            }
            if !symbol.chars().all(|c| c.is_ascii_uppercase()) {
                return Verdict::fail("Stock symbols must contain only letters A-Z");
            }
        }
        InstrumentType::Option => {
            if !(1..=5).contains(&len) {
                return Verdict::fail("Option underlying symbols must be 1-5 characters");
            }
        }
    }
    Verdict::pass("Valid symbol")
}

/// Forex quantities are bounded by the forex band; the position-size cap
/// applies to share and contract counts.
pub fn validate_quantity(qty: f64, instrument_type: InstrumentType, limits: &Limits) -> Verdict {
    if !qty.is_finite() {
        return Verdict::fail("Quantity must be a number");
    }
    if qty <= 0.0 {
        return Verdict::fail("Quantity must be positive");
    }
    match instrument_type {
        InstrumentType::Forex => {
            if qty < limits.forex_min_quantity {
                return Verdict::fail(format!(
                    "Forex minimum quantity is {}",
                    group_thousands(limits.forex_min_quantity, 0)
                ));
            }
            if qty > limits.forex_max_quantity {
                return Verdict::fail(format!(
                    "Forex maximum quantity is {}",
                    group_thousands(limits.forex_max_quantity, 0)
                ));
            }
        }
        InstrumentType::Stock | InstrumentType::Option => {
            let name = if instrument_type == InstrumentType::Stock {
                "Stock"
            } else {
                "Option"
            };
            if qty.fract() != 0.0 {
                return Verdict::fail(format!("{name} quantity must be a whole number"));
            }
            if qty < 1.0 {
                return Verdict::fail(format!("{name} minimum quantity is 1"));
            }
            if qty > limits.max_position_size {
                return Verdict::fail(format!(
                    "Quantity exceeds maximum position size of {}",
                    group_thousands(limits.max_position_size, 0)
                ));
            }
        }
    }
    Verdict::pass("Valid quantity")
}

pub fn validate_price(price: f64, kind: PriceKind, limits: &Limits) -> Verdict {
    let label = kind.label();
    if !price.is_finite() {
        return Verdict::fail(format!("{label} must be a number"));
    }
    if price <= 0.0 {
        return Verdict::fail(format!("{label} must be positive"));
    }
    if price > limits.max_price {
        return Verdict::fail(format!("{label} seems unreasonably high"));
    }
    Verdict::pass("Valid price")
}

/// Notional check. On success the message carries the computed value.
pub fn validate_order_value(qty: f64, price: f64, symbol: &str, limits: &Limits) -> Verdict {
    let total = qty * price;
    if !total.is_finite() {
        return Verdict::fail(format!("Cannot calculate order value for {symbol}"));
    }
    if total > limits.max_order_value {
        return Verdict::fail(format!(
            "Order value ${} exceeds limit of ${}",
            group_thousands(total, 2),
            group_thousands(limits.max_order_value, 2)
        ));
    }
    Verdict::pass(format!("Order value: ${}", group_thousands(total, 2)))
}

pub fn classify_forex_pair(symbol: &str) -> PairClass {
    let symbol = symbol.trim().to_ascii_uppercase();
    if MAJOR_PAIRS.contains(&symbol.as_str()) {
        PairClass::Major
    } else if CROSS_PAIRS.contains(&symbol.as_str()) {
        PairClass::Cross
    } else {
        PairClass::Exotic
    }
}

/// Symbol check plus classification. Exotic pairs pass with an advisory
/// message.
pub fn validate_forex_pair(symbol: &str) -> Verdict {
    let verdict = validate_symbol(symbol, InstrumentType::Forex);
    if !verdict.valid {
        return verdict;
    }
    let symbol = symbol.trim().to_ascii_uppercase();
    match classify_forex_pair(&symbol) {
        PairClass::Major => Verdict::pass(format!("Major currency pair: {symbol}")),
        PairClass::Cross => Verdict::pass(format!("Cross currency pair: {symbol}")),
        PairClass::Exotic => Verdict::pass(format!(
            "Exotic/custom currency pair: {symbol} (verify availability)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(10_800.0, 2), "10,800.00");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1_000_000.0, 0), "1,000,000");
        assert_eq!(group_thousands(-1234.5, 1), "-1,234.5");
    }

    #[test]
    fn parse_number_rejects_garbage() {
        assert_eq!(parse_number(" 10,000 ", "Quantity").unwrap(), 10_000.0);
        let err = parse_number("abc", "Quantity").unwrap_err();
        assert!(!err.valid);
        assert_eq!(err.message, "Quantity must be a number");
        assert!(parse_number("NaN", "Quantity").is_err());
    }

    #[test]
    fn symbol_is_normalized() {
        assert!(validate_symbol(" eurusd ", InstrumentType::Forex).valid);
        assert!(validate_symbol("aapl", InstrumentType::Stock).valid);
        assert!(!validate_symbol("EURUS", InstrumentType::Forex).valid);
        assert!(!validate_symbol("EUR1SD", InstrumentType::Forex).valid);
        assert!(!validate_symbol("BRK.B", InstrumentType::Stock).valid);
        assert!(!validate_symbol("", InstrumentType::Option).valid);
    }

    #[test]
    fn pair_classes() {
        assert_eq!(classify_forex_pair("eurusd"), PairClass::Major);
        assert_eq!(classify_forex_pair("GBPJPY"), PairClass::Cross);
        assert_eq!(classify_forex_pair("USDTRY"), PairClass::Exotic);
        assert!(validate_forex_pair("USDTRY").message.contains("verify availability"));
        assert!(!validate_forex_pair("USD").valid);
    }

    #[test]
    fn position_cap_binds_shares_and_contracts_not_forex() {
        let limits = Limits::default();
        assert!(validate_quantity(5_000_000.0, InstrumentType::Forex, &limits).valid);
        assert!(!validate_quantity(20_000_000.0, InstrumentType::Forex, &limits).valid);

        let over = validate_quantity(100_001.0, InstrumentType::Stock, &limits);
        assert!(!over.valid);
        assert!(over.message.contains("100,000"));
        assert!(!validate_quantity(100_001.0, InstrumentType::Option, &limits).valid);
    }

    #[test]
    fn price_ceiling() {
        let limits = Limits::default();
        assert!(validate_price(1.08, PriceKind::Limit, &limits).valid);
        assert_eq!(
            validate_price(0.0, PriceKind::Stop, &limits).message,
            "Stop price must be positive"
        );
        assert!(!validate_price(2_000_000.0, PriceKind::Limit, &limits).valid);
        assert!(!validate_price(f64::NAN, PriceKind::Limit, &limits).valid);
    }

    #[test]
    fn order_value_message_carries_value() {
        let limits = Limits::default();
        let ok = validate_order_value(10_000.0, 1.08, "EURUSD", &limits);
        assert!(ok.valid);
        assert_eq!(ok.message, "Order value: $10,800.00");

        let too_big = validate_order_value(1_000.0, 60.0, "AAPL", &limits);
        assert!(!too_big.valid);
        assert!(too_big.message.contains("exceeds limit of $50,000.00"));
    }
}
