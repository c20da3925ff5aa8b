//! Core types: Action, Instrument, OrderKind, OrderDraft, BrokerOrderId

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Buy or sell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// The side that closes a position opened with `self`.
    pub fn opposite(self) -> Action {
        match self {
            Action::Buy => Action::Sell,
            Action::Sell => Action::Buy,
        }
    }

    /// Parse `BUY`/`SELL` (case-insensitive).
    pub fn parse(s: &str) -> Option<Action> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Some(Action::Buy),
            "SELL" => Some(Action::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

/// Instrument taxonomy without the per-type fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    Forex,
    Stock,
    Option,
}

impl InstrumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            InstrumentType::Forex => "forex",
            InstrumentType::Stock => "stock",
            InstrumentType::Option => "option",
        }
    }

    pub fn parse(s: &str) -> Option<InstrumentType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forex" | "fx" => Some(InstrumentType::Forex),
            "stock" | "stk" => Some(InstrumentType::Stock),
            "option" | "opt" => Some(InstrumentType::Option),
            _ => None,
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Option right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionRight {
    Call,
    Put,
}

impl OptionRight {
    /// Single-letter code used by the gateway (`C` / `P`).
    pub fn code(self) -> &'static str {
        match self {
            OptionRight::Call => "C",
            OptionRight::Put => "P",
        }
    }

    pub fn parse(s: &str) -> Option<OptionRight> {
        match s.trim().to_ascii_uppercase().as_str() {
            "C" | "CALL" => Some(OptionRight::Call),
            "P" | "PUT" => Some(OptionRight::Put),
            _ => None,
        }
    }
}

/// A tradable instrument descriptor.
///
/// Each variant carries exactly the fields its instrument type requires, so a
/// stock without an exchange or an option without a strike cannot be built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Instrument {
    /// Currency pair such as `EURUSD`, traded on IDEALPRO.
    Forex { symbol: String },
    Stock {
        symbol: String,
        exchange: String,
        currency: String,
    },
    Option {
        /// Underlying symbol.
        symbol: String,
        expiry: NaiveDate,
        strike: f64,
        right: OptionRight,
        #[serde(default = "default_exchange")]
        exchange: String,
    },
}

fn default_exchange() -> String {
    "SMART".into()
}

impl Instrument {
    pub fn forex(pair: &str) -> Self {
        Instrument::Forex {
            symbol: pair.trim().to_ascii_uppercase(),
        }
    }

    pub fn stock(symbol: &str, exchange: &str, currency: &str) -> Self {
        Instrument::Stock {
            symbol: symbol.trim().to_ascii_uppercase(),
            exchange: exchange.trim().to_ascii_uppercase(),
            currency: currency.trim().to_ascii_uppercase(),
        }
    }

    pub fn option(symbol: &str, expiry: NaiveDate, strike: f64, right: OptionRight) -> Self {
        Instrument::Option {
            symbol: symbol.trim().to_ascii_uppercase(),
            expiry,
            strike,
            right,
            exchange: default_exchange(),
        }
    }

    pub fn instrument_type(&self) -> InstrumentType {
        match self {
            Instrument::Forex { .. } => InstrumentType::Forex,
            Instrument::Stock { .. } => InstrumentType::Stock,
            Instrument::Option { .. } => InstrumentType::Option,
        }
    }

    /// Pair, ticker or underlying, depending on the variant.
    pub fn symbol(&self) -> &str {
        match self {
            Instrument::Forex { symbol }
            | Instrument::Stock { symbol, .. }
            | Instrument::Option { symbol, .. } => symbol,
        }
    }

    /// Replace the symbol, keeping every type-specific field.
    pub fn with_symbol(&self, symbol: &str) -> Self {
        let mut next = self.clone();
        let upper = symbol.trim().to_ascii_uppercase();
        match &mut next {
            Instrument::Forex { symbol }
            | Instrument::Stock { symbol, .. }
            | Instrument::Option { symbol, .. } => *symbol = upper,
        }
        next
    }

    /// Base and quote currency of a forex pair (`EURUSD` -> `EUR`, `USD`).
    pub fn forex_legs(&self) -> Option<(&str, &str)> {
        match self {
            Instrument::Forex { symbol } if symbol.len() == 6 && symbol.is_ascii() => {
                Some((&symbol[..3], &symbol[3..]))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Forex { symbol } => write!(f, "{symbol} (forex)"),
            Instrument::Stock {
                symbol,
                exchange,
                currency,
            } => write!(f, "{symbol} ({exchange}/{currency})"),
            Instrument::Option {
                symbol,
                expiry,
                strike,
                right,
                ..
            } => write!(
                f,
                "{symbol} {} {strike} {}",
                expiry.format("%Y%m%d"),
                right.code()
            ),
        }
    }
}

/// Order kind with exactly the prices it requires.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrderKind {
    Market,
    Limit {
        limit_price: f64,
    },
    Stop {
        stop_price: f64,
    },
    StopLimit {
        stop_price: f64,
        limit_price: f64,
    },
    /// Entry order plus protective stop-loss and take-profit legs.
    /// A missing `limit_price` means a market entry.
    Bracket {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit_price: Option<f64>,
        stop_loss_price: f64,
        take_profit_price: f64,
    },
}

impl OrderKind {
    pub fn name(&self) -> &'static str {
        match self {
            OrderKind::Market => "Market",
            OrderKind::Limit { .. } => "Limit",
            OrderKind::Stop { .. } => "Stop",
            OrderKind::StopLimit { .. } => "StopLimit",
            OrderKind::Bracket { .. } => "Bracket",
        }
    }

    pub fn limit_price(&self) -> Option<f64> {
        match self {
            OrderKind::Limit { limit_price } | OrderKind::StopLimit { limit_price, .. } => {
                Some(*limit_price)
            }
            OrderKind::Bracket { limit_price, .. } => *limit_price,
            _ => None,
        }
    }

    pub fn stop_price(&self) -> Option<f64> {
        match self {
            OrderKind::Stop { stop_price } | OrderKind::StopLimit { stop_price, .. } => {
                Some(*stop_price)
            }
            _ => None,
        }
    }

    /// Price used to estimate the notional value of the order, if any.
    pub fn reference_price(&self) -> Option<f64> {
        self.limit_price().or_else(|| self.stop_price())
    }

    pub fn is_bracket(&self) -> bool {
        matches!(self, OrderKind::Bracket { .. })
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Market => write!(f, "MKT"),
            OrderKind::Limit { limit_price } => write!(f, "LMT @ {limit_price}"),
            OrderKind::Stop { stop_price } => write!(f, "STP @ {stop_price}"),
            OrderKind::StopLimit {
                stop_price,
                limit_price,
            } => write!(f, "STP LMT {stop_price} / {limit_price}"),
            OrderKind::Bracket {
                limit_price,
                stop_loss_price,
                take_profit_price,
            } => match limit_price {
                Some(p) => write!(
                    f,
                    "BRACKET LMT {p} SL {stop_loss_price} TP {take_profit_price}"
                ),
                None => write!(f, "BRACKET MKT SL {stop_loss_price} TP {take_profit_price}"),
            },
        }
    }
}

/// Everything needed to submit an order, before any gateway interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub instrument: Instrument,
    pub action: Action,
    pub quantity: f64,
    pub kind: OrderKind,
}

impl OrderDraft {
    pub fn new(instrument: Instrument, action: Action, quantity: f64, kind: OrderKind) -> Self {
        Self {
            instrument,
            action,
            quantity,
            kind,
        }
    }

    pub fn symbol(&self) -> &str {
        self.instrument.symbol()
    }
}

impl fmt::Display for OrderDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.action, self.quantity, self.instrument, self.kind
        )
    }
}

/// Order identifier assigned by the broker gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrokerOrderId(pub i64);

impl fmt::Display for BrokerOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
