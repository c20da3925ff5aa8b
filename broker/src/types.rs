//! Shared gateway types: contracts, order requests, acknowledgements,
//! open orders, positions, account values, quotes.

use std::fmt;

use orderdesk::{Action, BrokerOrderId, Instrument};

/// An instrument the gateway has resolved to a tradable contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractRef {
    pub instrument: Instrument,
    /// Broker contract id, 0 when the gateway does not expose one.
    pub contract_id: i64,
}

/// Role of an order within a bracket, or `Single` for standalone orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegRole {
    Single,
    Parent,
    StopLoss,
    TakeProfit,
}

impl fmt::Display for LegRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegRole::Single => write!(f, "order"),
            LegRole::Parent => write!(f, "parent"),
            LegRole::StopLoss => write!(f, "stop-loss"),
            LegRole::TakeProfit => write!(f, "take-profit"),
        }
    }
}

/// A simple (non-composite) order type the gateway can place directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderType {
    Market,
    Limit(f64),
    Stop(f64),
    StopLimit { stop: f64, limit: f64 },
}

impl OrderType {
    /// Broker order-type code (`MKT`, `LMT`, `STP`, `STP LMT`).
    pub fn code(&self) -> &'static str {
        match self {
            OrderType::Market => "MKT",
            OrderType::Limit(_) => "LMT",
            OrderType::Stop(_) => "STP",
            OrderType::StopLimit { .. } => "STP LMT",
        }
    }
}

/// One order to place at the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub action: Action,
    pub quantity: f64,
    pub order_type: OrderType,
    pub role: LegRole,
    /// Parent order for bracket children.
    pub parent_id: Option<BrokerOrderId>,
}

impl OrderRequest {
    pub fn single(action: Action, quantity: f64, order_type: OrderType) -> Self {
        Self {
            action,
            quantity,
            order_type,
            role: LegRole::Single,
            parent_id: None,
        }
    }

    /// One leg of a bracket. Every leg is transmitted as soon as it is placed,
    /// so an acknowledged parent is live even if a protective leg later fails.
    pub fn leg(
        role: LegRole,
        action: Action,
        quantity: f64,
        order_type: OrderType,
        parent_id: Option<BrokerOrderId>,
    ) -> Self {
        Self {
            action,
            quantity,
            order_type,
            role,
            parent_id,
        }
    }
}

/// Gateway acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitAck {
    pub order_id: BrokerOrderId,
    /// First status reported by the gateway, verbatim.
    pub status: String,
}

/// The contract fields reported alongside an open order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractSummary {
    pub symbol: String,
    pub security_type: String,
    pub exchange: String,
    pub currency: String,
}

impl From<&Instrument> for ContractSummary {
    /// Forex pairs are reported the way the gateway lists them: base currency
    /// as symbol, quote currency as currency.
    fn from(instrument: &Instrument) -> Self {
        match instrument {
            Instrument::Forex { symbol } => {
                let (base, quote) = instrument.forex_legs().unwrap_or((symbol, "USD"));
                ContractSummary {
                    symbol: base.to_string(),
                    security_type: "CASH".into(),
                    exchange: "IDEALPRO".into(),
                    currency: quote.to_string(),
                }
            }
            Instrument::Stock {
                symbol,
                exchange,
                currency,
            } => ContractSummary {
                symbol: symbol.clone(),
                security_type: "STK".into(),
                exchange: exchange.clone(),
                currency: currency.clone(),
            },
            Instrument::Option {
                symbol, exchange, ..
            } => ContractSummary {
                symbol: symbol.clone(),
                security_type: "OPT".into(),
                exchange: exchange.clone(),
                currency: "USD".into(),
            },
        }
    }
}

/// The gateway's current report of one open order. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrder {
    pub order_id: BrokerOrderId,
    pub contract: ContractSummary,
    pub action: Action,
    pub quantity: f64,
    /// Broker order-type code, e.g. `LMT`.
    pub order_type: String,
    pub status: String,
    pub filled: f64,
    pub remaining: f64,
    pub avg_fill_price: f64,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
}

impl PendingOrder {
    pub fn is_open(&self) -> bool {
        orderdesk::status::is_open_broker_state(&self.status)
    }
}

/// Snapshot quote. Missing sides are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
}

impl Quote {
    /// Bid/ask midpoint, falling back to the last trade.
    pub fn mid(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) if b > 0.0 && a > 0.0 => Some((b + a) / 2.0),
            _ => self.last.filter(|l| *l > 0.0),
        }
    }

    pub fn spread(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) if b > 0.0 && a > 0.0 => Some(a - b),
            _ => None,
        }
    }
}

/// A position held at the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub account: String,
    pub contract: ContractSummary,
    /// Positive = long, negative = short.
    pub quantity: f64,
    pub avg_cost: f64,
}

impl Position {
    /// Quantity times average cost. Approximates market value without a quote.
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.avg_cost
    }
}

/// Account summary values, in the account's base currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountSummary {
    pub net_liquidation: f64,
    pub total_cash: f64,
    pub buying_power: f64,
    pub available_funds: f64,
    pub gross_position_value: f64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
}

impl AccountSummary {
    /// Summary tags requested from the gateway.
    pub const TAGS: [&'static str; 7] = [
        "NetLiquidation",
        "TotalCashValue",
        "BuyingPower",
        "AvailableFunds",
        "GrossPositionValue",
        "UnrealizedPnL",
        "RealizedPnL",
    ];

    /// Store one reported tag. Returns false for tags this summary ignores.
    pub fn apply(&mut self, tag: &str, value: f64) -> bool {
        let slot = match tag {
            "NetLiquidation" => &mut self.net_liquidation,
            "TotalCashValue" => &mut self.total_cash,
            "BuyingPower" => &mut self.buying_power,
            "AvailableFunds" => &mut self.available_funds,
            "GrossPositionValue" => &mut self.gross_position_value,
            "UnrealizedPnL" => &mut self.unrealized_pnl,
            "RealizedPnL" => &mut self.realized_pnl,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// `(tag, value)` pairs in display order.
    pub fn rows(&self) -> [(&'static str, f64); 7] {
        [
            ("NetLiquidation", self.net_liquidation),
            ("TotalCashValue", self.total_cash),
            ("BuyingPower", self.buying_power),
            ("AvailableFunds", self.available_funds),
            ("GrossPositionValue", self.gross_position_value),
            ("UnrealizedPnL", self.unrealized_pnl),
            ("RealizedPnL", self.realized_pnl),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_summary_applies_known_tags() {
        let mut summary = AccountSummary::default();
        assert!(summary.apply("NetLiquidation", 125_000.0));
        assert!(summary.apply("BuyingPower", 500_000.0));
        assert!(!summary.apply("Leverage-S", 1.5));
        assert_eq!(summary.net_liquidation, 125_000.0);
        assert_eq!(summary.rows()[2], ("BuyingPower", 500_000.0));
        assert_eq!(summary.total_cash, 0.0);
    }

    #[test]
    fn short_position_has_negative_cost_basis() {
        let position = Position {
            account: "DU123456".into(),
            contract: ContractSummary::from(&Instrument::stock("AAPL", "SMART", "USD")),
            quantity: -10.0,
            avg_cost: 150.0,
        };
        assert_eq!(position.cost_basis(), -1_500.0);
    }
}
