//! Validation limits.

use serde::{Deserialize, Serialize};

/// Numeric thresholds applied before an order reaches the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Max notional (quantity x reference price) of a single order.
    pub max_order_value: f64,
    /// Max shares or contracts in a single stock or option order.
    pub max_position_size: f64,
    /// Sanity ceiling for any per-unit price.
    pub max_price: f64,
    pub forex_min_quantity: f64,
    pub forex_max_quantity: f64,
}

impl Limits {
    /// Validate the limits. Returns `Err` with a description if any field is nonsensical.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("max_order_value", self.max_order_value),
            ("max_position_size", self.max_position_size),
            ("max_price", self.max_price),
            ("forex_min_quantity", self.forex_min_quantity),
            ("forex_max_quantity", self.forex_max_quantity),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be positive and finite, got {value}"));
            }
        }
        if self.forex_min_quantity > self.forex_max_quantity {
            return Err(format!(
                "forex_min_quantity ({}) exceeds forex_max_quantity ({})",
                self.forex_min_quantity, self.forex_max_quantity
            ));
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_order_value: 50_000.0,
            max_position_size: 100_000.0,
            max_price: 1_000_000.0,
            forex_min_quantity: 1_000.0,
            forex_max_quantity: 10_000_000.0,
        }
    }
}
