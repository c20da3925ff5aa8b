//! Bracket price relations and risk/reward.

use std::fmt;

use orderdesk::Action;
use serde::Serialize;

/// Check that protective prices sit on the correct side of the entry and of
/// each other. All violations are returned, not just the first.
///
/// `entry` is `None` for a market entry, in which case only the relation
/// between the two protective prices is checked.
pub fn validate_bracket_prices(
    entry: Option<f64>,
    stop_loss: f64,
    take_profit: f64,
    action: Action,
) -> Vec<String> {
    let mut errors = Vec::new();
    let limit_entry = entry.filter(|e| *e > 0.0);

    match action {
        Action::Buy => {
            if let Some(entry) = limit_entry {
                if stop_loss >= entry {
                    errors.push("For BUY orders, stop loss must be below entry price".to_string());
                }
                if take_profit <= entry {
                    errors.push("For BUY orders, take profit must be above entry price".to_string());
                }
            }
            if stop_loss >= take_profit {
                errors.push("For BUY orders, stop loss must be below take profit".to_string());
            }
        }
        Action::Sell => {
            if let Some(entry) = limit_entry {
                if stop_loss <= entry {
                    errors.push("For SELL orders, stop loss must be above entry price".to_string());
                }
                if take_profit >= entry {
                    errors.push("For SELL orders, take profit must be below entry price".to_string());
                }
            }
            if stop_loss <= take_profit {
                errors.push("For SELL orders, stop loss must be above take profit".to_string());
            }
        }
    }

    if stop_loss <= 0.0 {
        errors.push("Stop loss price must be positive".to_string());
    }
    if take_profit <= 0.0 {
        errors.push("Take profit price must be positive".to_string());
    }
    errors
}

/// Per-unit risk and reward of a bracket, and their ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskReward {
    pub risk: f64,
    pub reward: f64,
    pub ratio: f64,
}

impl fmt::Display for RiskReward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Risk/Reward Ratio: {:.2}:1 (Risk: ${:.2}, Reward: ${:.2})",
            self.ratio, self.risk, self.reward
        )
    }
}

/// `None` when the stop is on the wrong side of the entry (risk <= 0).
pub fn calculate_risk_reward(
    entry: f64,
    stop_loss: f64,
    take_profit: f64,
    action: Action,
) -> Option<RiskReward> {
    let (risk, reward) = match action {
        Action::Buy => (entry - stop_loss, take_profit - entry),
        Action::Sell => (stop_loss - entry, entry - take_profit),
    };
    if risk.is_nan() || risk <= 0.0 {
        return None;
    }
    Some(RiskReward {
        risk,
        reward,
        ratio: reward / risk,
    })
}
