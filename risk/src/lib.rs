//! Pre-submission order validation for orderdesk.
//!
//! Checks symbol format, quantity bounds, price bounds, order value and
//! bracket price relations against configurable [`Limits`]. Nothing here
//! talks to the gateway or the filesystem.

pub mod bracket;
pub mod checks;
pub mod config;
pub mod report;

pub use bracket::{RiskReward, calculate_risk_reward, validate_bracket_prices};
pub use checks::{
    PairClass, PriceKind, Verdict, classify_forex_pair, parse_number, validate_forex_pair,
    validate_order_value, validate_price, validate_symbol,
};
pub use config::Limits;
pub use report::ValidationReport;

use orderdesk::{Action, Instrument, InstrumentType, OrderDraft, OrderKind};

/// Pre-submission validator.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    limits: Limits,
}

impl Validator {
    /// Create a validator with the given limits.
    ///
    /// # Panics
    ///
    /// Panics if `limits` fails validation (e.g., NaN fields, min above max).
    /// Configuration is validated on load, so this only fires on programmer error.
    #[track_caller]
    pub fn new(limits: Limits) -> Self {
        if let Err(msg) = limits.validate() {
            panic!("invalid Limits: {msg}");
        }
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn validate_quantity(&self, qty: f64, instrument_type: InstrumentType) -> Verdict {
        checks::validate_quantity(qty, instrument_type, &self.limits)
    }

    pub fn validate_price(&self, price: f64, kind: PriceKind) -> Verdict {
        checks::validate_price(price, kind, &self.limits)
    }

    pub fn validate_order_value(&self, qty: f64, price: f64, symbol: &str) -> Verdict {
        checks::validate_order_value(qty, price, symbol, &self.limits)
    }

    /// Run every check that applies to `draft` and collect the results.
    pub fn validate_order(&self, draft: &OrderDraft) -> ValidationReport {
        let mut report = ValidationReport::default();
        let instrument_type = draft.instrument.instrument_type();
        let symbol = draft.symbol().trim().to_ascii_uppercase();

        let verdict = validate_symbol(&symbol, instrument_type);
        if !verdict.valid {
            report.errors.push(format!("Symbol: {verdict}"));
        } else if instrument_type == InstrumentType::Forex
            && classify_forex_pair(&symbol) == PairClass::Exotic
        {
            report.warnings.push(validate_forex_pair(&symbol).message);
        }

        let verdict = self.validate_quantity(draft.quantity, instrument_type);
        if !verdict.valid {
            report.errors.push(format!("Quantity: {verdict}"));
        }

        if let Instrument::Option { strike, .. } = &draft.instrument {
            self.check_price(&mut report, *strike, PriceKind::Strike);
        }

        self.check_kind(&mut report, draft.action, &draft.kind);

        if let Some(price) = draft.kind.reference_price().filter(|p| *p > 0.0) {
            let verdict = self.validate_order_value(draft.quantity, price, &symbol);
            if verdict.valid {
                report.warnings.push(verdict.message);
            } else {
                report.errors.push(verdict.message);
            }
        }

        report
    }

    fn check_price(&self, report: &mut ValidationReport, price: f64, kind: PriceKind) {
        let verdict = self.validate_price(price, kind);
        if !verdict.valid {
            report.errors.push(verdict.message);
        }
    }

    fn check_kind(&self, report: &mut ValidationReport, action: Action, kind: &OrderKind) {
        match *kind {
            OrderKind::Market => {}
            OrderKind::Limit { limit_price } => {
                self.check_price(report, limit_price, PriceKind::Limit);
            }
            OrderKind::Stop { stop_price } => {
                self.check_price(report, stop_price, PriceKind::Stop);
            }
            OrderKind::StopLimit {
                stop_price,
                limit_price,
            } => {
                self.check_price(report, limit_price, PriceKind::Limit);
                self.check_price(report, stop_price, PriceKind::Stop);
                match action {
                    Action::Buy if limit_price <= stop_price => report.errors.push(
                        "For BUY stop-limit orders, limit price must be higher than stop price"
                            .to_string(),
                    ),
                    Action::Sell if limit_price >= stop_price => report.errors.push(
                        "For SELL stop-limit orders, limit price must be lower than stop price"
                            .to_string(),
                    ),
                    _ => {}
                }
            }
            OrderKind::Bracket {
                limit_price,
                stop_loss_price,
                take_profit_price,
            } => {
                if let Some(entry) = limit_price {
                    self.check_price(report, entry, PriceKind::Limit);
                }
                for (price, kind) in [
                    (stop_loss_price, PriceKind::StopLoss),
                    (take_profit_price, PriceKind::TakeProfit),
                ] {
                    // Sign is reported by the bracket check below.
                    if price > 0.0 {
                        self.check_price(report, price, kind);
                    }
                }
                report.errors.extend(validate_bracket_prices(
                    limit_price,
                    stop_loss_price,
                    take_profit_price,
                    action,
                ));

                let rr = limit_price.and_then(|entry| {
                    calculate_risk_reward(entry, stop_loss_price, take_profit_price, action)
                });
                if let Some(rr) = rr.filter(|rr| rr.ratio < 1.0) {
                    report
                        .warnings
                        .push(format!("{rr} is below 1:1, reward is smaller than risk"));
                }
            }
        }
    }
}
