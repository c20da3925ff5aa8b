//! Interactive menu.
//!
//! Every workflow here gathers input, shows the validation report, asks for
//! confirmation and then calls the same [`OrderDesk`] operations the
//! one-shot commands use.

use chrono::NaiveDate;
use dialoguer::{Confirm, Input, Select};
use orderdesk::{
    Action, Instrument, InstrumentType, OptionRight, OrderDraft, OrderKind, OrderRecord,
    RecordFilter,
};
use orderdesk_broker::{OrderGateway, PendingOrder};
use orderdesk_risk::{parse_number, validate_symbol};

use crate::clone::CloneOverrides;
use crate::config::DefaultsConfig;
use crate::desk::OrderDesk;
use crate::display;
use crate::error::{Error, Result};

const MAIN_MENU: &[&str] = &[
    "Place forex order",
    "Place stock order",
    "Place option order",
    "Place bracket order",
    "Order history",
    "Clone previous order",
    "Search history",
    "Statistics",
    "Pending orders / cancel",
    "Account and positions",
    "Exit",
];

fn prompt_failed(e: dialoguer::Error) -> Error {
    Error::Aborted(format!("prompt failed: {e}"))
}

fn select(prompt: &str, items: &[&str], default: usize) -> Result<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(default)
        .interact()
        .map_err(prompt_failed)
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(prompt_failed)
}

fn ask_text(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(d) = default {
        input = input.default(d.to_string());
    }
    input.interact_text().map_err(prompt_failed)
}

fn ask_number(prompt: &str, what: &str, default: Option<f64>) -> Result<f64> {
    let mut input = Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(|raw: &String| parse_number(raw, what).map(|_| ()).map_err(|v| v.message));
    if let Some(d) = default {
        input = input.default(d.to_string());
    }
    let raw = input.interact_text().map_err(prompt_failed)?;
    parse_number(&raw, what).map_err(|v| Error::Aborted(v.message))
}

fn ask_symbol(prompt: &str, instrument_type: InstrumentType) -> Result<String> {
    let raw = Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(|s: &String| {
            let verdict = validate_symbol(s, instrument_type);
            if verdict.valid {
                Ok(())
            } else {
                Err(verdict.message)
            }
        })
        .interact_text()
        .map_err(prompt_failed)?;
    Ok(raw.trim().to_ascii_uppercase())
}

fn ask_action() -> Result<Action> {
    Ok(match select("Action", &["BUY", "SELL"], 0)? {
        0 => Action::Buy,
        _ => Action::Sell,
    })
}

fn ask_kind() -> Result<OrderKind> {
    Ok(match select("Order type", &["Market", "Limit", "Stop", "Stop-limit"], 1)? {
        0 => OrderKind::Market,
        1 => OrderKind::Limit {
            limit_price: ask_number("Limit price", "Limit price", None)?,
        },
        2 => OrderKind::Stop {
            stop_price: ask_number("Stop price", "Stop price", None)?,
        },
        _ => OrderKind::StopLimit {
            stop_price: ask_number("Stop price", "Stop price", None)?,
            limit_price: ask_number("Limit price", "Limit price", None)?,
        },
    })
}

fn ask_expiry() -> Result<NaiveDate> {
    let raw = Input::<String>::new()
        .with_prompt("Expiry (YYYYMMDD)")
        .validate_with(|s: &String| {
            parse_expiry(s)
                .map(|_| ())
                .ok_or_else(|| "expiry must be YYYYMMDD or YYYY-MM-DD".to_string())
        })
        .interact_text()
        .map_err(prompt_failed)?;
    parse_expiry(&raw).ok_or_else(|| Error::Aborted(format!("invalid expiry {raw}")))
}

/// `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn forex_draft(defaults: &DefaultsConfig) -> Result<OrderDraft> {
    let symbol = ask_symbol("Currency pair (e.g. EURUSD)", InstrumentType::Forex)?;
    let action = ask_action()?;
    let quantity = ask_number("Quantity", "Quantity", Some(defaults.forex_quantity))?;
    let kind = ask_kind()?;
    Ok(OrderDraft::new(Instrument::forex(&symbol), action, quantity, kind))
}

fn stock_draft(defaults: &DefaultsConfig) -> Result<OrderDraft> {
    let symbol = ask_symbol("Ticker", InstrumentType::Stock)?;
    let exchange = ask_text("Exchange", Some(&defaults.exchange))?;
    let currency = ask_text("Currency", Some(&defaults.currency))?;
    let action = ask_action()?;
    let quantity = ask_number("Shares", "Quantity", Some(defaults.stock_quantity))?;
    let kind = ask_kind()?;
    Ok(OrderDraft::new(
        Instrument::stock(&symbol, &exchange, &currency),
        action,
        quantity,
        kind,
    ))
}

fn option_draft(defaults: &DefaultsConfig) -> Result<OrderDraft> {
    let symbol = ask_symbol("Underlying", InstrumentType::Option)?;
    let expiry = ask_expiry()?;
    let strike = ask_number("Strike", "Strike price", None)?;
    let right = match select("Right", &["Call", "Put"], 0)? {
        0 => OptionRight::Call,
        _ => OptionRight::Put,
    };
    let action = ask_action()?;
    let quantity = ask_number("Contracts", "Quantity", Some(defaults.option_quantity))?;
    let kind = ask_kind()?;
    Ok(OrderDraft::new(
        Instrument::option(&symbol, expiry, strike, right),
        action,
        quantity,
        kind,
    ))
}

fn bracket_draft(defaults: &DefaultsConfig) -> Result<OrderDraft> {
    let (instrument, default_qty) = match select("Instrument", &["Forex", "Stock"], 0)? {
        0 => (
            Instrument::forex(&ask_symbol("Currency pair", InstrumentType::Forex)?),
            defaults.forex_quantity,
        ),
        _ => (
            Instrument::stock(
                &ask_symbol("Ticker", InstrumentType::Stock)?,
                &defaults.exchange,
                &defaults.currency,
            ),
            defaults.stock_quantity,
        ),
    };
    let action = ask_action()?;
    let quantity = ask_number("Quantity", "Quantity", Some(default_qty))?;
    let limit_price = match select("Entry", &["Limit", "Market"], 0)? {
        0 => Some(ask_number("Entry limit price", "Limit price", None)?),
        _ => None,
    };
    let stop_loss_price = ask_number("Stop loss price", "Stop loss price", None)?;
    let take_profit_price = ask_number("Take profit price", "Take profit price", None)?;
    Ok(OrderDraft::new(
        instrument,
        action,
        quantity,
        OrderKind::Bracket {
            limit_price,
            stop_loss_price,
            take_profit_price,
        },
    ))
}

/// Show the validation report and submit on confirmation.
fn review_and_submit<G: OrderGateway>(desk: &mut OrderDesk<G>, draft: OrderDraft) -> Result<()> {
    println!("\n{draft}");
    let report = desk.validator().validate_order(&draft);
    print!("{report}");
    if !report.is_ok() {
        println!("Order not submitted.");
        return Ok(());
    }
    if !confirm("Submit order?")? {
        println!("Cancelled by user.");
        return Ok(());
    }
    let submitted = desk.submit_order(draft)?;
    display::display_submitted(&submitted);
    Ok(())
}

fn edit_clone(source: &OrderRecord) -> Result<CloneOverrides> {
    let draft = &source.draft;
    let mut overrides = CloneOverrides::default();

    let symbol = ask_text("Symbol", Some(draft.symbol()))?;
    if !symbol.trim().eq_ignore_ascii_case(draft.symbol()) {
        overrides.symbol = Some(symbol);
    }
    let action = ask_action_default(draft.action)?;
    if action != draft.action {
        overrides.action = Some(action);
    }
    let quantity = ask_number("Quantity", "Quantity", Some(draft.quantity))?;
    if quantity != draft.quantity {
        overrides.quantity = Some(quantity);
    }
    if let Some(current) = draft.kind.limit_price() {
        let p = ask_number("Limit price", "Limit price", Some(current))?;
        if p != current {
            overrides.limit_price = Some(p);
        }
    }
    let stop = match draft.kind {
        OrderKind::Bracket {
            stop_loss_price, ..
        } => Some(stop_loss_price),
        ref other => other.stop_price(),
    };
    if let Some(current) = stop {
        let p = ask_number("Stop price", "Stop price", Some(current))?;
        if p != current {
            overrides.stop_price = Some(p);
        }
    }
    Ok(overrides)
}

fn ask_action_default(current: Action) -> Result<Action> {
    let default = if current == Action::Buy { 0 } else { 1 };
    Ok(match select("Action", &["BUY", "SELL"], default)? {
        0 => Action::Buy,
        _ => Action::Sell,
    })
}

fn clone_flow<G: OrderGateway>(desk: &mut OrderDesk<G>) -> Result<()> {
    display::display_history(&desk.store().recent(display::HISTORY_LIMIT), "RECENT ORDERS");
    let id = ask_number("Order # to clone", "Order number", None)?;
    if id < 1.0 || id.fract() != 0.0 {
        println!("Order numbers are whole numbers starting at 1.");
        return Ok(());
    }
    let record_id = id as u64;
    let source = desk
        .store()
        .find_by_id(record_id)
        .ok_or(Error::RecordNotFound(record_id))?;
    display::display_record(&source);

    let overrides = if confirm("Edit fields before submitting?")? {
        edit_clone(&source)?
    } else {
        CloneOverrides::default()
    };
    let draft = crate::clone::clone_draft(&source, &overrides)?;
    println!("\n{draft}");
    print!("{}", desk.validator().validate_order(&draft));
    if !confirm("Submit cloned order?")? {
        println!("Cancelled by user.");
        return Ok(());
    }
    let submitted = desk.clone_order(record_id, &overrides)?;
    display::display_submitted(&submitted);
    Ok(())
}

fn search_flow<G: OrderGateway>(desk: &OrderDesk<G>) -> Result<()> {
    let symbol = ask_text("Symbol (blank for any)", Some(""))?;
    let instrument_type = match select("Instrument type", &["Any", "Forex", "Stock", "Option"], 0)? {
        1 => Some(InstrumentType::Forex),
        2 => Some(InstrumentType::Stock),
        3 => Some(InstrumentType::Option),
        _ => None,
    };
    let action = match select("Action", &["Any", "BUY", "SELL"], 0)? {
        1 => Some(Action::Buy),
        2 => Some(Action::Sell),
        _ => None,
    };
    let filter = RecordFilter {
        symbol: Some(symbol.trim().to_string()).filter(|s| !s.is_empty()),
        instrument_type,
        action,
    };
    let found = desk.store().filter(&filter);
    display::display_history(&found, &format!("FOUND {} ORDER(S)", found.len()));
    Ok(())
}

fn cancel_menu<G: OrderGateway>(desk: &mut OrderDesk<G>) -> Result<()> {
    loop {
        let pending: Vec<PendingOrder> = desk.get_pending()?;
        display::display_pending(&pending);
        let choice = select(
            "Cancel",
            &[
                "Cancel by number",
                "Cancel by order ID",
                "Cancel all",
                "Refresh",
                "Back",
            ],
            3,
        )?;
        let result = match choice {
            0 if !pending.is_empty() => {
                let n = ask_number("Number", "Number", None)?;
                let order = (n >= 1.0 && n.fract() == 0.0)
                    .then(|| pending.get(n as usize - 1))
                    .flatten();
                match order {
                    Some(order) => desk.cancel_one(order).map(|r| display::display_cancel(&r)),
                    None => {
                        println!("No pending order #{n}");
                        Ok(())
                    }
                }
            }
            1 => {
                let id = ask_number("Order ID", "Order ID", None)?;
                desk.cancel_by_id(orderdesk::BrokerOrderId(id as i64))
                    .map(|r| display::display_cancel(&r))
            }
            2 if !pending.is_empty() => {
                if confirm(&format!("Cancel all {} pending order(s)?", pending.len()))? {
                    desk.cancel_all(&pending)
                        .map(|r| display::display_cancel_all(&r))
                } else {
                    Ok(())
                }
            }
            3 | 0 | 2 => Ok(()),
            _ => return Ok(()),
        };
        if let Err(e) = result {
            println!("Error: {e}");
        }
    }
}

/// Run the interactive menu until the user exits.
pub fn run_menu<G: OrderGateway>(desk: &mut OrderDesk<G>, defaults: &DefaultsConfig) -> Result<()> {
    loop {
        println!();
        let choice = select("Order desk", MAIN_MENU, 0)?;
        let result = match choice {
            0 => forex_draft(defaults).and_then(|d| review_and_submit(desk, d)),
            1 => stock_draft(defaults).and_then(|d| review_and_submit(desk, d)),
            2 => option_draft(defaults).and_then(|d| review_and_submit(desk, d)),
            3 => bracket_draft(defaults).and_then(|d| review_and_submit(desk, d)),
            4 => {
                let recent = desk.store().recent(display::HISTORY_LIMIT);
                display::display_history(&recent, "RECENT ORDERS");
                Ok(())
            }
            5 => clone_flow(desk),
            6 => search_flow(desk),
            7 => {
                print!("{}", desk.store().statistics());
                Ok(())
            }
            8 => cancel_menu(desk),
            9 => desk
                .account_overview()
                .map(|overview| display::display_account(&overview)),
            _ => return Ok(()),
        };
        match result {
            Ok(()) => {}
            Err(Error::Aborted(msg)) => return Err(Error::Aborted(msg)),
            Err(e) => println!("Error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_formats() {
        let want = NaiveDate::from_ymd_opt(2025, 1, 17);
        assert_eq!(parse_expiry("20250117"), want);
        assert_eq!(parse_expiry(" 2025-01-17 "), want);
        assert_eq!(parse_expiry("17/01/2025"), None);
    }
}
