//! CLI entry point for the order desk.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{ArgGroup, Parser, Subcommand};

use orderdesk::{Action, BrokerOrderId, InstrumentType, OrderKind, RecordFilter};
use orderdesk_broker::ibkr::IbkrGateway;
use orderdesk_cli::config::Config;
use orderdesk_cli::display;
use orderdesk_cli::error::{Error, Result};
use orderdesk_cli::{CloneOverrides, OrderDesk, fetch_quotes, prompt};

#[derive(Parser)]
#[command(name = "orderdesk")]
#[command(about = "Order desk for Interactive Brokers: submit, track, clone and cancel orders")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Skip confirmation prompts (live-account warning, cancel all, clone)
    #[arg(long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive menu
    Menu,

    /// Show recent order history
    History {
        /// Number of most recent orders to show
        #[arg(long, default_value_t = display::HISTORY_LIMIT)]
        limit: usize,
    },

    /// Search order history
    Search {
        #[arg(long)]
        symbol: Option<String>,
        /// forex, stock or option
        #[arg(long = "type", value_parser = parse_instrument_type)]
        instrument_type: Option<InstrumentType>,
        /// BUY or SELL
        #[arg(long, value_parser = parse_action)]
        action: Option<Action>,
    },

    /// Show one history record in full
    Show { id: u64 },

    /// History statistics
    Stats,

    /// Re-submit a history record, optionally with changes
    Clone {
        id: u64,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long, value_parser = parse_action)]
        action: Option<Action>,
        #[arg(long)]
        quantity: Option<f64>,
        /// Submit as a market order
        #[arg(long, conflicts_with_all = ["limit", "stop"])]
        market: bool,
        #[arg(long)]
        limit: Option<f64>,
        #[arg(long)]
        stop: Option<f64>,
    },

    /// List orders the gateway reports as open
    Pending {
        /// Use cached history statuses instead of the gateway
        #[arg(long)]
        local: bool,
    },

    /// Cancel pending orders
    #[command(group(ArgGroup::new("target").required(true).args(["order_id", "all", "record"])))]
    Cancel {
        /// Gateway order id
        order_id: Option<i64>,
        /// Cancel every open order
        #[arg(long)]
        all: bool,
        /// Cancel all legs of a history record
        #[arg(long)]
        record: Option<u64>,
    },

    /// Copy live order statuses into history
    Sync,

    /// Snapshot quotes for currency pairs
    Quote {
        /// Pairs to quote (defaults to [quotes].pairs)
        pairs: Vec<String>,
    },

    /// Account summary and current positions
    Account,

    /// Check the gateway connection
    Status,
}

fn parse_action(s: &str) -> std::result::Result<Action, String> {
    Action::parse(s).ok_or_else(|| format!("invalid action '{s}' (expected BUY or SELL)"))
}

fn parse_instrument_type(s: &str) -> std::result::Result<InstrumentType, String> {
    InstrumentType::parse(s)
        .ok_or_else(|| format!("invalid instrument type '{s}' (expected forex, stock or option)"))
}

fn confirm(prompt: &str, skip: bool) -> Result<()> {
    if skip {
        return Ok(());
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;
    if confirmed {
        Ok(())
    } else {
        Err(Error::Aborted("Aborted.".into()))
    }
}

/// Ask before anything that could place or cancel orders on a live account.
fn guard_live(config: &Config, skip: bool) -> Result<()> {
    match config.live_trading_warning() {
        Some(warning) => {
            eprintln!("WARNING: {warning}");
            confirm("Continue?", skip)
        }
        None => Ok(()),
    }
}

fn gateway(config: &Config) -> IbkrGateway {
    IbkrGateway::new(
        &config.connection.host,
        config.connection.port,
        config.connection.client_id,
    )
    .with_settle(Duration::from_millis(config.connection.settle_ms))
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let mut desk = OrderDesk::from_config(gateway(config), config)?;

    match cli.command {
        Command::Menu => {
            guard_live(config, cli.yes)?;
            prompt::run_menu(&mut desk, &config.defaults)
        }
        Command::History { limit } => {
            display::display_history(&desk.store().recent(limit), "RECENT ORDERS");
            Ok(())
        }
        Command::Search {
            symbol,
            instrument_type,
            action,
        } => {
            let filter = RecordFilter {
                symbol,
                instrument_type,
                action,
            };
            let found = desk.store().filter(&filter);
            display::display_history(&found, &format!("FOUND {} ORDER(S)", found.len()));
            Ok(())
        }
        Command::Show { id } => {
            let record = desk.store().find_by_id(id).ok_or(Error::RecordNotFound(id))?;
            display::display_record(&record);
            Ok(())
        }
        Command::Stats => {
            print!("{}", desk.store().statistics());
            Ok(())
        }
        Command::Clone {
            id,
            symbol,
            action,
            quantity,
            market,
            limit,
            stop,
        } => {
            guard_live(config, cli.yes)?;
            let overrides = CloneOverrides {
                symbol,
                action,
                quantity,
                kind: market.then_some(OrderKind::Market),
                limit_price: limit,
                stop_price: stop,
            };
            let source = desk.store().find_by_id(id).ok_or(Error::RecordNotFound(id))?;
            let draft = orderdesk_cli::clone_draft(&source, &overrides)?;
            println!("{draft}");
            confirm("Submit cloned order?", cli.yes)?;
            let submitted = desk.clone_order(id, &overrides)?;
            display::display_submitted(&submitted);
            Ok(())
        }
        Command::Pending { local } => {
            if local {
                display::display_history(&desk.local_open(), "OPEN ORDERS (cached)");
            } else {
                display::display_pending(&desk.get_pending()?);
            }
            Ok(())
        }
        Command::Cancel {
            order_id,
            all,
            record,
        } => {
            guard_live(config, cli.yes)?;
            if all {
                let pending = desk.get_pending()?;
                if pending.is_empty() {
                    println!("No pending orders.");
                    return Ok(());
                }
                display::display_pending(&pending);
                confirm(&format!("Cancel all {} order(s)?", pending.len()), cli.yes)?;
                display::display_cancel_all(&desk.cancel_all(&pending)?);
            } else if let Some(record_id) = record {
                display::display_record_cancel(&desk.cancel_record(record_id)?);
            } else if let Some(id) = order_id {
                display::display_cancel(&desk.cancel_by_id(BrokerOrderId(id))?);
            }
            Ok(())
        }
        Command::Sync => {
            display::display_sync(&desk.sync_history()?);
            Ok(())
        }
        Command::Quote { pairs } => {
            let pairs = if pairs.is_empty() {
                config.quotes.pairs.clone()
            } else {
                pairs
            };
            let (host, port) = (config.connection.host.clone(), config.connection.port);
            let settle = Duration::from_millis(config.connection.settle_ms);
            let results = fetch_quotes(
                |client_id| IbkrGateway::new(&host, port, client_id).with_settle(settle),
                config.connection.client_id,
                &pairs,
                config.quotes.workers,
            )?;
            display::display_quotes(&results);
            Ok(())
        }
        Command::Account => {
            let overview = desk.account_overview()?;
            display::display_account(&overview);
            Ok(())
        }
        Command::Status => {
            print!("Connecting to IB Gateway at {}... ", config.address());
            let status = desk.check_connection()?;
            println!("OK");
            println!(
                "Client id {}, {} open order(s), history at {}",
                status.client_id,
                status.open_orders,
                config.storage.history_file.display()
            );
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(cli, &config) {
        match &e {
            Error::Validation(report) => {
                eprint!("{report}");
                eprintln!("\nOrder not submitted.");
                process::exit(2);
            }
            Error::Aborted(msg) => {
                eprintln!("{msg}");
                process::exit(0);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
