//! IBKR connection, contract resolution, account data and snapshot quotes.

use ibapi::accounts::types::AccountGroup;
use ibapi::accounts::{AccountSummaryResult, PositionUpdate};
use ibapi::client::blocking::Client;
use ibapi::contracts::{Contract, Currency, Exchange, SecurityType, Symbol};
use ibapi::market_data::realtime::{TickType, TickTypes};
use log::{debug, info, warn};
use orderdesk::Instrument;

use crate::error::BrokerError;
use crate::types::{AccountSummary, ContractRef, ContractSummary, Position, Quote};

/// Wraps the ibapi blocking client with convenience methods.
pub struct IbkrClient {
    client: Client,
}

impl IbkrClient {
    /// Connect to IB Gateway/TWS.
    pub fn connect(host: &str, port: u16, client_id: i32) -> Result<Self, BrokerError> {
        let address = format!("{host}:{port}");
        info!("Connecting to IB Gateway at {address}...");

        let client = Client::connect(&address, client_id)
            .map_err(|e| BrokerError::Connection(format!("failed to connect to {address}: {e}")))?;

        info!("Connected (client_id={client_id})");
        Ok(Self { client })
    }

    /// Get the underlying ibapi client (for order submission).
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Resolve an instrument to exactly one contract.
    pub fn qualify(&self, instrument: &Instrument) -> Result<ContractRef, BrokerError> {
        let contract = contract_for(instrument, 0);
        let details = self
            .client
            .contract_details(&contract)
            .map_err(|e| BrokerError::InstrumentNotFound(format!("{instrument}: {e}")))?;

        let Some(first) = details.first() else {
            return Err(BrokerError::InstrumentNotFound(instrument.to_string()));
        };
        if details.len() > 1 {
            debug!(
                "{instrument}: {} contracts matched, using con_id {}",
                details.len(),
                first.contract.contract_id
            );
        }

        Ok(ContractRef {
            instrument: instrument.clone(),
            contract_id: i64::from(first.contract.contract_id),
        })
    }

    /// Fetch current positions.
    pub fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        let subscription = self
            .client
            .positions()
            .map_err(|e| BrokerError::Connection(format!("failed to request positions: {e}")))?;

        let mut positions = Vec::new();
        for update in subscription {
            match update {
                PositionUpdate::Position(pos) => {
                    let c = &pos.contract;
                    debug!(
                        "Position: {} {} qty={} avg_cost={:.4}",
                        pos.account, c.symbol, pos.position, pos.average_cost
                    );
                    positions.push(Position {
                        account: pos.account.clone(),
                        contract: ContractSummary {
                            symbol: c.symbol.to_string(),
                            security_type: c.security_type.to_string(),
                            exchange: c.exchange.to_string(),
                            currency: c.currency.to_string(),
                        },
                        quantity: pos.position,
                        avg_cost: pos.average_cost,
                    });
                }
                PositionUpdate::PositionEnd => break,
            }
        }

        info!("Fetched {} positions", positions.len());
        Ok(positions)
    }

    /// Fetch the account summary tags in [`AccountSummary::TAGS`].
    pub fn account_summary(&self) -> Result<AccountSummary, BrokerError> {
        let group = AccountGroup("All".to_string());
        let subscription = self
            .client
            .account_summary(&group, &AccountSummary::TAGS)
            .map_err(|e| {
                BrokerError::Connection(format!("failed to request account summary: {e}"))
            })?;

        let mut summary = AccountSummary::default();
        for result in subscription {
            match result {
                AccountSummaryResult::Summary(s) => {
                    debug!("Account {}: {}={} {}", s.account, s.tag, s.value, s.currency);
                    match s.value.parse::<f64>() {
                        Ok(value) => {
                            summary.apply(&s.tag, value);
                        }
                        Err(_) => warn!("Unparseable account value {}={}", s.tag, s.value),
                    }
                }
                AccountSummaryResult::End => break,
            }
        }

        info!(
            "Account: net_liquidation={:.2}, cash={:.2}, buying_power={:.2}",
            summary.net_liquidation, summary.total_cash, summary.buying_power
        );
        Ok(summary)
    }

    /// Fetch a snapshot quote.
    pub fn quote(&self, contract: &ContractRef) -> Result<Quote, BrokerError> {
        let ib_contract = to_ib_contract(contract);
        let subscription = self
            .client
            .market_data(&ib_contract)
            .snapshot()
            .subscribe()
            .map_err(|e| BrokerError::Connection(format!("market data request failed: {e}")))?;

        let mut bid = None;
        let mut ask = None;
        let mut last = None;

        for tick in subscription {
            match tick {
                TickTypes::Price(price_tick) => match price_tick.tick_type {
                    TickType::Bid => bid = Some(price_tick.price),
                    TickType::Ask => ask = Some(price_tick.price),
                    TickType::Last => last = Some(price_tick.price),
                    _ => {}
                },
                TickTypes::PriceSize(ps) => match ps.price_tick_type {
                    TickType::Bid => bid = Some(ps.price),
                    TickType::Ask => ask = Some(ps.price),
                    TickType::Last => last = Some(ps.price),
                    _ => {}
                },
                TickTypes::SnapshotEnd => break,
                _ => {}
            }
        }

        // The gateway reports -1 for a side it has no data for.
        let valid = |p: Option<f64>| p.filter(|v| *v > 0.0);
        let quote = Quote {
            symbol: contract.instrument.symbol().to_string(),
            bid: valid(bid),
            ask: valid(ask),
            last: valid(last),
        };

        if quote.bid.is_none() && quote.ask.is_none() && quote.last.is_none() {
            return Err(BrokerError::Other(format!(
                "no valid price received for {}",
                contract.instrument
            )));
        }
        Ok(quote)
    }
}

/// Build the ibapi contract for an instrument.
pub fn contract_for(instrument: &Instrument, contract_id: i32) -> Contract {
    match instrument {
        Instrument::Forex { symbol } => {
            let (base, quote) = instrument.forex_legs().unwrap_or((symbol, "USD"));
            Contract {
                contract_id,
                symbol: Symbol(base.to_string()),
                security_type: SecurityType::ForexPair,
                exchange: Exchange("IDEALPRO".to_string()),
                currency: Currency(quote.to_string()),
                ..Default::default()
            }
        }
        Instrument::Stock {
            symbol,
            exchange,
            currency,
        } => Contract {
            contract_id,
            symbol: Symbol(symbol.clone()),
            security_type: SecurityType::Stock,
            exchange: Exchange(exchange.clone()),
            currency: Currency(currency.clone()),
            ..Default::default()
        },
        Instrument::Option {
            symbol,
            expiry,
            strike,
            right,
            exchange,
        } => Contract {
            contract_id,
            symbol: Symbol(symbol.clone()),
            security_type: SecurityType::Option,
            exchange: Exchange(exchange.clone()),
            currency: Currency("USD".to_string()),
            last_trade_date_or_contract_month: expiry.format("%Y%m%d").to_string(),
            strike: *strike,
            right: right.code().to_string(),
            multiplier: "100".to_string(),
            ..Default::default()
        },
    }
}

/// The ibapi contract for an already-qualified reference.
pub fn to_ib_contract(contract: &ContractRef) -> Contract {
    let con_id = i32::try_from(contract.contract_id).unwrap_or(0);
    contract_for(&contract.instrument, con_id)
}
