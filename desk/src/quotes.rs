//! Multi-pair quote snapshots fanned out over a bounded thread pool.
//!
//! Each worker opens its own gateway session. Client ids are
//! `base_client_id + 1 + index`, so no two concurrent sessions share one and
//! none collides with the desk's own id.

use log::{debug, warn};
use orderdesk::{Instrument, InstrumentType};
use orderdesk_broker::{OrderGateway, Quote, Session};
use orderdesk_risk::validate_symbol;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Quote (or failure) for one requested symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteResult {
    pub symbol: String,
    pub client_id: i32,
    pub quote: std::result::Result<Quote, String>,
}

fn fetch_one<G: OrderGateway>(gateway: &mut G, symbol: &str) -> std::result::Result<Quote, String> {
    let verdict = validate_symbol(symbol, InstrumentType::Forex);
    if !verdict.valid {
        return Err(verdict.message);
    }
    let session = Session::open(gateway).map_err(|e| e.to_string())?;
    let contract = session
        .qualify(&Instrument::forex(symbol))
        .map_err(|e| e.to_string())?;
    session.quote(&contract).map_err(|e| e.to_string())
}

/// Fetch snapshot quotes for `symbols` with at most `workers` concurrent
/// sessions. Results keep the input order.
pub fn fetch_quotes<G, F>(
    make_gateway: F,
    base_client_id: i32,
    symbols: &[String],
    workers: usize,
) -> Result<Vec<QuoteResult>>
where
    G: OrderGateway,
    F: Fn(i32) -> G + Sync,
{
    if symbols.is_empty() {
        return Ok(Vec::new());
    }
    let threads = workers.clamp(1, symbols.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Gateway(format!("failed to build quote pool: {e}")))?;

    let results = pool.install(|| {
        symbols
            .par_iter()
            .enumerate()
            .map(|(i, raw)| {
                let symbol = raw.trim().to_ascii_uppercase();
                let client_id = base_client_id + 1 + i as i32;
                let mut gateway = make_gateway(client_id);
                let quote = fetch_one(&mut gateway, &symbol);
                match &quote {
                    Ok(q) => debug!("{symbol}: bid={:?} ask={:?}", q.bid, q.ask),
                    Err(e) => warn!("{symbol}: {e}"),
                }
                QuoteResult {
                    symbol,
                    client_id,
                    quote,
                }
            })
            .collect()
    });
    Ok(results)
}
