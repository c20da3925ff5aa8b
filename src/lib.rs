//! # orderdesk
//!
//! Order model and history store for Interactive Brokers order workflows.
//!
//! - **Instruments**: forex pairs, stocks and options as one tagged type
//! - **Order kinds**: Market, Limit, Stop, StopLimit, Bracket, each carrying
//!   exactly the prices it needs
//! - **Status**: local terminal states plus broker-native states, with a
//!   single open/terminal classification
//! - **History**: a human-readable JSON file, rewritten atomically on change
//!
//! ## Quick Start
//!
//! ```no_run
//! use orderdesk::{Action, Instrument, NewOrder, OrderDraft, OrderKind, OrderStore};
//! use orderdesk::record::SubmissionOutcome;
//!
//! let store = OrderStore::open("data/order_history.json");
//! let draft = OrderDraft::new(
//!     Instrument::forex("EURUSD"),
//!     Action::Buy,
//!     10_000.0,
//!     OrderKind::Limit { limit_price: 1.08 },
//! );
//! let id = store
//!     .append(NewOrder { draft, outcome: SubmissionOutcome::default() })
//!     .unwrap();
//! assert_eq!(store.find_by_id(id).unwrap().id, id);
//! ```

pub mod error;
pub mod record;
pub mod stats;
pub mod status;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use record::{BracketIds, NewOrder, OrderRecord, SubmissionOutcome};
pub use stats::HistoryStats;
pub use status::{LocalStatus, OrderStatus};
pub use store::{OrderStore, RecordFilter};
pub use types::{
    Action, BrokerOrderId, Instrument, InstrumentType, OptionRight, OrderDraft, OrderKind,
};
