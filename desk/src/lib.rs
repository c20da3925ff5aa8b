//! orderdesk-cli: interactive order desk for Interactive Brokers.
//!
//! Validates orders, places them through an [`orderdesk_broker::OrderGateway`],
//! keeps a JSON order history and an audit trail, and can clone, cancel and
//! reconcile orders against the live gateway. Also reports account values,
//! positions and quotes.

pub mod audit;
pub mod cancel;
pub mod clone;
pub mod config;
pub mod desk;
pub mod display;
pub mod error;
pub mod lifecycle;
pub mod prompt;
pub mod quotes;

pub use cancel::{CancelAllReport, CancelOutcome, CancelReport, RecordCancelReport, SyncReport};
pub use clone::{CloneOverrides, clone_draft};
pub use config::Config;
pub use desk::{AccountOverview, OrderDesk, Pacing};
pub use error::{Error, Result};
pub use lifecycle::Submitted;
pub use quotes::{QuoteResult, fetch_quotes};
