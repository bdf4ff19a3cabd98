// Application layer: the aggregation core, the ledger seam it reads through,
// and the service that clients (CLI, exporters) drive.

pub mod aggregator;
pub mod error;
pub mod ledger;
pub mod reporting;
pub mod service;

pub use aggregator::*;
pub use error::*;
pub use ledger::{CategoryAggregate, Ledger};
pub use reporting::*;
pub use service::*;
