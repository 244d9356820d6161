//! A JSON API for personal finance records kept in a Google sheet.
//!
//! The `Dispatcher` turns requests into reads and writes of a `Workbook`, which reaches the sheet
//! through a `Store`. The `server` module puts the dispatcher behind HTTP.

mod api;
pub mod args;
pub mod commands;
mod config;
mod dispatch;
mod error;
pub mod model;
mod sections;
mod server;
mod utils;
mod workbook;

#[cfg(test)]
mod test;

pub use api::{MemoryStore, Mode, Store, StoreError, StoreResult};
pub use config::{Config, SheetNames};
pub use dispatch::{Body, Dispatcher, Envelope};
pub use error::{Error, ErrorType, Result};
pub use server::router;
pub use workbook::{SyncOutcome, SyncResults, Workbook};
