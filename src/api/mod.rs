//! The `Store` trait, which abstracts the spreadsheet, and its two implementations: `GoogleSheet`
//! for a real Google sheet and `MemoryStore` for running without one.

mod google;
mod memory;

pub use memory::MemoryStore;

use crate::error::Res;
use crate::model::Row;
use crate::Config;
use std::fmt::{Display, Formatter};
use tracing::debug;

/// When this environment variable is set (and not empty) the app uses a seeded `MemoryStore`
/// instead of talking to Google.
pub const FINANZAS_IN_TEST_MODE: &str = "FINANZAS_IN_TEST_MODE";

/// The message given when a tab does not exist in the workbook.
pub const SHEET_NOT_FOUND: &str = "Sheet not found";

/// Selects the store backend.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    /// Returns `Mode::Test` if `FINANZAS_IN_TEST_MODE` is set to a non-empty value, otherwise
    /// `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(FINANZAS_IN_TEST_MODE) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Errors returned by a `Store`.
#[derive(Debug)]
pub enum StoreError {
    /// The named tab does not exist.
    NotFound(String),
    /// Anything else that went wrong while talking to the backend.
    Backend(anyhow::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(table) => write!(f, "{SHEET_NOT_FOUND}: '{table}'"),
            StoreError::Backend(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Backend(e)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A workbook made of named tables (tabs), each of which is a grid of cells. Row numbers are
/// 1-based, like in a spreadsheet.
#[async_trait::async_trait]
pub trait Store: Send {
    /// Reads the used range of `table`, starting at row 1.
    async fn read(&mut self, table: &str) -> StoreResult<Vec<Row>>;

    /// Writes `rows` into `table` starting at `start_row` and column A. Cells beyond the width of
    /// each row are left alone.
    async fn write_range(&mut self, table: &str, start_row: usize, rows: &[Row])
        -> StoreResult<()>;

    /// Clears the first `columns` columns of rows `start_row..=end_row`.
    async fn clear_range(
        &mut self,
        table: &str,
        start_row: usize,
        end_row: usize,
        columns: usize,
    ) -> StoreResult<()>;

    /// Writes `row` below the last row that has any content and returns its row number.
    async fn append_row(&mut self, table: &str, row: Row) -> StoreResult<usize> {
        let rows = self.read(table).await?;
        let row_number = last_used_row(&rows) + 1;
        self.write_range(table, row_number, std::slice::from_ref(&row))
            .await?;
        Ok(row_number)
    }
}

/// The 1-based number of the last row with a non-blank cell, or 0 for an empty table.
pub(crate) fn last_used_row(rows: &[Row]) -> usize {
    rows.iter()
        .rposition(|row| row.iter().any(|c| !c.is_blank()))
        .map(|ix| ix + 1)
        .unwrap_or(0)
}

/// Creates the store selected by `mode`.
pub(crate) fn store(config: &Config, mode: Mode) -> Res<Box<dyn Store>> {
    match mode {
        Mode::Google => {
            debug!("Using the Google sheet {}", config.spreadsheet_id());
            Ok(Box::new(google::GoogleSheet::new(config)?))
        }
        Mode::Test => {
            debug!("Using the in-memory store");
            Ok(Box::new(MemoryStore::seeded(config.sheets())?))
        }
    }
}
