//! Implements the `Store` trait using the `sheets::Client` to interact with a Google sheet.
//!
//! Cells are read as typed grid data rather than display text, so numbers arrive as numbers and
//! date-formatted cells become `Cell::Date` whatever the locale of the sheet.
//!
//! Authentication is not handled here. The access token is read from the token file before every
//! call, so an external tool can keep it fresh while the service runs.

use crate::api::{Store, StoreError, StoreResult};
use crate::error::Res;
use crate::model::{Cell, Row};
use crate::{utils, Config};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sheets::types::{
    BatchClearValuesRequest, BatchUpdateValuesRequest, CellData, Dimension, GridData,
    NumberFormatType, ValueInputOption, ValueRange,
};
use sheets::ClientError;
use std::path::PathBuf;
use tracing::{trace, warn};

/// The body of an error response from the Sheets API when a range names a tab that does not exist.
const UNKNOWN_TAB: &str = "Unable to parse range";

/// The widest range that is read from a tab.
const LAST_COLUMN: &str = "ZZ";

/// The parts of the token file that we use.
#[derive(Debug, Clone, Deserialize)]
struct TokenFile {
    access_token: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Implements the `Store` trait using the `sheets::Client`.
pub(super) struct GoogleSheet {
    spreadsheet_id: String,
    token_path: PathBuf,
}

impl GoogleSheet {
    pub(super) fn new(config: &Config) -> Res<Self> {
        anyhow::ensure!(
            !config.spreadsheet_id().is_empty(),
            "No spreadsheet is configured, set sheet_url in {}",
            config.config_path().display()
        );
        Ok(Self {
            spreadsheet_id: config.spreadsheet_id().to_string(),
            token_path: config.token_path(),
        })
    }

    /// Creates a new sheets client with the access token currently in the token file.
    async fn client(&self) -> Res<sheets::Client> {
        let token: TokenFile = utils::deserialize(&self.token_path)
            .await
            .context("Unable to load the OAuth token file")?;
        if let Some(expires_at) = token.expires_at {
            if expires_at <= Utc::now() {
                warn!(
                    "The access token in {} expired at {expires_at}",
                    self.token_path.display()
                );
            }
        }
        // The sheets crate wants client_id, client_secret, redirect_uri and a refresh token, none
        // of which are needed for API calls with an access token.
        Ok(sheets::Client::new(
            String::new(),
            String::new(),
            String::new(),
            token.access_token,
            String::new(),
        ))
    }
}

#[async_trait::async_trait]
impl Store for GoogleSheet {
    async fn read(&mut self, table: &str) -> StoreResult<Vec<Row>> {
        trace!("read {table}");
        let client = self.client().await?;
        let range = a1_range(table, 1, None, None);
        let response = client
            .spreadsheets()
            .get(&self.spreadsheet_id, true, &[range])
            .await
            .map_err(|e| store_error(table, e, "fetch"))?;
        Ok(response
            .body
            .sheets
            .into_iter()
            .next()
            .and_then(|sheet| sheet.data.into_iter().next())
            .map(|grid| grid_rows(&grid))
            .unwrap_or_default())
    }

    async fn write_range(
        &mut self,
        table: &str,
        start_row: usize,
        rows: &[Row],
    ) -> StoreResult<()> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return Ok(());
        }
        trace!("write {} rows to {table} at row {start_row}", rows.len());
        let client = self.client().await?;
        let end_row = start_row + rows.len() - 1;
        let request = BatchUpdateValuesRequest {
            data: vec![ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: a1_range(table, start_row, Some(end_row), Some(width)),
                values: rows
                    .iter()
                    .map(|row| row.iter().map(Cell::to_sheet_value).collect())
                    .collect(),
            }],
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };
        client
            .spreadsheets()
            .values_batch_update(&self.spreadsheet_id, &request)
            .await
            .map_err(|e| store_error(table, e, "write"))?;
        Ok(())
    }

    async fn clear_range(
        &mut self,
        table: &str,
        start_row: usize,
        end_row: usize,
        columns: usize,
    ) -> StoreResult<()> {
        if end_row < start_row || columns == 0 {
            return Ok(());
        }
        trace!("clear {table} rows {start_row}..={end_row}");
        let client = self.client().await?;
        let request = BatchClearValuesRequest {
            ranges: vec![a1_range(table, start_row, Some(end_row), Some(columns))],
        };
        client
            .spreadsheets()
            .values_batch_clear(&self.spreadsheet_id, &request)
            .await
            .map_err(|e| store_error(table, e, "clear"))?;
        Ok(())
    }
}

/// The rows of a grid read from A1, without trailing blank cells or rows.
fn grid_rows(grid: &GridData) -> Vec<Row> {
    let mut rows: Vec<Row> = grid
        .row_data
        .iter()
        .map(|row| {
            let mut cells: Row = row.values.iter().map(grid_cell).collect();
            while cells.last().is_some_and(Cell::is_blank) {
                cells.pop();
            }
            cells
        })
        .collect();
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }
    rows
}

/// Converts the effective value of a cell. Numbers stay numbers, and a number shown with a date
/// format is a serial date.
fn grid_cell(data: &CellData) -> Cell {
    let Some(value) = &data.effective_value else {
        return Cell::Empty;
    };
    if !value.string_value.is_empty() {
        return Cell::Text(value.string_value.clone());
    }
    // An unchecked checkbox comes back with no value fields set.
    if value.error_value.is_some() || value.bool_value || data.formatted_value == "FALSE" {
        return Cell::from(data.formatted_value.clone());
    }
    let format = data
        .effective_format
        .as_ref()
        .and_then(|f| f.number_format.as_ref())
        .and_then(|f| f.type_.as_ref());
    match format {
        Some(NumberFormatType::Date | NumberFormatType::DateTime) => {
            Cell::from_serial_date(value.number_value).unwrap_or(Cell::Number(value.number_value))
        }
        _ => Cell::Number(value.number_value),
    }
}

/// Builds an A1 range such as `'Ahorro e Inversiones'!A3:G9`. With no end row the range is open
/// ended, and with no width it extends to the last column we ever read.
fn a1_range(table: &str, start_row: usize, end_row: Option<usize>, width: Option<usize>) -> String {
    let last_column = width.map(column_letters);
    let last_column = last_column.as_deref().unwrap_or(LAST_COLUMN);
    let end_row = end_row.map(|n| n.to_string()).unwrap_or_default();
    let quoted = table.replace('\'', "''");
    format!("'{quoted}'!A{start_row}:{last_column}{end_row}")
}

/// Converts a column count into the letters of the last column, e.g. 1 is `A`, 13 is `M` and 27 is
/// `AA`.
fn column_letters(mut n: usize) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Distinguishes a missing tab from other failures.
fn store_error(table: &str, e: ClientError, verb: &str) -> StoreError {
    let text = format!("{e} {e:?}");
    if text.contains(UNKNOWN_TAB) {
        return StoreError::NotFound(table.to_string());
    }
    StoreError::Backend(
        map_client_error(e).context(format!("Failed to {verb} the {table} sheet")),
    )
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(7), "G");
        assert_eq!(column_letters(13), "M");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(702), "ZZ");
    }

    #[test]
    fn test_a1_range() {
        assert_eq!(a1_range("Movimientos", 1, None, None), "'Movimientos'!A1:ZZ");
        assert_eq!(
            a1_range("Ahorro e Inversiones", 3, Some(4), Some(7)),
            "'Ahorro e Inversiones'!A3:G4"
        );
        assert_eq!(a1_range("Mi 'hoja'", 2, Some(2), Some(1)), "'Mi ''hoja'''!A2:A2");
    }

    fn grid_cell_json(value: serde_json::Value) -> Cell {
        let data: CellData = serde_json::from_value(value).unwrap();
        grid_cell(&data)
    }

    #[test]
    fn test_grid_cell_types() {
        assert_eq!(grid_cell_json(serde_json::json!({})), Cell::Empty);
        assert_eq!(
            grid_cell_json(serde_json::json!({
                "effectiveValue": {"stringValue": "Banco Galicia"},
                "formattedValue": "Banco Galicia"
            })),
            Cell::from("Banco Galicia")
        );
        // A `#,##0` balance in an es-AR sheet shows as 1.500 but is the number 1500.
        assert_eq!(
            grid_cell_json(serde_json::json!({
                "effectiveValue": {"numberValue": 1500},
                "effectiveFormat": {"numberFormat": {"type": "NUMBER", "pattern": "#,##0"}},
                "formattedValue": "1.500"
            })),
            Cell::Number(1500.0)
        );
        assert_eq!(
            grid_cell_json(serde_json::json!({
                "effectiveValue": {},
                "formattedValue": "0"
            })),
            Cell::Number(0.0)
        );
        assert_eq!(
            grid_cell_json(serde_json::json!({
                "effectiveValue": {"boolValue": true},
                "formattedValue": "TRUE"
            })),
            Cell::from("TRUE")
        );
    }

    #[test]
    fn test_grid_cell_dates() {
        let date = grid_cell_json(serde_json::json!({
            "effectiveValue": {"numberValue": 45672},
            "effectiveFormat": {"numberFormat": {"type": "DATE", "pattern": "d/M/yyyy"}},
            "formattedValue": "15/1/2025"
        }));
        assert!(matches!(date, Cell::Date(_)));
        assert_eq!(date.date_text(), "2025-01-15");

        let stamp = grid_cell_json(serde_json::json!({
            "effectiveValue": {"numberValue": 45672.5},
            "effectiveFormat": {"numberFormat": {"type": "DATE_TIME"}},
            "formattedValue": "15/1/2025 12:00:00"
        }));
        assert_eq!(stamp.to_sheet_value(), "2025-01-15 12:00:00");
    }

    #[test]
    fn test_grid_rows_trim_blanks() {
        let grid: GridData = serde_json::from_value(serde_json::json!({
            "rowData": [
                {"values": [
                    {"effectiveValue": {"stringValue": "ID"}},
                    {"effectiveValue": {"stringValue": "Monto"}},
                    {}
                ]},
                {"values": [
                    {"effectiveValue": {"stringValue": "mov-1"}},
                    {"effectiveValue": {"numberValue": 84320.5}}
                ]},
                {},
                {"values": [{}]}
            ]
        }))
        .unwrap();
        let rows = grid_rows(&grid);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1][1], Cell::Number(84320.5));
    }

    #[test]
    fn test_token_file_without_expiry() {
        let token: TokenFile = serde_json::from_str(r#"{"access_token": "ya29.x"}"#).unwrap();
        assert_eq!(token.access_token, "ya29.x");
        assert!(token.expires_at.is_none());
    }
}
