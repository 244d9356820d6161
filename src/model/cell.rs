//! The `Cell` type and the lenient coercions used when mapping sheet rows to records.
//!
//! Nothing in here fails. A cell that cannot be read as the requested type silently becomes a
//! default value (`0`, `""`, or whatever default the caller provides). This is intentional: the
//! sheets are edited by hand and a stray label in a numeric column must not break a whole read.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::fmt::{Display, Formatter};

/// Buenos Aires is UTC-03:00 all year round (no daylight saving time since 2009).
const BUENOS_AIRES_OFFSET_HOURS: i64 = 3;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A single cell value as read from, or written to, a sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// A native date value. Only produced by stores that know cell types, and by us when writing a
    /// timestamp.
    Date(DateTime<Utc>),
}

pub(crate) static EMPTY: Cell = Cell::Empty;

/// Returns the cell at `ix`, or an empty cell if the row is too short.
pub(crate) fn cell(row: &[Cell], ix: usize) -> &Cell {
    row.get(ix).unwrap_or(&EMPTY)
}

impl Cell {
    /// True for an empty cell or for text with no characters.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Number(_) | Cell::Date(_) => false,
        }
    }

    /// True only for a number cell. Text that happens to look like a number does not count.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Number(_))
    }

    /// A value the way a sheet stores typed input: a plain decimal becomes a number, anything else
    /// stays text.
    pub(crate) fn entered(value: &str) -> Cell {
        match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::from(value),
        }
    }

    /// A date given as a sheet serial number, i.e. days since 1899-12-30 in the sheet's wall-clock
    /// time (Buenos Aires) with the time of day as the fraction.
    pub(crate) fn from_serial_date(serial: f64) -> Option<Cell> {
        if !serial.is_finite() {
            return None;
        }
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
        let millis = (serial * MILLIS_PER_DAY).round() as i64;
        let local = epoch.checked_add_signed(Duration::milliseconds(millis))?;
        let utc = local.checked_add_signed(Duration::hours(BUENOS_AIRES_OFFSET_HOURS))?;
        Some(Cell::Date(Utc.from_utc_datetime(&utc)))
    }

    /// The string form of the cell.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => format_date(d),
        }
    }

    /// The string form of the cell, or `default` when the cell is blank.
    pub fn text_or(&self, default: &str) -> String {
        if self.is_blank() {
            default.to_string()
        } else {
            self.text()
        }
    }

    /// A native date becomes `yyyy-MM-dd` in Buenos Aires time. Anything else passes through as
    /// its string form, including dates that were already formatted as text.
    pub fn date_text(&self) -> String {
        self.text()
    }

    /// The numeric value of the cell, if it has one.
    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_number(s),
            Cell::Empty | Cell::Date(_) => None,
        }
    }

    /// The numeric value of the cell, or `0` when it is empty or not a number.
    pub fn number_or_zero(&self) -> f64 {
        self.number().unwrap_or(0.0)
    }

    /// A non-negative whole number, e.g. an installment count.
    pub fn count(&self) -> u32 {
        to_count(self.number_or_zero())
    }

    /// The string that is sent to a sheet when writing this cell. Dates carry their time of day.
    pub fn to_sheet_value(&self) -> String {
        match self {
            Cell::Date(d) => buenos_aires(d).format("%Y-%m-%d %H:%M:%S").to_string(),
            other => other.text(),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<String> for Cell {
    /// An empty string is an empty cell.
    fn from(value: String) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::Date(value)
    }
}

fn buenos_aires(d: &DateTime<Utc>) -> chrono::NaiveDateTime {
    d.naive_utc() - Duration::hours(BUENOS_AIRES_OFFSET_HOURS)
}

fn format_date(d: &DateTime<Utc>) -> String {
    buenos_aires(d).format("%Y-%m-%d").to_string()
}

pub(crate) fn to_count(n: f64) -> u32 {
    if n.is_finite() && n > 0.0 {
        n.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Reads a number the way a person would have typed it into a sheet.
///
/// A plain decimal (`1500`, `-12.5`, `1e3`) is taken as is. Otherwise we accept money formatting:
/// an optional sign, an optional currency symbol (`$`, `US$`, `U$S`, `ARS`, `USD`), spaces, and
/// either `,` or `.` as the thousands separator.
///
/// Separator rules for the money form:
/// - both `,` and `.` present: whichever comes last is the decimal separator.
/// - one kind repeated: it is the thousands separator.
/// - a single separator followed by exactly three digits: thousands separator.
/// - any other single separator: decimal separator.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return n.is_finite().then_some(n);
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let (negative, unsigned) = match compact.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, compact.as_str()),
    };
    let without_symbol = CURRENCY_SYMBOLS
        .iter()
        .find_map(|symbol| unsigned.strip_prefix(symbol))
        .unwrap_or(unsigned);
    // A sign may also come after the symbol, e.g. `$-50`.
    let (negative, digits) = match without_symbol.strip_prefix('-') {
        Some(rest) => (!negative, rest),
        None => (negative, without_symbol),
    };

    if digits.is_empty()
        || !digits.starts_with(|c: char| c.is_ascii_digit())
        || !digits
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return None;
    }

    let normalized = normalize_separators(digits);
    let value = normalized.parse::<f64>().ok().filter(|n| n.is_finite())?;
    Some(if negative { -value } else { value })
}

const CURRENCY_SYMBOLS: &[&str] = &["US$", "U$S", "ARS", "USD", "$"];

fn normalize_separators(digits: &str) -> String {
    let commas = digits.matches(',').count();
    let dots = digits.matches('.').count();
    let decimal = match (commas, dots) {
        (0, 0) => None,
        (c, d) if c > 0 && d > 0 => {
            let last_comma = digits.rfind(',');
            let last_dot = digits.rfind('.');
            if last_comma > last_dot {
                Some(',')
            } else {
                Some('.')
            }
        }
        (1, 0) => single_separator(digits, ','),
        (0, 1) => single_separator(digits, '.'),
        _ => None,
    };

    let mut out = String::with_capacity(digits.len());
    for c in digits.chars() {
        match c {
            ',' | '.' if Some(c) == decimal => out.push('.'),
            ',' | '.' => {}
            other => out.push(other),
        }
    }
    out
}

fn single_separator(digits: &str, separator: char) -> Option<char> {
    let after = digits.rsplit(separator).next().unwrap_or_default();
    if after.len() == 3 {
        None
    } else {
        Some(separator)
    }
}
