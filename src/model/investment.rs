use crate::model::movement::or_default_currency;
use crate::model::{cell, lenient, Cell, Record, Row, DEFAULT_CURRENCY};
use serde::{Deserialize, Serialize};

/// An investment listed in the investments block of the Ahorro e Inversiones sheet.
///
/// `rate` is the percentage as text without the `%` sign, e.g. `"38.5"`. The sheet stores it with
/// the sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Investment {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "nombre", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "tipo", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::number")]
    pub capital: f64,
    #[serde(rename = "moneda", deserialize_with = "lenient::text")]
    pub currency: String,
    #[serde(rename = "tasa", deserialize_with = "lenient::text")]
    pub rate: String,
    #[serde(rename = "fechaInicio", deserialize_with = "lenient::text")]
    pub start_date: String,
    #[serde(rename = "fechaVto", deserialize_with = "lenient::text")]
    pub due_date: String,
    /// Zero means "not known", in which case the capital is used.
    #[serde(rename = "valorActual", deserialize_with = "lenient::number")]
    pub current_value: f64,
}

impl Default for Investment {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            kind: String::new(),
            capital: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            rate: String::from("0"),
            start_date: String::new(),
            due_date: String::new(),
            current_value: 0.0,
        }
    }
}

impl Investment {
    /// The current value, falling back to the capital when no current value is known.
    pub fn current_value_or_capital(&self) -> f64 {
        if self.current_value == 0.0 {
            self.capital
        } else {
            self.current_value
        }
    }
}

impl Record for Investment {
    const WIDTH: usize = 8;

    fn from_row(row: &[Cell]) -> Self {
        let capital = cell(row, 2).number_or_zero();
        let rate = cell(row, 4).text().replacen('%', "", 1);
        let mut investment = Self {
            id: String::new(),
            name: cell(row, 0).text(),
            kind: cell(row, 1).text(),
            capital,
            currency: cell(row, 3).text_or(DEFAULT_CURRENCY),
            rate: if rate.is_empty() { "0".into() } else { rate },
            start_date: cell(row, 5).date_text(),
            due_date: cell(row, 6).date_text(),
            current_value: cell(row, 7).number_or_zero(),
        };
        investment.current_value = investment.current_value_or_capital();
        investment
    }

    fn to_row(&self) -> Row {
        let rate = if self.rate.is_empty() {
            "0"
        } else {
            self.rate.as_str()
        };
        vec![
            Cell::from(self.name.as_str()),
            Cell::from(self.kind.as_str()),
            Cell::from(self.capital),
            Cell::from(or_default_currency(&self.currency)),
            Cell::from(format!("{rate}%")),
            Cell::from(self.start_date.as_str()),
            Cell::from(self.due_date.as_str()),
            Cell::from(self.current_value_or_capital()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_strips_percent() {
        let inv = Investment::from_row(&[
            Cell::from("Plazo fijo"),
            Cell::from("Plazo fijo"),
            Cell::from("1000000"),
            Cell::from("ARS"),
            Cell::from("38.5%"),
            Cell::from("2025-01-02"),
            Cell::from("2025-02-01"),
            Cell::from("1031643"),
        ]);
        assert_eq!(inv.rate, "38.5");
        assert_eq!(inv.capital, 1000000.0);
        assert_eq!(inv.current_value, 1031643.0);
    }

    #[test]
    fn test_defaults_for_missing_cells() {
        let inv = Investment::from_row(&[Cell::from("FCI"), Cell::from("Money market")]);
        assert_eq!(inv.currency, "ARS");
        assert_eq!(inv.rate, "0");
        assert_eq!(inv.capital, 0.0);
        assert_eq!(inv.current_value, 0.0);
    }

    #[test]
    fn test_current_value_defaults_to_capital() {
        let inv = Investment::from_row(&[
            Cell::from("Bono"),
            Cell::from("Renta fija"),
            Cell::from("500"),
            Cell::from("USD"),
            Cell::from("7%"),
        ]);
        assert_eq!(inv.current_value, 500.0);

        let client = Investment {
            capital: 200.0,
            current_value: 0.0,
            ..Investment::default()
        };
        assert_eq!(client.to_row()[7], Cell::Number(200.0));
    }

    #[test]
    fn test_round_trip_re_adds_percent() {
        let original = vec![
            Cell::from("Cedear"),
            Cell::from("Acciones"),
            Cell::Number(300.0),
            Cell::from("USD"),
            Cell::from("12%"),
            Cell::from("2024-11-01"),
            Cell::Empty,
            Cell::Number(345.5),
        ];
        let written = Investment::from_row(&original).to_row();
        assert_eq!(written, original);
    }

    #[test]
    fn test_numeric_rate_from_client() {
        let inv: Investment = serde_json::from_str(r#"{"nombre": "PF", "tasa": 40}"#).unwrap();
        assert_eq!(inv.rate, "40");
        assert_eq!(inv.to_row()[4], Cell::from("40%"));
    }
}
