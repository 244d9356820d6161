use crate::model::{cell, lenient, Cell, Record, Row, DEFAULT_CURRENCY};
use serde::{Deserialize, Serialize};

/// Represents a single row from the Movimientos sheet: one income or expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movement {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "fecha", deserialize_with = "lenient::text")]
    pub date: String,
    #[serde(rename = "tipo", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(rename = "categoria", deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(rename = "descripcion", deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(rename = "monto", deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(rename = "medioPago", deserialize_with = "lenient::text")]
    pub payment_method: String,
    #[serde(rename = "moneda", deserialize_with = "lenient::text")]
    pub currency: String,
    #[serde(rename = "notas", deserialize_with = "lenient::text")]
    pub notes: String,
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            id: String::new(),
            date: String::new(),
            kind: String::new(),
            category: String::new(),
            description: String::new(),
            amount: 0.0,
            payment_method: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            notes: String::new(),
        }
    }
}

impl Record for Movement {
    const WIDTH: usize = 9;

    fn from_row(row: &[Cell]) -> Self {
        Self {
            id: cell(row, 0).text(),
            date: cell(row, 1).date_text(),
            kind: cell(row, 2).text(),
            category: cell(row, 3).text(),
            description: cell(row, 4).text(),
            amount: cell(row, 5).number_or_zero(),
            payment_method: cell(row, 6).text(),
            currency: cell(row, 7).text_or(DEFAULT_CURRENCY),
            notes: cell(row, 8).text(),
        }
    }

    fn to_row(&self) -> Row {
        vec![
            Cell::from(self.id.as_str()),
            Cell::from(self.date.as_str()),
            Cell::from(self.kind.as_str()),
            Cell::from(self.category.as_str()),
            Cell::from(self.description.as_str()),
            Cell::from(self.amount),
            Cell::from(self.payment_method.as_str()),
            Cell::from(or_default_currency(&self.currency)),
            Cell::from(self.notes.as_str()),
        ]
    }
}

pub(super) fn or_default_currency(currency: &str) -> &str {
    if currency.is_empty() {
        DEFAULT_CURRENCY
    } else {
        currency
    }
}
