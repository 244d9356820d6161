use crate::model::{cell, lenient, Cell, Record, Row};
use serde::{Deserialize, Serialize};

/// The status of a goal that does not state one.
pub(crate) const DEFAULT_GOAL_STATUS: &str = "Activa";

/// A savings goal listed in the goals block of the Ahorro e Inversiones sheet.
///
/// Columns are `name, target, saved, progress, deadline, status, notes`. Progress and notes are
/// not part of the record; they are blanked when goals are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavingsGoal {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "nombre", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "objetivo", deserialize_with = "lenient::number")]
    pub target_amount: f64,
    #[serde(rename = "ahorrado", deserialize_with = "lenient::number")]
    pub saved_amount: f64,
    #[serde(rename = "fechaLimite", deserialize_with = "lenient::text")]
    pub deadline: String,
    #[serde(rename = "estado", deserialize_with = "lenient::text")]
    pub status: String,
}

impl Default for SavingsGoal {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            target_amount: 0.0,
            saved_amount: 0.0,
            deadline: String::new(),
            status: DEFAULT_GOAL_STATUS.to_string(),
        }
    }
}

impl Record for SavingsGoal {
    const WIDTH: usize = 7;

    fn from_row(row: &[Cell]) -> Self {
        Self {
            id: String::new(),
            name: cell(row, 0).text(),
            target_amount: cell(row, 1).number_or_zero(),
            saved_amount: cell(row, 2).number_or_zero(),
            deadline: cell(row, 4).date_text(),
            status: cell(row, 5).text_or(DEFAULT_GOAL_STATUS),
        }
    }

    fn to_row(&self) -> Row {
        let status = if self.status.is_empty() {
            DEFAULT_GOAL_STATUS
        } else {
            self.status.as_str()
        };
        vec![
            Cell::from(self.name.as_str()),
            Cell::from(self.target_amount),
            Cell::from(self.saved_amount),
            Cell::Empty,
            Cell::from(self.deadline.as_str()),
            Cell::from(status),
            Cell::Empty,
        ]
    }
}
