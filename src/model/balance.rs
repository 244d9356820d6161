use crate::model::{cell, lenient, Cell, Record, Row};
use serde::{Deserialize, Serialize};

/// One account listed in the Patrimonio sheet.
///
/// The sheet has no id column. Ids are synthesized while reading as `ars-N` or `usd-N`, so they
/// are only unique within a single read.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountBalance {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "nombre", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "tipo", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(rename = "saldo", deserialize_with = "lenient::number")]
    pub balance: f64,
}

impl Record for AccountBalance {
    const WIDTH: usize = 3;

    fn from_row(row: &[Cell]) -> Self {
        Self {
            id: String::new(),
            name: cell(row, 0).text(),
            kind: cell(row, 1).text(),
            balance: cell(row, 2).number_or_zero(),
        }
    }

    fn to_row(&self) -> Row {
        vec![
            Cell::from(self.name.as_str()),
            Cell::from(self.kind.as_str()),
            Cell::from(self.balance),
        ]
    }
}

/// The accounts of the Patrimonio sheet, split by the currency section they are listed under.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetWorth {
    #[serde(rename = "ars")]
    pub local: Vec<AccountBalance>,
    #[serde(rename = "usd")]
    pub foreign: Vec<AccountBalance>,
}
