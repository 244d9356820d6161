//! Types that represent the core data model, such as `Movement` and `Investment`, and the mapping
//! between them and sheet rows.
mod balance;
mod card;
mod cell;
mod goal;
mod investment;
mod lenient;
mod movement;

pub use balance::{AccountBalance, NetWorth};
pub use card::CardInstallment;
pub use cell::Cell;
pub use goal::SavingsGoal;
pub use investment::Investment;
pub use movement::Movement;

pub(crate) use cell::cell;

use serde::{Deserialize, Serialize};

/// One sheet row.
pub type Row = Vec<Cell>;

/// The currency used whenever a record does not name one.
pub const DEFAULT_CURRENCY: &str = "ARS";

/// A record that corresponds to exactly one sheet row.
pub trait Record: Sized {
    /// The number of columns produced by `to_row`.
    const WIDTH: usize;

    /// Builds the record from a row. Never fails: unreadable cells become defaults.
    fn from_row(row: &[Cell]) -> Self;

    /// The row that is written to the sheet for this record.
    fn to_row(&self) -> Row;
}

/// Everything that `getData` returns, keyed by the names the client uses.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceData {
    #[serde(rename = "movimientos")]
    pub movements: Vec<Movement>,
    #[serde(rename = "tarjetas")]
    pub cards: Vec<CardInstallment>,
    #[serde(rename = "patrimonio")]
    pub net_worth: NetWorth,
    #[serde(rename = "metas")]
    pub goals: Vec<SavingsGoal>,
    #[serde(rename = "inversiones")]
    pub investments: Vec<Investment>,
}

/// The `data` of a `sync` request. Only the entities that are present get synced.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPayload {
    #[serde(rename = "movimientos", skip_serializing_if = "Option::is_none")]
    pub movements: Option<Vec<Movement>>,
    #[serde(rename = "tarjetas", skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardInstallment>>,
    #[serde(rename = "patrimonio", skip_serializing_if = "Option::is_none")]
    pub net_worth: Option<NetWorth>,
    #[serde(rename = "metas", skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<SavingsGoal>>,
    #[serde(rename = "inversiones", skip_serializing_if = "Option::is_none")]
    pub investments: Option<Vec<Investment>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finance_data_uses_client_keys() {
        let json = serde_json::to_value(FinanceData::default()).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["movimientos", "tarjetas", "patrimonio", "metas", "inversiones"] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(json["movimientos"], serde_json::json!([]));
        assert_eq!(json["patrimonio"], serde_json::json!({"ars": [], "usd": []}));
    }

    #[test]
    fn test_sync_payload_absent_vs_empty() {
        let payload: SyncPayload =
            serde_json::from_str(r#"{"movimientos": [], "metas": null}"#).unwrap();
        assert_eq!(payload.movements, Some(Vec::new()));
        assert!(payload.goals.is_none());
        assert!(payload.cards.is_none());
    }
}
