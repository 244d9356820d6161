use crate::model::{cell, lenient, Cell, Record, Row};
use serde::{Deserialize, Serialize};

/// Represents a single row from the Tarjetas sheet: one installment of a credit card purchase.
///
/// All installments of one purchase share a `group_id`. The sheet has 13 columns, but only the first
/// seven are ever written back (see `to_row`); the remaining columns are maintained in the sheet.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardInstallment {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "fechaCompra", deserialize_with = "lenient::text")]
    pub purchase_date: String,
    #[serde(rename = "tarjeta", deserialize_with = "lenient::text")]
    pub card: String,
    #[serde(rename = "descripcion", deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(rename = "montoTotal", deserialize_with = "lenient::number")]
    pub total_amount: f64,
    #[serde(rename = "cuotasTotales", deserialize_with = "lenient::count")]
    pub total_installments: u32,
    #[serde(rename = "cuotaActual", deserialize_with = "lenient::count")]
    pub current_installment: u32,
    #[serde(rename = "montoCuota", deserialize_with = "lenient::number")]
    pub installment_amount: f64,
    #[serde(rename = "fechaCierre", deserialize_with = "lenient::text")]
    pub closing_date: String,
    #[serde(rename = "fechaVto", deserialize_with = "lenient::text")]
    pub due_date: String,
    #[serde(rename = "estado", deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(rename = "idGrupo", deserialize_with = "lenient::text")]
    pub group_id: String,
    #[serde(rename = "mesImputacion", deserialize_with = "lenient::text")]
    pub posting_month: String,
    /// Sent by the client when adding a purchase. It is not a column of its own when reading.
    #[serde(
        rename = "categoria",
        deserialize_with = "lenient::text",
        skip_serializing_if = "String::is_empty"
    )]
    pub category: String,
}

impl CardInstallment {
    /// The number of columns that exist in the Tarjetas sheet and are cleared on sync.
    pub const SHEET_WIDTH: usize = 13;
}

impl Record for CardInstallment {
    const WIDTH: usize = 7;

    fn from_row(row: &[Cell]) -> Self {
        Self {
            id: cell(row, 0).text(),
            purchase_date: cell(row, 1).date_text(),
            card: cell(row, 2).text(),
            description: cell(row, 3).text(),
            total_amount: cell(row, 4).number_or_zero(),
            total_installments: cell(row, 5).count(),
            current_installment: cell(row, 6).count(),
            installment_amount: cell(row, 7).number_or_zero(),
            closing_date: cell(row, 8).date_text(),
            due_date: cell(row, 9).date_text(),
            status: cell(row, 10).text(),
            group_id: cell(row, 11).text(),
            posting_month: cell(row, 12).date_text(),
            category: String::new(),
        }
    }

    /// The write layout of the sheet is `id, purchase date, card, description, total, installment
    /// count, category`. The seventh column is written with the category even though it is read
    /// as the current installment; existing sheets depend on these offsets.
    fn to_row(&self) -> Row {
        vec![
            Cell::from(self.id.as_str()),
            Cell::from(self.purchase_date.as_str()),
            Cell::from(self.card.as_str()),
            Cell::from(self.description.as_str()),
            Cell::from(self.total_amount),
            Cell::from(self.total_installments),
            Cell::from(self.category.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Row {
        values.iter().map(|v| Cell::from(*v)).collect()
    }

    #[test]
    fn test_from_row() {
        let c = CardInstallment::from_row(&row(&[
            "t-1",
            "2025-01-10",
            "Visa",
            "Heladera",
            "600000",
            "6",
            "2",
            "100000",
            "2025-02-20",
            "2025-03-05",
            "Pendiente",
            "g-1",
            "2025-03",
        ]));
        assert_eq!(c.id, "t-1");
        assert_eq!(c.card, "Visa");
        assert_eq!(c.total_amount, 600000.0);
        assert_eq!(c.total_installments, 6);
        assert_eq!(c.current_installment, 2);
        assert_eq!(c.installment_amount, 100000.0);
        assert_eq!(c.closing_date, "2025-02-20");
        assert_eq!(c.due_date, "2025-03-05");
        assert_eq!(c.status, "Pendiente");
        assert_eq!(c.group_id, "g-1");
        assert_eq!(c.posting_month, "2025-03");
        assert_eq!(c.category, "");
    }

    #[test]
    fn test_write_layout() {
        let c = CardInstallment {
            id: "t-9".into(),
            purchase_date: "2025-04-01".into(),
            card: "Master".into(),
            description: "Zapatillas".into(),
            total_amount: 90000.0,
            total_installments: 3,
            current_installment: 1,
            category: "Ropa".into(),
            ..CardInstallment::default()
        };
        let written = c.to_row();
        assert_eq!(written.len(), CardInstallment::WIDTH);
        assert_eq!(written[5], Cell::Number(3.0));
        assert_eq!(written[6], Cell::from("Ropa"));
    }

    #[test]
    fn test_category_omitted_when_empty() {
        let json = serde_json::to_value(CardInstallment::default()).unwrap();
        assert!(json.get("categoria").is_none());
        assert_eq!(json["cuotasTotales"], 0);
        assert_eq!(json["idGrupo"], "");
    }

    #[test]
    fn test_deserialize_from_client() {
        let json = r#"{
            "id": "t-2",
            "fechaCompra": "2025-05-02",
            "tarjeta": "Visa",
            "descripcion": "Notebook",
            "montoTotal": 1200000,
            "cuotasTotales": "12",
            "categoria": "Tecnología"
        }"#;
        let c: CardInstallment = serde_json::from_str(json).unwrap();
        assert_eq!(c.total_amount, 1200000.0);
        assert_eq!(c.total_installments, 12);
        assert_eq!(c.category, "Tecnología");
    }
}
