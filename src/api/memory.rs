//! Implements the `Store` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::{Store, StoreError, StoreResult};
use crate::config::SheetNames;
use crate::error::Res;
use crate::model::{Cell, Row};
use anyhow::{ensure, Context};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::Mutex;

/// An implementation of the `Store` trait that holds its tables in memory. Clones share the same
/// tables, so a test can keep a handle and look at what the app wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Vec<Row>>>>,
}

impl MemoryStore {
    /// Creates a `MemoryStore` holding `tables`. The map key is the tab name and the map value is
    /// the rows of the tab.
    pub fn new(tables: HashMap<String, Vec<Row>>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    /// Creates a `MemoryStore` seeded with a small sample workbook, using `names` for the tabs.
    pub fn seeded(names: &SheetNames) -> Res<Self> {
        let mut tables = HashMap::new();
        tables.insert(names.movements.clone(), load_csv(MOVEMENT_DATA)?);
        tables.insert(names.cards.clone(), load_csv(CARD_DATA)?);
        tables.insert(names.net_worth.clone(), load_csv(NET_WORTH_DATA)?);
        tables.insert(names.savings.clone(), load_csv(SAVINGS_DATA)?);
        Ok(Self::new(tables))
    }

    /// A copy of the rows currently held for `table`.
    pub async fn table(&self, table: &str) -> Option<Vec<Row>> {
        self.tables.lock().await.get(table).cloned()
    }

    /// Replaces (or creates) `table`.
    pub async fn set_table(&self, table: impl Into<String>, rows: Vec<Row>) {
        self.tables.lock().await.insert(table.into(), rows);
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn read(&mut self, table: &str) -> StoreResult<Vec<Row>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::NotFound(table.to_string()))?;
        // Like the Sheets API, trailing empty rows are not part of the used range.
        let used = rows
            .iter()
            .rposition(|row| row.iter().any(|c| !c.is_blank()))
            .map(|ix| ix + 1)
            .unwrap_or(0);
        Ok(rows[..used].to_vec())
    }

    async fn write_range(
        &mut self,
        table: &str,
        start_row: usize,
        rows: &[Row],
    ) -> StoreResult<()> {
        check_row_number(start_row)?;
        let mut tables = self.tables.lock().await;
        let existing = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::NotFound(table.to_string()))?;
        let first = start_row - 1;
        if existing.len() < first + rows.len() {
            existing.resize(first + rows.len(), Row::new());
        }
        for (offset, row) in rows.iter().enumerate() {
            let target = &mut existing[first + offset];
            if target.len() < row.len() {
                target.resize(row.len(), Cell::Empty);
            }
            target[..row.len()].clone_from_slice(row);
        }
        Ok(())
    }

    async fn clear_range(
        &mut self,
        table: &str,
        start_row: usize,
        end_row: usize,
        columns: usize,
    ) -> StoreResult<()> {
        check_row_number(start_row)?;
        let mut tables = self.tables.lock().await;
        let existing = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::NotFound(table.to_string()))?;
        for row in existing
            .iter_mut()
            .skip(start_row - 1)
            .take((end_row + 1).saturating_sub(start_row))
        {
            for c in row.iter_mut().take(columns) {
                *c = Cell::Empty;
            }
        }
        Ok(())
    }
}

fn check_row_number(row_number: usize) -> Res<()> {
    ensure!(row_number >= 1, "Row numbers start at 1, got {row_number}");
    Ok(())
}

/// Loads rows from a CSV-formatted string, typed the way a sheet types what is entered into it.
/// Empty fields become empty cells.
fn load_csv(csv_data: &str) -> Res<Vec<Row>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.context("Unable to parse seed data")?;
        rows.push(record.iter().map(Cell::entered).collect());
    }
    Ok(rows)
}

/// Seed Movimientos data.
const MOVEMENT_DATA: &str = r##"ID,Fecha,Tipo,Categoría,Descripción,Monto,Medio de pago,Moneda,Notas
mov-001,2025-03-01,Ingreso,Sueldo,Sueldo marzo,1850000,Transferencia,ARS,
mov-002,2025-03-02,Gasto,Supermercado,Coto,"$ 84.320,50",Débito,ARS,
mov-003,2025-03-04,Gasto,Servicios,Edenor,32150,Débito automático,ARS,bimestral
mov-004,2025-03-06,Gasto,Transporte,Carga SUBE,10000,Mercado Pago,ARS,
mov-005,2025-03-08,Gasto,Suscripciones,Netflix,12.99,Tarjeta,USD,
"##;

/// Seed Tarjetas data.
const CARD_DATA: &str = r##"ID,Fecha compra,Tarjeta,Descripción,Monto total,Cuotas,Cuota actual,Monto cuota,Fecha cierre,Fecha vto,Estado,ID grupo,Mes imputación
tj-001-1,2025-01-15,Visa Galicia,Heladera,900000,6,1,150000,2025-01-23,2025-02-05,Pagada,tj-001,2025-02
tj-001-2,2025-01-15,Visa Galicia,Heladera,900000,6,2,150000,2025-02-20,2025-03-05,Pendiente,tj-001,2025-03
tj-002-1,2025-02-10,Master BBVA,Zapatillas,120000,3,1,40000,2025-02-20,2025-03-05,Pendiente,tj-002,2025-03
"##;

/// Seed Patrimonio data. Local accounts start at row 5, foreign accounts two rows below the
/// `Cuentas en USD` row.
const NET_WORTH_DATA: &str = r##"PATRIMONIO NETO
,
Cuentas en ARS
Cuenta,Tipo,Saldo,Actualizado
Banco Galicia,Caja de ahorro,420000,2025-03-01 10:00:00
Mercado Pago,Billetera virtual,75500,2025-03-01 10:00:00
Efectivo,Efectivo,30000,2025-03-01 10:00:00
TOTAL ARS,,525500
,
Cuentas en USD
Cuenta,Tipo,Saldo,Actualizado
Caja Galicia,Caja de ahorro,1500,2025-03-01 10:00:00
Billetes,Efectivo,800,2025-03-01 10:00:00
TOTAL USD,,2300
"##;

/// Seed Ahorro e Inversiones data. Goals start at row 3, investments two rows below the
/// `INVERSIONES` row.
const SAVINGS_DATA: &str = r##"METAS DE AHORRO
Meta,Objetivo,Ahorrado,Progreso,Fecha límite,Estado,Notas
Vacaciones,1500000,450000,30%,2025-12-15,Activa,
Fondo de emergencia,3000000,3000000,100%,,Cumplida,
,
INVERSIONES
Instrumento,Tipo,Capital,Moneda,Tasa,Fecha inicio,Fecha vto,Valor actual
Plazo fijo Galicia,Plazo fijo,1000000,ARS,32%,2025-02-20,2025-03-22,1026301
Cedear SPY,Acciones,500,USD,0%,2024-11-05,,548
TOTAL,,,,,,,
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::last_used_row;

    #[tokio::test]
    async fn test_seed_layout() {
        let names = SheetNames::default();
        let store = MemoryStore::seeded(&names).unwrap();
        let net_worth = store.table(&names.net_worth).await.unwrap();
        assert_eq!(net_worth[4][0], Cell::from("Banco Galicia"));
        assert_eq!(net_worth[4][2], Cell::Number(420000.0));
        let savings = store.table(&names.savings).await.unwrap();
        assert_eq!(savings[2][0], Cell::from("Vacaciones"));
        assert_eq!(savings[5][0], Cell::from("INVERSIONES"));
        let movements = store.table(&names.movements).await.unwrap();
        assert_eq!(movements[2][5], Cell::from("$ 84.320,50"));
        assert_eq!(movements[1][8], Cell::Empty);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let mut store = MemoryStore::default();
        assert!(matches!(
            store.read("Nada").await,
            Err(StoreError::NotFound(t)) if t == "Nada"
        ));
        assert!(matches!(
            store.clear_range("Nada", 2, 3, 1).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_write_clear_and_append() {
        let mut store = MemoryStore::default();
        store
            .set_table("T", vec![vec![Cell::from("a"), Cell::from("b")]])
            .await;

        store
            .write_range("T", 3, &[vec![Cell::from("x")], vec![Cell::from("y")]])
            .await
            .unwrap();
        let rows = store.read("T").await.unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[1].is_empty());
        assert_eq!(rows[3][0], Cell::from("y"));

        store.clear_range("T", 3, 4, 1).await.unwrap();
        let rows = store.read("T").await.unwrap();
        assert_eq!(rows.len(), 1);

        let n = store
            .append_row("T", vec![Cell::from("z"), Cell::Number(2.0)])
            .await
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(last_used_row(&store.read("T").await.unwrap()), 2);
    }

    #[tokio::test]
    async fn test_clear_only_touches_requested_columns() {
        let mut store = MemoryStore::default();
        store
            .set_table(
                "T",
                vec![vec![Cell::from("a"), Cell::from("b"), Cell::from("c")]],
            )
            .await;
        store.clear_range("T", 1, 1, 2).await.unwrap();
        let rows = store.read("T").await.unwrap();
        assert_eq!(rows[0], vec![Cell::Empty, Cell::Empty, Cell::from("c")]);
    }

    #[tokio::test]
    async fn test_row_zero_is_rejected() {
        let mut store = MemoryStore::default();
        store.set_table("T", Vec::new()).await;
        assert!(matches!(
            store.write_range("T", 0, &[]).await,
            Err(StoreError::Backend(_))
        ));
    }
}
