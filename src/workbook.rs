//! Reads and writes the finance records of a workbook through a `Store`.
//!
//! Movimientos and Tarjetas are flat tables with a header row: a sync clears everything below the
//! header and rewrites it. Patrimonio and Ahorro e Inversiones are laid out by hand with sections, so
//! a sync overwrites records in place from the first row of each section and leaves everything
//! else in the sheet alone.

use crate::api::{last_used_row, Store, StoreError, StoreResult, SHEET_NOT_FOUND};
use crate::config::SheetNames;
use crate::model::{
    cell, AccountBalance, CardInstallment, Cell, FinanceData, Investment, Movement, NetWorth, Record,
    Row, SavingsGoal, SyncPayload,
};
use crate::sections::{
    find_sentinel, scan, Currency, GoalsLayout, InvestmentsLayout, NetWorthLayout,
    FOREIGN_ACCOUNTS, INVESTMENTS,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

/// The first data row of the flat tables, below the header.
const FIRST_DATA_ROW: usize = 2;
/// The first row of the local-currency accounts in the Patrimonio sheet.
const FIRST_LOCAL_ACCOUNT_ROW: usize = 5;
/// The first row of the goals in the Ahorro e Inversiones sheet.
const FIRST_GOAL_ROW: usize = 3;
/// Records below a sentinel start this many rows further down, leaving room for a header row.
const SENTINEL_TO_FIRST_RECORD: usize = 2;

/// The outcome of syncing one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SyncOutcome {
    Synced { synced: usize },
    Failed { error: String },
}

impl From<StoreResult<usize>> for SyncOutcome {
    fn from(value: StoreResult<usize>) -> Self {
        match value {
            Ok(synced) => SyncOutcome::Synced { synced },
            Err(StoreError::NotFound(table)) => {
                warn!("Unable to sync, the sheet '{table}' does not exist");
                SyncOutcome::Failed {
                    error: SHEET_NOT_FOUND.to_string(),
                }
            }
            Err(StoreError::Backend(e)) => {
                warn!("Unable to sync: {e:#}");
                SyncOutcome::Failed {
                    error: format!("{e:#}"),
                }
            }
        }
    }
}

/// The `results` of a sync request. Only the entities that were present in the request appear.
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct SyncResults {
    #[serde(rename = "movimientos", skip_serializing_if = "Option::is_none")]
    pub movements: Option<SyncOutcome>,
    #[serde(rename = "tarjetas", skip_serializing_if = "Option::is_none")]
    pub cards: Option<SyncOutcome>,
    #[serde(rename = "patrimonio", skip_serializing_if = "Option::is_none")]
    pub net_worth: Option<SyncOutcome>,
    #[serde(rename = "metas", skip_serializing_if = "Option::is_none")]
    pub goals: Option<SyncOutcome>,
    #[serde(rename = "inversiones", skip_serializing_if = "Option::is_none")]
    pub investments: Option<SyncOutcome>,
}

/// The finance workbook.
pub struct Workbook {
    store: Box<dyn Store>,
    sheets: SheetNames,
}

impl Workbook {
    pub fn new(store: Box<dyn Store>, sheets: SheetNames) -> Self {
        Self { store, sheets }
    }

    /// Reads every entity. A missing tab reads as no records.
    pub async fn get_data(&mut self) -> StoreResult<FinanceData> {
        let sheets = self.sheets.clone();
        let movements = self.read_or_empty(&sheets.movements).await?;
        let cards = self.read_or_empty(&sheets.cards).await?;
        let net_worth = self.read_or_empty(&sheets.net_worth).await?;
        let savings = self.read_or_empty(&sheets.savings).await?;

        let data = FinanceData {
            movements: read_table(&movements),
            cards: read_table(&cards),
            net_worth: read_net_worth(&net_worth),
            goals: read_goals(&savings),
            investments: read_investments(&savings),
        };
        debug!(
            "Read {} movements, {} card installments, {} accounts, {} goals and {} investments",
            data.movements.len(),
            data.cards.len(),
            data.net_worth.local.len() + data.net_worth.foreign.len(),
            data.goals.len(),
            data.investments.len()
        );
        Ok(data)
    }

    /// Syncs every entity present in `payload`, in a fixed order. A failure syncing one entity is
    /// reported in its result and does not stop the others.
    pub async fn sync(&mut self, payload: SyncPayload) -> SyncResults {
        let mut results = SyncResults::default();
        if let Some(movements) = payload.movements {
            results.movements = Some(self.sync_movements(&movements).await.into());
        }
        if let Some(cards) = payload.cards {
            results.cards = Some(self.sync_cards(&cards).await.into());
        }
        if let Some(net_worth) = payload.net_worth {
            results.net_worth = Some(self.sync_net_worth(&net_worth).await.into());
        }
        if let Some(goals) = payload.goals {
            results.goals = Some(self.sync_goals(&goals).await.into());
        }
        if let Some(investments) = payload.investments {
            results.investments = Some(self.sync_investments(&investments).await.into());
        }
        results
    }

    /// Replaces all movements.
    pub async fn sync_movements(&mut self, movements: &[Movement]) -> StoreResult<usize> {
        let table = self.sheets.movements.clone();
        self.resync(&table, movements, Movement::WIDTH).await
    }

    /// Replaces all card installments. Every column of the sheet is cleared, but only the columns
    /// produced by `CardInstallment::to_row` are written.
    pub async fn sync_cards(&mut self, cards: &[CardInstallment]) -> StoreResult<usize> {
        let table = self.sheets.cards.clone();
        self.resync(&table, cards, CardInstallment::SHEET_WIDTH)
            .await
    }

    /// Overwrites the local accounts from row 5 and the foreign accounts from two rows below the
    /// `Cuentas en USD` row. Every written account is stamped with the current time. If the sheet
    /// has no foreign section the foreign accounts are skipped. Returns the number of accounts
    /// written.
    pub async fn sync_net_worth(&mut self, net_worth: &NetWorth) -> StoreResult<usize> {
        let table = self.sheets.net_worth.clone();
        let now = Cell::from(Utc::now());
        let stamp = |account: &AccountBalance| -> Row {
            let mut row = account.to_row();
            row.push(now.clone());
            row
        };

        let local: Vec<Row> = net_worth.local.iter().map(stamp).collect();
        self.store
            .write_range(&table, FIRST_LOCAL_ACCOUNT_ROW, &local)
            .await?;
        let mut synced = local.len();

        // Looked up after writing, since a long list of local accounts can overwrite the sentinel.
        let rows = self.store.read(&table).await?;
        match find_sentinel(&rows, FOREIGN_ACCOUNTS) {
            Some(ix) => {
                let foreign: Vec<Row> = net_worth.foreign.iter().map(stamp).collect();
                let start = ix + 1 + SENTINEL_TO_FIRST_RECORD;
                self.store.write_range(&table, start, &foreign).await?;
                synced += foreign.len();
            }
            None if !net_worth.foreign.is_empty() => warn!(
                "The sheet '{table}' has no '{FOREIGN_ACCOUNTS}' row, {} foreign accounts were not \
                written",
                net_worth.foreign.len()
            ),
            None => {}
        }
        info!("Wrote {synced} accounts to '{table}'");
        Ok(synced)
    }

    /// Overwrites goals from row 3. Rows below the last goal are left as they are.
    pub async fn sync_goals(&mut self, goals: &[SavingsGoal]) -> StoreResult<usize> {
        let table = self.sheets.savings.clone();
        // Fails with NotFound when the tab is missing, even if there is nothing to write.
        self.store.read(&table).await?;
        let rows: Vec<Row> = goals.iter().map(Record::to_row).collect();
        self.store
            .write_range(&table, FIRST_GOAL_ROW, &rows)
            .await?;
        info!("Wrote {} goals to '{table}'", rows.len());
        Ok(rows.len())
    }

    /// Overwrites investments from two rows below the `INVERSIONES` row. Like the foreign accounts
    /// of the net worth sheet, nothing is written when the sheet has no such row. Returns the number
    /// of investments written.
    pub async fn sync_investments(&mut self, investments: &[Investment]) -> StoreResult<usize> {
        let table = self.sheets.savings.clone();
        let existing = self.store.read(&table).await?;
        let Some(ix) = find_sentinel(&existing, INVESTMENTS) else {
            warn!(
                "The sheet '{table}' has no '{INVESTMENTS}' row, {} investments were not written",
                investments.len()
            );
            return Ok(0);
        };
        let rows: Vec<Row> = investments.iter().map(Record::to_row).collect();
        let start = ix + 1 + SENTINEL_TO_FIRST_RECORD;
        self.store.write_range(&table, start, &rows).await?;
        info!("Wrote {} investments to '{table}'", rows.len());
        Ok(rows.len())
    }

    /// Appends a movement below the last used row and returns the row number.
    pub async fn add_movement(&mut self, movement: &Movement) -> StoreResult<usize> {
        let table = self.sheets.movements.clone();
        let row = self.store.append_row(&table, movement.to_row()).await?;
        info!("Added movement '{}' at row {row}", movement.id);
        Ok(row)
    }

    /// Appends a card installment below the last used row and returns the row number.
    pub async fn add_card(&mut self, card: &CardInstallment) -> StoreResult<usize> {
        let table = self.sheets.cards.clone();
        let row = self.store.append_row(&table, card.to_row()).await?;
        info!("Added card installment '{}' at row {row}", card.id);
        Ok(row)
    }

    /// Clears the data rows of a flat table and writes `records` in their place.
    async fn resync<R>(&mut self, table: &str, records: &[R], clear_width: usize) -> StoreResult<usize>
    where
        R: Record + Sync,
    {
        let existing = self.store.read(table).await?;
        let last = last_used_row(&existing);
        if last >= FIRST_DATA_ROW {
            self.store
                .clear_range(table, FIRST_DATA_ROW, last, clear_width)
                .await?;
        }
        let rows: Vec<Row> = records.iter().map(Record::to_row).collect();
        self.store.write_range(table, FIRST_DATA_ROW, &rows).await?;
        info!("Synced {} rows to '{table}'", rows.len());
        Ok(rows.len())
    }

    async fn read_or_empty(&mut self, table: &str) -> StoreResult<Vec<Row>> {
        match self.store.read(table).await {
            Err(StoreError::NotFound(_)) => {
                warn!("The sheet '{table}' does not exist");
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

/// The records of a flat table: every row below the header whose first cell is not blank.
fn read_table<R: Record>(rows: &[Row]) -> Vec<R> {
    rows.iter()
        .skip(FIRST_DATA_ROW - 1)
        .filter(|row| !cell(row, 0).is_blank())
        .map(|row| R::from_row(row))
        .collect()
}

fn read_net_worth(rows: &[Row]) -> NetWorth {
    let mut net_worth = NetWorth::default();
    for (currency, row) in scan(&NetWorthLayout, rows) {
        let (prefix, accounts) = match currency {
            Currency::Local => ("ars", &mut net_worth.local),
            Currency::Foreign => ("usd", &mut net_worth.foreign),
        };
        let mut account = AccountBalance::from_row(row);
        account.id = format!("{prefix}-{}", accounts.len() + 1);
        accounts.push(account);
    }
    net_worth
}

fn read_goals(rows: &[Row]) -> Vec<SavingsGoal> {
    scan(&GoalsLayout, rows)
        .into_iter()
        .enumerate()
        .map(|(ix, (_, row))| SavingsGoal {
            id: format!("meta-{}", ix + 1),
            ..SavingsGoal::from_row(row)
        })
        .collect()
}

fn read_investments(rows: &[Row]) -> Vec<Investment> {
    scan(&InvestmentsLayout, rows)
        .into_iter()
        .enumerate()
        .map(|(ix, (_, row))| Investment {
            id: format!("inv-{}", ix + 1),
            ..Investment::from_row(row)
        })
        .collect()
}
