//! Scanning of sheets that hold more than one logical section.
//!
//! The Patrimonio sheet lists local-currency accounts and then foreign-currency accounts. The
//! Ahorro e Inversiones sheet lists savings goals and then investments. Sections are introduced by
//! sentinel rows: rows whose first cell contains a marker such as `INVERSIONES`. Matching is a
//! case-sensitive substring match on the first cell.
//!
//! Each sheet is described by a `Layout`, which classifies rows one at a time as the scanner walks
//! them in order. The result depends on the order of the sentinels: a sheet with sentinels in the
//! wrong order is grouped wrongly rather than rejected.

use crate::model::{cell, Cell, Row};
use std::fmt::Debug;

/// Where the scanner is within a sheet.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum State<S> {
    /// Before the first sentinel of interest.
    Seeking,
    /// Capturing rows that belong to section `S`.
    In(S),
    /// Past the end of everything of interest. No further rows are looked at.
    Done,
}

/// What a row means, given the current state.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Step<S> {
    /// A sentinel that starts section `S`. The row itself is not captured.
    Enter(S),
    /// A sentinel that ends the scan.
    End,
    /// A header, label, blank or out-of-section row.
    Skip,
    /// A row that is captured if the scanner is in a section and the layout accepts it.
    Candidate,
}

/// Describes the sections of one kind of sheet.
pub(crate) trait Layout {
    type Section: Copy + Eq + Debug;

    fn start(&self) -> State<Self::Section>;

    /// Classifies a row by the text of its first cell.
    fn step(&self, state: State<Self::Section>, first: &str) -> Step<Self::Section>;

    /// Whether a candidate row holds a record.
    fn accepts(&self, _row: &[Cell]) -> bool {
        true
    }
}

/// Walks `rows` in order and returns every captured row along with the section it belongs to.
pub(crate) fn scan<'a, L>(layout: &L, rows: &'a [Row]) -> Vec<(L::Section, &'a [Cell])>
where
    L: Layout,
{
    let mut state = layout.start();
    let mut captured = Vec::new();
    for row in rows {
        let first = cell(row, 0).text();
        match layout.step(state, &first) {
            Step::Enter(section) => state = State::In(section),
            Step::End => state = State::Done,
            Step::Skip => {}
            Step::Candidate => {
                if let State::In(section) = state {
                    if layout.accepts(row) {
                        captured.push((section, row.as_slice()));
                    }
                }
            }
        }
        if state == State::Done {
            break;
        }
    }
    captured
}

/// Returns the index of the first row whose first cell contains `marker`.
pub(crate) fn find_sentinel(rows: &[Row], marker: &str) -> Option<usize> {
    rows.iter()
        .position(|row| cell(row, 0).text().contains(marker))
}

/// The currency sections of the Patrimonio sheet.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Currency {
    Local,
    Foreign,
}

/// The sentinel that introduces the foreign-currency accounts when writing.
pub(crate) const FOREIGN_ACCOUNTS: &str = "Cuentas en USD";

const FOREIGN_MARKERS: &[&str] = &["USD", "Dólares"];
const NET_WORTH_LABELS: &[&str] = &["TOTAL", "Cuenta", "PATRIMONIO"];

/// The Patrimonio sheet. Rows are local-currency accounts until a row mentions `USD` or
/// `Dólares`. There is no end marker. Only rows with a number in the third column are accounts,
/// which leaves out subtotals and labels.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct NetWorthLayout;

impl Layout for NetWorthLayout {
    type Section = Currency;

    fn start(&self) -> State<Currency> {
        State::In(Currency::Local)
    }

    fn step(&self, _state: State<Currency>, first: &str) -> Step<Currency> {
        if FOREIGN_MARKERS.iter().any(|m| first.contains(m)) {
            Step::Enter(Currency::Foreign)
        } else if first.is_empty() || NET_WORTH_LABELS.iter().any(|l| first.contains(l)) {
            Step::Skip
        } else {
            Step::Candidate
        }
    }

    fn accepts(&self, row: &[Cell]) -> bool {
        matches!(row.get(2), Some(c) if c.is_numeric())
    }
}

/// The sections of the Ahorro e Inversiones sheet.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Savings {
    Goals,
    Investments,
}

pub(crate) const GOALS: &str = "METAS";
pub(crate) const INVESTMENTS: &str = "INVERSIONES";
const TOTAL: &str = "TOTAL";
const GOAL_HEADERS: &[&str] = &["Meta", "Objetivo"];
const INVESTMENT_HEADERS: &[&str] = &["Instrumento", "Tipo"];

/// The goals block of the Ahorro e Inversiones sheet: from `METAS` up to `INVERSIONES`.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct GoalsLayout;

impl Layout for GoalsLayout {
    type Section = Savings;

    fn start(&self) -> State<Savings> {
        State::Seeking
    }

    fn step(&self, _state: State<Savings>, first: &str) -> Step<Savings> {
        if first.contains(GOALS) {
            Step::Enter(Savings::Goals)
        } else if first.contains(INVESTMENTS) {
            Step::End
        } else if first.is_empty() || GOAL_HEADERS.contains(&first) {
            Step::Skip
        } else {
            Step::Candidate
        }
    }
}

/// The investments block of the Ahorro e Inversiones sheet: from `INVERSIONES` up to the first
/// `TOTAL` row inside the block.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct InvestmentsLayout;

impl Layout for InvestmentsLayout {
    type Section = Savings;

    fn start(&self) -> State<Savings> {
        State::Seeking
    }

    fn step(&self, state: State<Savings>, first: &str) -> Step<Savings> {
        if first.contains(INVESTMENTS) {
            Step::Enter(Savings::Investments)
        } else if first.contains(TOTAL) {
            match state {
                State::In(_) => Step::End,
                State::Seeking | State::Done => Step::Skip,
            }
        } else if first.is_empty() || INVESTMENT_HEADERS.contains(&first) {
            Step::Skip
        } else {
            Step::Candidate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Vec<Row> {
        rows.iter()
            .map(|r| r.iter().map(|v| Cell::entered(v)).collect())
            .collect()
    }

    fn names<S: Copy>(captured: &[(S, &[Cell])]) -> Vec<String> {
        captured.iter().map(|(_, row)| cell(row, 0).text()).collect()
    }

    fn net_worth_sheet() -> Vec<Row> {
        sheet(&[
            &["PATRIMONIO NETO"],
            &[""],
            &["Cuentas en ARS"],
            &["Cuenta", "Tipo", "Saldo", "Actualizado"],
            &["Banco Galicia", "Cuenta corriente", "150000"],
            &["Efectivo", "Efectivo", "20000"],
            &["Subtotal", "", "=SUM(C5:C6)"],
            &["TOTAL ARS", "", "170000"],
            &[""],
            &["Cuentas en USD"],
            &["Cuenta", "Tipo", "Saldo", "Actualizado"],
            &["Caja Galicia", "Caja de ahorro", "1200"],
            &["Billetes", "Efectivo", "300"],
            &["TOTAL USD", "", "1500"],
        ])
    }

    #[test]
    fn test_net_worth_splits_at_foreign_sentinel() {
        let rows = net_worth_sheet();
        let k = find_sentinel(&rows, FOREIGN_ACCOUNTS).unwrap();
        let captured = scan(&NetWorthLayout, &rows);
        assert_eq!(
            names(&captured),
            vec!["Banco Galicia", "Efectivo", "Caja Galicia", "Billetes"]
        );
        let sections: Vec<Currency> = captured.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            sections,
            vec![
                Currency::Local,
                Currency::Local,
                Currency::Foreign,
                Currency::Foreign
            ]
        );
        // Everything captured as foreign comes after the sentinel.
        for (section, row) in &captured {
            let ix = rows.iter().position(|r| r.as_slice() == *row).unwrap();
            assert_eq!(*section == Currency::Foreign, ix > k);
        }
    }

    #[test]
    fn test_net_worth_requires_numeric_balance() {
        let rows = sheet(&[
            &["Banco", "CA", "abc"],
            &["Broker", "Inversión"],
            &["Billetera", "Virtual", "1500.25"],
        ]);
        let captured = scan(&NetWorthLayout, &rows);
        assert_eq!(names(&captured), vec!["Billetera"]);
    }

    #[test]
    fn test_net_worth_text_that_looks_numeric_is_not_a_balance() {
        let mut rows = sheet(&[&["Caja", "CA", "1.500"], &["Broker", "Inversión", "$ 2.000"]]);
        rows.push(vec![
            Cell::from("Plazo fijo"),
            Cell::from("Banco"),
            Cell::Number(1500.0),
        ]);
        let captured = scan(&NetWorthLayout, &rows);
        assert_eq!(names(&captured), vec!["Plazo fijo"]);
    }

    #[test]
    fn test_net_worth_sentinels_out_of_order_misgroup() {
        let rows = sheet(&[
            &["Cuentas en USD"],
            &["Caja", "CA", "10"],
            &["Cuentas en ARS"],
            &["Banco", "CA", "20"],
        ]);
        let captured = scan(&NetWorthLayout, &rows);
        assert!(captured.iter().all(|(s, _)| *s == Currency::Foreign));
        assert_eq!(captured.len(), 2);
    }

    fn savings_sheet() -> Vec<Row> {
        sheet(&[
            &["METAS DE AHORRO"],
            &["Meta", "Objetivo", "Ahorrado", "%", "Fecha límite", "Estado"],
            &["Vacaciones", "1500000", "300000", "20%", "2025-12-01", "Activa"],
            &["Auto", "8000000", "1000000", "12.5%", "2026-06-30", ""],
            &[""],
            &["INVERSIONES"],
            &["Instrumento", "Tipo", "Capital", "Moneda", "Tasa"],
            &["Plazo fijo", "Plazo fijo", "1000000", "ARS", "38%"],
            &["Cedear SPY", "Acciones", "500", "USD", "0%"],
            &["TOTAL", "", "1000500"],
            &["Notas sueltas", "", ""],
        ])
    }

    #[test]
    fn test_goals_block() {
        let rows = savings_sheet();
        let captured = scan(&GoalsLayout, &rows);
        assert_eq!(names(&captured), vec!["Vacaciones", "Auto"]);
        assert!(captured.iter().all(|(s, _)| *s == Savings::Goals));
    }

    #[test]
    fn test_investments_block() {
        let rows = savings_sheet();
        let captured = scan(&InvestmentsLayout, &rows);
        assert_eq!(names(&captured), vec!["Plazo fijo", "Cedear SPY"]);
        assert!(captured.iter().all(|(s, _)| *s == Savings::Investments));
    }

    #[test]
    fn test_total_before_investments_does_not_end_scan() {
        let rows = sheet(&[
            &["METAS"],
            &["Casa", "100"],
            &["TOTAL METAS", "100"],
            &["INVERSIONES"],
            &["Bono", "Renta fija", "50"],
        ]);
        assert_eq!(names(&scan(&InvestmentsLayout, &rows)), vec!["Bono"]);
        // "TOTAL METAS" mentions the goals marker, so it re-enters the block instead of being a goal.
        assert_eq!(names(&scan(&GoalsLayout, &rows)), vec!["Casa"]);
    }

    #[test]
    fn test_goal_total_without_marker_is_a_goal() {
        let rows = sheet(&[
            &["METAS"],
            &["Casa", "100"],
            &["TOTAL AHORRADO", "100"],
            &["INVERSIONES"],
        ]);
        assert_eq!(
            names(&scan(&GoalsLayout, &rows)),
            vec!["Casa", "TOTAL AHORRADO"]
        );
    }

    #[test]
    fn test_no_sentinels_captures_nothing() {
        let rows = sheet(&[&["Vacaciones", "100"], &["Plazo fijo", "PF", "10"]]);
        assert!(scan(&GoalsLayout, &rows).is_empty());
        assert!(scan(&InvestmentsLayout, &rows).is_empty());
    }

    #[test]
    fn test_investments_before_goals_ends_goal_scan() {
        let rows = sheet(&[
            &["INVERSIONES"],
            &["Bono", "Renta fija", "50"],
            &["METAS"],
            &["Casa", "100"],
        ]);
        assert!(scan(&GoalsLayout, &rows).is_empty());
    }

    #[test]
    fn test_find_sentinel() {
        let rows = savings_sheet();
        assert_eq!(find_sentinel(&rows, INVESTMENTS), Some(5));
        assert_eq!(find_sentinel(&rows, "NO EXISTE"), None);
    }
}
