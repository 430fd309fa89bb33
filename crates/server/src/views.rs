//! Conversions from engine values to wire types.

use api_types::{
    bank::BankView,
    expense::ExpenseView,
    movement::{MovementKind as ApiKind, MovementView},
    reconciliation::{MatchView, ReconciliationStats, ReconciliationView, StatementLine},
};
use engine::{Bank, Expense, ExternalRecord, Movement, MovementKind, StatementReconciliation};

pub(crate) fn map_kind(kind: MovementKind) -> ApiKind {
    match kind {
        MovementKind::Inflow => ApiKind::Inflow,
        MovementKind::Outflow => ApiKind::Outflow,
    }
}

pub(crate) fn unmap_kind(kind: ApiKind) -> MovementKind {
    match kind {
        ApiKind::Inflow => MovementKind::Inflow,
        ApiKind::Outflow => MovementKind::Outflow,
    }
}

pub(crate) fn bank_view(bank: Bank) -> BankView {
    BankView {
        id: bank.id,
        name: bank.name,
        balance: bank.balance,
    }
}

pub(crate) fn movement_view(movement: &Movement) -> MovementView {
    MovementView {
        id: movement.id,
        kind: map_kind(movement.kind),
        amount: movement.magnitude,
        signed_amount: movement.signed_amount(),
        description: movement.description.clone(),
        date: movement.date,
        reconciled: movement.reconciled,
        external_reference: movement.external_reference.clone(),
        bank_id: movement.bank_id,
    }
}

pub(crate) fn statement_line(record: &ExternalRecord) -> StatementLine {
    StatementLine {
        date: record.date,
        description: record.description.clone(),
        amount: record.amount,
        line: record.line,
    }
}

pub(crate) fn expense_view(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        description: expense.description,
        amount: expense.amount,
        category: expense.category,
        date: expense.date,
    }
}

pub(crate) fn reconciliation_view(outcome: &StatementReconciliation) -> ReconciliationView {
    let report = &outcome.report;
    let stats = report.stats();

    ReconciliationView {
        matches: report
            .matches()
            .map(|(record, movement)| MatchView {
                line: statement_line(record),
                movement: movement_view(movement),
            })
            .collect(),
        discrepancies: report.discrepancies().map(statement_line).collect(),
        missing: report.missing().map(movement_view).collect(),
        stats: ReconciliationStats {
            matches: stats.matches,
            discrepancies: stats.discrepancies,
            missing: stats.missing,
        },
        rejected: outcome.rejected,
    }
}
