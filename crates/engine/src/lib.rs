//! Back-office treasury engine.
//!
//! The crate keeps banks, internal movements and expenses in a SQL store and
//! reconciles uploaded bank statements against them. The pure pieces
//! ([`statement`] and [`reconciliation`]) can be used without a database; the
//! [`Engine`] wires them to the store.

pub use banks::Bank;
pub use commands::{NewExpense, NewMovement};
pub use error::EngineError;
pub use expenses::{DISCREPANCY_CATEGORY, Expense};
pub use movements::{Movement, MovementKind};
pub use ops::{Engine, EngineBuilder, MaterializedDiscrepancy, StatementReconciliation};
pub use reconciliation::{
    MatchKind, MatchResult, MatchRules, ReconciliationReport, ReconciliationStats, reconcile,
};
pub use statement::{ExternalRecord, ParsedStatement, RawStatementRow, parse_statement};

mod banks;
mod commands;
mod error;
mod expenses;
pub mod money;
mod movements;
mod ops;
pub mod reconciliation;
pub mod statement;

type ResultEngine<T> = Result<T, EngineError>;
