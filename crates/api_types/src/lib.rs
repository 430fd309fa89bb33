use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod bank {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankNew {
        pub name: String,
        /// Defaults to zero when omitted.
        #[serde(default)]
        pub opening_balance: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankView {
        pub id: Uuid,
        pub name: String,
        pub balance: Decimal,
    }
}

pub mod movement {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MovementKind {
        Inflow,
        Outflow,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementNew {
        pub kind: MovementKind,
        /// Unsigned amount; the kind gives the direction.
        pub amount: Decimal,
        pub date: NaiveDate,
        pub bank_id: Option<Uuid>,
        pub description: Option<String>,
        pub external_reference: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementView {
        pub id: Uuid,
        pub kind: MovementKind,
        pub amount: Decimal,
        /// Negative for outflows.
        pub signed_amount: Decimal,
        pub description: Option<String>,
        pub date: NaiveDate,
        pub reconciled: bool,
        pub external_reference: Option<String>,
        pub bank_id: Option<Uuid>,
    }

    /// Query string of `GET /movements/unreconciled`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UnreconciledQuery {
        pub bank_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconcileBatch {
        pub ids: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconcileBatchResult {
        pub count: u64,
    }
}

pub mod reconciliation {
    use super::*;
    use crate::movement::MovementView;

    /// A statement line as read from the uploaded file.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatementLine {
        pub date: NaiveDate,
        pub description: String,
        pub amount: Decimal,
        /// 1-based line of the uploaded file.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub line: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MatchView {
        pub line: StatementLine,
        pub movement: MovementView,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReconciliationStats {
        pub matches: usize,
        pub discrepancies: usize,
        pub missing: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconciliationView {
        pub matches: Vec<MatchView>,
        /// Statement lines without an internal movement.
        pub discrepancies: Vec<StatementLine>,
        /// Internal movements without a statement line.
        pub missing: Vec<MovementView>,
        pub stats: ReconciliationStats,
        /// Data rows skipped because their date or amount was unreadable.
        pub rejected: usize,
    }

    /// Request body for booking a discrepancy as a bank expense.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DiscrepancyNew {
        pub date: NaiveDate,
        #[serde(default)]
        pub description: String,
        /// Signed amount as printed on the statement.
        pub amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DiscrepancyMaterialized {
        pub expense_id: Uuid,
        pub movement_id: Uuid,
        /// Bank balance after the booking.
        pub balance: Decimal,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub description: String,
        pub amount: Decimal,
        pub category: String,
        pub date: NaiveDate,
    }
}
