use std::io::Read;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DISCREPANCY_CATEGORY, EngineError, Expense, ExternalRecord, MatchRules, Movement,
    MovementKind, ReconciliationReport, ResultEngine, expenses,
    money::{from_minor, to_minor},
    reconcile, statement::parse_statement,
};

use super::{Engine, movements::unreconciled_movements, with_tx};

/// Description given to a booked discrepancy whose statement line had none.
const UNNAMED_DISCREPANCY: &str = "Gasto bancario";

/// What [`Engine::materialize_discrepancy`] wrote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedDiscrepancy {
    pub expense_id: Uuid,
    pub movement_id: Uuid,
    /// Bank balance after the booking.
    pub balance: Decimal,
}

/// Result of reconciling an uploaded statement file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementReconciliation {
    pub report: ReconciliationReport,
    /// Data rows dropped because their date or amount could not be read.
    pub rejected: usize,
}

impl Engine {
    /// Classifies `records` against the unreconciled movements of a bank.
    ///
    /// Nothing is written; acting on the report is left to
    /// [`Engine::reconcile_all_matches`], [`Engine::reconcile_one`] and
    /// [`Engine::materialize_discrepancy`].
    pub async fn reconcile_statement(
        &self,
        bank_id: Uuid,
        records: &[ExternalRecord],
        rules: &MatchRules,
    ) -> ResultEngine<ReconciliationReport> {
        with_tx!(self, |db_tx| {
            self.require_bank(&db_tx, bank_id).await?;
            let movements = unreconciled_movements(&db_tx, Some(bank_id)).await?;
            Ok(reconcile(records, &movements, rules))
        })
    }

    /// Parses an uploaded CSV statement and reconciles it with the engine
    /// rules.
    pub async fn reconcile_upload<R: Read>(
        &self,
        bank_id: Uuid,
        reader: R,
    ) -> ResultEngine<StatementReconciliation> {
        let parsed = parse_statement(reader)?;
        let report = self
            .reconcile_statement(bank_id, &parsed.records, &self.rules)
            .await?;
        Ok(StatementReconciliation {
            report,
            rejected: parsed.rejected,
        })
    }

    /// Confirms a single match.
    pub async fn reconcile_one(&self, movement_id: Uuid) -> ResultEngine<()> {
        self.mark_reconciled(movement_id).await
    }

    /// Confirms every match of `report` at once and returns how many
    /// movements were flagged.
    pub async fn reconcile_all_matches(&self, report: &ReconciliationReport) -> ResultEngine<u64> {
        let ids = report.matched_movement_ids();
        if ids.is_empty() {
            return Ok(0);
        }
        self.mark_reconciled_batch(&ids).await
    }

    /// Books a statement line with no internal counterpart as a bank expense.
    ///
    /// In one transaction this inserts an expense of `|amount|` in the `Otros`
    /// category, lowers the bank balance by the same value and records an
    /// already reconciled outflow on that bank. On any error nothing is kept.
    pub async fn materialize_discrepancy(
        &self,
        record: &ExternalRecord,
        bank_id: Uuid,
    ) -> ResultEngine<MaterializedDiscrepancy> {
        let magnitude = record.amount.abs();
        // Booked in minor units; a magnitude that rounds to 0.00 is rejected.
        let magnitude_minor = to_minor(magnitude)?;
        if magnitude_minor == 0 {
            return Err(EngineError::InvalidAmount(
                "discrepancy amount must not be zero".to_string(),
            ));
        }
        let magnitude = from_minor(magnitude_minor);
        let description = match record.description.trim() {
            "" => UNNAMED_DISCREPANCY.to_string(),
            text => text.to_string(),
        };
        let delta_minor = -magnitude_minor;

        with_tx!(self, |db_tx| {
            self.require_bank(&db_tx, bank_id).await?;

            let expense = Expense::new(
                description.clone(),
                magnitude,
                DISCREPANCY_CATEGORY.to_string(),
                record.date,
            )?;
            expenses::ActiveModel::try_from(&expense)?
                .insert(&db_tx)
                .await?;

            let balance = self
                .apply_balance_delta(&db_tx, bank_id, delta_minor)
                .await?;

            let mut movement = Movement::new(
                MovementKind::Outflow,
                magnitude,
                record.date,
                Some(description.clone()),
                Some(bank_id),
            )?;
            movement.reconciled = true;
            movement
                .to_active_model(Utc::now())?
                .insert(&db_tx)
                .await?;

            tracing::info!(
                "booked discrepancy '{}' of {} on bank {}",
                description,
                magnitude,
                bank_id
            );
            Ok(MaterializedDiscrepancy {
                expense_id: expense.id,
                movement_id: movement.id,
                balance: from_minor(balance),
            })
        })
    }
}
