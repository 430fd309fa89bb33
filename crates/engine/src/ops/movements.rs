use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, Movement, NewMovement, ResultEngine, movements};

use super::{Engine, normalize_optional_text, with_tx};

pub(super) async fn unreconciled_movements<C: ConnectionTrait>(
    db: &C,
    bank_id: Option<Uuid>,
) -> ResultEngine<Vec<Movement>> {
    let mut query = movements::Entity::find().filter(movements::Column::Reconciled.eq(false));
    if let Some(bank_id) = bank_id {
        query = query.filter(movements::Column::BankId.eq(bank_id));
    }

    let models = query
        .order_by_desc(movements::Column::OccurredOn)
        .order_by_asc(movements::Column::CreatedAt)
        .all(db)
        .await?;

    models.into_iter().map(Movement::try_from).collect()
}

impl Engine {
    /// Return a movement snapshot from DB.
    pub async fn movement(&self, movement_id: Uuid) -> ResultEngine<Movement> {
        with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            Movement::try_from(model)
        })
    }

    /// Lists movements still waiting for a statement line.
    ///
    /// With `bank_id` only that bank's movements are returned. Newest dates
    /// come first; movements sharing a date keep their insertion order.
    pub async fn list_unreconciled(&self, bank_id: Option<Uuid>) -> ResultEngine<Vec<Movement>> {
        unreconciled_movements(&self.database, bank_id).await
    }

    /// Records a new internal movement.
    ///
    /// The movement is stored as given; bank balances are not touched.
    pub async fn append_movement(&self, cmd: NewMovement) -> ResultEngine<Uuid> {
        let mut movement = Movement::new(
            cmd.kind,
            cmd.magnitude,
            cmd.date,
            normalize_optional_text(cmd.description.as_deref()),
            cmd.bank_id,
        )?;
        movement.external_reference = normalize_optional_text(cmd.external_reference.as_deref());
        movement.reconciled = cmd.reconciled;

        with_tx!(self, |db_tx| {
            if let Some(bank_id) = movement.bank_id {
                self.require_bank(&db_tx, bank_id).await?;
            }
            movement
                .to_active_model(Utc::now())?
                .insert(&db_tx)
                .await?;
            Ok(movement.id)
        })
    }

    /// Flags a movement as reconciled.
    ///
    /// Reconciling an already reconciled movement is a no-op.
    pub async fn mark_reconciled(&self, movement_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            if model.reconciled {
                return Ok(());
            }

            let active = movements::ActiveModel {
                id: sea_orm::ActiveValue::Set(movement_id),
                reconciled: sea_orm::ActiveValue::Set(true),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            tracing::info!("movement {movement_id} reconciled");
            Ok(())
        })
    }

    /// Flags every movement in `movement_ids` as reconciled in one
    /// transaction.
    ///
    /// Duplicated ids count once. If any id is unknown nothing is changed.
    /// Returns the number of distinct movements flagged.
    pub async fn mark_reconciled_batch(&self, movement_ids: &[Uuid]) -> ResultEngine<u64> {
        let ids: BTreeSet<Uuid> = movement_ids.iter().copied().collect();
        if ids.is_empty() {
            return Ok(0);
        }

        with_tx!(self, |db_tx| {
            let found = movements::Entity::find()
                .filter(movements::Column::Id.is_in(ids.iter().copied()))
                .count(&db_tx)
                .await?;
            if found != ids.len() as u64 {
                return Err(EngineError::KeyNotFound("movement not exists".to_string()));
            }

            movements::Entity::update_many()
                .col_expr(movements::Column::Reconciled, Expr::value(true))
                .filter(movements::Column::Id.is_in(ids.iter().copied()))
                .exec(&db_tx)
                .await?;
            tracing::info!("{} movements reconciled", ids.len());
            Ok(ids.len() as u64)
        })
    }
}
