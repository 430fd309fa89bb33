use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, banks, movements};

use super::Engine;

impl Engine {
    pub(super) async fn require_bank(
        &self,
        db: &DatabaseTransaction,
        bank_id: Uuid,
    ) -> ResultEngine<banks::Model> {
        banks::Entity::find_by_id(bank_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("bank not exists".to_string()))
    }

    pub(super) async fn require_movement(
        &self,
        db: &DatabaseTransaction,
        movement_id: Uuid,
    ) -> ResultEngine<movements::Model> {
        movements::Entity::find_by_id(movement_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))
    }

    /// Adds `delta_minor` to the stored balance of a bank and returns the new
    /// balance in minor units.
    pub(super) async fn apply_balance_delta(
        &self,
        db: &DatabaseTransaction,
        bank_id: Uuid,
        delta_minor: i64,
    ) -> ResultEngine<i64> {
        let bank = self.require_bank(db, bank_id).await?;
        let balance = bank
            .balance_minor
            .checked_add(delta_minor)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        let active = banks::ActiveModel {
            id: sea_orm::ActiveValue::Set(bank_id),
            balance_minor: sea_orm::ActiveValue::Set(balance),
            ..Default::default()
        };
        active.update(db).await?;
        Ok(balance)
    }
}
