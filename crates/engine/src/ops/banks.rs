use rust_decimal::Decimal;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Bank, EngineError, ResultEngine, banks,
    money::{from_minor, to_minor},
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Lists every bank ordered by name.
    pub async fn list_banks(&self) -> ResultEngine<Vec<Bank>> {
        let models = banks::Entity::find()
            .order_by_asc(banks::Column::Name)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Bank::from).collect())
    }

    /// Return a bank snapshot from DB.
    pub async fn bank(&self, bank_id: Uuid) -> ResultEngine<Bank> {
        with_tx!(self, |db_tx| {
            let model = self.require_bank(&db_tx, bank_id).await?;
            Ok(Bank::from(model))
        })
    }

    /// Registers a new bank with an opening balance.
    ///
    /// Names are unique, compared case-insensitively.
    pub async fn new_bank(&self, name: &str, opening_balance: Decimal) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "bank")?;
        with_tx!(self, |db_tx| {
            let exists = banks::Entity::find()
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let bank = Bank::new(name, opening_balance);
            banks::ActiveModel::try_from(&bank)?.insert(&db_tx).await?;
            tracing::info!("created bank {} ({})", bank.name, bank.id);
            Ok(bank.id)
        })
    }

    /// Adds a signed `delta` to the bank balance and returns the new balance.
    pub async fn adjust_balance(&self, bank_id: Uuid, delta: Decimal) -> ResultEngine<Decimal> {
        let delta_minor = to_minor(delta)?;
        with_tx!(self, |db_tx| {
            let balance = self
                .apply_balance_delta(&db_tx, bank_id, delta_minor)
                .await?;
            Ok(from_minor(balance))
        })
    }
}
