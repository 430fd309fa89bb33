//! The module contains `Bank` struct and its implementation.

use rust_decimal::Decimal;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ResultEngine,
    money::{from_minor, to_minor},
};

/// A bank account.
///
/// A bank is the ledger entity the statements are downloaded from. It keeps a
/// running balance that movements and reconciliation adjustments act upon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    /// Stable identifier for this bank.
    pub id: Uuid,
    pub name: String,
    pub balance: Decimal,
}

impl Bank {
    pub fn new(name: String, balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            balance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "banks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub balance_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Bank> for ActiveModel {
    type Error = crate::EngineError;

    fn try_from(value: &Bank) -> ResultEngine<Self> {
        Ok(Self {
            id: ActiveValue::Set(value.id),
            name: ActiveValue::Set(value.name.clone()),
            balance_minor: ActiveValue::Set(to_minor(value.balance)?),
        })
    }
}

impl From<Model> for Bank {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            balance: from_minor(model.balance_minor),
        }
    }
}
