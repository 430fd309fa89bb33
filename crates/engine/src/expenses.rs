//! Expenses booked by the back office.
//!
//! Reconciliation only creates expenses when a statement line has no internal
//! counterpart and the operator decides to book it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    money::{from_minor, to_minor},
};

/// Category given to expenses created from a statement discrepancy.
pub const DISCREPANCY_CATEGORY: &str = "Otros";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
}

impl Expense {
    pub fn new(
        description: String,
        amount: Decimal,
        category: String,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(
                "expense amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            description,
            amount,
            category,
            date,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub description: String,
    pub amount_minor: i64,
    pub category: String,
    pub spent_on: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Expense> for ActiveModel {
    type Error = EngineError;

    fn try_from(value: &Expense) -> ResultEngine<Self> {
        Ok(Self {
            id: ActiveValue::Set(value.id),
            description: ActiveValue::Set(value.description.clone()),
            amount_minor: ActiveValue::Set(to_minor(value.amount)?),
            category: ActiveValue::Set(value.category.clone()),
            spent_on: ActiveValue::Set(value.date),
        })
    }
}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            description: model.description,
            amount: from_minor(model.amount_minor),
            category: model.category,
            date: model.spent_on,
        }
    }
}
