//! Internal financial movements.
//!
//! A [`Movement`] is the internal record of money entering or leaving a bank,
//! produced by the sale, purchase and expense flows. The store keeps an
//! unsigned magnitude plus a [`MovementKind`] tag; matching against a bank
//! statement works on the signed value returned by
//! [`Movement::signed_amount`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    money::{from_minor, magnitude_to_minor},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Inflow,
    Outflow,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }

    /// Applies the sign of this kind to an unsigned magnitude.
    #[must_use]
    pub fn signed(self, magnitude: Decimal) -> Decimal {
        match self {
            Self::Inflow => magnitude,
            Self::Outflow => -magnitude,
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "inflow" => Ok(Self::Inflow),
            "outflow" => Ok(Self::Outflow),
            other => Err(EngineError::InvalidKind(format!(
                "unknown movement kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub kind: MovementKind,
    /// Unsigned amount, always `>= 0`.
    pub magnitude: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub reconciled: bool,
    pub external_reference: Option<String>,
    pub bank_id: Option<Uuid>,
}

impl Movement {
    pub fn new(
        kind: MovementKind,
        magnitude: Decimal,
        date: NaiveDate,
        description: Option<String>,
        bank_id: Option<Uuid>,
    ) -> ResultEngine<Self> {
        if magnitude.is_sign_negative() && !magnitude.is_zero() {
            return Err(EngineError::InvalidAmount(
                "magnitude must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            magnitude,
            description,
            date,
            reconciled: false,
            external_reference: None,
            bank_id,
        })
    }

    /// Signed value used to compare against statement lines: outflows are
    /// negative, inflows positive.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.magnitude)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub occurred_on: Date,
    pub reconciled: bool,
    pub external_reference: Option<String>,
    pub bank_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::banks::Entity",
        from = "Column::BankId",
        to = "super::banks::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Banks,
}

impl Related<super::banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Banks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Movement {
    /// Builds the row to insert, stamping `created_at` so movements sharing a
    /// date keep their insertion order.
    pub(crate) fn to_active_model(&self, created_at: DateTime<Utc>) -> ResultEngine<ActiveModel> {
        Ok(ActiveModel {
            id: ActiveValue::Set(self.id),
            kind: ActiveValue::Set(self.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(magnitude_to_minor(self.magnitude)?),
            description: ActiveValue::Set(self.description.clone()),
            occurred_on: ActiveValue::Set(self.date),
            reconciled: ActiveValue::Set(self.reconciled),
            external_reference: ActiveValue::Set(self.external_reference.clone()),
            bank_id: ActiveValue::Set(self.bank_id),
            created_at: ActiveValue::Set(created_at),
        })
    }
}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        if model.amount_minor < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "stored magnitude of movement {} is negative",
                model.id
            )));
        }
        Ok(Self {
            id: model.id,
            kind: MovementKind::try_from(model.kind.as_str())?,
            magnitude: from_minor(model.amount_minor),
            description: model.description,
            date: model.occurred_on,
            reconciled: model.reconciled,
            external_reference: model.external_reference,
            bank_id: model.bank_id,
        })
    }
}
