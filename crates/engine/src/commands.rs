//! Command structs for engine operations.
//!
//! These types group parameters for write operations (new movement, new
//! expense), keeping call sites readable and avoiding long argument lists.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::MovementKind;

/// Record a new internal movement.
#[derive(Clone, Debug)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub magnitude: Decimal,
    pub date: NaiveDate,
    pub bank_id: Option<Uuid>,
    pub description: Option<String>,
    pub external_reference: Option<String>,
    pub reconciled: bool,
}

impl NewMovement {
    #[must_use]
    pub fn new(kind: MovementKind, magnitude: Decimal, date: NaiveDate) -> Self {
        Self {
            kind,
            magnitude,
            date,
            bank_id: None,
            description: None,
            external_reference: None,
            reconciled: false,
        }
    }

    #[must_use]
    pub fn bank_id(mut self, bank_id: Uuid) -> Self {
        self.bank_id = Some(bank_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn external_reference(mut self, reference: impl Into<String>) -> Self {
        self.external_reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn reconciled(mut self, reconciled: bool) -> Self {
        self.reconciled = reconciled;
        self
    }
}

/// Book a new expense.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: Option<String>,
}

impl NewExpense {
    #[must_use]
    pub fn new(description: impl Into<String>, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
            category: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
