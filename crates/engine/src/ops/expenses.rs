use sea_orm::{QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{DISCREPANCY_CATEGORY, Expense, NewExpense, ResultEngine, expenses};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Books a new expense. Without a category the expense lands in `Otros`.
    pub async fn record_expense(&self, cmd: NewExpense) -> ResultEngine<Uuid> {
        let description = normalize_required_name(&cmd.description, "expense")?;
        let category = normalize_optional_text(cmd.category.as_deref())
            .unwrap_or_else(|| DISCREPANCY_CATEGORY.to_string());
        let expense = Expense::new(description, cmd.amount, category, cmd.date)?;

        with_tx!(self, |db_tx| {
            expenses::ActiveModel::try_from(&expense)?
                .insert(&db_tx)
                .await?;
            tracing::info!("recorded expense {} ({})", expense.id, expense.amount);
            Ok(expense.id)
        })
    }

    /// Lists expenses, newest first.
    pub async fn list_expenses(&self) -> ResultEngine<Vec<Expense>> {
        let models = expenses::Entity::find()
            .order_by_desc(expenses::Column::SpentOn)
            .order_by_asc(expenses::Column::Description)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Expense::from).collect())
    }
}
