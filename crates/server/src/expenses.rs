use api_types::expense::ExpenseView;
use axum::{Json, extract::State};

use crate::{ServerError, server::ServerState, views::expense_view};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let expenses = state.engine.list_expenses().await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}
