//! Banks API endpoints.

use api_types::bank::{BankCreated, BankNew, BankView};
use axum::{Json, extract::State, http::StatusCode};

use crate::{ServerError, server::ServerState, views::bank_view};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<BankView>>, ServerError> {
    let banks = state.engine.list_banks().await?;
    Ok(Json(banks.into_iter().map(bank_view).collect()))
}

pub async fn bank_new(
    State(state): State<ServerState>,
    Json(payload): Json<BankNew>,
) -> Result<(StatusCode, Json<BankCreated>), ServerError> {
    let id = state
        .engine
        .new_bank(&payload.name, payload.opening_balance)
        .await?;
    Ok((StatusCode::CREATED, Json(BankCreated { id })))
}
