//! Statement reconciliation endpoints.
//!
//! Uploads are the raw CSV text of a bank statement in the request body.

use api_types::{
    movement::ReconcileBatchResult,
    reconciliation::{DiscrepancyMaterialized, DiscrepancyNew, ReconciliationView},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::ExternalRecord;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views::reconciliation_view};

/// Classifies the uploaded statement without changing anything.
pub async fn preview(
    State(state): State<ServerState>,
    Path(bank_id): Path<Uuid>,
    body: String,
) -> Result<Json<ReconciliationView>, ServerError> {
    let outcome = state
        .engine
        .reconcile_upload(bank_id, body.as_bytes())
        .await?;
    Ok(Json(reconciliation_view(&outcome)))
}

/// Classifies the uploaded statement and confirms every match.
pub async fn apply(
    State(state): State<ServerState>,
    Path(bank_id): Path<Uuid>,
    body: String,
) -> Result<Json<ReconcileBatchResult>, ServerError> {
    let outcome = state
        .engine
        .reconcile_upload(bank_id, body.as_bytes())
        .await?;
    let count = state.engine.reconcile_all_matches(&outcome.report).await?;
    Ok(Json(ReconcileBatchResult { count }))
}

pub async fn materialize(
    State(state): State<ServerState>,
    Path(bank_id): Path<Uuid>,
    Json(payload): Json<DiscrepancyNew>,
) -> Result<(StatusCode, Json<DiscrepancyMaterialized>), ServerError> {
    let record = ExternalRecord::new(payload.date, payload.description, payload.amount);
    let booked = state
        .engine
        .materialize_discrepancy(&record, bank_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DiscrepancyMaterialized {
            expense_id: booked.expense_id,
            movement_id: booked.movement_id,
            balance: booked.balance,
        }),
    ))
}
