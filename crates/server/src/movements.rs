//! Movements API endpoints.

use api_types::movement::{
    MovementCreated, MovementNew, MovementView, ReconcileBatch, ReconcileBatchResult,
    UnreconciledQuery,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::NewMovement;
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    views::{movement_view, unmap_kind},
};

pub async fn unreconciled(
    State(state): State<ServerState>,
    Query(query): Query<UnreconciledQuery>,
) -> Result<Json<Vec<MovementView>>, ServerError> {
    let movements = state.engine.list_unreconciled(query.bank_id).await?;
    Ok(Json(movements.iter().map(movement_view).collect()))
}

pub async fn movement_new(
    State(state): State<ServerState>,
    Json(payload): Json<MovementNew>,
) -> Result<(StatusCode, Json<MovementCreated>), ServerError> {
    let mut cmd = NewMovement::new(unmap_kind(payload.kind), payload.amount, payload.date);
    if let Some(bank_id) = payload.bank_id {
        cmd = cmd.bank_id(bank_id);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(reference) = payload.external_reference {
        cmd = cmd.external_reference(reference);
    }

    let id = state.engine.append_movement(cmd).await?;
    Ok((StatusCode::CREATED, Json(MovementCreated { id })))
}

pub async fn reconcile_one(
    State(state): State<ServerState>,
    Path(movement_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.reconcile_one(movement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reconcile_batch(
    State(state): State<ServerState>,
    Json(payload): Json<ReconcileBatch>,
) -> Result<Json<ReconcileBatchResult>, ServerError> {
    let count = state.engine.mark_reconciled_batch(&payload.ids).await?;
    Ok(Json(ReconcileBatchResult { count }))
}
