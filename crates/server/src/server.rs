use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{banks, expenses, movements, reconciliation};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Builds the HTTP routes over `state`.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/banks", get(banks::list).post(banks::bank_new))
        .route(
            "/banks/{bank_id}/reconciliation",
            post(reconciliation::preview),
        )
        .route(
            "/banks/{bank_id}/reconciliation/apply",
            post(reconciliation::apply),
        )
        .route(
            "/banks/{bank_id}/discrepancies",
            post(reconciliation::materialize),
        )
        .route("/movements", post(movements::movement_new))
        .route("/movements/unreconciled", get(movements::unreconciled))
        .route("/movements/reconcile", post(movements::reconcile_batch))
        .route("/movements/{movement_id}/reconcile", post(movements::reconcile_one))
        .route("/expenses", get(expenses::list))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
