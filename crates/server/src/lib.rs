use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod banks;
mod expenses;
mod movements;
mod reconciliation;
mod server;
mod views;

pub mod types {
    pub mod bank {
        pub use api_types::bank::{BankCreated, BankNew, BankView};
    }

    pub mod movement {
        pub use api_types::movement::{
            MovementCreated, MovementKind, MovementNew, MovementView, ReconcileBatch,
            ReconcileBatchResult, UnreconciledQuery,
        };
    }

    pub mod reconciliation {
        pub use api_types::reconciliation::{
            DiscrepancyMaterialized, DiscrepancyNew, MatchView, ReconciliationStats,
            ReconciliationView, StatementLine,
        };
    }

    pub mod expense {
        pub use api_types::expense::ExpenseView;
    }
}

pub enum ServerError {
    Engine(EngineError),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidKind(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidStatement(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let ServerError::Engine(err) = self;
        let (status, error) = (status_for_engine_error(&err), message_for_engine_error(err));

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
