//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a bank, movement or expense is not found.
//! - [`InvalidName`] thrown when a bank or expense name is blank.
//! - [`InvalidStatement`] thrown when an uploaded statement cannot be read at
//!   all (row-level problems never surface as errors).
//! - [`Database`] wraps every failure reported by the store.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidStatement`]: EngineError::InvalidStatement
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid movement kind: {0}")]
    InvalidKind(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidStatement(a), Self::InvalidStatement(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<csv::Error> for EngineError {
    fn from(value: csv::Error) -> Self {
        Self::InvalidStatement(value.to_string())
    }
}
