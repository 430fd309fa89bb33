use sea_orm::DatabaseConnection;

use crate::{EngineError, MatchRules, ResultEngine};

mod access;
mod banks;
mod expenses;
mod movements;
mod reconciliation;

pub use reconciliation::{MaterializedDiscrepancy, StatementReconciliation};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    rules: MatchRules,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Tolerances used by [`Engine::reconcile_statement`].
    pub fn match_rules(&self) -> MatchRules {
        self.rules
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    rules: MatchRules,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default matching tolerances.
    pub fn match_rules(mut self, rules: MatchRules) -> EngineBuilder {
        self.rules = rules;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.rules.amount_epsilon <= rust_decimal::Decimal::ZERO {
            return Err(EngineError::InvalidAmount(
                "amount_epsilon must be > 0".to_string(),
            ));
        }
        if self.rules.date_window_days < 0 {
            return Err(EngineError::InvalidAmount(
                "date_window_days must be >= 0".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            rules: self.rules,
        })
    }
}
