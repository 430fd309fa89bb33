//! Handles settings for the application.
//!
//! Configuration is read from an optional `settings.toml` in the working
//! directory and then from environment variables prefixed with `TESORERIA`,
//! using `__` between sections (`TESORERIA__SERVER__PORT=8080`).
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Reconciliation {
    pub amount_epsilon: Decimal,
    pub date_window_days: i64,
}

impl From<&Reconciliation> for engine::MatchRules {
    fn from(value: &Reconciliation) -> Self {
        Self {
            amount_epsilon: value.amount_epsilon,
            date_window_days: value.date_window_days,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    pub reconciliation: Reconciliation,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let defaults = engine::MatchRules::default();
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default(
                "reconciliation.amount_epsilon",
                defaults.amount_epsilon.to_string(),
            )?
            .set_default("reconciliation.date_window_days", defaults.date_window_days)?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("TESORERIA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
