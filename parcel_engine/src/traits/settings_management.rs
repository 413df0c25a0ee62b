use thiserror::Error;

use crate::db_types::{Amount, Settings};

#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The settings record does not exist")]
    SettingsNotFound,
    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),
    #[error("The price cannot be represented: {0}")]
    PriceOverflow(String),
}

impl From<sqlx::Error> for SettingsError {
    fn from(e: sqlx::Error) -> Self {
        SettingsError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait SettingsManagement {
    /// Fetches the singleton settings record. `None` is returned if it has never been created.
    async fn fetch_settings(&self) -> Result<Option<Settings>, SettingsError>;

    /// Creates or overwrites the singleton settings record.
    async fn save_settings(&self, settings: &Settings) -> Result<(), SettingsError>;

    /// Writes a new local-currency price, leaving the tariff and currency as they are in storage. Returns the
    /// updated record, or `None` if it does not exist. Nothing is created.
    async fn save_price(&self, price: Amount) -> Result<Option<Settings>, SettingsError>;
}
