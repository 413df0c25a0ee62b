use thiserror::Error;

use crate::traits::{ExchangeRateError, SettingsError};

/// Why a tariff refresh did not write anything.
#[derive(Debug, Clone, Error)]
pub enum TariffUpdateError {
    #[error("Could not fetch the exchange rate. {0}")]
    RateUnavailable(#[from] ExchangeRateError),
    #[error("Could not update the tariff. {0}")]
    Settings(#[from] SettingsError),
}
