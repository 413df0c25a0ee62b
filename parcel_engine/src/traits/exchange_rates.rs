use thiserror::Error;

use crate::db_types::Amount;

#[derive(Debug, Clone, Error)]
pub enum ExchangeRateError {
    #[error("The exchange rate source could not be reached: {0}")]
    Unreachable(String),
    #[error("The exchange rate source returned a response that could not be understood: {0}")]
    MalformedResponse(String),
    #[error("The exchange rate source does not quote {0}")]
    RateNotQuoted(String),
}

/// A source of currency conversion rates.
///
/// Implementations make a single attempt per call. Every transport or parsing problem must be reported as an
/// [`ExchangeRateError`]; nothing else may escape.
#[allow(async_fn_in_trait)]
pub trait ExchangeRateSource {
    /// Returns how many units of `quote` one unit of `base` buys.
    async fn fetch_rate(&self, base: &str, quote: &str) -> Result<Amount, ExchangeRateError>;
}
