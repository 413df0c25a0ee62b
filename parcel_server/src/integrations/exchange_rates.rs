//! An [`ExchangeRateSource`] backed by a public JSON rates API.
//!
//! The source is queried with `GET {base_url}/{BASE}` and must answer with `{ "rates": { "KZT": 481.23, ... } }`.
use std::{collections::HashMap, str::FromStr, time::Duration};

use log::*;
use parcel_engine::{
    db_types::Amount,
    traits::{ExchangeRateError, ExchangeRateSource},
};
use serde::Deserialize;
use serde_json::Value;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateSource {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_else(|e| {
            warn!("💱️ Could not configure the exchange rate client ({e}). Using the defaults.");
            reqwest::Client::new()
        });
        Self { client, base_url: base_url.trim_end_matches('/').to_string() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ExchangeRateSource for HttpRateSource {
    async fn fetch_rate(&self, base: &str, quote: &str) -> Result<Amount, ExchangeRateError> {
        let url = format!("{}/{base}", self.base_url);
        trace!("💱️ Fetching exchange rates from {url}");
        let response =
            self.client.get(&url).send().await.map_err(|e| ExchangeRateError::Unreachable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeRateError::Unreachable(format!("{url} returned {status}")));
        }
        let body =
            response.json::<RatesResponse>().await.map_err(|e| ExchangeRateError::MalformedResponse(e.to_string()))?;
        let rate = body.rates.get(quote).ok_or_else(|| ExchangeRateError::RateNotQuoted(quote.to_string()))?;
        let rate = match rate {
            Value::Number(n) => Amount::from_str(&n.to_string()),
            Value::String(s) => Amount::from_str(s),
            other => {
                return Err(ExchangeRateError::MalformedResponse(format!("The {quote} rate is not a number: {other}")))
            },
        }
        .map_err(|e| ExchangeRateError::MalformedResponse(e.to_string()))?;
        if rate.is_negative() || rate.is_zero() {
            return Err(ExchangeRateError::MalformedResponse(format!("The {quote} rate must be positive, got {rate}")));
        }
        Ok(rate)
    }
}
