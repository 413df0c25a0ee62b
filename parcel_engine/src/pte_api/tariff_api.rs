//! The `TariffApi` manages the singleton [`Settings`] record: the operator-set tariff, and the local-currency price
//! derived from it with a live exchange rate.
use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Amount, Settings},
    pte_api::errors::TariffUpdateError,
    traits::{ExchangeRateSource, SettingsError, SettingsManagement},
};

/// A successful tariff refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffRefresh {
    pub tariff: Amount,
    pub rate: Amount,
    pub price: Amount,
    pub currency: String,
}

pub struct TariffApi<B> {
    db: B,
}

impl<B> Debug for TariffApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TariffApi")
    }
}

impl<B> TariffApi<B>
where B: SettingsManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_settings(&self) -> Result<Settings, SettingsError> {
        self.db.fetch_settings().await?.ok_or(SettingsError::SettingsNotFound)
    }

    /// Sets the operator-controlled fields. The price is left alone until the next refresh.
    pub async fn update_settings(
        &self,
        tariff: Option<Amount>,
        currency: Option<String>,
    ) -> Result<Settings, SettingsError> {
        if let Some(t) = tariff {
            if t.is_negative() {
                return Err(SettingsError::InvalidTariff(format!("{t} is negative")));
            }
        }
        let mut settings = match self.db.fetch_settings().await? {
            Some(s) => s,
            None => {
                warn!("💱️ There were no settings. A new record will be created.");
                Settings::new(Amount::zero(), Amount::zero(), "")
            },
        };
        if let Some(t) = tariff {
            settings.tariff = t;
        }
        if let Some(c) = currency.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
            settings.currency = c;
        }
        settings.updated_at = chrono::Utc::now();
        self.db.save_settings(&settings).await?;
        info!("💱️ Settings updated. Tariff: {}, currency: {}", settings.tariff, settings.currency);
        Ok(settings)
    }

    /// Recomputes `price = round(tariff × rate, 2)` and saves it. Fails with
    /// [`SettingsError::SettingsNotFound`] rather than creating a record.
    ///
    /// Only the price column is written, so a tariff or currency change made by an operator while the refresh is in
    /// flight is kept.
    pub async fn refresh_price(&self, rate: Amount) -> Result<Settings, SettingsError> {
        let settings = self.db.fetch_settings().await?.ok_or(SettingsError::SettingsNotFound)?;
        let price = settings
            .tariff
            .checked_mul(rate)
            .ok_or_else(|| SettingsError::PriceOverflow(format!("{} × {rate}", settings.tariff)))?
            .rounded();
        self.db.save_price(price).await?.ok_or(SettingsError::SettingsNotFound)
    }

    /// Fetches the `base`→`quote` rate from `source` and refreshes the price with it. Nothing is written if the rate
    /// cannot be fetched or the settings do not exist.
    pub async fn update_from_source<S: ExchangeRateSource>(
        &self,
        source: &S,
        base: &str,
        quote: &str,
    ) -> Result<TariffRefresh, TariffUpdateError> {
        let rate = source.fetch_rate(base, quote).await?;
        debug!("💱️ 1 {base} = {rate} {quote}");
        let settings = self.refresh_price(rate).await?;
        Ok(TariffRefresh { tariff: settings.tariff, rate, price: settings.price, currency: settings.currency })
    }
}
