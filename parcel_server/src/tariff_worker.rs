use log::*;
use parcel_engine::{
    traits::{ExchangeRateSource, SettingsError, SettingsManagement},
    SqliteDatabase,
    TariffApi,
    TariffUpdateError,
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{config::TariffConfig, integrations::exchange_rates::HttpRateSource};

/// Starts the tariff worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The first refresh happens immediately. Runs are strictly sequential; if a run takes longer than the interval, the
/// missed ticks are skipped rather than bunched up.
pub fn start_tariff_worker(db: SqliteDatabase, config: TariffConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.update_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let api = TariffApi::new(db);
        let source = HttpRateSource::new(&config.exchange_rate_url);
        info!(
            "🕰️ Tariff worker started. Refreshing {}→{} every {} minutes",
            config.base_currency,
            config.quote_currency,
            config.update_interval.as_secs() / 60
        );
        loop {
            timer.tick().await;
            run_tariff_update(&api, &source, &config.base_currency, &config.quote_currency).await;
        }
    })
}

/// Runs one tariff refresh and logs the outcome. Returns true if the price was updated.
pub async fn run_tariff_update<B, S>(api: &TariffApi<B>, source: &S, base: &str, quote: &str) -> bool
where
    B: SettingsManagement,
    S: ExchangeRateSource,
{
    info!("🕰️ Running tariff update job");
    match api.update_from_source(source, base, quote).await {
        Ok(refresh) => {
            info!(
                "💱️ Tariff updated. {} {base} at {} {quote}/{base} is {} {}",
                refresh.tariff, refresh.rate, refresh.price, refresh.currency
            );
            true
        },
        Err(TariffUpdateError::RateUnavailable(e)) => {
            error!("💱️ Could not fetch the {base}→{quote} exchange rate. The price was not changed. {e}");
            false
        },
        Err(TariffUpdateError::Settings(SettingsError::SettingsNotFound)) => {
            warn!("🕰️ There are no settings in the database. Nothing to update.");
            false
        },
        Err(TariffUpdateError::Settings(e)) => {
            error!("🕰️ Error running tariff update job: {e}");
            false
        },
    }
}
