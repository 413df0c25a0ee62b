use std::{env, time::Duration};

use log::*;
use parcel_common::{parse_boolean_flag, Secret};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_PTS_HOST: &str = "127.0.0.1";
const DEFAULT_PTS_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/parcel_store.db";
const DEFAULT_EXCHANGE_RATE_URL: &str = "https://api.exchangerate-api.com/v4/latest";
const DEFAULT_BASE_CURRENCY: &str = "USD";
const DEFAULT_QUOTE_CURRENCY: &str = "KZT";
const DEFAULT_TARIFF_UPDATE_INTERVAL_MINS: u64 = 60;
const RANDOM_SECRET_LENGTH: usize = 48;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub tariff: TariffConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PTS_HOST.to_string(),
            port: DEFAULT_PTS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            tariff: TariffConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PTS_HOST").ok().unwrap_or_else(|| DEFAULT_PTS_HOST.into());
        let port = env::var("PTS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PTS_PORT. {e} Using the default, {DEFAULT_PTS_PORT}, instead."
                    );
                    DEFAULT_PTS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PTS_PORT);
        let database_url = env::var("PTS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ PTS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the authentication configuration. {e}. Reverting to the default configuration.");
            AuthConfig::default()
        });
        let tariff = TariffConfig::from_env_or_default();
        Self { host, port, database_url, auth, tariff }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret that bearer tokens are signed with.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Tokens issued before \
             a restart will stop working. Set PTS_JWT_SECRET for production. 🚨️🚨️🚨️"
        );
        let secret: String =
            thread_rng().sample_iter(&Alphanumeric).take(RANDOM_SECRET_LENGTH).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("PTS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [PTS_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("PTS_JWT_SECRET is empty".to_string()));
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  TariffConfig  -----------------------------------------------------
/// Settings for the periodic tariff refresh.
#[derive(Clone, Debug)]
pub struct TariffConfig {
    /// Base URL of the exchange rate source. The base currency code is appended as the last path segment.
    pub exchange_rate_url: String,
    pub base_currency: String,
    pub quote_currency: String,
    pub update_interval: Duration,
    pub disable_worker: bool,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            exchange_rate_url: DEFAULT_EXCHANGE_RATE_URL.to_string(),
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            quote_currency: DEFAULT_QUOTE_CURRENCY.to_string(),
            update_interval: Duration::from_secs(DEFAULT_TARIFF_UPDATE_INTERVAL_MINS * 60),
            disable_worker: false,
        }
    }
}

impl TariffConfig {
    pub fn from_env_or_default() -> Self {
        let exchange_rate_url = env::var("PTS_EXCHANGE_RATE_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_EXCHANGE_RATE_URL.to_string());
        let base_currency = currency_from_env("PTS_BASE_CURRENCY", DEFAULT_BASE_CURRENCY);
        let quote_currency = currency_from_env("PTS_QUOTE_CURRENCY", DEFAULT_QUOTE_CURRENCY);
        let update_interval = update_interval_from(env::var("PTS_TARIFF_UPDATE_INTERVAL").ok());
        let disable_worker = parse_boolean_flag(env::var("PTS_DISABLE_TARIFF_WORKER").ok(), false);
        Self {
            exchange_rate_url,
            base_currency,
            quote_currency,
            update_interval,
            disable_worker,
        }
    }
}

/// Reads the refresh interval in whole minutes. Zero, garbage or a value too large to hold in seconds falls back to
/// the default.
fn update_interval_from(value: Option<String>) -> Duration {
    let default = Duration::from_secs(DEFAULT_TARIFF_UPDATE_INTERVAL_MINS * 60);
    let Some(value) = value else {
        info!(
            "🪛️ PTS_TARIFF_UPDATE_INTERVAL is not set. Using the default value of \
             {DEFAULT_TARIFF_UPDATE_INTERVAL_MINS} minutes."
        );
        return default;
    };
    match value.trim().parse::<u64>() {
        Ok(0) => {
            warn!("🪛️ PTS_TARIFF_UPDATE_INTERVAL must be at least one minute.");
            default
        },
        Ok(mins) => mins.checked_mul(60).map(Duration::from_secs).unwrap_or_else(|| {
            warn!("🪛️ PTS_TARIFF_UPDATE_INTERVAL of {mins} minutes is too large.");
            default
        }),
        Err(e) => {
            warn!("🪛️ Invalid configuration value for PTS_TARIFF_UPDATE_INTERVAL. {e}");
            default
        },
    }
}

fn currency_from_env(var: &str, default: &str) -> String {
    match env::var(var).map(|s| s.trim().to_uppercase()) {
        Ok(s) if !s.is_empty() => s,
        _ => {
            debug!("🪛️ {var} is not set. Using {default}.");
            default.to_string()
        },
    }
}
