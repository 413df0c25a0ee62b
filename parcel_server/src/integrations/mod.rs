//! Clients for the third-party services the server talks to.
pub mod exchange_rates;
