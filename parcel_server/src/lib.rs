//! # Parcel tracking server
//! This crate hosts the HTTP server for the parcel tracking engine. It is responsible for:
//! * Accepting single and bulk (spreadsheet) track status updates from the warehouse.
//! * Serving paginated, filtered track and user listings to the admin panel.
//! * Reading and writing the tariff settings, and keeping the local-currency price in step with the exchange rate.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/tracks/...`: Track updates, listings and totals.
//! * `/api/user/...`: User listings, referrals, bonus percentages and profile edits.
//! * `/api/settings`: The tariff settings.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod tariff_worker;

#[cfg(test)]
mod endpoint_tests;
