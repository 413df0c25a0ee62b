//! #  Backend behaviour
//!
//! This module defines the interface contracts that storage backends (and the exchange rate source) must honour in
//! order to be driven by the public APIs in [`crate::pte_api`].
//!
//! ## Tracks
//! A track is a parcel moving through the delivery pipeline, identified by its business key. The
//! [`TrackManagement`] trait is responsible for creating and updating tracks atomically, including appending to
//! their status history, and for the filtered listings used by operators.
//!
//! ## Settings
//! [`SettingsManagement`] reads and writes the singleton tariff configuration.
//!
//! ## Users
//! [`UserManagement`] covers the user records that matter for pricing and referrals: bonus percentages, personal
//! rate overrides, bookmarks and the archive.
//!
//! ## Exchange rates
//! [`ExchangeRateSource`] is the narrow interface to whatever provides the conversion rate from the tariff currency
//! to the local currency.
mod data_objects;
mod exchange_rates;
mod settings_management;
mod track_management;
mod user_management;

pub use data_objects::{BatchResult, BookmarkOwner, BookmarkWithOwner, UpsertResult, UserActivity};
pub use exchange_rates::{ExchangeRateError, ExchangeRateSource};
pub use settings_management::{SettingsError, SettingsManagement};
pub use track_management::{TrackApiError, TrackManagement};
pub use user_management::{UserApiError, UserManagement};
