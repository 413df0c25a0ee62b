//! Parcel Tracking Engine
//!
//! The parcel tracking engine records parcel "tracks" as they move through the delivery pipeline, prices them from
//! their weight and the current tariff, and keeps the tariff in step with a live exchange rate.
//! This library contains the core logic. It is transport-agnostic.
//!
//! The library is divided into three main sections:
//! 1. The backend contracts ([`mod@traits`]) and the SQLite backend that implements them. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`TrackFlowApi`], [`TariffApi`], [`UserApi`]). This provides the track lifecycle and
//!    pricing rules, the tariff refresh, and the user listing and referral functionality.
//! 3. Value objects for queries and updates ([`query_objects`], [`track_objects`], [`user_objects`]).
pub mod db_types;
mod pte_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use pte_api::{
    errors::TariffUpdateError,
    query_objects,
    tariff_api::{TariffApi, TariffRefresh},
    track_flow_api::TrackFlowApi,
    track_objects,
    user_api::UserApi,
    user_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
