//! # Parcel tracking engine public API
//!
//! The `pte_api` module exposes the programmatic API for the parcel tracking engine. The API is modular, so that
//! clients can pick the functionality they need.
//!
//! * [`track_flow_api`] reconciles status updates against stored tracks, prices them, and lists them.
//! * [`tariff_api`] manages the tariff settings and refreshes the local-currency price from an exchange rate.
//! * [`user_api`] manages referral bonuses, profile fields and bookmarks.
//!
//! The other submodules are value objects used by the APIs and by backends.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the traits required by the API.
//!
//! ```rust,ignore
//! use parcel_engine::{SqliteDatabase, TrackFlowApi, track_objects::TrackUpdate};
//! let db = SqliteDatabase::new_with_url("sqlite://data/parcel_store.db", 5).await?;
//! let api = TrackFlowApi::new(db);
//! let result = api.apply_update(TrackUpdate::new("TRK1", "received")).await?;
//! ```
pub mod errors;
pub mod query_objects;
pub mod tariff_api;
pub mod track_flow_api;
pub mod track_objects;
pub mod user_api;
pub mod user_objects;
