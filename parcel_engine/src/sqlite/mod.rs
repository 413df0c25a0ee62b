//! SQLite backend for the parcel tracking engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
