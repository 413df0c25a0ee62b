use thiserror::Error;

use crate::{
    db_types::{Track, TrackId},
    pte_api::{
        query_objects::{Page, Pagination, TrackQueryFilter},
        track_objects::{BatchTrackUpdate, Pricing, TrackUpdate},
    },
    traits::{data_objects::UpsertResult, BatchResult, SettingsError},
};

#[derive(Debug, Clone, Error)]
pub enum TrackApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("There are no settings configured, so tracks cannot be priced")]
    SettingsNotFound,
    #[error("Invalid track id: {0}")]
    InvalidTrackId(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("At least one track id must be supplied")]
    EmptyTrackList,
    #[error("Track {0} does not exist")]
    TrackNotFound(TrackId),
}

impl From<sqlx::Error> for TrackApiError {
    fn from(e: sqlx::Error) -> Self {
        TrackApiError::DatabaseError(e.to_string())
    }
}

impl From<SettingsError> for TrackApiError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::SettingsNotFound => TrackApiError::SettingsNotFound,
            other => TrackApiError::DatabaseError(other.to_string()),
        }
    }
}

/// The `TrackManagement` trait defines the storage behaviour behind the track lifecycle.
///
/// The create-vs-update decision and the field merge rules are pure functions in
/// [`crate::pte_api::track_objects`]. Backends are responsible for running them against the stored record inside a
/// single atomic unit of work, and for appending the history entry.
#[allow(async_fn_in_trait)]
pub trait TrackManagement {
    /// Fetches the track with the given business key, including its full history.
    async fn fetch_track(&self, track: &TrackId) -> Result<Option<Track>, TrackApiError>;

    /// Fetches all the tracks in the list that exist, with their history. Unknown ids are silently skipped.
    async fn fetch_tracks(&self, tracks: &[TrackId]) -> Result<Vec<Track>, TrackApiError>;

    /// Creates the track if it does not exist, otherwise updates it. Exactly one track is written and exactly one
    /// history entry is appended.
    async fn upsert_track(&self, update: TrackUpdate, pricing: Pricing) -> Result<UpsertResult, TrackApiError>;

    /// Sets the status of every known track in the batch and creates the unknown ones. Weight, price, place and
    /// currency are never touched.
    async fn upsert_batch(&self, batch: BatchTrackUpdate) -> Result<BatchResult, TrackApiError>;

    /// Sets (or with `None`, clears) the customer a track belongs to. Returns `false` if the track does not exist.
    async fn assign_owner(&self, track: &TrackId, owner: Option<String>) -> Result<bool, TrackApiError>;

    /// Returns one page of tracks matching the filter, along with the total number of matches.
    async fn search_tracks(
        &self,
        query: TrackQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Track>, TrackApiError>;
}
