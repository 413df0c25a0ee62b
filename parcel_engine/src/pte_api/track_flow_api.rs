use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Track, TrackId},
    pte_api::{
        query_objects::{Page, Pagination, TrackQueryFilter},
        track_objects::{BatchTrackUpdate, Pricing, TrackTotals, TrackUpdate},
    },
    traits::{BatchResult, SettingsManagement, TrackApiError, TrackManagement, UpsertResult},
};

/// `TrackFlowApi` is the primary API for recording parcel movements. It reconciles incoming status updates against
/// the stored tracks and prices them using the current settings.
pub struct TrackFlowApi<B> {
    db: B,
}

impl<B> Debug for TrackFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TrackFlowApi")
    }
}

impl<B> TrackFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> TrackFlowApi<B>
where B: TrackManagement + SettingsManagement
{
    /// Reads the settings once and returns the pricing to use for one operation.
    pub async fn pricing(&self) -> Result<Pricing, TrackApiError> {
        let settings = self.db.fetch_settings().await?.ok_or_else(|| {
            error!("📦️ There are no settings in the database. Tracks cannot be priced.");
            TrackApiError::SettingsNotFound
        })?;
        Ok(Pricing::from(&settings))
    }

    /// Creates the track if it is new, or updates it otherwise. See [`crate::pte_api::track_objects::resolve`] for
    /// the merge rules.
    pub async fn apply_update(&self, update: TrackUpdate) -> Result<UpsertResult, TrackApiError> {
        if update.track.is_empty() {
            return Err(TrackApiError::InvalidTrackId("A track id is required".to_string()));
        }
        let pricing = self.pricing().await?;
        let track_id = update.track.clone();
        let result = self.db.upsert_track(update, pricing).await?;
        match &result {
            UpsertResult::Created(t) => info!("📦️ Track {track_id} created with status '{}'", t.status),
            UpsertResult::Updated(t) => {
                debug!("📦️ Track {track_id} updated to '{}'. It has {} history entries", t.status, t.history.len())
            },
        }
        Ok(result)
    }

    /// Applies one status to many tracks, creating the ones that do not exist yet.
    pub async fn apply_batch(&self, batch: BatchTrackUpdate) -> Result<BatchResult, TrackApiError> {
        if batch.is_empty() {
            return Err(TrackApiError::EmptyTrackList);
        }
        let status = batch.status.clone();
        let result = self.db.upsert_batch(batch).await?;
        info!("📦️ Batch update to '{status}': {} tracks created, {} updated", result.created, result.updated);
        Ok(result)
    }

    pub async fn fetch_track(&self, track: &TrackId) -> Result<Option<Track>, TrackApiError> {
        self.db.fetch_track(track).await
    }

    /// Associates a track with the customer it belongs to. Fails with [`TrackApiError::TrackNotFound`] if there is
    /// no such track.
    pub async fn assign_owner(&self, track: &TrackId, owner: Option<String>) -> Result<(), TrackApiError> {
        let owner = owner.map(|o| o.trim().to_string()).filter(|o| !o.is_empty());
        if self.db.assign_owner(track, owner).await? {
            Ok(())
        } else {
            Err(TrackApiError::TrackNotFound(track.clone()))
        }
    }

    pub async fn search_tracks(
        &self,
        query: TrackQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Track>, TrackApiError> {
        trace!("📦️ Searching tracks. {query}");
        self.db.search_tracks(query, pagination).await
    }

    /// Sums the weight and price of the given tracks, reporting the ones that are unknown or not yet weighed.
    pub async fn check_tracks(&self, tracks: &[TrackId]) -> Result<TrackTotals, TrackApiError> {
        if tracks.is_empty() {
            return Err(TrackApiError::EmptyTrackList);
        }
        let found = self.db.fetch_tracks(tracks).await?;
        TrackTotals::tally(tracks, &found)
    }
}
