use std::fmt::Display;

use parcel_engine::{
    db_types::{Amount, Track, TrackId, User},
    query_objects::{DateSort, Page, Pagination, Presence, TrackQueryFilter, UserQueryFilter},
    track_objects::{parse_track_date, BatchTrackUpdate, TrackUpdate},
    traits::{TrackApiError, UserActivity},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

//--------------------------------------       Track updates     -------------------------------------------------------
/// Body of `POST /api/tracks/addTrack`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackRequest {
    pub track: String,
    pub status: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub weight: Option<Amount>,
    #[serde(default)]
    pub place: Option<String>,
}

impl TryFrom<AddTrackRequest> for TrackUpdate {
    type Error = TrackApiError;

    fn try_from(req: AddTrackRequest) -> Result<Self, Self::Error> {
        let mut update = TrackUpdate::new(req.track.as_str(), req.status);
        if let Some(date) = req.date.as_deref().filter(|d| !d.trim().is_empty()) {
            update = update.with_date(parse_track_date(date)?);
        }
        if let Some(weight) = req.weight {
            update = update.with_weight(weight);
        }
        if let Some(place) = req.place {
            update = update.with_place(place);
        }
        Ok(update)
    }
}

/// Body of `POST /api/tracks/addExcelTrack`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBatchRequest {
    pub tracks: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub date: Option<String>,
}

impl TryFrom<AddBatchRequest> for BatchTrackUpdate {
    type Error = TrackApiError;

    fn try_from(req: AddBatchRequest) -> Result<Self, Self::Error> {
        let tracks = req.tracks.iter().map(|t| TrackId::from(t.as_str())).collect();
        let mut batch = BatchTrackUpdate::new(tracks, req.status);
        if let Some(date) = req.date.as_deref().filter(|d| !d.trim().is_empty()) {
            batch = batch.with_date(parse_track_date(date)?);
        }
        Ok(batch)
    }
}

//--------------------------------------       Track listing     -------------------------------------------------------
/// Query string of `GET /api/tracks`. Everything is read as text so that junk values fall back to the defaults
/// instead of failing the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub user_filter: Option<String>,
    pub sort_by_date: Option<String>,
}

impl TrackListParams {
    pub fn into_query(self) -> (TrackQueryFilter, Pagination) {
        let pagination = Pagination::from_query(self.page.as_deref(), self.limit.as_deref());
        let mut filter = TrackQueryFilter::default().sorted(DateSort::from_query(self.sort_by_date.as_deref()));
        if let Some(search) = self.search {
            filter = filter.with_search(search);
        }
        if let Some(status) = self.status {
            filter = filter.with_status(status);
        }
        if let Some(presence) = Presence::from_query(self.user_filter.as_deref()) {
            filter = filter.with_owner(presence);
        }
        (filter, pagination)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackListResponse {
    pub total_count: i64,
    pub current_page: u32,
    pub total_pages: i64,
    pub tracks: Vec<Track>,
}

impl From<Page<Track>> for TrackListResponse {
    fn from(page: Page<Track>) -> Self {
        Self {
            total_count: page.total_count,
            current_page: page.current_page,
            total_pages: page.total_pages,
            tracks: page.items,
        }
    }
}

/// Collects the track ids from the `GET /api/tracks/checkTracks` query string. Ids may be repeated
/// (`tracks=A&tracks=B`), given in array form (`tracks[]=A`) or comma separated (`tracks=A,B`).
pub fn tracks_from_query(pairs: &[(String, String)]) -> Vec<TrackId> {
    pairs
        .iter()
        .filter(|(k, _)| k == "tracks" || k == "tracks[]")
        .flat_map(|(_, v)| v.split(','))
        .filter_map(|s| s.parse::<TrackId>().ok())
        .collect()
}

//--------------------------------------       User listing      -------------------------------------------------------
/// Query string of `GET /api/user/users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub filter_by_role: Option<String>,
    pub filter_by_filial: Option<String>,
    pub sort_by_date: Option<String>,
    pub sort_by_activity: Option<String>,
}

impl UserListParams {
    pub fn into_query(self) -> (UserQueryFilter, Pagination) {
        let pagination = Pagination::from_query(self.page.as_deref(), self.limit.as_deref());
        let by_activity = self.sort_by_activity.as_deref().map(|s| s.trim() == "true").unwrap_or(false);
        let mut filter = UserQueryFilter::default()
            .sorted(DateSort::from_query(self.sort_by_date.as_deref()))
            .by_activity(by_activity);
        if let Some(search) = self.search {
            filter = filter.with_search(&search);
        }
        if let Some(role) = self.filter_by_role {
            filter = filter.with_role(role);
        }
        if let Some(filial) = self.filter_by_filial {
            filter = filter.with_filial(filial);
        }
        (filter, pagination)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub total_count: i64,
    pub current_page: u32,
    pub total_pages: i64,
    pub users: Vec<UserActivity>,
}

impl From<Page<UserActivity>> for UserListResponse {
    fn from(page: Page<UserActivity>) -> Self {
        Self {
            total_count: page.total_count,
            current_page: page.current_page,
            total_pages: page.total_pages,
            users: page.items,
        }
    }
}

//--------------------------------------      User accounts      -------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusPercentage {
    #[serde(default)]
    pub referral_bonus_percentage: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: User,
}

//--------------------------------------         Settings        -------------------------------------------------------
/// Body of `PUT /api/settings`. Both fields are optional; absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub tariff: Option<Amount>,
    #[serde(default)]
    pub currency: Option<String>,
}
