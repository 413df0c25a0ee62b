use mockall::mock;
use parcel_engine::{
    db_types::{Amount, ArchiveEntry, Bookmark, NewBookmark, NewUser, Settings, Track, TrackId, User, UserId},
    query_objects::{Page, Pagination, TrackQueryFilter, UserQueryFilter},
    track_objects::{BatchTrackUpdate, Pricing, TrackUpdate},
    traits::{
        BatchResult,
        BookmarkWithOwner,
        SettingsError,
        SettingsManagement,
        TrackApiError,
        TrackManagement,
        UpsertResult,
        UserActivity,
        UserApiError,
        UserManagement,
    },
    user_objects::UserProfileUpdate,
};

mock! {
    pub ParcelStore {}
    impl TrackManagement for ParcelStore {
        async fn fetch_track(&self, track: &TrackId) -> Result<Option<Track>, TrackApiError>;
        async fn fetch_tracks(&self, tracks: &[TrackId]) -> Result<Vec<Track>, TrackApiError>;
        async fn upsert_track(&self, update: TrackUpdate, pricing: Pricing) -> Result<UpsertResult, TrackApiError>;
        async fn upsert_batch(&self, batch: BatchTrackUpdate) -> Result<BatchResult, TrackApiError>;
        async fn assign_owner(&self, track: &TrackId, owner: Option<String>) -> Result<bool, TrackApiError>;
        async fn search_tracks(
            &self,
            query: TrackQueryFilter,
            pagination: Pagination,
        ) -> Result<Page<Track>, TrackApiError>;
    }
    impl SettingsManagement for ParcelStore {
        async fn fetch_settings(&self) -> Result<Option<Settings>, SettingsError>;
        async fn save_settings(&self, settings: &Settings) -> Result<(), SettingsError>;
        async fn save_price(&self, price: Amount) -> Result<Option<Settings>, SettingsError>;
    }
}

mock! {
    pub UserStore {}
    impl UserManagement for UserStore {
        async fn create_user(&self, user: NewUser) -> Result<User, UserApiError>;
        async fn fetch_user(&self, id: UserId) -> Result<Option<User>, UserApiError>;
        async fn update_user(&self, id: UserId, update: UserProfileUpdate) -> Result<Option<User>, UserApiError>;
        async fn set_bonus_percentage(&self, id: UserId, percentage: Amount) -> Result<Option<User>, UserApiError>;
        async fn fetch_referrals(&self, referrer: UserId) -> Result<Vec<User>, UserApiError>;
        async fn search_users(
            &self,
            query: UserQueryFilter,
            pagination: Pagination,
        ) -> Result<Page<UserActivity>, UserApiError>;
        async fn add_bookmark(&self, user: UserId, bookmark: NewBookmark) -> Result<Bookmark, UserApiError>;
        async fn fetch_bookmarks(&self, user: UserId) -> Result<Vec<Bookmark>, UserApiError>;
        async fn archive_bookmark(&self, user: UserId, track: &TrackId) -> Result<Option<ArchiveEntry>, UserApiError>;
        async fn fetch_archive(&self, user: UserId) -> Result<Vec<ArchiveEntry>, UserApiError>;
        async fn fetch_bookmarks_without_status(&self) -> Result<Vec<BookmarkWithOwner>, UserApiError>;
    }
}
