//! `SqliteDatabase` is a concrete implementation of a parcel tracking engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, settings, tracks, users};
use crate::{
    db_types::{Amount, ArchiveEntry, Bookmark, NewBookmark, NewUser, Settings, Track, TrackId, User, UserId},
    pte_api::{
        query_objects::{Page, Pagination, TrackQueryFilter, UserQueryFilter},
        track_objects::{resolve, BatchTrackUpdate, Pricing, TrackMutation, TrackUpdate},
        user_objects::UserProfileUpdate,
    },
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
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl TrackManagement for SqliteDatabase {
    async fn fetch_track(&self, track: &TrackId) -> Result<Option<Track>, TrackApiError> {
        let mut conn = self.pool.acquire().await?;
        let track = tracks::fetch_track(track, &mut conn).await?;
        Ok(track)
    }

    async fn fetch_tracks(&self, ids: &[TrackId]) -> Result<Vec<Track>, TrackApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = tracks::fetch_tracks(ids, &mut conn).await?;
        Ok(result)
    }

    /// Reads the current record, resolves the update against it and writes the result, in a single transaction.
    async fn upsert_track(&self, update: TrackUpdate, pricing: Pricing) -> Result<UpsertResult, TrackApiError> {
        let mut tx = self.pool.begin().await?;
        let existing = tracks::fetch_track(&update.track, &mut tx).await?;
        let result = match resolve(existing.as_ref(), &update, &pricing)? {
            TrackMutation::Create(new_track) => {
                let track = tracks::insert_track(new_track, &mut tx).await?;
                UpsertResult::Created(track)
            },
            TrackMutation::Update(changes) => {
                let id = changes.id;
                tracks::update_track(changes, &mut tx).await?;
                let track = tracks::fetch_track_by_id(id, &mut tx).await?.ok_or_else(|| {
                    error!("🗃️ Track #{id} disappeared in the middle of an update. This is a bug.");
                    TrackApiError::TrackNotFound(update.track.clone())
                })?;
                UpsertResult::Updated(track)
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn upsert_batch(&self, batch: BatchTrackUpdate) -> Result<BatchResult, TrackApiError> {
        let mut tx = self.pool.begin().await?;
        let result = tracks::upsert_batch(batch, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn assign_owner(&self, track: &TrackId, owner: Option<String>) -> Result<bool, TrackApiError> {
        let mut conn = self.pool.acquire().await?;
        let updated = tracks::assign_owner(track, owner, &mut conn).await?;
        Ok(updated)
    }

    async fn search_tracks(
        &self,
        query: TrackQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Track>, TrackApiError> {
        let mut conn = self.pool.acquire().await?;
        let (tracks, total) = tracks::search_tracks(query, pagination, &mut conn).await?;
        Ok(Page::new(tracks, total, pagination))
    }
}

impl SettingsManagement for SqliteDatabase {
    async fn fetch_settings(&self) -> Result<Option<Settings>, SettingsError> {
        let mut conn = self.pool.acquire().await?;
        let result = settings::fetch_settings(&mut conn).await?;
        Ok(result)
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut conn = self.pool.acquire().await?;
        settings::save_settings(settings, &mut conn).await?;
        Ok(())
    }

    async fn save_price(&self, price: Amount) -> Result<Option<Settings>, SettingsError> {
        let mut conn = self.pool.acquire().await?;
        let result = settings::save_price(price, &mut conn).await?;
        Ok(result)
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::insert_user(user, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(id, &mut conn).await?;
        Ok(user)
    }

    async fn update_user(&self, id: UserId, update: UserProfileUpdate) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::update_user(id, update, &mut conn).await?;
        Ok(user)
    }

    async fn set_bonus_percentage(&self, id: UserId, percentage: Amount) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::set_bonus_percentage(id, percentage, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_referrals(&self, referrer: UserId) -> Result<Vec<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let referrals = users::fetch_referrals(referrer, &mut conn).await?;
        Ok(referrals)
    }

    async fn search_users(
        &self,
        query: UserQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<UserActivity>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let (users, total) = users::search_users(query, pagination, &mut conn).await?;
        Ok(Page::new(users, total, pagination))
    }

    async fn add_bookmark(&self, user: UserId, bookmark: NewBookmark) -> Result<Bookmark, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let bookmark = users::insert_bookmark(user, bookmark, &mut conn).await?;
        Ok(bookmark)
    }

    async fn fetch_bookmarks(&self, user: UserId) -> Result<Vec<Bookmark>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let bookmarks = users::fetch_bookmarks(user, &mut conn).await?;
        Ok(bookmarks)
    }

    async fn archive_bookmark(&self, user: UserId, track: &TrackId) -> Result<Option<ArchiveEntry>, UserApiError> {
        let mut tx = self.pool.begin().await?;
        let entry = users::archive_bookmark(user, track, &mut tx).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn fetch_archive(&self, user: UserId) -> Result<Vec<ArchiveEntry>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let entries = users::fetch_archive(user, &mut conn).await?;
        Ok(entries)
    }

    async fn fetch_bookmarks_without_status(&self) -> Result<Vec<BookmarkWithOwner>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let bookmarks = users::fetch_bookmarks_without_status(&mut conn).await?;
        Ok(bookmarks)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }
}
