use thiserror::Error;

use crate::{
    db_types::{Amount, ArchiveEntry, Bookmark, NewBookmark, NewUser, TrackId, User, UserId},
    pte_api::{
        query_objects::{Page, Pagination, UserQueryFilter},
        user_objects::UserProfileUpdate,
    },
    traits::{BookmarkWithOwner, UserActivity},
};

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User {0} does not exist")]
    UserNotFound(UserId),
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),
    #[error("Invalid bonus percentage: {0}")]
    InvalidBonusPercentage(String),
    #[error("Invalid personal rate: {0}")]
    InvalidPersonalRate(String),
}

impl From<sqlx::Error> for UserApiError {
    fn from(e: sqlx::Error) -> Self {
        UserApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    async fn create_user(&self, user: NewUser) -> Result<User, UserApiError>;

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, UserApiError>;

    /// Applies the supplied profile fields. Fields that are `None` in the update keep their current value.
    /// Returns `None` if the user does not exist.
    async fn update_user(&self, id: UserId, update: UserProfileUpdate) -> Result<Option<User>, UserApiError>;

    /// Sets the referral bonus percentage. Returns `None` if the user does not exist.
    async fn set_bonus_percentage(&self, id: UserId, percentage: Amount) -> Result<Option<User>, UserApiError>;

    /// Returns all the users that were referred by `referrer`.
    async fn fetch_referrals(&self, referrer: UserId) -> Result<Vec<User>, UserApiError>;

    /// Returns one page of users matching the filter, annotated with their bookmark and archive counts.
    async fn search_users(
        &self,
        query: UserQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<UserActivity>, UserApiError>;

    async fn add_bookmark(&self, user: UserId, bookmark: NewBookmark) -> Result<Bookmark, UserApiError>;

    async fn fetch_bookmarks(&self, user: UserId) -> Result<Vec<Bookmark>, UserApiError>;

    /// Moves the user's bookmark for `track` into their archive. Returns `None` if there is no such bookmark.
    async fn archive_bookmark(&self, user: UserId, track: &TrackId) -> Result<Option<ArchiveEntry>, UserApiError>;

    async fn fetch_archive(&self, user: UserId) -> Result<Vec<ArchiveEntry>, UserApiError>;

    /// Returns every bookmark, across all users, that has no current status, with the owner's contact details.
    async fn fetch_bookmarks_without_status(&self) -> Result<Vec<BookmarkWithOwner>, UserApiError>;
}
