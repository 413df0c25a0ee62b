use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Amount, ArchiveEntry, Bookmark, NewBookmark, NewUser, TrackId, User, UserId},
    pte_api::{
        query_objects::{Page, Pagination, UserQueryFilter},
        user_objects::{validate_bonus_percentage, UserProfileUpdate},
    },
    traits::{BookmarkWithOwner, UserActivity, UserApiError, UserManagement},
};

/// `UserApi` covers the parts of a user record that affect pricing and referrals.
pub struct UserApi<B> {
    db: B,
}

impl<B> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi")
    }
}

impl<B> UserApi<B>
where B: UserManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User, UserApiError> {
        let user = self.db.create_user(user).await?;
        debug!("🧑️ User #{} created", user.id);
        Ok(user)
    }

    pub async fn fetch_user(&self, id: UserId) -> Result<User, UserApiError> {
        self.db.fetch_user(id).await?.ok_or(UserApiError::UserNotFound(id))
    }

    pub async fn bonus_percentage(&self, id: UserId) -> Result<Amount, UserApiError> {
        let user = self.fetch_user(id).await?;
        Ok(user.referral_bonus_percentage)
    }

    /// The percentage is validated before the store is touched.
    pub async fn update_bonus_percentage(&self, id: UserId, percentage: Option<Amount>) -> Result<User, UserApiError> {
        let percentage = validate_bonus_percentage(percentage)?;
        let user = self.db.set_bonus_percentage(id, percentage).await?.ok_or(UserApiError::UserNotFound(id))?;
        info!("🧑️ Referral bonus for user #{id} set to {percentage}%");
        Ok(user)
    }

    pub async fn update_profile(&self, id: UserId, update: UserProfileUpdate) -> Result<User, UserApiError> {
        update.validate()?;
        let user = self.db.update_user(id, update).await?.ok_or(UserApiError::UserNotFound(id))?;
        debug!("🧑️ Profile for user #{id} updated");
        Ok(user)
    }

    pub async fn referrals(&self, referrer: UserId) -> Result<Vec<User>, UserApiError> {
        self.db.fetch_referrals(referrer).await
    }

    pub async fn search_users(
        &self,
        query: UserQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<UserActivity>, UserApiError> {
        self.db.search_users(query, pagination).await
    }

    pub async fn add_bookmark(&self, user: UserId, bookmark: NewBookmark) -> Result<Bookmark, UserApiError> {
        self.fetch_user(user).await?;
        self.db.add_bookmark(user, bookmark).await
    }

    pub async fn bookmarks(&self, user: UserId) -> Result<Vec<Bookmark>, UserApiError> {
        self.db.fetch_bookmarks(user).await
    }

    pub async fn archive_bookmark(&self, user: UserId, track: &TrackId) -> Result<Option<ArchiveEntry>, UserApiError> {
        self.db.archive_bookmark(user, track).await
    }

    pub async fn archive(&self, user: UserId) -> Result<Vec<ArchiveEntry>, UserApiError> {
        self.db.fetch_archive(user).await
    }

    pub async fn bookmarks_without_status(&self) -> Result<Vec<BookmarkWithOwner>, UserApiError> {
        self.db.fetch_bookmarks_without_status().await
    }
}
