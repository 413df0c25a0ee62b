use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Bookmark, Track, User, UserId};

/// The outcome of a single-track upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UpsertResult {
    Created(Track),
    Updated(Track),
}

impl UpsertResult {
    pub fn track(&self) -> &Track {
        match self {
            UpsertResult::Created(t) | UpsertResult::Updated(t) => t,
        }
    }

    pub fn into_track(self) -> Track {
        match self {
            UpsertResult::Created(t) | UpsertResult::Updated(t) => t,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, UpsertResult::Created(_))
    }
}

/// The number of tracks created and updated by a batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub created: u64,
    pub updated: u64,
}

impl BatchResult {
    pub fn new(created: u64, updated: u64) -> Self {
        Self { created, updated }
    }
}

/// A user record annotated with how many bookmarks and archived tracks they have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub bookmark_count: i64,
    pub archive_count: i64,
    pub total_activity: i64,
}

/// The contact details of a bookmark's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkOwner {
    pub user_id: UserId,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkWithOwner {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    pub user: BookmarkOwner,
}
