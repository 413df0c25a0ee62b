use chrono::Utc;
use log::{debug, trace};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Amount, ArchiveEntry, Bookmark, NewBookmark, NewUser, TrackId, User, UserId},
    pte_api::{
        query_objects::{like_pattern, Pagination, UserQueryFilter, UserSearch},
        user_objects::UserProfileUpdate,
    },
    traits::{BookmarkOwner, BookmarkWithOwner, UserActivity},
};

const DEFAULT_ROLE: &str = "client";

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let now = Utc::now();
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (name, surname, phone, email, role, selected_filial, referrer, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(user.name)
    .bind(user.surname)
    .bind(user.phone)
    .bind(user.email)
    .bind(user.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()))
    .bind(user.selected_filial)
    .bind(user.referrer)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ User #{} inserted", user.id);
    Ok(user)
}

pub async fn fetch_user(id: UserId, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

/// Applies the supplied profile fields, leaving the others as they are. A cleared personal rate is written as NULL.
/// Returns `None` if the user does not exist.
pub async fn update_user(
    id: UserId,
    update: UserProfileUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as(
        r#"
            UPDATE users SET
                name = COALESCE($1, name),
                surname = COALESCE($2, surname),
                phone = COALESCE($3, phone),
                email = COALESCE($4, email),
                role = COALESCE($5, role),
                selected_filial = COALESCE($6, selected_filial),
                personal_rate = CASE WHEN $7 THEN $8 ELSE personal_rate END,
                updated_at = $9
            WHERE id = $10
            RETURNING *;
        "#,
    )
    .bind(update.name)
    .bind(update.surname)
    .bind(update.phone)
    .bind(update.email)
    .bind(update.role)
    .bind(update.selected_filial)
    .bind(update.personal_rate.is_some())
    .bind(update.personal_rate.flatten())
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

pub async fn set_bonus_percentage(
    id: UserId,
    percentage: Amount,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as(
        "UPDATE users SET referral_bonus_percentage = $1, updated_at = $2 WHERE id = $3 RETURNING *",
    )
    .bind(percentage)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

pub async fn fetch_referrals(referrer: UserId, conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    let users =
        sqlx::query_as("SELECT * FROM users WHERE referrer = $1 ORDER BY id").bind(referrer).fetch_all(conn).await?;
    Ok(users)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &UserQueryFilter) {
    if query.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    match &query.search {
        Some(UserSearch::Phone(phone)) => {
            where_clause.push("phone = ");
            where_clause.push_bind_unseparated(phone.clone());
        },
        Some(UserSearch::Name(name)) => {
            let pattern = like_pattern(name);
            where_clause.push("(name LIKE ");
            where_clause.push_bind_unseparated(pattern.clone());
            where_clause.push_unseparated(" ESCAPE '\\' OR surname LIKE ");
            where_clause.push_bind_unseparated(pattern);
            where_clause.push_unseparated(" ESCAPE '\\')");
        },
        None => {},
    }
    if let Some(role) = &query.role {
        where_clause.push("role = ");
        where_clause.push_bind_unseparated(role.clone());
    }
    if let Some(filial) = &query.filial {
        where_clause.push("selected_filial = ");
        where_clause.push_bind_unseparated(filial.clone());
    }
}

/// Fetches one page of users according to the criteria in the `UserQueryFilter`, along with the total number of
/// matching users. Activity ordering is applied over the full result set, before paging.
pub async fn search_users(
    query: UserQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<UserActivity>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
    push_filters(&mut builder, &query);
    let total = builder.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT *, bookmark_count + archive_count AS total_activity FROM (
            SELECT users.*,
                (SELECT COUNT(*) FROM bookmarks b WHERE b.user_id = users.id) AS bookmark_count,
                (SELECT COUNT(*) FROM archive a WHERE a.user_id = users.id) AS archive_count
            FROM users"#,
    );
    push_filters(&mut builder, &query);
    builder.push(") ORDER BY ");
    if query.sort_by_activity {
        builder.push("total_activity DESC, ");
    }
    let direction = query.sort_by_date.sql_direction();
    builder.push(format!("created_at {direction}, id {direction}"));
    builder.push(" LIMIT ");
    builder.push_bind(i64::from(pagination.limit));
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let users = builder.build_query_as::<UserActivity>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_users: {} of {total} users", users.len());
    Ok((users, total))
}

pub async fn insert_bookmark(
    user: UserId,
    bookmark: NewBookmark,
    conn: &mut SqliteConnection,
) -> Result<Bookmark, sqlx::Error> {
    let bookmark = sqlx::query_as(
        r#"
            INSERT INTO bookmarks (user_id, track, description, current_status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user)
    .bind(bookmark.track)
    .bind(bookmark.description)
    .bind(bookmark.current_status)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(bookmark)
}

pub async fn fetch_bookmarks(user: UserId, conn: &mut SqliteConnection) -> Result<Vec<Bookmark>, sqlx::Error> {
    let bookmarks =
        sqlx::query_as("SELECT * FROM bookmarks WHERE user_id = $1 ORDER BY id").bind(user).fetch_all(conn).await?;
    Ok(bookmarks)
}

/// Moves the bookmark for `track` into the archive. This is not atomic. Embed it in a transaction to make it so.
pub async fn archive_bookmark(
    user: UserId,
    track: &TrackId,
    conn: &mut SqliteConnection,
) -> Result<Option<ArchiveEntry>, sqlx::Error> {
    let bookmark: Option<Bookmark> =
        sqlx::query_as("SELECT * FROM bookmarks WHERE user_id = $1 AND track = $2 ORDER BY id LIMIT 1")
            .bind(user)
            .bind(track)
            .fetch_optional(&mut *conn)
            .await?;
    let Some(bookmark) = bookmark else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM bookmarks WHERE id = $1").bind(bookmark.id).execute(&mut *conn).await?;
    let entry = sqlx::query_as(
        r#"
            INSERT INTO archive (user_id, track, description, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user)
    .bind(bookmark.track)
    .bind(bookmark.description)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(Some(entry))
}

pub async fn fetch_archive(user: UserId, conn: &mut SqliteConnection) -> Result<Vec<ArchiveEntry>, sqlx::Error> {
    let entries =
        sqlx::query_as("SELECT * FROM archive WHERE user_id = $1 ORDER BY id").bind(user).fetch_all(conn).await?;
    Ok(entries)
}

#[derive(Debug, FromRow)]
struct BookmarkOwnerRow {
    #[sqlx(flatten)]
    bookmark: Bookmark,
    name: String,
    surname: String,
    phone: String,
    email: Option<String>,
}

impl From<BookmarkOwnerRow> for BookmarkWithOwner {
    fn from(row: BookmarkOwnerRow) -> Self {
        let user = BookmarkOwner {
            user_id: row.bookmark.user_id,
            name: row.name,
            surname: row.surname,
            phone: row.phone,
            email: row.email,
        };
        Self { bookmark: row.bookmark, user }
    }
}

/// Every bookmark with an empty `current_status`, across all users, joined with the owner's contact details.
pub async fn fetch_bookmarks_without_status(
    conn: &mut SqliteConnection,
) -> Result<Vec<BookmarkWithOwner>, sqlx::Error> {
    let rows: Vec<BookmarkOwnerRow> = sqlx::query_as(
        r#"
            SELECT b.*, u.name, u.surname, u.phone, u.email
            FROM bookmarks b JOIN users u ON u.id = b.user_id
            WHERE b.current_status IS NULL OR TRIM(b.current_status) = ''
            ORDER BY b.id
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(BookmarkWithOwner::from).collect())
}
