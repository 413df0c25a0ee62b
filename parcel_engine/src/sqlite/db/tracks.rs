use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::MAX_IDS_PER_STATEMENT;
use crate::{
    db_types::{HistoryEntry, HistoryRow, Track, TrackId},
    pte_api::{
        query_objects::{like_pattern, DateSort, Pagination, Presence, TrackQueryFilter},
        track_objects::{BatchTrackUpdate, NewTrack, TrackChanges},
    },
    traits::BatchResult,
};

/// Returns the track with the given business key, with its full history.
pub async fn fetch_track(track: &TrackId, conn: &mut SqliteConnection) -> Result<Option<Track>, sqlx::Error> {
    let track: Option<Track> =
        sqlx::query_as("SELECT * FROM tracks WHERE track = $1").bind(track).fetch_optional(&mut *conn).await?;
    match track {
        Some(mut t) => {
            t.history = fetch_history(t.id, conn).await?;
            Ok(Some(t))
        },
        None => Ok(None),
    }
}

pub async fn fetch_track_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Track>, sqlx::Error> {
    let track: Option<Track> =
        sqlx::query_as("SELECT * FROM tracks WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match track {
        Some(mut t) => {
            t.history = fetch_history(t.id, conn).await?;
            Ok(Some(t))
        },
        None => Ok(None),
    }
}

/// Returns the history of a track in the order it was recorded.
pub async fn fetch_history(track_id: i64, conn: &mut SqliteConnection) -> Result<Vec<HistoryEntry>, sqlx::Error> {
    let history = sqlx::query_as("SELECT status, date FROM track_history WHERE track_id = $1 ORDER BY id")
        .bind(track_id)
        .fetch_all(conn)
        .await?;
    Ok(history)
}

/// Loads the history of every track in `tracks` with one query per chunk, rather than one per track.
async fn attach_history(tracks: &mut [Track], conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let mut by_track: HashMap<i64, Vec<HistoryEntry>> = HashMap::with_capacity(tracks.len());
    let ids = tracks.iter().map(|t| t.id).collect::<Vec<i64>>();
    for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT track_id, status, date FROM track_history WHERE track_id IN (");
        let mut list = builder.separated(", ");
        for id in chunk {
            list.push_bind(*id);
        }
        builder.push(") ORDER BY id");
        let rows = builder.build_query_as::<HistoryRow>().fetch_all(&mut *conn).await?;
        for row in rows {
            by_track.entry(row.track_id).or_default().push(row.into());
        }
    }
    for track in tracks.iter_mut() {
        track.history = by_track.remove(&track.id).unwrap_or_default();
    }
    Ok(())
}

/// Returns every track in `ids` that exists, with its history. Unknown ids are skipped.
pub async fn fetch_tracks(ids: &[TrackId], conn: &mut SqliteConnection) -> Result<Vec<Track>, sqlx::Error> {
    let mut result = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM tracks WHERE track IN (");
        let mut list = builder.separated(", ");
        for id in chunk {
            list.push_bind(id.clone());
        }
        builder.push(") ORDER BY id");
        let tracks = builder.build_query_as::<Track>().fetch_all(&mut *conn).await?;
        result.extend(tracks);
    }
    attach_history(&mut result, conn).await?;
    Ok(result)
}

/// Inserts a new track along with its first history entry. This is not atomic. You can embed this call inside a
/// transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_track(track: NewTrack, conn: &mut SqliteConnection) -> Result<Track, sqlx::Error> {
    let now = Utc::now();
    let mut inserted: Track = sqlx::query_as(
        r#"
            INSERT INTO tracks (track, status, weight, place, currency, price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(track.track)
    .bind(track.status)
    .bind(track.weight)
    .bind(track.place)
    .bind(track.currency)
    .bind(track.price)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    append_history(inserted.id, &track.entry, conn).await?;
    debug!("🗃️ Track [{}] inserted with id {}", inserted.track, inserted.id);
    inserted.history = vec![track.entry];
    Ok(inserted)
}

/// Applies the changes to an existing track and appends the history entry. `None` fields are left untouched.
pub async fn update_track(changes: TrackChanges, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let TrackChanges { id, status, weight, price, place, currency, entry } = changes;
    sqlx::query(
        r#"
            UPDATE tracks SET
                status = $1,
                weight = COALESCE($2, weight),
                price = COALESCE($3, price),
                place = COALESCE($4, place),
                currency = COALESCE($5, currency),
                updated_at = $6
            WHERE id = $7
        "#,
    )
    .bind(status)
    .bind(weight)
    .bind(price)
    .bind(place)
    .bind(currency)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;
    append_history(id, &entry, conn).await?;
    trace!("🗃️ Track #{id} updated");
    Ok(())
}

pub async fn append_history(
    track_id: i64,
    entry: &HistoryEntry,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO track_history (track_id, status, date) VALUES ($1, $2, $3)")
        .bind(track_id)
        .bind(&entry.status)
        .bind(entry.date)
        .execute(conn)
        .await?;
    Ok(())
}

/// Sets the owner of a track. Returns `false` if the track does not exist.
pub async fn assign_owner(
    track: &TrackId,
    owner: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE tracks SET owner = $1, updated_at = $2 WHERE track = $3")
        .bind(owner)
        .bind(Utc::now())
        .bind(track)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Sets the status of every known track in the batch, appending one history entry to each, and creates the unknown
/// ones with a single history entry. Both steps are idempotent per id: a track that appears between the lookup and
/// the insert is left alone rather than duplicated.
pub async fn upsert_batch(batch: BatchTrackUpdate, conn: &mut SqliteConnection) -> Result<BatchResult, sqlx::Error> {
    let timestamp = batch.timestamp();
    let now = Utc::now();
    let (mut created, mut updated) = (0, 0);
    for chunk in batch.tracks.chunks(MAX_IDS_PER_STATEMENT) {
        let known = known_tracks(chunk, conn).await?;
        if !known.is_empty() {
            let ids = known.iter().map(|(id, _)| *id).collect::<Vec<i64>>();
            updated += set_status(&ids, &batch.status, timestamp, now, conn).await?;
        }
        let known = known.into_iter().map(|(_, t)| t).collect::<HashSet<TrackId>>();
        let new_tracks = chunk.iter().filter(|t| !known.contains(*t)).cloned().collect::<Vec<TrackId>>();
        if !new_tracks.is_empty() {
            created += insert_bare_tracks(&new_tracks, &batch.status, timestamp, now, conn).await?;
        }
    }
    debug!("🗃️ Batch update: {created} tracks created, {updated} updated");
    Ok(BatchResult::new(created, updated))
}

async fn known_tracks(tracks: &[TrackId], conn: &mut SqliteConnection) -> Result<Vec<(i64, TrackId)>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT id, track FROM tracks WHERE track IN (");
    let mut list = builder.separated(", ");
    for t in tracks {
        list.push_bind(t.clone());
    }
    builder.push(")");
    let rows = builder.build_query_as::<(i64, TrackId)>().fetch_all(conn).await?;
    Ok(rows)
}

async fn set_status(
    ids: &[i64],
    status: &str,
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE tracks SET status = ");
    builder.push_bind(status.to_string());
    builder.push(", updated_at = ");
    builder.push_bind(now);
    builder.push(" WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    builder.push(")");
    trace!("🗃️ Executing query: {}", builder.sql());
    let updated = builder.build().execute(&mut *conn).await?.rows_affected();

    let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO track_history (track_id, status, date) SELECT id, ");
    builder.push_bind(status.to_string());
    builder.push(", ");
    builder.push_bind(timestamp);
    builder.push(" FROM tracks WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    builder.push(") ORDER BY id");
    builder.build().execute(conn).await?;
    Ok(updated)
}

async fn insert_bare_tracks(
    tracks: &[TrackId],
    status: &str,
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO tracks (track, status, created_at, updated_at) ");
    builder.push_values(tracks, |mut row, track| {
        row.push_bind(track.clone()).push_bind(status.to_string()).push_bind(now).push_bind(now);
    });
    builder.push(" ON CONFLICT (track) DO NOTHING RETURNING id");
    let ids = builder.build_query_scalar::<i64>().fetch_all(&mut *conn).await?;
    if ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO track_history (track_id, status, date) ");
    builder.push_values(&ids, |mut row, id| {
        row.push_bind(*id).push_bind(status.to_string()).push_bind(timestamp);
    });
    builder.build().execute(conn).await?;
    Ok(ids.len() as u64)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &TrackQueryFilter) {
    if query.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(search) = &query.search {
        let pattern = like_pattern(search);
        where_clause.push("(track LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR owner LIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(" ESCAPE '\\')");
    }
    if let Some(status) = &query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.clone());
    }
    match query.owner {
        Some(Presence::Exists) => {
            where_clause.push("owner IS NOT NULL");
        },
        Some(Presence::NotExists) => {
            where_clause.push("owner IS NULL");
        },
        None => {},
    }
}

/// Fetches one page of tracks according to the criteria in the `TrackQueryFilter`, and the total number of matching
/// tracks.
///
/// `Latest` orders by the most recent history date, newest first. `Oldest` orders by the earliest history date,
/// oldest first.
pub async fn search_tracks(
    query: TrackQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Track>, i64), sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tracks");
    push_filters(&mut builder, &query);
    let total = builder.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM tracks");
    push_filters(&mut builder, &query);
    let ordering = match query.sort {
        DateSort::Latest => "(SELECT MAX(date) FROM track_history h WHERE h.track_id = tracks.id)",
        DateSort::Oldest => "(SELECT MIN(date) FROM track_history h WHERE h.track_id = tracks.id)",
    };
    let direction = query.sort.sql_direction();
    builder.push(format!(" ORDER BY {ordering} {direction}, id {direction}"));
    builder.push(" LIMIT ");
    builder.push_bind(i64::from(pagination.limit));
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let mut tracks = builder.build_query_as::<Track>().fetch_all(&mut *conn).await?;
    attach_history(&mut tracks, conn).await?;
    trace!("🗃️ Result of search_tracks: {} of {total} tracks", tracks.len());
    Ok((tracks, total))
}
