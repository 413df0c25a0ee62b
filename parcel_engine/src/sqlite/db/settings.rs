use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Amount, Settings};

/// The settings table holds at most one row, with this id.
const SETTINGS_ID: i64 = 1;

pub async fn fetch_settings(conn: &mut SqliteConnection) -> Result<Option<Settings>, sqlx::Error> {
    let settings = sqlx::query_as("SELECT tariff, price, currency, updated_at FROM settings WHERE id = $1")
        .bind(SETTINGS_ID)
        .fetch_optional(conn)
        .await?;
    Ok(settings)
}

/// Inserts the settings row, or overwrites it if it already exists.
pub async fn save_settings(settings: &Settings, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO settings (id, tariff, price, currency, updated_at) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                tariff = excluded.tariff,
                price = excluded.price,
                currency = excluded.currency,
                updated_at = excluded.updated_at
        "#,
    )
    .bind(SETTINGS_ID)
    .bind(settings.tariff)
    .bind(settings.price)
    .bind(&settings.currency)
    .bind(settings.updated_at)
    .execute(conn)
    .await?;
    trace!("🗃️ Settings saved. Tariff {}, price {} {}", settings.tariff, settings.price, settings.currency);
    Ok(())
}

/// Updates the price column of the existing settings row only.
pub async fn save_price(price: Amount, conn: &mut SqliteConnection) -> Result<Option<Settings>, sqlx::Error> {
    let settings: Option<Settings> = sqlx::query_as(
        r#"
            UPDATE settings SET price = $1, updated_at = $2 WHERE id = $3
            RETURNING tariff, price, currency, updated_at
        "#,
    )
    .bind(price)
    .bind(Utc::now())
    .bind(SETTINGS_ID)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Price set to {price}. Settings row present: {}", settings.is_some());
    Ok(settings)
}
