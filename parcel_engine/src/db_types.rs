use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use parcel_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid identifier: {0}")]
pub struct ConversionError(String);

//--------------------------------------        TrackId        ---------------------------------------------------------
/// The business key of a track (the shipment code printed on the parcel). Track ids are unique and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl FromStr for TrackId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("A track id cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//--------------------------------------     HistoryEntry      ---------------------------------------------------------
/// An immutable `(status, date)` pair. One is appended every time a track is created or updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub status: String,
    pub date: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new<S: Into<String>>(status: S, date: DateTime<Utc>) -> Self {
        Self { status: status.into(), date }
    }
}

/// A history row as stored, carrying the id of the track it belongs to.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct HistoryRow {
    pub track_id: i64,
    pub status: String,
    pub date: DateTime<Utc>,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self { status: row.status, date: row.date }
    }
}

//--------------------------------------         Track         ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: i64,
    pub track: TrackId,
    pub status: String,
    pub weight: Option<Amount>,
    /// Where the parcel was received. The first non-empty value sticks.
    pub place: Option<String>,
    pub currency: Option<String>,
    /// `weight × Settings.price` at the time of the last update that supplied a weight.
    pub price: Option<Amount>,
    /// The customer the parcel belongs to, if it has been claimed.
    #[serde(rename = "user")]
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Default for TrackId {
    fn default() -> Self {
        Self(String::new())
    }
}

impl Track {
    /// The date of the most recent history entry, if there is one.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.history.last().map(|h| h.date)
    }

    pub fn has_place(&self) -> bool {
        self.place.as_ref().map(|p| !p.trim().is_empty()).unwrap_or(false)
    }

    pub fn has_currency(&self) -> bool {
        self.currency.as_ref().map(|c| !c.trim().is_empty()).unwrap_or(false)
    }
}

//--------------------------------------       Settings        ---------------------------------------------------------
/// The singleton tariff configuration.
///
/// `tariff` is set by an operator, in USD per unit of weight. `price` is the same tariff converted to the local
/// `currency` using the last exchange rate that was successfully fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub tariff: Amount,
    pub price: Amount,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    pub fn new<S: Into<String>>(tariff: Amount, price: Amount, currency: S) -> Self {
        Self { tariff, price, currency: currency.into(), updated_at: Utc::now() }
    }
}

//--------------------------------------        UserId         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl FromStr for UserId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(ConversionError(format!("'{s}' is not a valid user id"))),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: String,
    pub selected_filial: Option<String>,
    /// The user that invited this one, if any.
    pub referrer: Option<UserId>,
    pub referral_bonus_percentage: Amount,
    /// A per-user tariff that overrides the global one, if set.
    pub personal_rate: Option<Amount>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub selected_filial: Option<String>,
    pub referrer: Option<UserId>,
}

impl NewUser {
    pub fn new<S: Into<String>>(name: S, surname: S, phone: S) -> Self {
        Self { name: name.into(), surname: surname.into(), phone: phone.into(), ..Default::default() }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role<S: Into<String>>(mut self, role: S) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_filial<S: Into<String>>(mut self, filial: S) -> Self {
        self.selected_filial = Some(filial.into());
        self
    }

    pub fn with_referrer(mut self, referrer: UserId) -> Self {
        self.referrer = Some(referrer);
        self
    }
}

//--------------------------------------       Bookmark        ---------------------------------------------------------
/// A user's saved reference to a track. `current_status` is a snapshot of the track status, if one is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: i64,
    pub user_id: UserId,
    pub track: TrackId,
    pub description: Option<String>,
    pub current_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmark {
    pub track: TrackId,
    pub description: Option<String>,
    pub current_status: Option<String>,
}

impl NewBookmark {
    pub fn new<T: Into<TrackId>>(track: T) -> Self {
        Self { track: track.into(), description: None, current_status: None }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status<S: Into<String>>(mut self, status: S) -> Self {
        self.current_status = Some(status.into());
        self
    }
}

//--------------------------------------     ArchiveEntry      ---------------------------------------------------------
/// A track the user has finished with and moved out of their bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEntry {
    pub id: i64,
    pub user_id: UserId,
    pub track: TrackId,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn user_ids_must_be_positive_integers() {
        assert_eq!(UserId::from_str("42").unwrap(), UserId(42));
        assert!(UserId::from_str("0").is_err());
        assert!(UserId::from_str("-3").is_err());
        assert!(UserId::from_str("65f1c0ffee").is_err());
    }

    #[test]
    fn track_ids_are_trimmed_and_non_empty() {
        assert_eq!(TrackId::from_str("  TRK1 ").unwrap().as_str(), "TRK1");
        assert!(TrackId::from_str("   ").is_err());
    }

    #[test]
    fn place_and_currency_presence() {
        let mut track = Track::default();
        assert!(!track.has_place());
        track.place = Some("  ".into());
        assert!(!track.has_place());
        track.place = Some("Almaty".into());
        assert!(track.has_place());
        track.currency = Some("KZT".into());
        assert!(track.has_currency());
    }
}
