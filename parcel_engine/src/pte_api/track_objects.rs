//! Value objects and pure merge rules for the track lifecycle.
//!
//! Nothing in here touches storage. Backends fetch the current record, hand it to [`resolve`], and persist the
//! [`TrackMutation`] that comes back.
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Amount, HistoryEntry, Settings, Track, TrackId},
    traits::TrackApiError,
};

//--------------------------------------        Pricing        ---------------------------------------------------------
/// The per-unit price and currency in force for one operation. It is read from [`Settings`] once and passed around
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub price_per_unit: Amount,
    pub currency: String,
}

impl Pricing {
    pub fn new<S: Into<String>>(price_per_unit: Amount, currency: S) -> Self {
        Self { price_per_unit, currency: currency.into() }
    }

    /// `round(weight × price_per_unit, 2)`, or `None` when there is no weight.
    pub fn line_total(&self, weight: Option<Amount>) -> Result<Option<Amount>, TrackApiError> {
        let Some(w) = weight else {
            return Ok(None);
        };
        let total = w.checked_mul(self.price_per_unit).ok_or_else(|| {
            TrackApiError::InvalidWeight(format!("{w} at {} per unit is too large to price", self.price_per_unit))
        })?;
        Ok(Some(total.rounded()))
    }
}

impl From<&Settings> for Pricing {
    fn from(settings: &Settings) -> Self {
        Self { price_per_unit: settings.price, currency: settings.currency.clone() }
    }
}

//--------------------------------------      Timestamps       ---------------------------------------------------------
/// The timestamp recorded in a history entry. A supplied calendar date is combined with the time of day of `now`;
/// without one, `now` is used as is.
pub fn history_timestamp(date: Option<NaiveDate>, now: DateTime<Utc>) -> DateTime<Utc> {
    match date {
        Some(d) => Utc.from_utc_datetime(&d.and_time(now.time())),
        None => now,
    }
}

/// Accepts a plain calendar date (`2024-09-01`) or a full RFC 3339 timestamp, of which only the date is kept.
pub fn parse_track_date(s: &str) -> Result<NaiveDate, TrackApiError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|e| TrackApiError::InvalidDate(format!("{s}: {e}")))
}

//--------------------------------------      TrackUpdate      ---------------------------------------------------------
/// A request to create or update a single track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackUpdate {
    pub track: TrackId,
    pub status: String,
    pub date: Option<NaiveDate>,
    pub weight: Option<Amount>,
    pub place: Option<String>,
    /// When the request was received. Supplies the time of day of the history entry.
    pub submitted_at: DateTime<Utc>,
}

impl TrackUpdate {
    pub fn new<T: Into<TrackId>, S: Into<String>>(track: T, status: S) -> Self {
        Self {
            track: track.into(),
            status: status.into(),
            date: None,
            weight: None,
            place: None,
            submitted_at: Utc::now(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_weight(mut self, weight: Amount) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_place<S: Into<String>>(mut self, place: S) -> Self {
        self.place = Some(place.into());
        self
    }

    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        history_timestamp(self.date, self.submitted_at)
    }

    /// The supplied place, if it is not blank.
    pub fn place(&self) -> Option<&str> {
        self.place.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// A brand-new track, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub track: TrackId,
    pub status: String,
    pub weight: Option<Amount>,
    pub place: Option<String>,
    pub currency: Option<String>,
    pub price: Option<Amount>,
    pub entry: HistoryEntry,
}

/// The fields of an existing track that change. `None` means "leave as is".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackChanges {
    pub id: i64,
    pub status: String,
    pub weight: Option<Amount>,
    pub price: Option<Amount>,
    pub place: Option<String>,
    pub currency: Option<String>,
    pub entry: HistoryEntry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackMutation {
    Create(NewTrack),
    Update(TrackChanges),
}

/// Decides how `update` changes the track, given what is currently stored (if anything) and the pricing in force.
///
/// * Status always takes the new value, and one history entry is appended.
/// * A supplied weight replaces the weight and the price together. Without one, both are untouched.
/// * Place is only written when the stored place is empty.
/// * Currency is only written when the stored currency is empty.
pub fn resolve(
    existing: Option<&Track>,
    update: &TrackUpdate,
    pricing: &Pricing,
) -> Result<TrackMutation, TrackApiError> {
    if let Some(w) = update.weight {
        if w.is_negative() {
            return Err(TrackApiError::InvalidWeight(format!("{w} is negative")));
        }
    }
    let entry = HistoryEntry::new(update.status.clone(), update.timestamp());
    let price = pricing.line_total(update.weight)?;
    let currency = Some(pricing.currency.clone()).filter(|c| !c.trim().is_empty());
    let mutation = match existing {
        None => TrackMutation::Create(NewTrack {
            track: update.track.clone(),
            status: update.status.clone(),
            weight: update.weight,
            place: update.place().map(String::from),
            currency,
            price,
            entry,
        }),
        Some(track) => TrackMutation::Update(TrackChanges {
            id: track.id,
            status: update.status.clone(),
            weight: update.weight,
            price,
            place: if track.has_place() { None } else { update.place().map(String::from) },
            currency: if track.has_currency() { None } else { currency },
            entry,
        }),
    };
    Ok(mutation)
}

//--------------------------------------   BatchTrackUpdate    ---------------------------------------------------------
/// Sets one status on many tracks at once. Duplicate ids are collapsed, keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTrackUpdate {
    pub tracks: Vec<TrackId>,
    pub status: String,
    pub date: Option<NaiveDate>,
    pub submitted_at: DateTime<Utc>,
}

impl BatchTrackUpdate {
    pub fn new<S: Into<String>>(tracks: Vec<TrackId>, status: S) -> Self {
        let mut seen = HashSet::with_capacity(tracks.len());
        let tracks = tracks.into_iter().filter(|t| !t.is_empty() && seen.insert(t.clone())).collect();
        Self { tracks, status: status.into(), date: None, submitted_at: Utc::now() }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    /// The timestamp shared by every history entry this batch appends.
    pub fn timestamp(&self) -> DateTime<Utc> {
        history_timestamp(self.date, self.submitted_at)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

//--------------------------------------      TrackTotals      ---------------------------------------------------------
/// Weight and price summed over a list of tracks, with the ids that could not be included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackTotals {
    pub total_weight: Amount,
    pub total_price: Amount,
    /// Tracks that exist but have no weight or no price.
    pub missing_data_tracks: Vec<TrackId>,
    pub not_found_tracks: Vec<TrackId>,
}

impl TrackTotals {
    /// Tallies `found` against the `requested` ids. Requested ids keep their order in the output lists.
    pub fn tally(requested: &[TrackId], found: &[Track]) -> Result<Self, TrackApiError> {
        let too_large = || TrackApiError::InvalidWeight("The totals of the requested tracks are too large".into());
        let mut totals = TrackTotals::default();
        for id in requested {
            match found.iter().find(|t| &t.track == id) {
                None => totals.not_found_tracks.push(id.clone()),
                Some(Track { weight: Some(w), price: Some(p), .. }) => {
                    totals.total_weight = totals.total_weight.checked_add(*w).ok_or_else(too_large)?;
                    totals.total_price = totals.total_price.checked_add(*p).ok_or_else(too_large)?;
                },
                Some(_) => totals.missing_data_tracks.push(id.clone()),
            }
        }
        totals.total_weight = totals.total_weight.rounded();
        totals.total_price = totals.total_price.rounded();
        Ok(totals)
    }
}
