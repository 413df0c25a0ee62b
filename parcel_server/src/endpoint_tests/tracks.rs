use std::str::FromStr;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Datelike, Utc};
use parcel_engine::{
    db_types::{Amount, Bookmark, Settings, Track, TrackId, UserId},
    query_objects::{DateSort, Page, Pagination, Presence, TrackQueryFilter},
    track_objects::{BatchTrackUpdate, Pricing, TrackUpdate},
    traits::{BatchResult, BookmarkOwner, BookmarkWithOwner, UpsertResult},
    TrackFlowApi,
    UserApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, json, post_request},
    mocks::{MockParcelStore, MockUserStore},
};
use crate::routes::{AddExcelTrackRoute, AddTrackRoute, BookmarksWithoutStatusRoute, CheckTracksRoute, TracksRoute};

fn amt(s: &str) -> Amount {
    Amount::from_str(s).unwrap()
}

fn track(id: &str, weight: Option<&str>, price: Option<&str>) -> Track {
    Track {
        id: 1,
        track: TrackId::from(id),
        status: "In transit".into(),
        weight: weight.map(amt),
        price: price.map(amt),
        currency: Some("KZT".into()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        ..Default::default()
    }
}

fn priced_store() -> MockParcelStore {
    let mut store = MockParcelStore::new();
    store.expect_fetch_settings().returning(|| Ok(Some(Settings::new(amt("10"), amt("4500"), "KZT"))));
    store
}

//----------------------------------------------   addTrack  ----------------------------------------------------
fn configure_new_track(cfg: &mut ServiceConfig) {
    let mut store = priced_store();
    store
        .expect_upsert_track()
        .withf(|u: &TrackUpdate, p: &Pricing| {
            u.track.as_str() == "TRK-001" &&
                u.status == "Received" &&
                u.weight == Some(amt("2.5")) &&
                u.place() == Some("Almaty") &&
                p.price_per_unit == amt("4500") &&
                p.currency == "KZT"
        })
        .times(1)
        .returning(|u, _| Ok(UpsertResult::Created(track(u.track.as_str(), Some("2.5"), Some("11250")))));
    cfg.service(AddTrackRoute::<MockParcelStore>::new()).app_data(web::Data::new(TrackFlowApi::new(store)));
}

#[actix_web::test]
async fn add_track_creates() {
    let _ = env_logger::try_init().ok();
    let body = json!({"track": "TRK-001", "status": "Received", "weight": 2.5, "place": "Almaty"});
    let (code, body) = post_request("/tracks/addTrack", body, configure_new_track).await;
    assert_eq!(code, StatusCode::CREATED);
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Track TRK-001 created");
}

fn configure_existing_track(cfg: &mut ServiceConfig) {
    let mut store = priced_store();
    store
        .expect_upsert_track()
        .withf(|u: &TrackUpdate, _| {
            let ts = u.timestamp();
            u.weight.is_none() && ts.year() == 2024 && ts.month() == 3 && ts.day() == 15
        })
        .times(1)
        .returning(|u, _| Ok(UpsertResult::Updated(track(u.track.as_str(), None, None))));
    cfg.service(AddTrackRoute::<MockParcelStore>::new()).app_data(web::Data::new(TrackFlowApi::new(store)));
}

#[actix_web::test]
async fn add_track_updates() {
    let _ = env_logger::try_init().ok();
    let body = json!({"track": "TRK-002", "status": "Arrived", "date": "2024-03-15T10:00:00+06:00"});
    let (code, body) = post_request("/tracks/addTrack", body, configure_existing_track).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Track TRK-002 updated");
}

fn configure_no_settings(cfg: &mut ServiceConfig) {
    let mut store = MockParcelStore::new();
    store.expect_fetch_settings().times(1).returning(|| Ok(None));
    store.expect_upsert_track().never();
    cfg.service(AddTrackRoute::<MockParcelStore>::new()).app_data(web::Data::new(TrackFlowApi::new(store)));
}

#[actix_web::test]
async fn add_track_without_settings() {
    let _ = env_logger::try_init().ok();
    let body = json!({"track": "TRK-003", "status": "Received", "weight": 1});
    let (code, body) = post_request("/tracks/addTrack", body, configure_no_settings).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().is_some());
}

fn configure_untouched_store(cfg: &mut ServiceConfig) {
    let mut store = MockParcelStore::new();
    store.expect_fetch_settings().never();
    store.expect_upsert_track().never();
    store.expect_upsert_batch().never();
    store.expect_fetch_tracks().never();
    cfg.service(AddTrackRoute::<MockParcelStore>::new())
        .service(AddExcelTrackRoute::<MockParcelStore>::new())
        .service(CheckTracksRoute::<MockParcelStore>::new())
        .app_data(web::Data::new(TrackFlowApi::new(store)));
}

#[actix_web::test]
async fn add_track_rejects_bad_input() {
    let _ = env_logger::try_init().ok();
    let body = json!({"track": "TRK-004", "status": "Received", "date": "2024/03/15"});
    let (code, body) = post_request("/tracks/addTrack", body, configure_untouched_store).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().is_some());

    let body = json!({"track": "", "status": "Received"});
    let (code, _) = post_request("/tracks/addTrack", body, configure_untouched_store).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_body_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let (code, body) = post_request("/tracks/addTrack", json!({"track": "TRK-005"}), configure_untouched_store).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("status"));
}

//----------------------------------------------   addExcelTrack  ----------------------------------------------------
fn configure_batch(cfg: &mut ServiceConfig) {
    let mut store = MockParcelStore::new();
    store
        .expect_upsert_batch()
        .withf(|b: &BatchTrackUpdate| {
            let ids = b.tracks.iter().map(|t| t.as_str()).collect::<Vec<_>>();
            ids == ["A1", "B2", "C3"] && b.status == "Shipped" && b.date.is_some()
        })
        .times(1)
        .returning(|_| Ok(BatchResult::new(2, 1)));
    cfg.service(AddExcelTrackRoute::<MockParcelStore>::new()).app_data(web::Data::new(TrackFlowApi::new(store)));
}

#[actix_web::test]
async fn batch_reports_counts() {
    let _ = env_logger::try_init().ok();
    let body = json!({"tracks": ["A1", "B2", "A1", "", "C3"], "status": "Shipped", "date": "2024-03-15"});
    let (code, body) = post_request("/tracks/addExcelTrack", body, configure_batch).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["created"], 2);
    assert_eq!(body["updated"], 1);
}

#[actix_web::test]
async fn empty_batch_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({"tracks": ["", " "], "status": "Shipped"});
    let (code, _) = post_request("/tracks/addExcelTrack", body, configure_untouched_store).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

//----------------------------------------------   Listing  ----------------------------------------------------
fn configure_listing(cfg: &mut ServiceConfig) {
    let mut store = MockParcelStore::new();
    store
        .expect_search_tracks()
        .withf(|q: &TrackQueryFilter, p: &Pagination| {
            q.search.as_deref() == Some("TRK") &&
                q.status.as_deref() == Some("Received") &&
                q.owner == Some(Presence::NotExists) &&
                q.sort == DateSort::Oldest &&
                *p == Pagination::new(2, 100)
        })
        .times(1)
        .returning(|_, p| Ok(Page::new(vec![track("TRK-101", Some("1"), Some("4500"))], 250, p)));
    cfg.service(TracksRoute::<MockParcelStore>::new()).app_data(web::Data::new(TrackFlowApi::new(store)));
}

#[actix_web::test]
async fn list_tracks() {
    let _ = env_logger::try_init().ok();
    let path = "/tracks?page=2&limit=abc&search=TRK&status=Received&userFilter=notExists&sortByDate=oldest";
    let (code, body) = get_request("", path, configure_listing).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["totalCount"], 250);
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["tracks"][0]["track"], "TRK-101");
}

//----------------------------------------------   Check  ----------------------------------------------------
fn configure_check(cfg: &mut ServiceConfig) {
    let mut store = MockParcelStore::new();
    store
        .expect_fetch_tracks()
        .withf(|ids: &[TrackId]| ids.iter().map(|t| t.as_str()).collect::<Vec<_>>() == ["A", "B", "C", "D"])
        .times(1)
        .returning(|_| {
            Ok(vec![
                track("A", Some("1.5"), Some("600")),
                track("B", Some("0.5"), Some("400")),
                track("C", None, None),
            ])
        });
    cfg.service(CheckTracksRoute::<MockParcelStore>::new()).app_data(web::Data::new(TrackFlowApi::new(store)));
}

#[actix_web::test]
async fn check_tracks_totals() {
    let _ = env_logger::try_init().ok();
    let (code, body) = get_request("", "/tracks/checkTracks?tracks=A&tracks=B,C&tracks=D", configure_check).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["totalWeight"], "2.00");
    assert_eq!(body["totalPrice"], "1000.00");
    assert_eq!(body["missingDataTracks"], json!(["C"]));
    assert_eq!(body["notFoundTracks"], json!(["D"]));
}

#[actix_web::test]
async fn check_without_tracks_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (code, _) = get_request("", "/tracks/checkTracks", configure_untouched_store).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

//----------------------------------------------   Bookmarks  ----------------------------------------------------
fn configure_bookmarks(cfg: &mut ServiceConfig) {
    let mut store = MockUserStore::new();
    store.expect_fetch_bookmarks_without_status().times(1).returning(|| {
        let bookmark = Bookmark {
            id: 7,
            user_id: UserId(3),
            track: TrackId::from("TRK-900"),
            description: Some("Winter boots".into()),
            current_status: None,
            created_at: Utc::now(),
        };
        let user = BookmarkOwner {
            user_id: UserId(3),
            name: "Aigerim".into(),
            surname: "Bekova".into(),
            phone: "77011234567".into(),
            email: None,
        };
        Ok(vec![BookmarkWithOwner { bookmark, user }])
    });
    cfg.service(BookmarksWithoutStatusRoute::<MockUserStore>::new()).app_data(web::Data::new(UserApi::new(store)));
}

#[actix_web::test]
async fn bookmarks_without_status() {
    let _ = env_logger::try_init().ok();
    let (code, body) = get_request("", "/tracks/getBookmarksWithoutStatus", configure_bookmarks).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body[0]["track"], "TRK-900");
    assert_eq!(body[0]["description"], "Winter boots");
    assert_eq!(body[0]["user"]["phone"], "77011234567");
}
