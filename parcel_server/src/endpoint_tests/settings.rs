use actix_web::{http::StatusCode, web, web::ServiceConfig};
use parcel_engine::{
    db_types::{Amount, Settings},
    TariffApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, json, put_request},
    mocks::MockParcelStore,
};
use crate::routes::{SettingsRoute, UpdateSettingsRoute};

fn configure_settings(cfg: &mut ServiceConfig) {
    let mut store = MockParcelStore::new();
    store.expect_fetch_settings().returning(|| Ok(Some(Settings::new(Amount::from(10), Amount::from(4500), "KZT"))));
    store
        .expect_save_settings()
        .withf(|s: &Settings| s.tariff == Amount::from(12) && s.price == Amount::from(4500) && s.currency == "KZT")
        .returning(|_| Ok(()));
    cfg.service(SettingsRoute::<MockParcelStore>::new())
        .service(UpdateSettingsRoute::<MockParcelStore>::new())
        .app_data(web::Data::new(TariffApi::new(store)));
}

#[actix_web::test]
async fn fetch_settings() {
    let _ = env_logger::try_init().ok();
    let (code, body) = get_request("", "/settings", configure_settings).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["tariff"], "10");
    assert_eq!(body["price"], "4500");
    assert_eq!(body["currency"], "KZT");
    assert!(body["updatedAt"].as_str().is_some());
}

#[actix_web::test]
async fn change_the_tariff() {
    let _ = env_logger::try_init().ok();
    let (code, body) = put_request("/settings", json!({"tariff": 12, "currency": "  "}), configure_settings).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["tariff"], "12");
    assert_eq!(body["price"], "4500");
    assert_eq!(body["currency"], "KZT");
}

fn configure_empty(cfg: &mut ServiceConfig) {
    let mut store = MockParcelStore::new();
    store.expect_fetch_settings().returning(|| Ok(None));
    store.expect_save_settings().never();
    cfg.service(SettingsRoute::<MockParcelStore>::new())
        .service(UpdateSettingsRoute::<MockParcelStore>::new())
        .app_data(web::Data::new(TariffApi::new(store)));
}

#[actix_web::test]
async fn missing_settings() {
    let _ = env_logger::try_init().ok();
    let (code, body) = get_request("", "/settings", configure_empty).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert!(json(&body)["error"].as_str().is_some());
}

#[actix_web::test]
async fn negative_tariff_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (code, _) = put_request("/settings", json!({"tariff": -1}), configure_empty).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}
