use std::str::FromStr;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use parcel_engine::{
    db_types::{Amount, User, UserId},
    query_objects::{DateSort, Page, Pagination, UserQueryFilter, UserSearch},
    traits::UserActivity,
    user_objects::UserProfileUpdate,
    UserApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, issue_token, json, post_request, put_request},
    mocks::MockUserStore,
};
use crate::{
    auth::JwtClaims,
    routes::{BonusPercentageRoute, MyReferralsRoute, UpdateBonusPercentageRoute, UpdateProfileRoute, UsersRoute},
};

fn user(id: i64, name: &str, referrer: Option<i64>) -> User {
    User {
        id: UserId(id),
        name: name.into(),
        surname: "Nurlanova".into(),
        phone: format!("7701000000{id}"),
        email: None,
        role: "client".into(),
        selected_filial: Some("Almaty".into()),
        referrer: referrer.map(UserId),
        referral_bonus_percentage: Amount::from(5),
        personal_rate: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn configure_users(cfg: &mut ServiceConfig) {
    let mut store = MockUserStore::new();
    store
        .expect_search_users()
        .withf(|q: &UserQueryFilter, p: &Pagination| {
            q.search == Some(UserSearch::Phone("77010000001".into())) &&
                q.role.as_deref() == Some("client") &&
                q.filial.is_none() &&
                q.sort_by_date == DateSort::Latest &&
                q.sort_by_activity &&
                *p == Pagination::new(1, 20)
        })
        .times(1)
        .returning(|_, p| {
            let activity =
                UserActivity { user: user(1, "Dana", None), bookmark_count: 3, archive_count: 2, total_activity: 5 };
            Ok(Page::new(vec![activity], 1, p))
        });
    cfg.service(UsersRoute::<MockUserStore>::new()).app_data(web::Data::new(UserApi::new(store)));
}

#[actix_web::test]
async fn list_users() {
    let _ = env_logger::try_init().ok();
    let path = "/user/users?limit=20&search=77010000001&filterByRole=client&filterByFilial=&sortByActivity=true";
    let (code, body) = get_request("", path, configure_users).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["users"][0]["name"], "Dana");
    assert_eq!(body["users"][0]["totalActivity"], 5);
}

//----------------------------------------------   Referrals  ----------------------------------------------------
fn configure_referrals(cfg: &mut ServiceConfig) {
    let mut store = MockUserStore::new();
    store
        .expect_fetch_referrals()
        .withf(|id: &UserId| *id == UserId(1))
        .returning(|_| Ok(vec![user(2, "Arman", Some(1)), user(3, "Saule", Some(1))]));
    cfg.service(MyReferralsRoute::<MockUserStore>::new()).app_data(web::Data::new(UserApi::new(store)));
}

#[actix_web::test]
async fn referrals_need_a_token() {
    let _ = env_logger::try_init().ok();
    let (code, body) = get_request("", "/user/referrals", configure_referrals).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    assert!(json(&body)["error"].as_str().is_some());
}

#[actix_web::test]
async fn referrals_for_the_caller() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(JwtClaims::new(UserId(1)), Duration::hours(1));
    let (code, body) = get_request(&token, "/user/referrals", configure_referrals).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body.as_array().map(|a| a.len()), Some(2));
    assert_eq!(body[0]["referrer"], 1);
}

#[actix_web::test]
async fn expired_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(JwtClaims::new(UserId(1)), Duration::minutes(-5));
    let (code, _) = get_request(&token, "/user/referrals", configure_referrals).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
}

//----------------------------------------------   Bonus  ----------------------------------------------------
fn configure_bonus(cfg: &mut ServiceConfig) {
    let mut store = MockUserStore::new();
    store.expect_fetch_user().returning(|id| Ok((id == UserId(4)).then(|| user(4, "Dana", None))));
    store
        .expect_set_bonus_percentage()
        .withf(|id: &UserId, p: &Amount| *id == UserId(4) && *p == Amount::from_str("12.5").unwrap())
        .times(1)
        .returning(|id, p| {
            let mut user = user(id.value(), "Dana", None);
            user.referral_bonus_percentage = p;
            Ok(Some(user))
        });
    cfg.service(BonusPercentageRoute::<MockUserStore>::new())
        .service(UpdateBonusPercentageRoute::<MockUserStore>::new())
        .app_data(web::Data::new(UserApi::new(store)));
}

#[actix_web::test]
async fn read_bonus_percentage() {
    let _ = env_logger::try_init().ok();
    let (code, body) = get_request("", "/user/4/bonusPercentage", configure_bonus).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json(&body)["referralBonusPercentage"], "5");

    let (code, _) = get_request("", "/user/abc/bonusPercentage", configure_bonus).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (code, body) = get_request("", "/user/99/bonusPercentage", configure_bonus).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert!(json(&body)["error"].as_str().is_some());
}

#[actix_web::test]
async fn set_bonus_percentage() {
    let _ = env_logger::try_init().ok();
    let body = json!({"referralBonusPercentage": 12.5});
    let (code, body) = post_request("/user/4/updateBonusPercentage", body, configure_bonus).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Bonus percentage for user #4 set to 12.5");
}

fn configure_bonus_untouched(cfg: &mut ServiceConfig) {
    let mut store = MockUserStore::new();
    store.expect_set_bonus_percentage().never();
    cfg.service(UpdateBonusPercentageRoute::<MockUserStore>::new()).app_data(web::Data::new(UserApi::new(store)));
}

#[actix_web::test]
async fn invalid_bonus_percentage() {
    let _ = env_logger::try_init().ok();
    let body = json!({"referralBonusPercentage": -1});
    let (code, _) = post_request("/user/4/updateBonusPercentage", body, configure_bonus_untouched).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (code, _) = post_request("/user/4/updateBonusPercentage", json!({}), configure_bonus_untouched).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

//----------------------------------------------   Profile  ----------------------------------------------------
fn configure_profile(cfg: &mut ServiceConfig) {
    let mut store = MockUserStore::new();
    store
        .expect_update_user()
        .withf(|id: &UserId, u: &UserProfileUpdate| {
            *id == UserId(6) && u.name.as_deref() == Some("Aliya") && u.phone.is_none()
        })
        .times(1)
        .returning(|id, _| Ok(Some(user(id.value(), "Aliya", None))));
    cfg.service(UpdateProfileRoute::<MockUserStore>::new()).app_data(web::Data::new(UserApi::new(store)));
}

#[actix_web::test]
async fn update_profile() {
    let _ = env_logger::try_init().ok();
    let (code, body) = put_request("/user/6/update", json!({"name": "Aliya"}), configure_profile).await;
    assert_eq!(code, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["message"], "User #6 updated");
    assert_eq!(body["user"]["name"], "Aliya");
    assert_eq!(body["user"]["id"], 6);
}

#[actix_web::test]
async fn negative_personal_rate_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (code, _) = put_request("/user/6/update", json!({"personalRate": -10}), configure_profile_untouched).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

fn configure_profile_untouched(cfg: &mut ServiceConfig) {
    let mut store = MockUserStore::new();
    store.expect_update_user().never();
    cfg.service(UpdateProfileRoute::<MockUserStore>::new()).app_data(web::Data::new(UserApi::new(store)));
}

fn configure_rate_cleared(cfg: &mut ServiceConfig) {
    let mut store = MockUserStore::new();
    store
        .expect_update_user()
        .withf(|id: &UserId, u: &UserProfileUpdate| *id == UserId(6) && u.personal_rate == Some(None))
        .times(1)
        .returning(|id, _| Ok(Some(user(id.value(), "Aliya", None))));
    cfg.service(UpdateProfileRoute::<MockUserStore>::new()).app_data(web::Data::new(UserApi::new(store)));
}

#[actix_web::test]
async fn null_personal_rate_is_passed_through() {
    let _ = env_logger::try_init().ok();
    let (code, body) = put_request("/user/6/update", json!({"personalRate": null}), configure_rate_cleared).await;
    assert_eq!(code, StatusCode::OK);
    assert!(json(&body)["user"]["personalRate"].is_null());
}
