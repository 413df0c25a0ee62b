use actix_web::{
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::Duration;
use log::debug;
use serde_json::Value;

use crate::{
    auth::{JwtClaims, TokenAuthority},
    config::AuthConfig,
    server::json_config,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("0f3c1d0e4b5a49c2a0d1e8f7b6c5a4d3-endpoint-tests")
}

pub fn issue_token(claims: JwtClaims, duration: Duration) -> String {
    TokenAuthority::new(&get_auth_config()).issue_token(claims, duration).expect("Failed to sign token")
}

pub async fn get_request(auth_header: &str, path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let mut req = TestRequest::get().uri(path);
    if !auth_header.is_empty() {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {auth_header}")));
    }
    send(req, configure).await
}

pub async fn post_request(path: &str, body: Value, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    send(TestRequest::post().uri(path).set_json(body), configure).await
}

pub async fn put_request(path: &str, body: Value, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    send(TestRequest::put().uri(path).set_json(body), configure).await
}

pub async fn send(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let authority = web::Data::new(TokenAuthority::new(&get_auth_config()));
    let app = App::new().app_data(authority).app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let body = String::from_utf8_lossy(&body).into_owned();
    (status, body)
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {body}"))
}
