//! Bearer token verification.
//!
//! Access tokens are HS256 JWTs carrying the id of the user they were issued to. Handlers that need to know who the
//! caller is take a [`JwtClaims`] argument; the extractor reads the token from the `Authorization: Bearer` header,
//! falling back to the `token` cookie, and verifies it against the [`TokenAuthority`] registered as app data.
use std::fmt::Debug;

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
};
use log::*;
use parcel_engine::db_types::UserId;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub id: UserId,
}

impl JwtClaims {
    pub fn new(id: UserId) -> Self {
        Self { id }
    }
}

/// Signs and verifies access tokens with the shared HS256 secret.
pub struct TokenAuthority {
    key: Hs256Key,
    time_options: TimeOptions,
}

impl Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenAuthority(HS256)")
    }
}

impl TokenAuthority {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, time_options: TimeOptions::default() }
    }

    /// Issue a new access token for the given user. The token expires after `duration`.
    pub fn issue_token(&self, claims: JwtClaims, duration: chrono::Duration) -> Result<String, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(claims).set_duration_and_issuance(&self.time_options, duration);
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::ValidationError(format!("{e}")))
    }

    /// Checks the signature and expiry of `token` and returns its claims.
    pub fn verify_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e}")))?;
        let token = Hs256
            .validator::<JwtClaims>(&self.key)
            .validate(&untrusted)
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        token
            .claims()
            .validate_expiration(&self.time_options)
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        Ok(token.claims().custom.clone())
    }
}

/// Pulls the raw token out of the request. The `Authorization` header wins over the cookie.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_whitespace().nth(1))
        .map(|s| s.to_string());
    from_header.or_else(|| req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string())).filter(|t| !t.is_empty())
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let authority = req.app_data::<web::Data<TokenAuthority>>().ok_or_else(|| {
        ServerError::ConfigurationError("No token authority has been registered with the server".to_string())
    })?;
    let token = token_from_request(req).ok_or(AuthError::MissingToken)?;
    let claims = authority.verify_token(&token).map_err(|e| {
        debug!("💻️ Rejected access token. {e}");
        e
    })?;
    trace!("💻️ Access token verified for user #{}", claims.id);
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;
    use chrono::Duration;

    use super::*;

    fn authority() -> TokenAuthority {
        TokenAuthority::new(&AuthConfig::new("a test secret that is only used here"))
    }

    #[test]
    fn issued_tokens_verify() {
        let authority = authority();
        let token = authority.issue_token(JwtClaims::new(UserId(42)), Duration::hours(1)).unwrap();
        let claims = authority.verify_token(&token).unwrap();
        assert_eq!(claims.id, UserId(42));
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let other = TokenAuthority::new(&AuthConfig::new("some other secret"));
        let token = other.issue_token(JwtClaims::new(UserId(42)), Duration::hours(1)).unwrap();
        let err = authority().verify_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let authority = authority();
        let token = authority.issue_token(JwtClaims::new(UserId(42)), Duration::minutes(-5)).unwrap();
        let err = authority.verify_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[test]
    fn garbage_is_poorly_formatted() {
        let err = authority().verify_token("not-a-jwt").unwrap_err();
        assert!(matches!(err, AuthError::PoorlyFormattedToken(_)));
    }

    #[test]
    fn header_beats_cookie() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer from-header"))
            .cookie(actix_web::cookie::Cookie::new(TOKEN_COOKIE, "from-cookie"))
            .to_http_request();
        assert_eq!(token_from_request(&req).as_deref(), Some("from-header"));
        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new(TOKEN_COOKIE, "from-cookie"))
            .to_http_request();
        assert_eq!(token_from_request(&req).as_deref(), Some("from-cookie"));
        assert!(token_from_request(&TestRequest::default().to_http_request()).is_none());
    }
}
