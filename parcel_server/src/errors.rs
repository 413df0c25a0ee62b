use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use parcel_engine::{
    db_types::ConversionError,
    traits::{SettingsError, TrackApiError, UserApiError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was supplied.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
}

impl From<TrackApiError> for ServerError {
    fn from(e: TrackApiError) -> Self {
        match e {
            TrackApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            TrackApiError::SettingsNotFound => Self::BackendError(e.to_string()),
            TrackApiError::InvalidTrackId(_) |
            TrackApiError::InvalidWeight(_) |
            TrackApiError::InvalidDate(_) |
            TrackApiError::EmptyTrackList => Self::InvalidRequestBody(e.to_string()),
            TrackApiError::TrackNotFound(_) => Self::NoRecordFound(e.to_string()),
        }
    }
}

impl From<SettingsError> for ServerError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            SettingsError::SettingsNotFound => Self::NoRecordFound(e.to_string()),
            SettingsError::InvalidTariff(_) => Self::InvalidRequestBody(e.to_string()),
            SettingsError::PriceOverflow(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<UserApiError> for ServerError {
    fn from(e: UserApiError) -> Self {
        match e {
            UserApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            UserApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            UserApiError::InvalidUserId(_) => Self::InvalidRequestPath(e.to_string()),
            UserApiError::InvalidBonusPercentage(_) | UserApiError::InvalidPersonalRate(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
        }
    }
}

impl From<ConversionError> for ServerError {
    fn from(e: ConversionError) -> Self {
        Self::InvalidRequestPath(e.to_string())
    }
}
