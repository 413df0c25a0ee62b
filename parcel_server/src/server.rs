use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use parcel_engine::{SqliteDatabase, TariffApi, TrackFlowApi, UserApi};

use crate::{
    auth::TokenAuthority,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        AddExcelTrackRoute,
        AddTrackRoute,
        BonusPercentageRoute,
        BookmarksWithoutStatusRoute,
        CheckTracksRoute,
        MyReferralsRoute,
        SettingsRoute,
        TracksRoute,
        UpdateBonusPercentageRoute,
        UpdateProfileRoute,
        UpdateSettingsRoute,
        UsersRoute,
    },
    tariff_worker::start_tariff_worker,
};

const DB_MAX_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, DB_MAX_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    debug!("🗃️ Connected to {}", db.url());
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    if config.tariff.disable_worker {
        warn!("🕰️ The tariff worker is disabled. Prices will not follow the exchange rate.");
    } else {
        let _worker = start_tariff_worker(db.clone(), config.tariff.clone());
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let authority = web::Data::new(TokenAuthority::new(&config.auth));
    let srv = HttpServer::new(move || {
        let tracks_api = TrackFlowApi::new(db.clone());
        let tariff_api = TariffApi::new(db.clone());
        let users_api = UserApi::new(db.clone());
        let api_scope = web::scope("/api")
            .service(AddTrackRoute::<SqliteDatabase>::new())
            .service(AddExcelTrackRoute::<SqliteDatabase>::new())
            .service(CheckTracksRoute::<SqliteDatabase>::new())
            .service(BookmarksWithoutStatusRoute::<SqliteDatabase>::new())
            .service(TracksRoute::<SqliteDatabase>::new())
            .service(SettingsRoute::<SqliteDatabase>::new())
            .service(UpdateSettingsRoute::<SqliteDatabase>::new())
            .service(UsersRoute::<SqliteDatabase>::new())
            .service(MyReferralsRoute::<SqliteDatabase>::new())
            .service(BonusPercentageRoute::<SqliteDatabase>::new())
            .service(UpdateBonusPercentageRoute::<SqliteDatabase>::new())
            .service(UpdateProfileRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pts::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(tracks_api))
            .app_data(web::Data::new(tariff_api))
            .app_data(web::Data::new(users_api))
            .app_data(authority.clone())
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are reported with the same `{"error": ...}` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|e, _req| ServerError::InvalidRequestBody(e.to_string()).into())
}
