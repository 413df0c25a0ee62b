//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here is async and only awaits the engine APIs, so
//! database work never blocks a worker.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use parcel_engine::{
    db_types::UserId,
    track_objects::{BatchTrackUpdate, TrackUpdate},
    traits::{SettingsManagement, TrackManagement, UserManagement},
    user_objects::UserProfileUpdate,
    TariffApi,
    TrackFlowApi,
    UserApi,
};

use crate::{
    auth::JwtClaims,
    data_objects::{
        tracks_from_query,
        AddBatchRequest,
        AddTrackRequest,
        BonusPercentage,
        JsonResponse,
        ProfileUpdateResponse,
        SettingsUpdate,
        TrackListParams,
        TrackListResponse,
        UserListParams,
        UserListResponse,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Tracks  ----------------------------------------------------
route!(add_track => Post "/tracks/addTrack" impl TrackManagement, SettingsManagement);
/// Creates or updates a single track.
///
/// The track is priced from its weight and the current tariff. Responds with `201 Created` for a new track and
/// `200 OK` for an update.
pub async fn add_track<B>(
    body: web::Json<AddTrackRequest>,
    api: web::Data<TrackFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: TrackManagement + SettingsManagement,
{
    let update = TrackUpdate::try_from(body.into_inner())?;
    debug!("💻️ POST addTrack for {} -> '{}'", update.track, update.status);
    let result = api.apply_update(update).await?;
    let track = &result.track().track;
    if result.is_created() {
        Ok(HttpResponse::Created().json(JsonResponse::success(format!("Track {track} created"))))
    } else {
        Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Track {track} updated"))))
    }
}

route!(add_excel_track => Post "/tracks/addExcelTrack" impl TrackManagement, SettingsManagement);
/// Applies one status to a list of tracks, typically uploaded from a spreadsheet. Unknown tracks are created.
pub async fn add_excel_track<B>(
    body: web::Json<AddBatchRequest>,
    api: web::Data<TrackFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: TrackManagement + SettingsManagement,
{
    let batch = BatchTrackUpdate::try_from(body.into_inner())?;
    debug!("💻️ POST addExcelTrack with {} tracks -> '{}'", batch.tracks.len(), batch.status);
    let result = api.apply_batch(batch).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(tracks => Get "/tracks" impl TrackManagement, SettingsManagement);
pub async fn tracks<B>(
    query: web::Query<TrackListParams>,
    api: web::Data<TrackFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: TrackManagement + SettingsManagement,
{
    let (filter, pagination) = query.into_inner().into_query();
    debug!("💻️ GET tracks page {} [{filter}]", pagination.page);
    let page = api.search_tracks(filter, pagination).await?;
    Ok(HttpResponse::Ok().json(TrackListResponse::from(page)))
}

route!(check_tracks => Get "/tracks/checkTracks" impl TrackManagement, SettingsManagement);
/// Sums the weight and price of the requested tracks.
///
/// Track ids are passed as `?tracks=A&tracks=B`, or as a comma separated list.
pub async fn check_tracks<B>(
    query: web::Query<Vec<(String, String)>>,
    api: web::Data<TrackFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: TrackManagement + SettingsManagement,
{
    let ids = tracks_from_query(&query);
    debug!("💻️ GET check for {} tracks", ids.len());
    let totals = api.check_tracks(&ids).await?;
    Ok(HttpResponse::Ok().json(totals))
}

route!(bookmarks_without_status => Get "/tracks/getBookmarksWithoutStatus" impl UserManagement);
/// Every bookmark that has no status yet, with the contact details of the user who made it.
pub async fn bookmarks_without_status<B: UserManagement>(
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET getBookmarksWithoutStatus");
    let bookmarks = api.bookmarks_without_status().await?;
    Ok(HttpResponse::Ok().json(bookmarks))
}

//----------------------------------------------   Settings  ----------------------------------------------------
route!(settings => Get "/settings" impl SettingsManagement);
pub async fn settings<B: SettingsManagement>(api: web::Data<TariffApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET settings");
    let settings = api.fetch_settings().await?;
    Ok(HttpResponse::Ok().json(settings))
}

route!(update_settings => Put "/settings" impl SettingsManagement);
/// Sets the tariff and/or the currency. The local price is recomputed by the tariff worker on its next run.
pub async fn update_settings<B: SettingsManagement>(
    body: web::Json<SettingsUpdate>,
    api: web::Data<TariffApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let SettingsUpdate { tariff, currency } = body.into_inner();
    debug!("💻️ PUT settings. Tariff: {tariff:?}, currency: {currency:?}");
    let settings = api.update_settings(tariff, currency).await?;
    Ok(HttpResponse::Ok().json(settings))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(users => Get "/user/users" impl UserManagement);
pub async fn users<B: UserManagement>(
    query: web::Query<UserListParams>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, pagination) = query.into_inner().into_query();
    debug!("💻️ GET users page {}", pagination.page);
    let page = api.search_users(filter, pagination).await?;
    Ok(HttpResponse::Ok().json(UserListResponse::from(page)))
}

route!(my_referrals => Get "/user/referrals" impl UserManagement);
/// The users that were referred by the caller. Requires a valid access token.
pub async fn my_referrals<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET referrals for user #{}", claims.id);
    let referrals = api.referrals(claims.id).await?;
    Ok(HttpResponse::Ok().json(referrals))
}

route!(bonus_percentage => Get "/user/{user_id}/bonusPercentage" impl UserManagement);
pub async fn bonus_percentage<B: UserManagement>(
    path: web::Path<String>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner().parse::<UserId>()?;
    debug!("💻️ GET bonusPercentage for user #{id}");
    let percentage = api.bonus_percentage(id).await?;
    Ok(HttpResponse::Ok().json(BonusPercentage { referral_bonus_percentage: Some(percentage) }))
}

route!(update_bonus_percentage => Post "/user/{user_id}/updateBonusPercentage" impl UserManagement);
/// Sets the user's referral bonus. The percentage is validated before the user is looked up.
pub async fn update_bonus_percentage<B: UserManagement>(
    path: web::Path<String>,
    body: web::Json<BonusPercentage>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner().parse::<UserId>()?;
    let percentage = body.into_inner().referral_bonus_percentage;
    debug!("💻️ POST updateBonusPercentage for user #{id}: {percentage:?}");
    let user = api.update_bonus_percentage(id, percentage).await?;
    let message = format!("Bonus percentage for user #{id} set to {}", user.referral_bonus_percentage);
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

route!(update_profile => Put "/user/{user_id}/update" impl UserManagement);
pub async fn update_profile<B: UserManagement>(
    path: web::Path<String>,
    body: web::Json<UserProfileUpdate>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner().parse::<UserId>()?;
    debug!("💻️ PUT profile update for user #{id}");
    let user = api.update_profile(id, body.into_inner()).await?;
    let response = ProfileUpdateResponse { message: format!("User #{id} updated"), user };
    Ok(HttpResponse::Ok().json(response))
}
