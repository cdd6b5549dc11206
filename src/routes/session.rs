use crate::auth::CurrentSession;
use crate::error::app_error::AppError;
use crate::models::session::SessionResponse;
use rocket::get;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

/// Current session user and token expiry. Tokens are never returned.
#[openapi(tag = "Session")]
#[get("/")]
pub async fn get_session(session: CurrentSession) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(SessionResponse::from(&session.bundle)))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![get_session]
}
