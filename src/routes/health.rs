use crate::Config;
use crate::models::health::HealthResponse;
use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

#[openapi(tag = "Health")]
#[get("/")]
pub async fn healthcheck(config: &State<Config>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        session_backend: format!("{:?}", config.session.backend).to_lowercase(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![healthcheck]
}
