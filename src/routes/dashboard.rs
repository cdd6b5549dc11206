use crate::auth::CurrentSession;
use crate::error::app_error::AppError;
use crate::models::dashboard::DashboardView;
use crate::routes::auth::Page;
use crate::service::dashboard::DashboardService;
use crate::upstream::SharedApi;
use rocket::serde::json::Json;
use rocket::{State, get, routes};

/// Landing view after sign-in: summary cards and the latest projects.
#[get("/dashboard")]
pub async fn dashboard(client: &State<SharedApi>, session: Option<CurrentSession>) -> Result<Page<Json<DashboardView>>, AppError> {
    let Some(session) = session else {
        return Ok(Page::Login);
    };

    let view = DashboardService::new(&**client.inner(), &session.bundle).build().await?;
    Ok(Page::View(Json(view)))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![dashboard]
}
