use crate::auth::CurrentSession;
use crate::error::app_error::AppError;
use crate::models::pagination::{PageRequest, PaginatedView};
use crate::models::statistics::{StatisticsRow, number_rows};
use crate::routes::project::parse_page_request;
use crate::upstream::SharedApi;
use crate::upstream::statistics::StatisticsRepository;
use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

pub(crate) async fn statistics_page<R: StatisticsRepository + Sync + ?Sized>(repo: &R, request: &PageRequest, token: &str) -> Result<PaginatedView<StatisticsRow>, AppError> {
    let data = repo.list_task_statistics(request, token).await?;
    Ok(number_rows(PaginatedView::new(data.records, &data.pagination_info)))
}

/// Per-user task statistics. Rows carry a serial number that continues across pages and the
/// response includes the "start - end of total" range label.
#[openapi(tag = "Statistics")]
#[get("/?<page>&<page_size>")]
pub async fn list_statistics(
    client: &State<SharedApi>,
    session: CurrentSession,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<Json<PaginatedView<StatisticsRow>>, AppError> {
    let request = parse_page_request(page, page_size)?;
    Ok(Json(statistics_page(&**client.inner(), &request, session.access_token()).await?))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_statistics]
}
