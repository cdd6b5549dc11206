use crate::auth::CurrentSession;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::pagination::{PageRequest, PaginatedView};
use crate::models::task::{NewTask, Task, TaskRequest};
use crate::routes::project::parse_page_request;
use crate::upstream::SharedApi;
use crate::upstream::task::TaskRepository;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use validator::Validate;

pub(crate) async fn task_page<R: TaskRepository + Sync + ?Sized>(repo: &R, request: &PageRequest, token: &str) -> Result<PaginatedView<Task>, AppError> {
    let data = repo.list_tasks(request, token).await?;
    Ok(PaginatedView::new(data.records, &data.pagination_info))
}

/// List tasks, one page at a time.
#[openapi(tag = "Tasks")]
#[get("/?<page>&<page_size>")]
pub async fn list_tasks(
    client: &State<SharedApi>,
    session: CurrentSession,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<Json<PaginatedView<Task>>, AppError> {
    let request = parse_page_request(page, page_size)?;
    Ok(Json(task_page(&**client.inner(), &request, session.access_token()).await?))
}

/// Create a task with its subtasks. Blank subtasks are dropped.
#[openapi(tag = "Tasks")]
#[post("/", data = "<payload>")]
pub async fn create_task(client: &State<SharedApi>, session: CurrentSession, payload: JsonBody<TaskRequest>) -> Result<Created<Json<Task>>, AppError> {
    payload.validate()?;
    let task = client.create_task(&NewTask::from(&*payload), session.access_token()).await?;
    Ok(Created::new(format!("/tasks/{}", task.id)).body(Json(task)))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_tasks, create_task]
}
