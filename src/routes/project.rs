use crate::auth::CurrentSession;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::pagination::{PageRequest, PaginatedView};
use crate::models::project::{NewProject, Project, ProjectCard, ProjectRequest, UserOption};
use crate::upstream::SharedApi;
use crate::upstream::project::ProjectRepository;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use validator::Validate;

#[allow(clippy::result_large_err)]
pub(crate) fn parse_page_request(page: Option<u32>, page_size: Option<u32>) -> Result<PageRequest, AppError> {
    PageRequest::from_query(page, page_size).map_err(AppError::BadRequest)
}

pub(crate) async fn project_page<R: ProjectRepository + Sync + ?Sized>(repo: &R, request: &PageRequest, token: &str) -> Result<PaginatedView<ProjectCard>, AppError> {
    let data = repo.list_projects(request, token).await?;
    Ok(PaginatedView::new(data.records, &data.pagination_info).map(|project| ProjectCard::from(&project)))
}

pub(crate) async fn create_for_user<R: ProjectRepository + Sync + ?Sized>(repo: &R, request: &ProjectRequest, session: &CurrentSession) -> Result<Project, AppError> {
    request.validate()?;
    let new_project = NewProject::from_request(request, session.bundle.user.id);
    repo.create_project(&new_project, session.access_token()).await
}

/// List projects as cards, one page at a time.
/// `page_size` must be one of 5, 10, 15 or 20; anything else is a 400.
#[openapi(tag = "Projects")]
#[get("/?<page>&<page_size>")]
pub async fn list_projects(
    client: &State<SharedApi>,
    session: CurrentSession,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<Json<PaginatedView<ProjectCard>>, AppError> {
    let request = parse_page_request(page, page_size)?;
    Ok(Json(project_page(&**client.inner(), &request, session.access_token()).await?))
}

/// Users for the "assigned users" dropdown, optionally filtered by name.
#[openapi(tag = "Projects")]
#[get("/users?<search>")]
pub async fn list_assignable_users(client: &State<SharedApi>, session: CurrentSession, search: Option<String>) -> Result<Json<Vec<UserOption>>, AppError> {
    let search = search.unwrap_or_default();
    Ok(Json(client.search_users(&search, session.access_token()).await?))
}

#[openapi(tag = "Projects")]
#[get("/<id>")]
pub async fn get_project(client: &State<SharedApi>, session: CurrentSession, id: i64) -> Result<Json<Project>, AppError> {
    Ok(Json(client.get_project(id, session.access_token()).await?))
}

/// Create a project. `created_by` is always the signed-in user.
#[openapi(tag = "Projects")]
#[post("/", data = "<payload>")]
pub async fn create_project(client: &State<SharedApi>, session: CurrentSession, payload: JsonBody<ProjectRequest>) -> Result<Created<Json<Project>>, AppError> {
    let project = create_for_user(&**client.inner(), &payload, &session).await?;
    Ok(Created::new(format!("/projects/{}", project.id)).body(Json(project)))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_projects, list_assignable_users, get_project, create_project]
}
