use crate::error::app_error::AppError;
use crate::models::pagination::PageRequest;
use crate::models::project::{NewProject, Project, UserOption};
use crate::upstream::ApiClient;
use crate::upstream::api_client::{ListData, require_data};

#[async_trait::async_trait]
pub trait ProjectRepository {
    async fn list_projects(&self, page: &PageRequest, token: &str) -> Result<ListData<Project>, AppError>;
    async fn get_project(&self, id: i64, token: &str) -> Result<Project, AppError>;
    async fn create_project(&self, project: &NewProject, token: &str) -> Result<Project, AppError>;
    async fn search_users(&self, search: &str, token: &str) -> Result<Vec<UserOption>, AppError>;
}

#[async_trait::async_trait]
impl ProjectRepository for ApiClient {
    async fn list_projects(&self, page: &PageRequest, token: &str) -> Result<ListData<Project>, AppError> {
        self.get_page("/projects", page, token).await
    }

    async fn get_project(&self, id: i64, token: &str) -> Result<Project, AppError> {
        let path = format!("/projects/{}", id);
        match self.get(&path, Some(token)).await {
            Ok(envelope) => require_data(&path, envelope),
            Err(AppError::UpstreamStatus { status: 404, .. }) => Err(AppError::NotFound("Project not found".to_string())),
            Err(e) => Err(e),
        }
    }

    async fn create_project(&self, project: &NewProject, token: &str) -> Result<Project, AppError> {
        let envelope = self.post("/projects", project, token).await?;
        require_data("/projects", envelope)
    }

    async fn search_users(&self, search: &str, token: &str) -> Result<Vec<UserOption>, AppError> {
        let envelope = self.get_with_query("/users/dropdown", &[("search", search.trim())], Some(token)).await?;
        require_data("/users/dropdown", envelope)
    }
}
