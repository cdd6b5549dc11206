use crate::error::app_error::AppError;
use crate::models::pagination::PageRequest;
use crate::models::task::{NewTask, Task};
use crate::upstream::ApiClient;
use crate::upstream::api_client::{ListData, require_data};

#[async_trait::async_trait]
pub trait TaskRepository {
    async fn list_tasks(&self, page: &PageRequest, token: &str) -> Result<ListData<Task>, AppError>;
    async fn create_task(&self, task: &NewTask, token: &str) -> Result<Task, AppError>;
}

#[async_trait::async_trait]
impl TaskRepository for ApiClient {
    async fn list_tasks(&self, page: &PageRequest, token: &str) -> Result<ListData<Task>, AppError> {
        self.get_page("/tasks", page, token).await
    }

    async fn create_task(&self, task: &NewTask, token: &str) -> Result<Task, AppError> {
        let envelope = self.post("/tasks", task, token).await?;
        require_data("/tasks", envelope)
    }
}
