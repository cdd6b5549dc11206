use crate::error::app_error::AppError;
use crate::models::pagination::PageRequest;
use crate::models::statistics::{TaskStats, TaskTotals};
use crate::upstream::ApiClient;
use crate::upstream::api_client::{ListData, require_data};

#[async_trait::async_trait]
pub trait StatisticsRepository {
    async fn list_task_statistics(&self, page: &PageRequest, token: &str) -> Result<ListData<TaskStats>, AppError>;
    async fn task_totals(&self, token: &str) -> Result<TaskTotals, AppError>;
}

#[async_trait::async_trait]
impl StatisticsRepository for ApiClient {
    async fn list_task_statistics(&self, page: &PageRequest, token: &str) -> Result<ListData<TaskStats>, AppError> {
        self.get_page("/tasks/statistics", page, token).await
    }

    async fn task_totals(&self, token: &str) -> Result<TaskTotals, AppError> {
        let envelope = self.get("/tasks/summary", Some(token)).await?;
        require_data("/tasks/summary", envelope)
    }
}
