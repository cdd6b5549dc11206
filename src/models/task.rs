use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub subtasks: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct TaskRequest {
    #[validate(length(min = 1, max = 200), custom(function = "crate::models::project::validate_not_blank"))]
    pub title: String,
    #[serde(default)]
    pub subtasks: Vec<String>,
    #[validate(range(min = 1))]
    pub project_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NewTask {
    pub title: String,
    pub subtasks: Vec<String>,
    pub project_id: i64,
}

impl From<&TaskRequest> for NewTask {
    fn from(request: &TaskRequest) -> Self {
        Self {
            title: request.title.trim().to_string(),
            subtasks: request
                .subtasks
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            project_id: request.project_id,
        }
    }
}
