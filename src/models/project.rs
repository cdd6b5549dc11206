use chrono::NaiveDate;
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Project {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub created_by: i64,
    #[serde(default)]
    pub updated_by: Option<i64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub assigned_users: Vec<i64>,
}

/// Card shown in the projects grid.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ProjectCard {
    pub id: i64,
    pub title: String,
    /// Upper-cased first letter of the title, used as the avatar.
    pub initial: String,
    pub description: String,
    pub status: Option<String>,
}

impl From<&Project> for ProjectCard {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            title: project.title.clone(),
            initial: project.title.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default(),
            description: project
                .description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "No description provided".to_string()),
            status: project.status.clone(),
        }
    }
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_links(links: &[String]) -> Result<(), ValidationError> {
    for link in links {
        let link = link.trim();
        if !(link.starts_with("http://") || link.starts_with("https://")) || link.len() <= "https://".len() {
            let mut error = ValidationError::new("url");
            error.message = Some(format!("invalid link: {}", link).into());
            return Err(error);
        }
    }
    Ok(())
}

fn validate_schedule(request: &ProjectRequest) -> Result<(), ValidationError> {
    if let (Some(start), Some(due)) = (request.start_date, request.due_date)
        && due < start
    {
        return Err(ValidationError::new("due_date_before_start_date"));
    }
    Ok(())
}

/// Body of the "Add Project" form.
#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
#[serde(crate = "rocket::serde")]
#[validate(schema(function = "validate_schedule"))]
pub struct ProjectRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(custom(function = "validate_links"))]
    pub links: Vec<String>,
    #[serde(default)]
    pub assigned_users: Vec<i64>,
}

/// Payload sent upstream. `created_by` always comes from the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NewProject {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_by: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub links: Vec<String>,
    pub assigned_users: Vec<i64>,
}

impl NewProject {
    pub fn from_request(request: &ProjectRequest, created_by: i64) -> Self {
        let mut assigned_users = Vec::with_capacity(request.assigned_users.len());
        for id in &request.assigned_users {
            if !assigned_users.contains(id) {
                assigned_users.push(*id);
            }
        }

        Self {
            title: request.title.trim().to_string(),
            description: request.description.as_ref().map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            created_by,
            start_date: request.start_date,
            due_date: request.due_date,
            links: request.links.iter().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect(),
            assigned_users,
        }
    }
}

/// Entry of the assignee dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct UserOption {
    pub id: i64,
    pub name: String,
}
