use crate::models::project::ProjectCard;
use crate::models::session::SessionUser;
use crate::models::statistics::SummaryCard;
use rocket::serde::Serialize;
use schemars::JsonSchema;

/// Landing view after sign-in.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DashboardView {
    pub user: SessionUser,
    pub cards: Vec<SummaryCard>,
    pub recent_projects: Vec<ProjectCard>,
}
