use crate::error::app_error::AppError;
use crate::models::dashboard::DashboardView;
use crate::models::pagination::PageRequest;
use crate::models::project::ProjectCard;
use crate::models::session::SessionBundle;
use crate::models::statistics::summary_cards;
use crate::upstream::project::ProjectRepository;
use crate::upstream::statistics::StatisticsRepository;
use tracing::debug;

pub struct DashboardService<'a, R: ?Sized> {
    repository: &'a R,
    session: &'a SessionBundle,
}

impl<'a, R> DashboardService<'a, R>
where
    R: ProjectRepository + StatisticsRepository + Sync + ?Sized,
{
    pub fn new(repository: &'a R, session: &'a SessionBundle) -> Self {
        Self { repository, session }
    }

    /// Summary cards plus the first page of projects.
    pub async fn build(&self) -> Result<DashboardView, AppError> {
        let token = self.session.token.access_token.as_str();
        let first_page = PageRequest::default();
        let (totals, projects) = tokio::join!(self.repository.task_totals(token), self.repository.list_projects(&first_page, token));
        let totals = totals?;
        let projects = projects?;

        debug!(user_id = self.session.user.id, projects = projects.records.len(), "dashboard assembled");

        Ok(DashboardView {
            user: self.session.user.clone(),
            cards: summary_cards(&totals),
            recent_projects: projects.records.iter().map(ProjectCard::from).collect(),
        })
    }
}
