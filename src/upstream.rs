pub mod api_client;
pub mod identity;
pub mod project;
pub mod statistics;
pub mod task;

pub use api_client::ApiClient;

use project::ProjectRepository;
use statistics::StatisticsRepository;
use std::sync::Arc;
use task::TaskRepository;

/// Every data endpoint the routes reach through the signed-in user's token.
pub trait WorkplannerApi: ProjectRepository + TaskRepository + StatisticsRepository + Send + Sync {}

impl<T> WorkplannerApi for T where T: ProjectRepository + TaskRepository + StatisticsRepository + Send + Sync {}

/// Managed state handed to the data routes.
pub type SharedApi = Arc<dyn WorkplannerApi>;
