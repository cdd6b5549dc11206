pub mod auth;
pub mod dashboard;
pub mod health;
pub mod pagination;
pub mod project;
pub mod session;
pub mod statistics;
pub mod task;
