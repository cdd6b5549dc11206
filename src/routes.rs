pub mod auth;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod project;
pub mod session;
pub mod statistics;
pub mod task;
