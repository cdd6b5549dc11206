pub mod dashboard;
pub mod oauth;
