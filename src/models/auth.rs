use crate::models::session::{SessionUser, TokenBundle};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;

/// `status` field of an upstream envelope. Provider snapshots send either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(crate = "rocket::serde", untagged)]
pub enum StatusField {
    Code(u16),
    Text(String),
}

impl StatusField {
    pub fn is_success(&self) -> bool {
        match self {
            StatusField::Code(code) => (200..300).contains(code),
            StatusField::Text(text) => text.eq_ignore_ascii_case("success") || text.eq_ignore_ascii_case("ok"),
        }
    }
}

/// Common wrapper around every upstream response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<StatusField>,
    #[serde(default)]
    pub success: Option<bool>,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// A body signals success unless it carries `success: false` or a non-success `status`.
    pub fn signals_success(&self) -> bool {
        self.success.unwrap_or(true) && self.status.as_ref().is_none_or(StatusField::is_success)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct AuthUrlData {
    #[serde(rename = "authUrl", default)]
    pub auth_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct CallbackData {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub token: Option<TokenBundle>,
}

/// Body of the login entry when no session exists yet.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct LoginPrompt {
    pub login_url: String,
    pub message: Option<String>,
}
