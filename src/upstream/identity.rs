use crate::error::app_error::AppError;
use crate::models::auth::{ApiEnvelope, AuthUrlData, CallbackData};
use crate::upstream::ApiClient;

pub const AUTH_URL_ENDPOINT: &str = "/auth/slack";
pub const CALLBACK_ENDPOINT: &str = "/auth/slack/callback";

/// Slack sign-in as exposed by the upstream API.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_auth_url(&self) -> Result<ApiEnvelope<AuthUrlData>, AppError>;
    async fn exchange_code(&self, code: &str) -> Result<ApiEnvelope<CallbackData>, AppError>;
}

#[async_trait::async_trait]
impl IdentityProvider for ApiClient {
    async fn fetch_auth_url(&self) -> Result<ApiEnvelope<AuthUrlData>, AppError> {
        self.get(AUTH_URL_ENDPOINT, None).await
    }

    async fn exchange_code(&self, code: &str) -> Result<ApiEnvelope<CallbackData>, AppError> {
        self.get_with_query(CALLBACK_ENDPOINT, &[("code", code)], None).await
    }
}
