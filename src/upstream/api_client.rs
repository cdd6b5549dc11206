use crate::config::UpstreamConfig;
use crate::error::app_error::AppError;
use crate::models::auth::ApiEnvelope;
use crate::models::pagination::{PageRequest, PaginationInfo};
use reqwest::{RequestBuilder, StatusCode};
use rocket::serde::json::{Value, serde_json};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// `data` block of every upstream list endpoint. Both fields are required.
#[derive(Debug, serde::Deserialize)]
pub struct ListData<T> {
    pub records: Vec<T>,
    pub pagination_info: PaginationInfo,
}

/// HTTP client for the Workplanner REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if config.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout));
        }
        let http = builder.build().map_err(|e| AppError::transport("client", e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<ApiEnvelope<T>, AppError> {
        let request = Self::authorize(self.http.get(self.url(path)), token);
        self.send(path, request).await
    }

    /// Query values go through the request builder so they never end up in `endpoint`, which is
    /// logged and kept in errors.
    pub(crate) async fn get_with_query<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], token: Option<&str>) -> Result<ApiEnvelope<T>, AppError> {
        let request = Self::authorize(self.http.get(self.url(path)).query(query), token);
        self.send(path, request).await
    }

    pub(crate) async fn get_page<T: DeserializeOwned>(&self, path: &str, page: &PageRequest, token: &str) -> Result<ListData<T>, AppError> {
        let request = self
            .http
            .get(self.url(path))
            .query(&[("page", page.page), ("page_size", page.page_size)])
            .bearer_auth(token);
        let envelope = self.send(path, request).await?;
        require_data(path, envelope)
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B, token: &str) -> Result<ApiEnvelope<T>, AppError> {
        let request = self.http.post(self.url(path)).json(body).bearer_auth(token);
        self.send(path, request).await
    }

    /// Sends one request and decodes the envelope. Non-2xx statuses, bodies that do not parse and
    /// envelopes that signal failure are all errors; nothing is defaulted.
    async fn send<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<ApiEnvelope<T>, AppError> {
        debug!(endpoint = %endpoint, "calling upstream");

        let response = request.send().await.map_err(|e| AppError::transport(endpoint, e.without_url()))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| AppError::transport(endpoint, e.without_url()))?;

        decode_envelope(endpoint, status, &bytes)
    }
}

pub(crate) fn decode_envelope<T: DeserializeOwned>(endpoint: &str, status: StatusCode, bytes: &[u8]) -> Result<ApiEnvelope<T>, AppError> {
    if !status.is_success() {
        let message = serde_json::from_slice::<ApiEnvelope<Value>>(bytes).ok().and_then(|e| e.message);
        warn!(endpoint = %endpoint, status = status.as_u16(), message = ?message, "upstream returned an error status");
        return Err(AppError::UpstreamStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    let envelope: ApiEnvelope<T> = serde_json::from_slice(bytes).map_err(|e| AppError::decode(endpoint, e.to_string()))?;

    if !envelope.signals_success() {
        warn!(endpoint = %endpoint, message = ?envelope.message, "upstream envelope signalled failure");
        return Err(AppError::UpstreamStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: envelope.message,
        });
    }

    Ok(envelope)
}

pub(crate) fn require_data<T>(endpoint: &str, envelope: ApiEnvelope<T>) -> Result<T, AppError> {
    envelope.data.ok_or_else(|| AppError::MissingField {
        endpoint: endpoint.to_string(),
        field: "data",
    })
}
