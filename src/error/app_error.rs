use crate::service::oauth::{HandshakeEvent, HandshakeState};
use rocket::http::Status;
use rocket::response::Responder;
use rocket::{Request, Response};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use std::io::Cursor;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Upstream service unavailable")]
    UpstreamTransport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Upstream service rejected the request ({status})")]
    UpstreamStatus { endpoint: String, status: u16, message: Option<String> },
    #[error("Upstream response could not be decoded")]
    UpstreamDecode { endpoint: String, message: String },
    #[error("Upstream response is missing `{field}`")]
    MissingField { endpoint: String, field: &'static str },
    #[error("This sign-in code has already been used")]
    CodeAlreadyUsed,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
    #[error("Internal server error")]
    SessionStore {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Internal server error")]
    InvalidTransition { from: HandshakeState, event: HandshakeEvent },
    #[error("Internal server error")]
    ConfigurationError {
        message: String,
        #[source]
        source: figment::Error,
    },
}

impl AppError {
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::UpstreamTransport {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamDecode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn session_store(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::SessionStore {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// True for the three upstream failure kinds: transport, non-success status and malformed body.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamTransport { .. } | AppError::UpstreamStatus { .. } | AppError::UpstreamDecode { .. } | AppError::MissingField { .. }
        )
    }

    /// Message safe to show the user on the login screen.
    pub fn user_message(&self) -> String {
        match self {
            AppError::UpstreamStatus { message: Some(message), .. } if !message.trim().is_empty() => message.clone(),
            AppError::CodeAlreadyUsed => self.to_string(),
            _ => "Slack login error. Please try again.".to_string(),
        }
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::UpstreamTransport { .. } => Status::BadGateway,
            AppError::UpstreamStatus { status: 401, .. } => Status::Unauthorized,
            AppError::UpstreamStatus { status: 404, .. } => Status::NotFound,
            AppError::UpstreamStatus { status: 422, .. } => Status::UnprocessableEntity,
            AppError::UpstreamStatus { .. } => Status::BadGateway,
            AppError::UpstreamDecode { .. } => Status::BadGateway,
            AppError::MissingField { .. } => Status::BadGateway,
            AppError::CodeAlreadyUsed => Status::Conflict,
            AppError::Unauthorized => Status::Unauthorized,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::ValidationError(_) => Status::BadRequest,
            AppError::SessionStore { .. } => Status::InternalServerError,
            AppError::InvalidTransition { .. } => Status::InternalServerError,
            AppError::ConfigurationError { .. } => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let path = req.uri().path();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        let user_id = req
            .local_cache(|| None::<crate::auth::CurrentSession>)
            .as_ref()
            .map(|s| s.bundle.user.id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        error!(
            error = ?self,
            upstream = self.is_upstream_failure(),
            request_id = %request_id,
            user_id = %user_id,
            method = %method,
            path = %path,
            "request failed"
        );

        let status = Status::from(&self);
        let body = self.to_string();

        Response::build().status(status).sized_body(body.len(), Cursor::new(body)).ok()
    }
}

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Bad Request"),
            ("401", "Unauthorized"),
            ("404", "Not Found"),
            ("502", "Upstream API failure or malformed upstream response"),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::ConfigurationError {
            message: "Failed to read configuration".to_string(),
            source: e,
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::session_store("Session store error", e)
    }
}
