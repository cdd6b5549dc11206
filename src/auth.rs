use crate::config::Config;
use crate::error::app_error::AppError;
use crate::models::session::{SessionBundle, SessionId};
use crate::store::SharedSessions;
use chrono::Utc;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecuritySchemeData, SecurityScheme};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use tracing::{debug, warn};

pub const DEFAULT_COOKIE_NAME: &str = "user";

/// An established session: the id from the private cookie and the bundle it points to.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session_id: SessionId,
    pub bundle: SessionBundle,
}

impl CurrentSession {
    pub fn access_token(&self) -> &str {
        &self.bundle.token.access_token
    }
}

pub(crate) fn parse_session_cookie_value(value: &str) -> Option<SessionId> {
    SessionId::parse(value.trim())
}

pub(crate) fn cookie_name(req: &Request<'_>) -> String {
    req.rocket()
        .state::<Config>()
        .map(|c| c.session.cookie_name.clone())
        .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string())
}

pub fn build_session_cookie(name: String, session_id: &SessionId) -> Cookie<'static> {
    Cookie::build((name, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn remove_session_cookie(cookies: &CookieJar<'_>, name: String) {
    cookies.remove_private(Cookie::build(name).path("/").build());
}

async fn resolve(req: &Request<'_>) -> Result<Option<CurrentSession>, AppError> {
    let name = cookie_name(req);
    let Some(session_id) = req.cookies().get_private(&name).and_then(|c| parse_session_cookie_value(c.value())) else {
        return Ok(None);
    };

    let Some(sessions) = req.rocket().state::<SharedSessions>() else {
        return Err(AppError::Unauthorized);
    };

    match sessions.get(&session_id).await? {
        Some(bundle) if !bundle.token.is_expired(Utc::now()) => Ok(Some(CurrentSession { session_id, bundle })),
        Some(_) => {
            debug!(session_id = %session_id, "session expired");
            sessions.clear(&session_id).await?;
            remove_session_cookie(req.cookies(), name);
            Ok(None)
        }
        None => {
            remove_session_cookie(req.cookies(), name);
            Ok(None)
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentSession {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        match resolve(req).await {
            Ok(Some(session)) => {
                req.local_cache(|| Some(session.clone()));
                Outcome::Success(session)
            }
            Ok(None) => Outcome::Error((Status::Unauthorized, AppError::Unauthorized)),
            Err(e) => {
                warn!(error = %e, "session lookup failed");
                Outcome::Error((Status::from(&e), e))
            }
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for CurrentSession {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let security_scheme = SecurityScheme {
            description: Some("Cookie-based session. Sign in through GET /auth/slack to obtain the session cookie.".to_string()),
            data: SecuritySchemeData::ApiKey {
                name: DEFAULT_COOKIE_NAME.to_string(),
                location: "cookie".to_string(),
            },
            extensions: Object::default(),
        };

        let mut security_req = SecurityRequirement::new();
        security_req.insert("cookieAuth".to_string(), Vec::new());

        Ok(RequestHeaderInput::Security("cookieAuth".to_string(), security_scheme, security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response};
        let mut responses = Responses::default();
        responses.responses.insert(
            "401".to_string(),
            RefOr::Object(Response {
                description: "Unauthorized - Authentication required".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}
