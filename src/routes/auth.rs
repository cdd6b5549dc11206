use crate::Config;
use crate::auth::{CurrentSession, build_session_cookie, remove_session_cookie};
use crate::error::app_error::AppError;
use crate::models::auth::LoginPrompt;
use crate::service::oauth::{CallbackOutcome, SessionEstablisher};
use crate::store::SharedSessions;
use rocket::http::{CookieJar, Status};
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect, Responder};
use rocket::serde::json::Json;
use rocket::{State, get, post, routes};
use tracing::info;

pub const LOGIN_ROUTE: &str = "/";
pub const SLACK_LOGIN_ROUTE: &str = "/auth/slack";

#[derive(rocket::Responder)]
pub enum EntryResponse {
    Prompt(Json<LoginPrompt>),
    Landing(Redirect),
    Failed(Flash<Redirect>),
}

/// A page that needs a session. Anonymous visitors are sent to the login entry.
pub enum Page<T> {
    View(T),
    Login,
}

impl<'r, T: Responder<'r, 'static>> Responder<'r, 'static> for Page<T> {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        match self {
            Page::View(view) => view.respond_to(req),
            Page::Login => Redirect::to(LOGIN_ROUTE).respond_to(req),
        }
    }
}

fn landing(config: &Config) -> Redirect {
    Redirect::to(config.session.landing_route.clone())
}

/// Login entry. Also where the provider sends the browser back with `?code=`.
///
/// An existing session goes straight to the landing route without touching the code.
#[get("/?<code>")]
pub async fn index(
    code: Option<String>,
    session: Option<CurrentSession>,
    flash: Option<FlashMessage<'_>>,
    cookies: &CookieJar<'_>,
    establisher: &State<SessionEstablisher>,
    sessions: &State<SharedSessions>,
    config: &State<Config>,
) -> EntryResponse {
    if session.is_some() {
        return EntryResponse::Landing(landing(config));
    }

    match establisher.handle_callback(code.as_deref(), sessions.inner().as_ref()).await {
        Ok(CallbackOutcome::NoCode) => EntryResponse::Prompt(Json(LoginPrompt {
            login_url: SLACK_LOGIN_ROUTE.to_string(),
            message: flash.map(|f| f.message().to_string()),
        })),
        Ok(CallbackOutcome::Established { session_id, .. }) => {
            cookies.add_private(build_session_cookie(config.session.cookie_name.clone(), &session_id));
            EntryResponse::Landing(landing(config))
        }
        Err(e) => EntryResponse::Failed(Flash::error(Redirect::to(LOGIN_ROUTE), e.user_message())),
    }
}

/// Starts the Slack sign-in by sending the browser to the provider.
#[get("/auth/slack")]
pub async fn slack_login(establisher: &State<SessionEstablisher>) -> Result<Redirect, Flash<Redirect>> {
    establisher
        .begin_login()
        .await
        .map(Redirect::to)
        .map_err(|e| Flash::error(Redirect::to(LOGIN_ROUTE), e.user_message()))
}

#[post("/auth/logout")]
pub async fn logout(
    session: Option<CurrentSession>,
    cookies: &CookieJar<'_>,
    sessions: &State<SharedSessions>,
    config: &State<Config>,
) -> Result<Status, AppError> {
    if let Some(session) = session {
        sessions.clear(&session.session_id).await?;
        info!(user_id = session.bundle.user.id, "signed out");
    }
    remove_session_cookie(cookies, config.session.cookie_name.clone());
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![index, slack_login, logout]
}
