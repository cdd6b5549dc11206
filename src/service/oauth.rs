use crate::error::app_error::AppError;
use crate::models::session::{SessionBundle, SessionId};
use crate::store::SessionRepository;
use crate::upstream::api_client::require_data;
use crate::upstream::identity::{AUTH_URL_ENDPOINT, CALLBACK_ENDPOINT, IdentityProvider};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Where the browser is in the Slack sign-in handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    RequestingAuthUrl,
    /// The browser left for the provider. Nothing survives until it comes back.
    RedirectedAway,
    AwaitingCode,
    ExchangingCode,
    Authenticated,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeEvent {
    LoginRequested,
    AuthUrlReceived,
    AuthUrlFailed,
    PageLoaded,
    CodeAbsent,
    CodePresent,
    ExchangeSucceeded,
    ExchangeFailed,
}

impl HandshakeState {
    pub fn next(self, event: HandshakeEvent) -> Result<Self, AppError> {
        use HandshakeEvent as E;
        use HandshakeState as S;

        let next = match (self, event) {
            (S::Idle | S::Failed, E::LoginRequested) => S::RequestingAuthUrl,
            (S::RequestingAuthUrl, E::AuthUrlReceived) => S::RedirectedAway,
            (S::RequestingAuthUrl, E::AuthUrlFailed) => S::Failed,
            (S::Idle | S::RedirectedAway | S::Failed, E::PageLoaded) => S::AwaitingCode,
            (S::AwaitingCode, E::CodeAbsent) => S::Idle,
            (S::AwaitingCode, E::CodePresent) => S::ExchangingCode,
            (S::ExchangingCode, E::ExchangeSucceeded) => S::Authenticated,
            (S::AwaitingCode | S::ExchangingCode, E::ExchangeFailed) => S::Failed,
            (from, event) => return Err(AppError::InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

/// Tracks one handshake through its transitions.
#[derive(Debug)]
struct Handshake {
    state: HandshakeState,
}

impl Handshake {
    fn new(state: HandshakeState) -> Self {
        Self { state }
    }

    fn advance(&mut self, event: HandshakeEvent) -> Result<HandshakeState, AppError> {
        let next = self.state.next(event)?;
        debug!(from = ?self.state, event = ?event, to = ?next, "handshake transition");
        self.state = next;
        Ok(next)
    }
}

/// Digests of authorization codes that were already handed to the exchange.
///
/// A code is claimed at most once while its entry is alive. Entries are forgotten after `ttl`.
#[derive(Debug)]
pub struct ProcessedCodes {
    ttl: Duration,
    cleanup_interval: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

fn code_digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

impl ProcessedCodes {
    pub fn new(ttl_seconds: u64, cleanup_interval_seconds: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_seconds.max(1)),
            cleanup_interval: Duration::from_secs(cleanup_interval_seconds.max(1)),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if this call claimed the code, `false` if it was already claimed.
    pub async fn claim(&self, code: &str) -> bool {
        let digest = code_digest(code);
        let now = Instant::now();
        let mut seen = self.seen.lock().await;

        if let Some(claimed_at) = seen.get(&digest)
            && now.duration_since(*claimed_at) < self.ttl
        {
            return false;
        }

        seen.insert(digest, now);
        true
    }

    /// Forgets codes older than the TTL and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut seen = self.seen.lock().await;
        let before = seen.len();
        seen.retain(|_, claimed_at| now.duration_since(*claimed_at) < ttl);
        before - seen.len()
    }

    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub fn spawn_cleanup_task(self: Arc<Self>) {
        let cleanup_interval = self.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cleanup_interval);
            loop {
                ticker.tick().await;
                let purged = self.purge_expired().await;
                if purged > 0 {
                    let remaining = self.len().await;
                    debug!(purged, remaining, "forgot processed authorization codes");
                }
            }
        });
    }
}

/// Result of handling a return from the provider.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// No code in the query; the login prompt is shown.
    NoCode,
    Established { session_id: SessionId, bundle: SessionBundle },
}

/// Drives the Slack sign-in: fetches the provider URL and turns a returned code into a session.
pub struct SessionEstablisher {
    identity: Arc<dyn IdentityProvider>,
    processed: Arc<ProcessedCodes>,
}

impl SessionEstablisher {
    pub fn new(identity: Arc<dyn IdentityProvider>, processed: Arc<ProcessedCodes>) -> Self {
        Self { identity, processed }
    }

    /// Asks upstream for the provider URL. Nothing is stored on either outcome.
    pub async fn begin_login(&self) -> Result<String, AppError> {
        let mut handshake = Handshake::new(HandshakeState::Idle);
        handshake.advance(HandshakeEvent::LoginRequested)?;

        let auth_url = match self.identity.fetch_auth_url().await {
            Ok(envelope) => require_data(AUTH_URL_ENDPOINT, envelope).and_then(|data| {
                data.auth_url.filter(|url| !url.trim().is_empty()).ok_or_else(|| AppError::MissingField {
                    endpoint: AUTH_URL_ENDPOINT.to_string(),
                    field: "authUrl",
                })
            }),
            Err(e) => Err(e),
        };

        match auth_url {
            Ok(url) => {
                handshake.advance(HandshakeEvent::AuthUrlReceived)?;
                info!("redirecting to Slack sign-in");
                Ok(url)
            }
            Err(e) => {
                handshake.advance(HandshakeEvent::AuthUrlFailed)?;
                warn!(error = %e, "could not obtain Slack sign-in URL");
                Err(e)
            }
        }
    }

    /// Handles a page load that may carry `?code=`. Each code is exchanged at most once and a
    /// session is stored only when upstream returned both the user and the token.
    pub async fn handle_callback(&self, code: Option<&str>, sessions: &dyn SessionRepository) -> Result<CallbackOutcome, AppError> {
        let mut handshake = Handshake::new(HandshakeState::RedirectedAway);
        handshake.advance(HandshakeEvent::PageLoaded)?;

        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            handshake.advance(HandshakeEvent::CodeAbsent)?;
            return Ok(CallbackOutcome::NoCode);
        };

        if !self.processed.claim(code).await {
            handshake.advance(HandshakeEvent::ExchangeFailed)?;
            warn!("authorization code was already used");
            return Err(AppError::CodeAlreadyUsed);
        }
        handshake.advance(HandshakeEvent::CodePresent)?;

        match self.exchange(code, sessions).await {
            Ok((session_id, bundle)) => {
                handshake.advance(HandshakeEvent::ExchangeSucceeded)?;
                info!(user_id = bundle.user.id, "session established");
                Ok(CallbackOutcome::Established { session_id, bundle })
            }
            Err(e) => {
                handshake.advance(HandshakeEvent::ExchangeFailed)?;
                warn!(error = %e, "Slack code exchange failed");
                Err(e)
            }
        }
    }

    async fn exchange(&self, code: &str, sessions: &dyn SessionRepository) -> Result<(SessionId, SessionBundle), AppError> {
        let envelope = self.identity.exchange_code(code).await?;
        let data = require_data(CALLBACK_ENDPOINT, envelope)?;

        let missing = |field: &'static str| AppError::MissingField {
            endpoint: CALLBACK_ENDPOINT.to_string(),
            field,
        };
        let user = data.user.ok_or_else(|| missing("user"))?;
        let token = data.token.ok_or_else(|| missing("token"))?;
        if token.access_token.trim().is_empty() {
            return Err(missing("token.access_token"));
        }

        let bundle = SessionBundle { user, token };
        let session_id = SessionId::new();
        sessions.set(&session_id, &bundle).await?;

        Ok((session_id, bundle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySessionRepository;
    use crate::test_utils::{MockIdentity, callback_body};
    use reqwest::StatusCode;

    fn establisher(identity: Arc<MockIdentity>) -> SessionEstablisher {
        SessionEstablisher::new(identity, Arc::new(ProcessedCodes::new(600, 60)))
    }

    #[test]
    fn happy_path_transitions() {
        let state = HandshakeState::Idle;
        let state = state.next(HandshakeEvent::LoginRequested).unwrap();
        let state = state.next(HandshakeEvent::AuthUrlReceived).unwrap();
        assert_eq!(state, HandshakeState::RedirectedAway);
        let state = state.next(HandshakeEvent::PageLoaded).unwrap();
        let state = state.next(HandshakeEvent::CodePresent).unwrap();
        let state = state.next(HandshakeEvent::ExchangeSucceeded).unwrap();
        assert_eq!(state, HandshakeState::Authenticated);
    }

    #[test]
    fn code_absent_returns_to_idle() {
        let state = HandshakeState::AwaitingCode.next(HandshakeEvent::CodeAbsent).unwrap();
        assert_eq!(state, HandshakeState::Idle);
    }

    #[test]
    fn authenticated_is_terminal() {
        let result = HandshakeState::Authenticated.next(HandshakeEvent::CodePresent);
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
        let result = HandshakeState::Idle.next(HandshakeEvent::ExchangeSucceeded);
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
    }

    #[rocket::async_test]
    async fn processed_codes_reject_second_claim() {
        let codes = ProcessedCodes::new(600, 60);
        assert!(codes.claim("abc").await);
        assert!(!codes.claim("abc").await);
        assert!(codes.claim("other").await);
        assert_eq!(codes.len().await, 2);
    }

    #[rocket::async_test]
    async fn processed_codes_expire_after_ttl() {
        let codes = ProcessedCodes::new(1, 60);
        assert!(codes.claim("abc").await);
        codes.seen.lock().await.values_mut().for_each(|claimed_at| *claimed_at -= Duration::from_secs(2));

        assert_eq!(codes.purge_expired().await, 1);
        assert_eq!(codes.len().await, 0);
        assert!(codes.claim("abc").await);
    }

    #[rocket::async_test]
    async fn cleanup_task_forgets_stale_codes() {
        let codes = Arc::new(ProcessedCodes::new(1, 60));
        assert!(codes.claim("stale").await);
        codes.seen.lock().await.values_mut().for_each(|claimed_at| *claimed_at -= Duration::from_secs(2));

        codes.clone().spawn_cleanup_task();
        // the first tick fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(codes.len().await, 0);
    }

    #[rocket::async_test]
    async fn processed_codes_store_digests_only() {
        let codes = ProcessedCodes::new(600, 60);
        codes.claim("secret-code").await;
        let seen = codes.seen.lock().await;
        assert!(!seen.contains_key("secret-code"));
        assert!(seen.contains_key(&code_digest("secret-code")));
    }

    #[rocket::async_test]
    async fn auth_url_only_navigates() {
        let identity = Arc::new(MockIdentity::default().with_auth_url(
            StatusCode::OK,
            r#"{"status":200,"success":true,"data":{"authUrl":"https://slack.com/oauth/v2/authorize?x=1"}}"#,
        ));
        let sessions = MemorySessionRepository::default();

        let url = establisher(identity.clone()).begin_login().await.unwrap();
        assert_eq!(url, "https://slack.com/oauth/v2/authorize?x=1");
        assert_eq!(identity.auth_url_calls(), 1);
        assert_eq!(identity.exchange_calls(), 0);
        assert_eq!(sessions.len().await, 0);
    }

    #[rocket::async_test]
    async fn missing_auth_url_fails_without_retry() {
        let identity = Arc::new(MockIdentity::default().with_auth_url(StatusCode::OK, r#"{"status":200,"success":true,"data":{}}"#));

        let result = establisher(identity.clone()).begin_login().await;
        assert!(matches!(result, Err(AppError::MissingField { field: "authUrl", .. })));
        assert_eq!(identity.auth_url_calls(), 1);
    }

    #[rocket::async_test]
    async fn auth_url_error_status_fails() {
        let identity = Arc::new(MockIdentity::default().with_auth_url(StatusCode::SERVICE_UNAVAILABLE, r#"{"message":"Slack is down"}"#));

        let err = establisher(identity).begin_login().await.unwrap_err();
        assert_eq!(err.user_message(), "Slack is down");
    }

    #[rocket::async_test]
    async fn callback_stores_exactly_the_returned_bundle() {
        let identity = Arc::new(MockIdentity::default().with_callback(StatusCode::OK, &callback_body(true, true)));
        let sessions = MemorySessionRepository::default();

        let outcome = establisher(identity).handle_callback(Some("code-1"), &sessions).await.unwrap();
        let CallbackOutcome::Established { session_id, bundle } = outcome else {
            panic!("expected an established session");
        };

        let stored = sessions.get(&session_id).await.unwrap().unwrap();
        assert_eq!(stored, bundle);
        assert_eq!(stored.user.id, 42);
        assert_eq!(stored.token.access_token, "xoxp-access");
        assert_eq!(sessions.len().await, 1);
    }

    #[rocket::async_test]
    async fn callback_without_token_stores_nothing() {
        let identity = Arc::new(MockIdentity::default().with_callback(StatusCode::OK, &callback_body(true, false)));
        let sessions = MemorySessionRepository::default();

        let result = establisher(identity).handle_callback(Some("code-2"), &sessions).await;
        assert!(matches!(result, Err(AppError::MissingField { field: "token", .. })));
        assert_eq!(sessions.len().await, 0);
    }

    #[rocket::async_test]
    async fn callback_without_user_stores_nothing() {
        let identity = Arc::new(MockIdentity::default().with_callback(StatusCode::OK, &callback_body(false, true)));
        let sessions = MemorySessionRepository::default();

        let result = establisher(identity).handle_callback(Some("code-3"), &sessions).await;
        assert!(matches!(result, Err(AppError::MissingField { field: "user", .. })));
        assert_eq!(sessions.len().await, 0);
    }

    #[rocket::async_test]
    async fn no_code_skips_the_exchange() {
        let identity = Arc::new(MockIdentity::default());
        let sessions = MemorySessionRepository::default();

        let outcome = establisher(identity.clone()).handle_callback(Some("  "), &sessions).await.unwrap();
        assert!(matches!(outcome, CallbackOutcome::NoCode));
        assert_eq!(identity.exchange_calls(), 0);
    }

    #[rocket::async_test]
    async fn same_code_is_exchanged_at_most_once() {
        let identity = Arc::new(MockIdentity::default().with_callback(StatusCode::OK, &callback_body(true, true)));
        let sessions = MemorySessionRepository::default();
        let establisher = establisher(identity.clone());

        let (first, second) = tokio::join!(
            establisher.handle_callback(Some("dup"), &sessions),
            establisher.handle_callback(Some("dup"), &sessions)
        );

        assert_eq!(identity.exchange_calls(), 1);
        assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(first.err().or(second.err()), Some(AppError::CodeAlreadyUsed)));
        assert_eq!(sessions.len().await, 1);
    }

    #[rocket::async_test]
    async fn failed_exchange_does_not_free_the_code() {
        let identity = Arc::new(MockIdentity::default().with_callback(StatusCode::BAD_REQUEST, r#"{"message":"invalid_code"}"#));
        let sessions = MemorySessionRepository::default();
        let establisher = establisher(identity.clone());

        assert!(establisher.handle_callback(Some("bad"), &sessions).await.is_err());
        let retry = establisher.handle_callback(Some("bad"), &sessions).await;
        assert!(matches!(retry, Err(AppError::CodeAlreadyUsed)));
        assert_eq!(identity.exchange_calls(), 1);
        assert_eq!(sessions.len().await, 0);
    }
}
