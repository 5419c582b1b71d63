//! Loopback endpoint that receives the OAuth consent redirect.

use std::{
    collections::HashMap,
    net::TcpListener,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use tokio::sync::watch;
use tracing::debug;

use super::MailError;

const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);
/// Time left for the final response to reach the browser after the outcome is known.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

const COMPLETE_PAGE: &str =
    "<html><body><p>The authentication flow has completed. You may close this window.</p></body></html>";
const DECLINED_PAGE: &str =
    "<html><body><p>Authorization was declined. You may close this window.</p></body></html>";
const MISMATCH_PAGE: &str =
    "<html><body><p>State mismatch. You may close this window.</p></body></html>";
const WAITING_PAGE: &str = "<html><body><p>Waiting for authorization.</p></body></html>";

type Outcome = Result<String, String>;

struct RedirectState {
    expected_state: String,
    outcome: Mutex<Option<Outcome>>,
    done: watch::Sender<bool>,
}

impl RedirectState {
    /// Records the first outcome only.
    fn finish(&self, outcome: Outcome) {
        if let Ok(mut slot) = self.outcome.lock() {
            if slot.is_none() {
                *slot = Some(outcome);
                self.done.send_replace(true);
            }
        }
    }

    fn take(&self) -> Option<Outcome> {
        self.outcome.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// A bound `127.0.0.1` port waiting for Google to send the browser back.
pub struct ConsentRedirect {
    listener: TcpListener,
    port: u16,
}

impl ConsentRedirect {
    /// Binds an ephemeral loopback port.
    pub fn bind() -> Result<Self, MailError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }

    pub fn wait_for_code(self, expected_state: &str) -> Result<String, MailError> {
        self.wait_for_code_within(expected_state, CONSENT_TIMEOUT)
    }

    /// Serves the redirect route until a code, a provider error or a state
    /// mismatch arrives, or `timeout` elapses.
    ///
    /// Requests are handled concurrently, so an idle connection never holds
    /// up the one carrying the code.
    pub fn wait_for_code_within(
        self,
        expected_state: &str,
        timeout: Duration,
    ) -> Result<String, MailError> {
        self.listener.set_nonblocking(true)?;
        let (done, _) = watch::channel(false);
        let state = Arc::new(RedirectState {
            expected_state: expected_state.to_string(),
            outcome: Mutex::new(None),
            done,
        });
        let app = Router::new()
            .route("/", get(handle_redirect))
            .with_state(Arc::clone(&state));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let std_listener = self.listener;
        let mut shutdown = state.done.subscribe();
        let mut grace = state.done.subscribe();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(std_listener)?;
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            });
            let served: std::io::Result<()> = tokio::select! {
                served = async move { server.await } => served,
                _ = async move {
                    let _ = grace.changed().await;
                    tokio::time::sleep(SHUTDOWN_GRACE).await;
                } => Ok(()),
                _ = tokio::time::sleep(timeout) => Ok(()),
            };
            served
        })?;

        match state.take() {
            Some(Ok(code)) => Ok(code),
            Some(Err(reason)) => Err(MailError::Auth(reason)),
            None => Err(MailError::Auth(format!(
                "no consent redirect within {} seconds",
                timeout.as_secs()
            ))),
        }
    }
}

async fn handle_redirect(
    State(state): State<Arc<RedirectState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    if let Some(error) = params.get("error") {
        state.finish(Err(format!("consent denied: {error}")));
        return Html(DECLINED_PAGE);
    }
    let Some(code) = params.get("code") else {
        return Html(WAITING_PAGE);
    };
    if params.get("state").map(String::as_str) != Some(state.expected_state.as_str()) {
        state.finish(Err("state mismatch in OAuth redirect".into()));
        return Html(MISMATCH_PAGE);
    }
    debug!("authorization code received");
    state.finish(Ok(code.clone()));
    Html(COMPLETE_PAGE)
}
