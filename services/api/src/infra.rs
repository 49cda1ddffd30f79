use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use constant_time_eq::constant_time_eq;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use waitlist::waitlist::{HookError, Session, WaitlistEntry, WaitlistHooks};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared secret that stands in for the host framework's admin session check.
#[derive(Clone, Default)]
pub(crate) struct AdminToken(pub(crate) Option<Arc<str>>);

impl AdminToken {
    pub(crate) fn new(token: Option<String>) -> Self {
        Self(token.map(Arc::from))
    }

    fn accepts(&self, request: &Request) -> bool {
        let Some(expected) = self.0.as_deref() else {
            return false;
        };

        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|presented| {
                constant_time_eq(presented.as_bytes(), expected.as_bytes())
            })
    }
}

/// Inserts an admin [`Session`] for requests carrying the configured bearer token.
pub(crate) async fn admin_session(
    State(token): State<AdminToken>,
    mut request: Request,
    next: Next,
) -> Response {
    if token.accepts(&request) {
        request.extensions_mut().insert(Session::new("admin"));
    }
    next.run(request).await
}

/// Callbacks that only log. Delivery of invite emails is left to real deployments.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggingHooks;

impl WaitlistHooks for LoggingHooks {
    async fn on_join(&self, entry: &WaitlistEntry) -> Result<(), HookError> {
        info!(email = %entry.email, position = entry.position, "new waitlist entry");
        Ok(())
    }

    async fn on_approve(&self, entry: &WaitlistEntry) -> Result<(), HookError> {
        info!(
            email = %entry.email,
            invited = entry.invited_at.is_some(),
            "waitlist entry approved"
        );
        Ok(())
    }

    async fn on_reject(&self, entry: &WaitlistEntry) -> Result<(), HookError> {
        info!(email = %entry.email, "waitlist entry rejected");
        Ok(())
    }

    async fn on_complete(&self, entry: &WaitlistEntry) -> Result<(), HookError> {
        info!(email = %entry.email, status = %entry.status, "waitlist entry completed");
        Ok(())
    }
}
