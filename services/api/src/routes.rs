use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use waitlist::waitlist::{waitlist_router, WaitlistHooks, WaitlistService, WaitlistStore};

pub(crate) fn with_waitlist_routes<S, H>(service: Arc<WaitlistService<S, H>>) -> axum::Router
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    waitlist_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::LoggingHooks;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;
    use waitlist::waitlist::{InMemoryWaitlistStore, WaitlistConfig};

    fn app(ready: bool) -> axum::Router {
        let service = WaitlistService::with_hooks(
            Arc::new(InMemoryWaitlistStore::new()),
            Arc::new(LoggingHooks),
            WaitlistConfig::default(),
        )
        .expect("valid config");
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_waitlist_routes(Arc::new(service)).layer(Extension(state))
    }

    async fn get(router: axum::Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route executes")
            .status()
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        assert_eq!(get(app(false), "/ready").await, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(get(app(true), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_and_waitlist_routes_are_mounted() {
        assert_eq!(get(app(true), "/metrics").await, StatusCode::OK);
        assert_eq!(
            get(app(true), "/waitlist/status?email=nobody%40x.com").await,
            StatusCode::NOT_FOUND
        );
    }
}
