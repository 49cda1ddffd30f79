use crate::cli::ServeArgs;
use crate::infra::{admin_session, AdminToken, AppState, LoggingHooks};
use crate::routes::with_waitlist_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use waitlist::config::AppConfig;
use waitlist::error::AppError;
use waitlist::telemetry;
use waitlist::waitlist::{InMemoryWaitlistStore, WaitlistService};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.waitlist.require_admin && config.auth.admin_token.is_none() {
        warn!("WAITLIST_ADMIN_TOKEN is unset; admin endpoints will reject every request");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryWaitlistStore::new());
    let service = Arc::new(WaitlistService::with_hooks(
        store,
        Arc::new(LoggingHooks),
        config.waitlist.clone(),
    )?);

    let admin_token = AdminToken::new(config.auth.admin_token.clone());
    let app = with_waitlist_routes(service)
        .layer(axum::middleware::from_fn_with_state(admin_token, admin_session))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        environment = ?config.environment,
        %addr,
        require_admin = config.waitlist.require_admin,
        max_entries = config.waitlist.max_entries,
        "waitlist service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
