use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{
    CompletedEntry, ListPage, PositionView, PromoteAllOutcome, StatusView, WaitlistEntry,
    WaitlistStats, WaitlistStatus,
};
use super::hooks::WaitlistHooks;
use super::service::{ErrorKind, ListQuery, Session, WaitlistError, WaitlistService};
use super::store::WaitlistStore;

type SharedService<S, H> = State<Arc<WaitlistService<S, H>>>;
type MaybeSession = Option<Extension<Session>>;
type JsonBody<T> = Result<Json<T>, JsonRejection>;
type QueryParams<T> = Result<Query<T>, QueryRejection>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JoinRequest {
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmailRequest {
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApproveRequest {
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) send_invite: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PromoteAllRequest {
    #[serde(default)]
    pub(crate) status: Option<WaitlistStatus>,
}

/// Router exposing the waitlist endpoints under `/waitlist`.
///
/// Admin endpoints read the caller's [`Session`] from request extensions; the host's
/// authentication middleware is expected to insert it.
pub fn waitlist_router<S, H>(service: Arc<WaitlistService<S, H>>) -> Router
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    Router::new()
        .route("/waitlist/join", post(join_handler::<S, H>))
        .route("/waitlist/status", get(status_handler::<S, H>))
        .route("/waitlist/position", get(position_handler::<S, H>))
        .route("/waitlist/list", get(list_handler::<S, H>))
        .route("/waitlist/stats", get(stats_handler::<S, H>))
        .route("/waitlist/approve", post(approve_handler::<S, H>))
        .route("/waitlist/reject", post(reject_handler::<S, H>))
        .route("/waitlist/promote", post(promote_handler::<S, H>))
        .route("/waitlist/promote-all", post(promote_all_handler::<S, H>))
        .route("/waitlist/complete", post(complete_handler::<S, H>))
        .route("/waitlist/remove", post(complete_handler::<S, H>))
        .with_state(service)
}

fn session_ref(session: &MaybeSession) -> Option<&Session> {
    session.as_ref().map(|Extension(session)| session)
}

pub(crate) async fn join_handler<S, H>(
    State(service): SharedService<S, H>,
    request: JsonBody<JoinRequest>,
) -> Result<Json<WaitlistEntry>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    let Json(request) = request?;
    let entry = service.join(&request.email, request.user_id).await?;
    Ok(Json(entry))
}

pub(crate) async fn status_handler<S, H>(
    State(service): SharedService<S, H>,
    request: QueryParams<EmailRequest>,
) -> Result<Json<StatusView>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    let Query(request) = request?;
    Ok(Json(service.status(&request.email).await?))
}

pub(crate) async fn position_handler<S, H>(
    State(service): SharedService<S, H>,
    request: QueryParams<EmailRequest>,
) -> Result<Json<PositionView>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    let Query(request) = request?;
    Ok(Json(service.position(&request.email).await?))
}

pub(crate) async fn list_handler<S, H>(
    State(service): SharedService<S, H>,
    session: MaybeSession,
    query: QueryParams<ListQuery>,
) -> Result<Json<ListPage>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    let Query(query) = query?;
    Ok(Json(service.list(session_ref(&session), &query).await?))
}

pub(crate) async fn stats_handler<S, H>(
    State(service): SharedService<S, H>,
    session: MaybeSession,
) -> Result<Json<WaitlistStats>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    Ok(Json(service.stats(session_ref(&session)).await?))
}

pub(crate) async fn approve_handler<S, H>(
    State(service): SharedService<S, H>,
    session: MaybeSession,
    request: JsonBody<ApproveRequest>,
) -> Result<Json<WaitlistEntry>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    let Json(request) = request?;
    let entry = service
        .approve(session_ref(&session), &request.email, request.send_invite)
        .await?;
    Ok(Json(entry))
}

pub(crate) async fn reject_handler<S, H>(
    State(service): SharedService<S, H>,
    session: MaybeSession,
    request: JsonBody<EmailRequest>,
) -> Result<Json<WaitlistEntry>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    let Json(request) = request?;
    Ok(Json(
        service.reject(session_ref(&session), &request.email).await?,
    ))
}

pub(crate) async fn promote_handler<S, H>(
    State(service): SharedService<S, H>,
    session: MaybeSession,
    request: JsonBody<EmailRequest>,
) -> Result<Json<WaitlistEntry>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    let Json(request) = request?;
    Ok(Json(
        service.promote(session_ref(&session), &request.email).await?,
    ))
}

pub(crate) async fn promote_all_handler<S, H>(
    State(service): SharedService<S, H>,
    session: MaybeSession,
    request: JsonBody<PromoteAllRequest>,
) -> Result<Json<PromoteAllOutcome>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    let Json(request) = request?;
    let outcome = service
        .promote_all(session_ref(&session), request.status)
        .await?;
    Ok(Json(outcome))
}

pub(crate) async fn complete_handler<S, H>(
    State(service): SharedService<S, H>,
    session: MaybeSession,
    request: JsonBody<EmailRequest>,
) -> Result<Json<CompletedEntry>, WaitlistError>
where
    S: WaitlistStore + 'static,
    H: WaitlistHooks + 'static,
{
    let Json(request) = request?;
    Ok(Json(
        service.complete(session_ref(&session), &request.email).await?,
    ))
}

impl From<JsonRejection> for WaitlistError {
    fn from(rejection: JsonRejection) -> Self {
        WaitlistError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for WaitlistError {
    fn from(rejection: QueryRejection) -> Self {
        WaitlistError::MalformedRequest(rejection.body_text())
    }
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WaitlistError {
    fn into_response(self) -> Response {
        let status = self.kind().status_code();
        if status.is_server_error() {
            error!(error = %self, "waitlist request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
