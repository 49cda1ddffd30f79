//! End-to-end waitlist scenarios driven through the public service facade and router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Extension;
use serde_json::{json, Value};
use tower::ServiceExt;

use waitlist::waitlist::{
    waitlist_router, ErrorKind, InMemoryWaitlistStore, Session, WaitlistConfig, WaitlistService,
    WaitlistStatus,
};

fn service(config: WaitlistConfig) -> WaitlistService<InMemoryWaitlistStore> {
    WaitlistService::new(Arc::new(InMemoryWaitlistStore::new()), config).expect("valid config")
}

fn admin() -> Session {
    Session::new("admin")
}

#[tokio::test]
async fn approving_the_head_of_the_queue_moves_the_next_entry_up() {
    let service = service(WaitlistConfig {
        renumber_positions: true,
        ..WaitlistConfig::default()
    });

    let a = service.join("a@x.com", None).await.expect("join a");
    let b = service.join("b@x.com", None).await.expect("join b");
    assert_eq!((a.position, b.position), (1, 2));

    service
        .approve(Some(&admin()), "a@x.com", None)
        .await
        .expect("approve a");

    let view = service.position("b@x.com").await.expect("position");
    assert_eq!(view.status, WaitlistStatus::Pending);
    assert_eq!(view.position, Some(1));
}

#[tokio::test]
async fn capacity_of_one_admits_a_single_entry() {
    let service = service(WaitlistConfig {
        max_entries: 1,
        ..WaitlistConfig::default()
    });

    service.join("a@x.com", None).await.expect("first join");
    let err = service
        .join("b@x.com", None)
        .await
        .expect_err("second join refused");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn full_lifecycle_over_http() {
    let service = Arc::new(service(WaitlistConfig::default()));
    let router = waitlist_router(service).layer(Extension(admin()));

    let call = |method: &str, uri: &str, body: Option<Value>| {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    };

    for email in ["first@x.com", "second@x.com"] {
        let response = router
            .clone()
            .oneshot(call("POST", "/waitlist/join", Some(json!({ "email": email }))))
            .await
            .expect("join");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(call(
            "POST",
            "/waitlist/approve",
            Some(json!({ "email": "second@x.com" })),
        ))
        .await
        .expect("approve");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(call("POST", "/waitlist/promote-all", Some(json!({ "status": "approved" }))))
        .await
        .expect("promote all");
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    let body: Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(body["promoted"], 1);
    assert_eq!(body["entries"][0]["email"], "second@x.com");

    let response = router
        .clone()
        .oneshot(call(
            "POST",
            "/waitlist/complete",
            Some(json!({ "email": "second@x.com" })),
        ))
        .await
        .expect("complete");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(call("GET", "/waitlist/status?email=second%40x.com", None))
        .await
        .expect("status");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(call("GET", "/waitlist/position?email=first%40x.com", None))
        .await
        .expect("position");
    assert_eq!(response.status(), StatusCode::OK);
}
