//! Session lifecycle and the expired-session recovery flow.

mod support;

use std::time::Duration;

use futures_util::future::join_all;
use serde_json::json;
use storefront_sdk::handler::SESSION_RENEWED_TEXT;
use storefront_sdk::prelude::*;
use support::{envelope, harness, ViewEvent, T0, WINDOW_MS};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_refresh(h: &support::Harness, delay: Duration, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})).set_delay(delay))
        .expect(expected)
        .mount(&h.server)
        .await;
}

#[tokio::test]
async fn test_login_then_lazy_expiry() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "userId": "u1" })))
        .mount(&h.server)
        .await;

    let resp = h
        .client
        .session()
        .login(&json!({ "email": "a@b.c", "password": "pw" }))
        .await
        .unwrap();
    assert_eq!(resp.json::<serde_json::Value>().unwrap()["userId"], "u1");
    assert!(h.client.session().is_logged_in());

    // No logout call: the flag simply stops counting once the window passes.
    h.clock.advance_ms(WINDOW_MS);
    assert!(!h.client.session().is_logged_in());
    assert!(!h.store.contains("session"));
}

#[tokio::test]
async fn test_concurrent_refreshes_issue_one_remote_call() {
    let h = harness().await;
    mount_refresh(&h, Duration::from_millis(200), 1).await;
    h.client.session().mark_logged_in().unwrap();

    let session = h.client.session();
    let results = join_all((0..10).map(|_| session.refresh())).await;

    assert!(results.iter().all(|r| r.is_ok()));
    h.server.verify().await;
}

#[tokio::test]
async fn test_concurrent_failures_share_refresh_outcome() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(envelope("S004", 401, "Refresh token invalid", "/api/auth/refresh"))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    h.client.session().mark_logged_in().unwrap();

    let session = h.client.session();
    let results = join_all((0..5).map(|_| session.refresh())).await;

    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionInvalid);
        assert_eq!(err.code(), "S004");
    }
    assert!(!h.store.contains("session"));
    h.server.verify().await;
}

#[tokio::test]
async fn test_abandon_keeps_refresh_in_flight() {
    let h = harness().await;
    mount_refresh(&h, Duration::from_millis(300), 1).await;
    h.client.session().mark_logged_in().unwrap();

    let first = {
        let session = h.client.session().clone();
        tokio::spawn(async move { session.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.client.session().is_refreshing().await);

    // A waiter from an earlier burst finishing late.
    h.client.session().abandon_refresh().await;
    assert!(h.client.session().is_refreshing().await);

    h.client.session().refresh().await.unwrap();
    first.await.unwrap().unwrap();
    h.server.verify().await;
}

#[tokio::test]
async fn test_refresh_extends_expiry_from_completion_time() {
    let h = harness().await;
    mount_refresh(&h, Duration::ZERO, 1).await;
    h.client.session().mark_logged_in().unwrap();

    let t1 = T0 + 20 * 60 * 1000;
    h.clock.set_ms(t1);
    h.client.session().refresh().await.unwrap();

    let state = h.client.session().session_state().unwrap();
    assert_eq!(state.expires_at_epoch_ms, t1 + WINDOW_MS);
}

#[tokio::test]
async fn test_expired_token_burst_refreshes_once_and_reloads() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(401).set_body_json(envelope(
            "S002",
            401,
            "Access token expired",
            "/api/orders",
        )))
        .mount(&h.server)
        .await;
    mount_refresh(&h, Duration::from_millis(300), 1).await;
    h.client.session().mark_logged_in().unwrap();

    let http = h.client.http();
    let options = RequestOptions::default();
    let results = join_all((0..6).map(|_| http.get("/api/orders", &options))).await;

    // Every caller still sees its own typed error.
    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionExpired);
        assert_eq!(err.status(), Some(401));
    }

    h.view.wait_for(|e| *e == ViewEvent::Reload).await;
    let renewed = h
        .view
        .notifications()
        .into_iter()
        .any(|n| n.severity == Severity::Info && n.text == SESSION_RENEWED_TEXT);
    assert!(renewed);
    assert!(h.client.session().is_logged_in());
    assert!(!h.view.events().contains(&ViewEvent::Login));
    h.server.verify().await;
}

#[tokio::test]
async fn test_unrecoverable_session_logs_out_and_redirects() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(401).set_body_json(envelope(
            "S002",
            401,
            "Access token expired",
            "/api/orders",
        )))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(envelope("S004", 401, "Refresh token invalid", "/api/auth/refresh")),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;
    h.client.session().mark_logged_in().unwrap();

    let _ = h.client.http().get("/api/orders", &RequestOptions::default()).await;

    h.view.wait_for(|e| *e == ViewEvent::Login).await;
    assert!(!h.client.session().is_logged_in());
    assert!(!h.view.events().contains(&ViewEvent::Reload));
    assert!(!h.client.session().is_refreshing().await);
    h.server.verify().await;
}

#[tokio::test]
async fn test_invalid_session_forces_logout() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(envelope(
            "S001",
            401,
            "Invalid token",
            "/api/me",
        )))
        .mount(&h.server)
        .await;
    // Remote logout failing must not prevent local cleanup.
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&h.server)
        .await;
    h.client.session().mark_logged_in().unwrap();

    let err = h.client.http().get("/api/me", &RequestOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionInvalid);

    h.view.wait_for(|e| *e == ViewEvent::Login).await;
    assert!(!h.store.contains("session"));
    assert!(h.view.notifications().is_empty());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&h.server)
        .await;
    h.client.session().mark_logged_in().unwrap();

    h.client.session().logout().await;
    h.client.session().logout().await;
    assert!(!h.client.session().is_logged_in());
    h.server.verify().await;
}
