use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use gantry::AppContext;
use gantry::config::{Config, RuntimeBackend};
use gantry::error::{AuthorizationFailure, GantryError};
use gantry::runtime::MemoryRuntime;
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

fn temp_database_url(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "gantry-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    format!("sqlite:{}", path.display())
}

fn test_config(tag: &str) -> Config {
    let mut cfg = Config::default();
    cfg.basic.database_url = temp_database_url(tag);
    cfg.auth.password_rounds = 2_048;
    cfg.auth.sweep_interval_secs = 0;
    cfg.runtime.backend = RuntimeBackend::Memory;
    cfg
}

async fn build_context(cfg: Config) -> AppContext {
    let runtime = Arc::new(MemoryRuntime::new());
    runtime.insert(&cfg.runtime.resource_name, false);
    AppContext::build(cfg, runtime)
        .await
        .expect("build application context")
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");

    let resp = app.clone().oneshot(request).await.expect("request failed");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };
    (status, headers, json)
}

#[tokio::test]
async fn register_login_logout_scenario() {
    let ctx = build_context(test_config("auth-scenario")).await;
    let app = gantry::server::gantry_router(ctx.state());

    // 1) register -> 201
    let (status, _, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(r#"{"username":"alice","password":"s3cret"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert!(body["accountId"].as_i64().expect("accountId") > 0);

    // 2) duplicate -> 409
    let (status, _, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(r#"{"username":"alice","password":"other"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    // 3) missing password -> 400
    let (status, _, body) =
        send(&app, "POST", "/register", None, Some(r#"{"username":"bob"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // 4) whitespace-only username -> 400
    let (status, _, _) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(r#"{"username":"   ","password":"pw"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 5) malformed JSON -> 400
    let (status, _, body) = send(&app, "POST", "/register", None, Some("not-json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    // 6) wrong password and unknown user look the same
    let (status, _, wrong) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(r#"{"username":"alice","password":"nope"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, unknown) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(r#"{"username":"mallory","password":"nope"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong["error"]["code"], "AUTHENTICATION_FAILED");

    // 7) login missing fields -> 400
    let (status, _, _) = send(&app, "POST", "/login", None, Some("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 8) login -> token
    let (status, _, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(r#"{"username":"alice","password":"s3cret"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token").to_string();
    assert!(!token.is_empty());
    assert!(body["expiresAt"].is_string());

    // 9) token works for a command
    let (status, _, body) = send(&app, "POST", "/resource/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");

    // 10) logout without header -> 400
    let (status, _, _) = send(&app, "POST", "/logout", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 11) logout -> 200, twice
    let (status, _, _) = send(&app, "POST", "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, "POST", "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // 12) revoked token -> 401
    let (status, _, body) = send(&app, "POST", "/resource/stop", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // 13) unknown token on logout is still a no-op success
    let (status, _, _) = send(&app, "POST", "/logout", Some("never-issued"), None).await;
    assert_eq!(status, StatusCode::OK);

    ctx.shutdown().await;
}

#[tokio::test]
async fn server_status_route_and_request_ids() {
    let ctx = build_context(test_config("auth-health")).await;
    let app = gantry::server::gantry_router(ctx.state());

    let (status, headers, body) = send(&app, "GET", "/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert!(headers.contains_key("x-request-id"));

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/status")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(
        resp.headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-123")
    );

    let (status, _, body) = send(&app, "GET", "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    ctx.shutdown().await;
}

#[tokio::test]
async fn expiry_is_checked_at_read_time() {
    let ctx = build_context(test_config("auth-expiry")).await;
    ctx.auth
        .register("alice", "s3cret")
        .await
        .expect("register");
    let issued = ctx.auth.login("alice", "s3cret").await.expect("login");

    let just_before = issued.expires_at - chrono::Duration::seconds(1);
    assert_eq!(
        ctx.auth
            .authorize_at(&issued.token, just_before)
            .await
            .expect("valid before expiry"),
        issued.account_id
    );
    assert!(matches!(
        ctx.auth.authorize_at(&issued.token, issued.expires_at).await,
        Err(GantryError::Authorization(AuthorizationFailure::Expired))
    ));
    // Reads never mutate: the token is still valid at an earlier instant.
    assert!(
        ctx.auth
            .authorize_at(&issued.token, just_before)
            .await
            .is_ok()
    );

    ctx.shutdown().await;
}

#[tokio::test]
async fn tokens_are_unique_per_login() {
    let ctx = build_context(test_config("auth-unique")).await;
    ctx.auth
        .register("alice", "s3cret")
        .await
        .expect("register");
    let a = ctx.auth.login("alice", "s3cret").await.expect("login");
    let b = ctx.auth.login("alice", "s3cret").await.expect("login");
    assert_ne!(a.token, b.token);

    // Revoking one session leaves the other alive.
    ctx.auth.logout(&a.token).await.expect("logout");
    assert!(matches!(
        ctx.auth.authorize(&a.token).await,
        Err(GantryError::Authorization(AuthorizationFailure::Revoked))
    ));
    assert!(ctx.auth.authorize(&b.token).await.is_ok());

    ctx.shutdown().await;
}

#[tokio::test]
async fn sessions_survive_a_restart() {
    let cfg = test_config("auth-restart");

    let ctx = build_context(cfg.clone()).await;
    ctx.auth
        .register("alice", "s3cret")
        .await
        .expect("register");
    let live = ctx.auth.login("alice", "s3cret").await.expect("login");
    let revoked = ctx.auth.login("alice", "s3cret").await.expect("login");
    ctx.auth.logout(&revoked.token).await.expect("logout");
    ctx.shutdown().await;

    let ctx = build_context(cfg).await;
    assert_eq!(
        ctx.auth
            .authorize(&live.token)
            .await
            .expect("restored session"),
        live.account_id
    );
    assert!(ctx.auth.authorize(&revoked.token).await.is_err());

    // Accounts persist too.
    assert!(matches!(
        ctx.auth.register("alice", "again").await,
        Err(GantryError::Conflict(_))
    ));

    ctx.shutdown().await;
}

#[tokio::test]
async fn sessions_beyond_cache_capacity_stay_valid() {
    let mut cfg = test_config("auth-capacity");
    cfg.auth.max_sessions = 2;
    let ctx = build_context(cfg).await;
    ctx.auth
        .register("alice", "s3cret")
        .await
        .expect("register");

    let mut issued = Vec::new();
    for _ in 0..6 {
        let session = ctx.auth.login("alice", "s3cret").await.expect("login");
        ctx.auth
            .authorize(&session.token)
            .await
            .expect("fresh token authorizes");
        issued.push(session);
    }
    // Force pending evictions.
    ctx.auth
        .sessions()
        .purge_expired(chrono::Utc::now())
        .await
        .expect("purge");

    for session in &issued {
        assert_eq!(
            ctx.auth
                .authorize(&session.token)
                .await
                .expect("live token authorizes"),
            session.account_id
        );
    }

    // Revocation holds for evicted sessions as well.
    for session in &issued {
        ctx.auth.logout(&session.token).await.expect("logout");
    }
    for session in &issued {
        assert!(matches!(
            ctx.auth.authorize(&session.token).await,
            Err(GantryError::Authorization(AuthorizationFailure::Revoked))
        ));
    }
    assert!(matches!(
        ctx.auth.authorize("never-issued").await,
        Err(GantryError::Authorization(AuthorizationFailure::UnknownToken))
    ));

    ctx.shutdown().await;
}

#[tokio::test]
async fn whitespace_username_is_a_validation_error_on_login() {
    let ctx = build_context(test_config("auth-blank-login")).await;
    let app = gantry::server::gantry_router(ctx.state());

    let (status, _, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(r#"{"username":"   ","password":"s3cret"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    ctx.shutdown().await;
}
