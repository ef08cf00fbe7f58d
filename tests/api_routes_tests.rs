use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

use folio_api::config::Config;
use folio_api::mail::MailSender;
use folio_api::router::{AppState, folio_router};
use folio_api::store::RecordStore;

#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait::async_trait]
impl MailSender for CapturingMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), folio_api::FolioError> {
        self.sent.lock().expect("mailer lock").push((
            to.to_string(),
            subject.to_string(),
            html_body.to_string(),
        ));
        Ok(())
    }
}

struct TestApp {
    app: Router,
    state: AppState,
    mailer: Arc<CapturingMailer>,
    db_path: PathBuf,
    _upload_dir: tempfile::TempDir,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}

async fn spawn_app(tag: &str) -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut db_path = std::env::temp_dir();
    db_path.push(format!("folio-{}-{}-{}.sqlite", tag, std::process::id(), nanos));

    let database_url = format!("sqlite:{}", db_path.display());
    let pool = folio_api::store::connect(&database_url)
        .await
        .expect("failed to open test pool");
    let store = RecordStore::new(pool);
    store.init_schema().await.expect("failed to init schema");

    let upload_dir = tempfile::tempdir().expect("failed to create upload dir");
    let template_path = upload_dir.path().join("contact.html");
    std::fs::write(&template_path, "<p>Hi {{fullName}}!</p>").expect("failed to write template");

    let mut cfg = Config::default();
    cfg.upload_dir = upload_dir.path().to_path_buf();
    cfg.template_path = template_path;
    cfg.jwt_secret = "integration-secret".to_string();

    let mailer = Arc::new(CapturingMailer::default());
    let dyn_mailer: Arc<dyn MailSender> = mailer.clone();
    let state = AppState::new(store, Arc::new(cfg), dyn_mailer);
    let app = folio_router(state.clone());

    TestApp {
        app,
        state,
        mailer,
        db_path,
        _upload_dir: upload_dir,
    }
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json = serde_json::from_slice(&bytes).expect("response body was not json");
    (status, json)
}

#[tokio::test]
async fn unmatched_route_returns_the_404_shape() {
    let harness = spawn_app("fallback").await;

    let resp = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Cannot find /api/nope on this server");
}

#[tokio::test]
async fn contact_form_dispatches_exactly_one_mail() {
    let harness = spawn_app("contact-ok").await;

    let (status, body) = post_json(
        &harness.app,
        "/api/send-mail",
        json!({
            "fullName": "Ada Lovelace",
            "contact": "ada@example.com",
            "message": "I would like a website."
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let sent = harness.mailer.sent.lock().expect("mailer lock");
    assert_eq!(sent.len(), 1);
    let (to, _subject, html) = &sent[0];
    assert_eq!(to, "ada@example.com");
    assert!(html.contains("Hi Ada Lovelace!"));
}

#[tokio::test]
async fn contact_form_reports_every_missing_field() {
    let harness = spawn_app("contact-missing").await;

    let (status, body) = post_json(&harness.app, "/api/send-mail", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    let errors = body["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 3);

    // nothing was dispatched
    assert!(harness.mailer.sent.lock().expect("mailer lock").is_empty());
}

#[tokio::test]
async fn login_with_unknown_email_never_returns_a_token() {
    let harness = spawn_app("login-unknown").await;

    let (status, body) = post_json(
        &harness.app,
        "/api/login",
        json!({"email": "ghost@example.com", "password": "whatever"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["errors"][0]["field"], "email");
    assert_eq!(body["errors"][0]["message"], "User does not exist");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn login_with_wrong_password_never_returns_a_token() {
    let harness = spawn_app("login-wrong").await;
    insert_user(&harness.state, "admin@example.com", "correct horse").await;

    let (status, body) = post_json(
        &harness.app,
        "/api/login",
        json!({"email": "admin@example.com", "password": "battery staple"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "password");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn login_success_issues_a_one_hour_token() {
    let harness = spawn_app("login-ok").await;
    insert_user(&harness.state, "admin@example.com", "correct horse").await;

    let before = chrono::Utc::now().timestamp();
    let (status, body) = post_json(
        &harness.app,
        "/api/login",
        json!({"email": "admin@example.com", "password": "correct horse"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let token = body["token"].as_str().expect("token string");

    let claims = folio_api::auth::decode_token("integration-secret", token)
        .expect("token should decode");
    assert_eq!(claims.email, "admin@example.com");
    assert!(claims.id > 0);
    let ttl = claims.exp - before;
    assert!((3595..=3605).contains(&ttl), "unexpected ttl {ttl}");
}

#[tokio::test]
async fn login_rejects_malformed_submission_with_field_errors() {
    let harness = spawn_app("login-malformed").await;

    let (status, body) = post_json(
        &harness.app,
        "/api/login",
        json!({"email": "not-an-email"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("errors array");
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().expect("field"))
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

async fn insert_user(state: &AppState, email: &str, password: &str) {
    let hash = bcrypt::hash(password, 4).expect("bcrypt hash");
    sqlx::query("INSERT INTO users (email, password) VALUES (?, ?)")
        .bind(email)
        .bind(hash)
        .execute(state.store.pool())
        .await
        .expect("failed to insert user");
}
