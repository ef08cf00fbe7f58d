use crate::config::Config;
use crate::error::MessageBody;
use crate::handlers::{apps, contact, login, projects};
use crate::mail::MailSender;
use crate::store::RecordStore;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

/// Shared per-request state: the record store (owning the pool), the
/// resolved configuration and the mail transport.
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn MailSender>,
}

impl AppState {
    pub fn new(store: RecordStore, config: Arc<Config>, mailer: Arc<dyn MailSender>) -> Self {
        Self {
            store,
            config,
            mailer,
        }
    }
}

pub fn folio_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .route("/api/send-mail", post(contact::send_mail_handler))
        .route("/api/login", post(login::login_handler))
        .route(
            "/api/apps",
            get(apps::list_apps_handler).post(apps::create_app_handler),
        )
        .route(
            "/api/edit/apps",
            get(apps::get_app_handler).post(apps::edit_app_handler),
        )
        .route(
            "/api/projects",
            get(projects::list_projects_handler).post(projects::create_project_handler),
        )
        .route(
            "/api/edit/projects",
            get(projects::get_project_handler).post(projects::edit_project_handler),
        )
        .route(
            "/api/projects/delete",
            get(projects::delete_project_handler),
        )
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => base.allow_origin(value),
            Err(_) => {
                warn!(origin, "invalid cors_origin; falling back to any origin");
                base.allow_origin(Any)
            }
        },
        None => base.allow_origin(Any),
    }
}

async fn fallback_handler(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(MessageBody {
            status: "fail",
            message: format!("Cannot find {} on this server", uri.path()),
        }),
    )
}
