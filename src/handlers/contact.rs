use axum::{Json, extract::State};
use serde_json::Value;
use tracing::info;

use crate::error::FolioError;
use crate::handlers::ApiMessage;
use crate::mail;
use crate::router::AppState;
use crate::validation::{self, SchemaKind};

/// POST /api/send-mail -> dispatches the templated contact reply.
///
/// Validation runs before any template or transport work; template-load and
/// relay failures surface as the generic 500.
pub async fn send_mail_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<ApiMessage>, FolioError> {
    let fields = validation::value_fields(&body);
    validation::validate(SchemaKind::Contact, &fields).map_err(FolioError::Validation)?;

    let full_name = fields.get("fullName").map(String::as_str).unwrap_or_default();
    let contact = fields.get("contact").map(String::as_str).unwrap_or_default();

    let template = mail::load_template(&state.config.template_path).await?;
    let html = mail::render_template(&template, full_name);
    state
        .mailer
        .send(contact, &state.config.smtp.subject, &html)
        .await?;

    info!(to = %contact, "contact mail dispatched");
    Ok(Json(ApiMessage::success("Email sent successfully")))
}
