use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::auth;
use crate::error::{FieldError, FolioError};
use crate::router::AppState;
use crate::validation::{self, SchemaKind};

#[derive(Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub message: String,
    pub token: String,
}

/// POST /api/login -> verifies credentials and issues a one-hour token.
/// Both failure modes answer with the same field-error shape; a token is
/// only ever present on success.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<LoginResponse>, FolioError> {
    let fields = validation::value_fields(&body);
    validation::validate(SchemaKind::Login, &fields).map_err(FolioError::Validation)?;

    let email = fields.get("email").map(String::as_str).unwrap_or_default();
    let password = fields.get("password").map(String::as_str).unwrap_or_default();

    let Some(credential) = auth::find_credential(state.store.pool(), email).await? else {
        return Err(FolioError::Validation(vec![FieldError::new(
            "email",
            "User does not exist",
        )]));
    };

    if !auth::verify_password(password, &credential.password)? {
        return Err(FolioError::Validation(vec![FieldError::new(
            "password",
            "Incorrect password",
        )]));
    }

    let token = auth::issue_token(&state.config.jwt_secret, credential.id, &credential.email)?;
    info!(email = %credential.email, "login succeeded");
    Ok(Json(LoginResponse {
        status: "success",
        message: "Logged in successfully".to_string(),
        token,
    }))
}
