use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

/// One violated constraint, addressed to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, ThisError)]
pub enum FolioError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UploadRejected(String),

    #[error("{0}")]
    NotFound(String),

    #[error("multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("database error: {0}")]
    Database(#[from] SqlxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("mail transport error: {0}")]
    MailTransport(#[from] lettre::transport::smtp::Error),

    #[error("mail message error: {0}")]
    MailMessage(#[from] lettre::error::Error),

    #[error("mail address error: {0}")]
    MailAddress(#[from] lettre::address::AddressError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// `{status:"fail"}` body carrying per-field violations.
#[derive(Serialize)]
pub struct FailErrorsBody {
    pub status: &'static str,
    pub errors: Vec<FieldError>,
}

/// `{status:"fail"|"error"}` body carrying a single message.
#[derive(Serialize)]
pub struct MessageBody {
    pub status: &'static str,
    pub message: String,
}

impl IntoResponse for FolioError {
    fn into_response(self) -> axum::response::Response {
        match self {
            FolioError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(FailErrorsBody {
                    status: "fail",
                    errors,
                }),
            )
                .into_response(),
            FolioError::BadRequest(message) | FolioError::UploadRejected(message) => (
                StatusCode::BAD_REQUEST,
                Json(MessageBody {
                    status: "fail",
                    message,
                }),
            )
                .into_response(),
            FolioError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(MessageBody {
                    status: "fail",
                    message,
                }),
            )
                .into_response(),
            FolioError::Multipart(e) => (
                StatusCode::BAD_REQUEST,
                Json(MessageBody {
                    status: "fail",
                    message: format!("malformed multipart request: {e}"),
                }),
            )
                .into_response(),
            // Database, I/O, mail, token and hash failures are logged with
            // full detail; clients only ever see the generic 500 body.
            internal => {
                error!(error = %internal, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(MessageBody {
                        status: "error",
                        message: "Internal Server Error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
