//! HTTP surface: one thin handler per route, all shaping the same uniform
//! JSON envelope. Handlers validate first, then resolve attachments, then
//! persist; every step is awaited before a success body is produced.

pub mod apps;
pub mod contact;
pub mod login;
pub mod projects;

use crate::error::FolioError;
use crate::store::JsonRecord;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct ApiMessage {
    pub status: &'static str,
    pub message: String,
}

impl ApiMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiResults {
    pub status: &'static str,
    pub results: Vec<JsonRecord>,
}

impl ApiResults {
    pub fn success(results: Vec<JsonRecord>) -> Self {
        Self {
            status: "success",
            results,
        }
    }
}

/// Read queries carry the table in `db`; record reads add `id`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub db: Option<String>,
    pub id: Option<String>,
}

pub(crate) fn require_param<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, FolioError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(FolioError::BadRequest(format!(
            "missing {name} query parameter"
        ))),
    }
}

pub(crate) fn parse_id(value: Option<&str>) -> Result<i64, FolioError> {
    value
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| FolioError::BadRequest("missing or invalid id".to_string()))
}
