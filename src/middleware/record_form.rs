use axum::{
    extract::{FromRequest, Multipart, Request},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

use crate::error::FolioError;
use crate::uploads::{self, UploadedFile};

/// Preprocessed multipart record submission: plain text fields plus at most
/// one buffered file per attachment slot.
///
/// The upload allow-list runs while the stream is consumed, so a disallowed
/// type is rejected before validation or storage sees the request. A second
/// file for an already-filled slot is rejected rather than silently dropped.
pub struct RecordForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl RecordForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl<S> FromRequest<S> for RecordForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = match Multipart::from_request(req, state).await {
            Ok(multipart) => multipart,
            Err(rejection) => return Err(rejection.into_response()),
        };

        let mut fields = HashMap::new();
        let mut files: HashMap<String, UploadedFile> = HashMap::new();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Err(FolioError::from(e).into_response()),
            };
            let Some(name) = field.name().map(|s| s.to_string()) else {
                continue;
            };

            match field.file_name().map(|s| s.to_string()) {
                // Browsers submit an empty file input as a part with an
                // empty filename; treat it as absent.
                Some(file_name) if !file_name.is_empty() => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    if let Err(e) = uploads::check_allowed(&file_name, &content_type) {
                        return Err(e.into_response());
                    }
                    if files.contains_key(&name) {
                        return Err(FolioError::UploadRejected(format!(
                            "multiple files supplied for {name}"
                        ))
                        .into_response());
                    }
                    let bytes = match field.bytes().await {
                        Ok(bytes) => bytes,
                        Err(e) => return Err(FolioError::from(e).into_response()),
                    };
                    files.insert(
                        name,
                        UploadedFile {
                            original_name: file_name,
                            content_type,
                            bytes,
                        },
                    );
                }
                _ => {
                    let value = match field.text().await {
                        Ok(value) => value,
                        Err(e) => return Err(FolioError::from(e).into_response()),
                    };
                    fields.insert(name, value);
                }
            }
        }

        Ok(Self { fields, files })
    }
}
