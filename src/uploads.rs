//! Attachment intake and resolution.
//!
//! An attachment slot (`image`, `pdfFile`) arrives either as a fresh binary
//! part or as a plain string naming the already-stored file to keep. Fresh
//! uploads are persisted under a timestamp-prefixed name before any database
//! statement runs; retained references pass through verbatim.

use crate::error::{FieldError, FolioError};
use axum::body::Bytes;
use chrono::Utc;
use std::path::Path;
use tokio::fs;
use tracing::warn;

pub const IMAGE_SLOT: &str = "image";
pub const PDF_SLOT: &str = "pdfFile";

/// Accepted upload types, matched on both extension and declared MIME.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "pdf"];
const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "application/pdf",
];

/// One buffered multipart file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Reject disallowed upload types before any byte is stored.
pub fn check_allowed(file_name: &str, content_type: &str) -> Result<(), FolioError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    let extension_ok = extension
        .as_deref()
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext))
        .unwrap_or(false);
    let mime_ok = ALLOWED_MIME_TYPES.contains(&content_type);

    if extension_ok && mime_ok {
        Ok(())
    } else {
        Err(FolioError::UploadRejected(format!(
            "unsupported upload type: {file_name} ({content_type})"
        )))
    }
}

/// Resolve a slot that must end up with a reference (create, or the `image`
/// slot on edit).
pub async fn resolve_required(
    dir: &Path,
    slot: &str,
    existing: Option<&str>,
    uploaded: Option<&UploadedFile>,
) -> Result<String, FolioError> {
    match resolve_optional(dir, existing, uploaded).await? {
        Some(reference) => Ok(reference),
        None => Err(FolioError::Validation(vec![FieldError::new(
            slot,
            format!("{slot} is required"),
        )])),
    }
}

/// Resolve a slot that may legitimately stay empty (`pdfFile`).
///
/// Precedence: fresh upload, then retained string reference, then nothing.
pub async fn resolve_optional(
    dir: &Path,
    existing: Option<&str>,
    uploaded: Option<&UploadedFile>,
) -> Result<Option<String>, FolioError> {
    if let Some(file) = uploaded {
        return Ok(Some(persist(dir, file).await?));
    }
    if let Some(existing) = existing
        && !existing.trim().is_empty()
    {
        return Ok(Some(existing.to_string()));
    }
    Ok(None)
}

/// Best-effort removal of a previous attachment once an edit replaced it.
/// A failed unlink never fails the request.
pub async fn gc_replaced(dir: &Path, previous: Option<&str>, current: &str) {
    let Some(previous) = previous else {
        return;
    };
    if previous.is_empty() || previous == current {
        return;
    }
    let path = dir.join(sanitize_name(previous));
    if let Err(e) = fs::remove_file(&path).await {
        warn!(path = %path.display(), error = %e, "failed to remove replaced attachment");
    }
}

async fn persist(dir: &Path, file: &UploadedFile) -> Result<String, FolioError> {
    let name = stored_name(&file.original_name);
    fs::create_dir_all(dir).await?;
    fs::write(dir.join(&name), &file.bytes).await?;
    Ok(name)
}

/// `<ingest-millis>_<sanitized original name>`; the millisecond prefix
/// keeps concurrent uploads of the same file name apart.
pub fn stored_name(original: &str) -> String {
    format!("{}_{}", Utc::now().timestamp_millis(), sanitize_name(original))
}

fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_upload(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"\x89PNG fake"),
        }
    }

    #[test]
    fn allow_list_accepts_images_and_pdf() {
        assert!(check_allowed("shot.png", "image/png").is_ok());
        assert!(check_allowed("photo.JPEG", "image/jpeg").is_ok());
        assert!(check_allowed("brief.pdf", "application/pdf").is_ok());
    }

    #[test]
    fn allow_list_rejects_by_extension_and_mime() {
        assert!(check_allowed("tool.exe", "application/octet-stream").is_err());
        // extension alone is not enough
        assert!(check_allowed("fake.png", "application/x-msdownload").is_err());
        // declared mime alone is not enough either
        assert!(check_allowed("fake.exe", "image/png").is_err());
        assert!(check_allowed("no_extension", "image/png").is_err());
    }

    #[test]
    fn stored_name_is_timestamp_prefixed() {
        let name = stored_name("logo.png");
        let (prefix, rest) = name.split_once('_').expect("prefix separator");
        assert!(prefix.parse::<i64>().is_ok());
        assert_eq!(rest, "logo.png");
    }

    #[test]
    fn stored_name_strips_path_components() {
        let name = stored_name("../../etc/passwd");
        assert!(name.ends_with("_passwd"));
        assert!(!name.contains('/'));
    }

    #[tokio::test]
    async fn fresh_upload_is_persisted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = png_upload("logo.png");
        let reference = resolve_required(dir.path(), IMAGE_SLOT, None, Some(&file))
            .await
            .unwrap();
        assert!(reference.ends_with("_logo.png"));
        let on_disk = std::fs::read(dir.path().join(&reference)).expect("stored file");
        assert_eq!(on_disk, file.bytes.to_vec());
    }

    #[tokio::test]
    async fn retained_reference_passes_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reference =
            resolve_required(dir.path(), IMAGE_SLOT, Some("1700000000000_old.png"), None)
                .await
                .unwrap();
        assert_eq!(reference, "1700000000000_old.png");
        // nothing was written
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_required_slot_is_a_field_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolve_required(dir.path(), IMAGE_SLOT, None, None)
            .await
            .unwrap_err();
        match err {
            FolioError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, IMAGE_SLOT);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_optional_slot_resolves_to_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolved = resolve_optional(dir.path(), None, None).await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn gc_removes_only_the_replaced_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let old = dir.path().join("100_old.png");
        std::fs::write(&old, b"old").unwrap();

        gc_replaced(dir.path(), Some("100_old.png"), "200_new.png").await;
        assert!(!old.exists());

        // same reference: kept
        let kept = dir.path().join("300_kept.png");
        std::fs::write(&kept, b"kept").unwrap();
        gc_replaced(dir.path(), Some("300_kept.png"), "300_kept.png").await;
        assert!(kept.exists());
    }
}
