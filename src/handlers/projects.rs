use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::info;

use crate::error::FolioError;
use crate::handlers::{ApiMessage, ApiResults, ListQuery, parse_id, require_param};
use crate::middleware::record_form::RecordForm;
use crate::router::AppState;
use crate::uploads::{self, IMAGE_SLOT, PDF_SLOT};
use crate::validation::{self, SchemaKind};

/// GET /api/projects/delete carries the table under `type`.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(rename = "type")]
    pub table: Option<String>,
    pub id: Option<String>,
}

/// POST /api/projects -> insert a project record; `image` is required,
/// `pdfFile` optional.
pub async fn create_project_handler(
    State(state): State<AppState>,
    form: RecordForm,
) -> Result<Json<ApiMessage>, FolioError> {
    validation::validate(SchemaKind::ProjectCreate, &form.fields)
        .map_err(FolioError::Validation)?;
    let table = form.field("table").unwrap_or_default();

    let image = uploads::resolve_required(
        &state.config.upload_dir,
        IMAGE_SLOT,
        form.field(IMAGE_SLOT),
        form.files.get(IMAGE_SLOT),
    )
    .await?;
    let pdf = uploads::resolve_optional(
        &state.config.upload_dir,
        form.field(PDF_SLOT),
        form.files.get(PDF_SLOT),
    )
    .await?;

    state
        .store
        .create(table, &project_fields(&form, image, pdf))
        .await?;
    info!(table = %table, "project record created");
    Ok(Json(ApiMessage::success("Project created successfully")))
}

/// POST /api/edit/projects -> update the record matching `id`; both slots
/// accept a fresh upload or a retained reference string.
pub async fn edit_project_handler(
    State(state): State<AppState>,
    form: RecordForm,
) -> Result<Json<ApiMessage>, FolioError> {
    validation::validate(SchemaKind::ProjectEdit, &form.fields).map_err(FolioError::Validation)?;
    let table = form.field("table").unwrap_or_default();
    let id = parse_id(form.field("id"))?;

    // Old references are only needed for cleanup when fresh uploads replace
    // them; fetching first also keeps a missing row from orphaning the new
    // files on disk.
    let (previous_image, previous_pdf) = if form.files.is_empty() {
        (None, None)
    } else {
        let record = state.store.get(table, id).await?;
        (
            record
                .get(IMAGE_SLOT)
                .and_then(|v| v.as_str())
                .map(str::to_string),
            record
                .get(PDF_SLOT)
                .and_then(|v| v.as_str())
                .map(str::to_string),
        )
    };

    let image = uploads::resolve_required(
        &state.config.upload_dir,
        IMAGE_SLOT,
        form.field(IMAGE_SLOT),
        form.files.get(IMAGE_SLOT),
    )
    .await?;
    let pdf = uploads::resolve_optional(
        &state.config.upload_dir,
        form.field(PDF_SLOT),
        form.files.get(PDF_SLOT),
    )
    .await?;

    state
        .store
        .update(table, &project_fields(&form, image.clone(), pdf.clone()), id)
        .await?;

    uploads::gc_replaced(&state.config.upload_dir, previous_image.as_deref(), &image).await;
    if let Some(pdf) = &pdf {
        uploads::gc_replaced(&state.config.upload_dir, previous_pdf.as_deref(), pdf).await;
    }

    info!(table = %table, id, "project record updated");
    Ok(Json(ApiMessage::success("Project updated successfully")))
}

/// GET /api/projects?db=<table> -> every record in the table.
pub async fn list_projects_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResults>, FolioError> {
    let table = require_param(query.db.as_deref(), "db")?;
    let results = state.store.list(table).await?;
    Ok(Json(ApiResults::success(results)))
}

/// GET /api/edit/projects?db=<table>&id=<id> -> single-record result set.
pub async fn get_project_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResults>, FolioError> {
    let table = require_param(query.db.as_deref(), "db")?;
    let id = parse_id(query.id.as_deref())?;
    let record = state.store.get(table, id).await?;
    Ok(Json(ApiResults::success(vec![record])))
}

/// GET /api/projects/delete?type=<table>&id=<id> -> remove one record.
pub async fn delete_project_handler(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ApiMessage>, FolioError> {
    let table = require_param(query.table.as_deref(), "type")?;
    let id = parse_id(query.id.as_deref())?;
    state.store.delete(table, id).await?;
    info!(table = %table, id, "project record deleted");
    Ok(Json(ApiMessage::success("Project deleted successfully")))
}

fn project_fields(
    form: &RecordForm,
    image: String,
    pdf: Option<String>,
) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("title", form.field("title").unwrap_or_default().to_string()),
        (
            "content",
            form.field("content").unwrap_or_default().to_string(),
        ),
        ("link", form.field("link").unwrap_or_default().to_string()),
        ("image", image),
    ];
    if let Some(pdf) = pdf {
        fields.push(("pdfFile", pdf));
    }
    fields
}
