use axum::{
    Json,
    extract::{Query, State},
};
use tracing::info;

use crate::error::FolioError;
use crate::handlers::{ApiMessage, ApiResults, ListQuery, parse_id, require_param};
use crate::middleware::record_form::RecordForm;
use crate::router::AppState;
use crate::uploads::{self, IMAGE_SLOT};
use crate::validation::{self, SchemaKind};

/// POST /api/apps -> insert a new app record into the named table.
pub async fn create_app_handler(
    State(state): State<AppState>,
    form: RecordForm,
) -> Result<Json<ApiMessage>, FolioError> {
    validation::validate(SchemaKind::AppCreate, &form.fields).map_err(FolioError::Validation)?;
    let table = form.field("table").unwrap_or_default();

    let image = uploads::resolve_required(
        &state.config.upload_dir,
        IMAGE_SLOT,
        form.field(IMAGE_SLOT),
        form.files.get(IMAGE_SLOT),
    )
    .await?;

    state.store.create(table, &app_fields(&form, image)).await?;
    info!(table = %table, "app record created");
    Ok(Json(ApiMessage::success("App created successfully")))
}

/// POST /api/edit/apps -> update the record matching `id`; `image` is a
/// fresh upload or the retained reference string.
pub async fn edit_app_handler(
    State(state): State<AppState>,
    form: RecordForm,
) -> Result<Json<ApiMessage>, FolioError> {
    validation::validate(SchemaKind::AppEdit, &form.fields).map_err(FolioError::Validation)?;
    let table = form.field("table").unwrap_or_default();
    let id = parse_id(form.field("id"))?;

    // The current row is only needed when a fresh upload replaces the
    // attachment: its old reference feeds the cleanup below, and a missing
    // row is caught before the new file lands on disk.
    let previous_image = if form.files.contains_key(IMAGE_SLOT) {
        let record = state.store.get(table, id).await?;
        record
            .get(IMAGE_SLOT)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    } else {
        None
    };

    let image = uploads::resolve_required(
        &state.config.upload_dir,
        IMAGE_SLOT,
        form.field(IMAGE_SLOT),
        form.files.get(IMAGE_SLOT),
    )
    .await?;

    state
        .store
        .update(table, &app_fields(&form, image.clone()), id)
        .await?;
    uploads::gc_replaced(&state.config.upload_dir, previous_image.as_deref(), &image).await;

    info!(table = %table, id, "app record updated");
    Ok(Json(ApiMessage::success("App updated successfully")))
}

/// GET /api/apps?db=<table> -> every record in the table.
pub async fn list_apps_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResults>, FolioError> {
    let table = require_param(query.db.as_deref(), "db")?;
    let results = state.store.list(table).await?;
    Ok(Json(ApiResults::success(results)))
}

/// GET /api/edit/apps?db=<table>&id=<id> -> single-record result set.
pub async fn get_app_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResults>, FolioError> {
    let table = require_param(query.db.as_deref(), "db")?;
    let id = parse_id(query.id.as_deref())?;
    let record = state.store.get(table, id).await?;
    Ok(Json(ApiResults::success(vec![record])))
}

fn app_fields(form: &RecordForm, image: String) -> Vec<(&'static str, String)> {
    vec![
        ("title", form.field("title").unwrap_or_default().to_string()),
        (
            "content",
            form.field("content").unwrap_or_default().to_string(),
        ),
        ("link", form.field("link").unwrap_or_default().to_string()),
        (
            "category",
            form.field("category").unwrap_or_default().to_string(),
        ),
        ("image", image),
    ]
}
