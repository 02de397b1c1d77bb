use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::request_id::RequestId;
use crate::models::{PipelineResponse, PipelineResult, UploadedFile};
use crate::services::workspace::WorkspaceScope;
use crate::utils::validation::{is_missing_form_name, sanitize_filename, validate_file_size};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use bytes::Bytes;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart body accepted by `/upload`
#[derive(Serialize, ToSchema)]
pub struct UploadForm {
    /// The XLS, XLSX or XML form definition
    #[schema(format = Binary)]
    pub file: String,
}

struct FilePart {
    original_name: String,
    content: Bytes,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Validator report, or an error field describing why the form was rejected", body = PipelineResponse)
    ),
    tag = "xform"
)]
pub async fn upload_form(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<PipelineResult>, AppError> {
    let mut part: Option<FilePart> = None;

    // Read every field before writing anything so rejected requests leave no trace
    while let Some(field) = multipart.next_field().await? {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content = field.bytes().await?;

        // Browsers send an unnamed, empty part for a file input left blank
        if original_name.trim().is_empty() && content.is_empty() {
            continue;
        }
        if part.is_some() {
            return Err(AppError::multiple_files());
        }
        part = Some(FilePart {
            original_name,
            content,
        });
    }

    let part = part.ok_or_else(AppError::no_file)?;
    validate_file_size(part.content.len(), state.config.max_file_size)?;
    let sanitized_name = sanitize_filename(&part.original_name)?;

    let run_id = Uuid::new_v4();
    let scope = state.workspace.for_upload(run_id);
    let stored_path = match scope.store(&sanitized_name, &part.content).await {
        Ok(path) => path,
        Err(e) => {
            scope.clear().await;
            return Err(e.into());
        }
    };

    let upload = UploadedFile {
        original_name: part.original_name,
        sanitized_name,
        stored_path,
    };
    tracing::info!(
        "Request {}: stored upload '{}' at {} ({} bytes)",
        request_id,
        upload.original_name,
        upload.stored_path.display(),
        part.content.len()
    );

    run_pipeline(&state, &scope, &upload.sanitized_name).await
}

/// `GET /` names no form.
pub async fn missing_form() -> Result<Json<PipelineResult>, AppError> {
    Err(AppError::no_file())
}

#[utoipa::path(
    get,
    path = "/xform_test/{filename}",
    params(
        ("filename" = String, Path, description = "Form already present in the workspace directory")
    ),
    responses(
        (status = 200, description = "Validator report, or an error field describing why the form was rejected", body = PipelineResponse)
    ),
    tag = "xform"
)]
pub async fn xform_test(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<PipelineResult>, AppError> {
    if is_missing_form_name(&filename) {
        return Err(AppError::no_file());
    }
    let filename = sanitize_filename(&filename)?;
    run_pipeline(&state, &state.workspace.shared(), &filename).await
}

async fn run_pipeline(
    state: &AppState,
    scope: &WorkspaceScope,
    filename: &str,
) -> Result<Json<PipelineResult>, AppError> {
    let result = state.pipeline.run(scope, filename).await?;
    Ok(Json(result))
}
