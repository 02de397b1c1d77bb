use crate::services::pipeline::PipelineError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub const NO_FILE_MESSAGE: &str = "No file was passed.";
pub const MULTIPLE_FILES_MESSAGE: &str = "Only one file can be uploaded at a time.";
const UNEXPECTED_PREFIX: &str = "An unexpected error occurred:\n\n";

/// Every way a form request can end without a validator report.
///
/// The web front end reads the `error` field rather than the status code, so every
/// variant is answered with `200 OK`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    UserInput(&'static str),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn no_file() -> Self {
        AppError::UserInput(NO_FILE_MESSAGE)
    }

    pub fn multiple_files() -> Self {
        AppError::UserInput(MULTIPLE_FILES_MESSAGE)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self {
            AppError::UserInput(msg) => {
                tracing::info!("Rejected request: {}", msg);
                json!({ "error": msg })
            }
            AppError::Pipeline(e) => {
                match &e {
                    PipelineError::Conversion { .. } | PipelineError::Validation { .. } => {
                        tracing::info!("Form rejected: {}", e)
                    }
                    PipelineError::ToolTimeout { .. } => tracing::error!("Tool hang: {}", e),
                    PipelineError::MalformedToolOutput { .. } => {
                        tracing::error!("Malformed validator output: {:?}", e)
                    }
                    PipelineError::Process(inner) => tracing::error!("Process error: {:?}", inner),
                }
                json!(e.to_result())
            }
            AppError::Multipart(e) => {
                tracing::error!("Multipart error: {:?}", e);
                json!({ "error": format!("{}{}", UNEXPECTED_PREFIX, e) })
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                json!({ "error": format!("{}{:#}", UNEXPECTED_PREFIX, e) })
            }
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_user_input_errors() {
        let (status, body) = body_of(AppError::no_file()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "No file was passed."}));

        let (_, body) = body_of(AppError::multiple_files()).await;
        assert_eq!(body, json!({"error": "Only one file can be uploaded at a time."}));
    }

    #[tokio::test]
    async fn test_validation_error_envelope() {
        let err = AppError::from(PipelineError::Validation {
            message: "bad xpath".to_string(),
            stdout: String::new(),
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "bad xpath"}));
    }

    #[tokio::test]
    async fn test_unexpected_error_includes_details() {
        let err = AppError::from(anyhow::anyhow!("disk full").context("Failed to write form.xls"));
        let (_, body) = body_of(err).await;
        assert_eq!(
            body["error"],
            "An unexpected error occurred:\n\nFailed to write form.xls: disk full"
        );
    }
}
