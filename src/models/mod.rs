use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use utoipa::ToSchema;

/// A form received by the upload endpoint, after it has been written to the workspace.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub sanitized_name: String,
    pub stored_path: PathBuf,
}

/// What the validator prints on stdout when it accepts a form
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidatorReport {
    #[serde(rename = "successMsg")]
    pub success_msg: String,
    #[serde(rename = "warningsMsg")]
    pub warnings_msg: Vec<String>,
}

/// Outcome of converting and validating one form.
///
/// Serializes to the envelope the web front end expects:
/// `{"success", "warnings", "error": ""}` or `{"error", "stdout"?}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    Success {
        message: String,
        warnings: Vec<String>,
    },
    Failure {
        error: String,
        stdout: Option<String>,
    },
}

impl PipelineResult {
    pub fn success(message: impl Into<String>, warnings: Vec<String>) -> Self {
        Self::Success {
            message: message.into(),
            warnings,
        }
    }

    /// A failed run. Blank tool output is not worth attaching.
    pub fn failure(error: impl Into<String>, stdout: &str) -> Self {
        Self::Failure {
            error: error.into(),
            stdout: (!stdout.trim().is_empty()).then(|| stdout.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

impl From<ValidatorReport> for PipelineResult {
    fn from(report: ValidatorReport) -> Self {
        Self::success(report.success_msg, report.warnings_msg)
    }
}

impl Serialize for PipelineResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success { message, warnings } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", message)?;
                map.serialize_entry("warnings", warnings)?;
                map.serialize_entry("error", "")?;
                map.end()
            }
            Self::Failure { error, stdout } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("error", error)?;
                if let Some(stdout) = stdout {
                    map.serialize_entry("stdout", stdout)?;
                }
                map.end()
            }
        }
    }
}

/// Documented shape of every response from the form endpoints
#[derive(Serialize, ToSchema)]
pub struct PipelineResponse {
    /// Validator's success message
    pub success: Option<String>,
    /// Validator warnings, present on success
    pub warnings: Option<Vec<String>>,
    /// Empty on success, otherwise the reason the form was rejected
    pub error: String,
    /// Raw tool output attached to some failures
    pub stdout: Option<String>,
}
