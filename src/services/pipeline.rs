use crate::config::AppConfig;
use crate::models::PipelineResult;
use crate::services::conversion::ConversionStage;
use crate::services::diagnostics::StderrFilter;
use crate::services::process::{ProcessError, ProcessRunner};
use crate::services::validation::ValidationStage;
use crate::services::workspace::WorkspaceScope;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{message}")]
    Conversion { message: String, stdout: String },

    #[error("{message}")]
    Validation { message: String, stdout: String },

    #[error("The validator returned output that could not be read:\n\n{source}")]
    MalformedToolOutput {
        #[source]
        source: serde_json::Error,
        stdout: String,
    },

    #[error("{program} did not finish within {} seconds.", .timeout.as_secs())]
    ToolTimeout { program: String, timeout: Duration },

    #[error("An unexpected error occurred:\n\n{0}")]
    Process(ProcessError),
}

impl From<ProcessError> for PipelineError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Timeout { program, timeout } => Self::ToolTimeout { program, timeout },
            other => Self::Process(other),
        }
    }
}

impl PipelineError {
    /// The failure envelope reported to the caller for this error.
    pub fn to_result(&self) -> PipelineResult {
        match self {
            Self::Conversion { message, stdout } | Self::Validation { message, stdout } => {
                PipelineResult::failure(message.clone(), stdout)
            }
            Self::MalformedToolOutput { stdout, .. } => {
                PipelineResult::failure(self.to_string(), stdout)
            }
            Self::ToolTimeout { .. } | Self::Process(_) => PipelineResult::failure(self.to_string(), ""),
        }
    }
}

/// Converts a spreadsheet form to XML when needed, then validates the XML.
pub struct XFormPipeline {
    conversion: ConversionStage,
    validation: ValidationStage,
}

impl XFormPipeline {
    pub fn new(conversion: ConversionStage, validation: ValidationStage) -> Self {
        Self {
            conversion,
            validation,
        }
    }

    pub fn from_config(runner: Arc<dyn ProcessRunner>, config: &AppConfig) -> Self {
        let filter = StderrFilter::new(config.platform_warning.clone());
        Self::new(
            ConversionStage::new(runner.clone(), config.converter.clone(), filter.clone()),
            ValidationStage::new(
                runner,
                config.validator.clone(),
                filter,
                config.validator_error_prefix.clone(),
            ),
        )
    }

    /// Runs both stages for `filename` inside `scope`.
    ///
    /// The scope is empty when this returns, whichever stage failed.
    pub async fn run(
        &self,
        scope: &WorkspaceScope,
        filename: &str,
    ) -> Result<PipelineResult, PipelineError> {
        let xml = match self.conversion.convert(scope, filename).await {
            Ok(xml) => xml,
            Err(e) => {
                scope.clear().await;
                return Err(e);
            }
        };

        let report = self.validation.validate(scope, &xml).await?;
        tracing::info!(
            "{} passed validation with {} warnings",
            filename,
            report.warnings_msg.len()
        );
        Ok(PipelineResult::from(report))
    }
}
