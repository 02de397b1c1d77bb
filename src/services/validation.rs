use crate::config::ToolCommand;
use crate::models::ValidatorReport;
use crate::services::diagnostics::{StderrFilter, strip_exception_prefix};
use crate::services::pipeline::PipelineError;
use crate::services::process::ProcessRunner;
use crate::services::workspace::WorkspaceScope;
use std::sync::Arc;

/// Runs the XFormTest validator against an XML form
pub struct ValidationStage {
    runner: Arc<dyn ProcessRunner>,
    command: ToolCommand,
    filter: StderrFilter,
    exception_prefix: String,
}

impl ValidationStage {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        command: ToolCommand,
        filter: StderrFilter,
        exception_prefix: String,
    ) -> Self {
        Self {
            runner,
            command,
            filter,
            exception_prefix,
        }
    }

    /// Validates `xml_filename` and empties the scope, whatever the outcome.
    pub async fn validate(
        &self,
        scope: &WorkspaceScope,
        xml_filename: &str,
    ) -> Result<ValidatorReport, PipelineError> {
        let path = scope.path_of(xml_filename);

        tracing::info!("Validating {}", xml_filename);
        let run = self.runner.run(&self.command, &[path.as_path()]).await;
        scope.clear().await;
        let output = run?;

        if let Some(stderr) = self.filter.error_text(&output.stderr) {
            let message = strip_exception_prefix(stderr, &self.exception_prefix);
            tracing::warn!("Validation of {} failed: {}", xml_filename, message);
            return Err(PipelineError::Validation {
                message,
                stdout: output.stdout,
            });
        }

        match serde_json::from_str(&output.stdout) {
            Ok(report) => Ok(report),
            Err(source) => {
                tracing::error!(
                    "Validator output for {} is not a report: {} (stdout: {:?})",
                    xml_filename,
                    source,
                    output.stdout
                );
                Err(PipelineError::MalformedToolOutput {
                    source,
                    stdout: output.stdout,
                })
            }
        }
    }
}
