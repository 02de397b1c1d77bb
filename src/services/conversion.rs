use crate::config::ToolCommand;
use crate::services::diagnostics::{StderrFilter, presentable_error};
use crate::services::pipeline::PipelineError;
use crate::services::process::ProcessRunner;
use crate::services::workspace::WorkspaceScope;
use std::sync::Arc;

/// Spreadsheet extensions the converter accepts, longest first.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &[".xlsx", ".xls"];

pub fn is_spreadsheet(filename: &str) -> bool {
    SPREADSHEET_EXTENSIONS
        .iter()
        .any(|ext| filename.ends_with(ext))
}

/// Name of the XML form produced from `filename`.
///
/// Only a trailing spreadsheet extension is replaced; other names come back unchanged.
pub fn xml_filename_for(filename: &str) -> String {
    for ext in SPREADSHEET_EXTENSIONS {
        if let Some(stem) = filename.strip_suffix(ext) {
            return format!("{}.xml", stem);
        }
    }
    filename.to_string()
}

/// Turns spreadsheet forms into XML forms with the external converter
pub struct ConversionStage {
    runner: Arc<dyn ProcessRunner>,
    command: ToolCommand,
    filter: StderrFilter,
}

impl ConversionStage {
    pub fn new(runner: Arc<dyn ProcessRunner>, command: ToolCommand, filter: StderrFilter) -> Self {
        Self {
            runner,
            command,
            filter,
        }
    }

    /// Returns the name of the XML form to validate.
    pub async fn convert(
        &self,
        scope: &WorkspaceScope,
        filename: &str,
    ) -> Result<String, PipelineError> {
        if !is_spreadsheet(filename) {
            return Ok(filename.to_string());
        }

        let xml = xml_filename_for(filename);
        let input = scope.path_of(filename);
        let output = scope.path_of(&xml);

        tracing::info!("Converting {} to {}", filename, xml);
        let result = self.runner.run(&self.command, &[input.as_path(), output.as_path()]).await?;

        if let Some(stderr) = self.filter.error_text(&result.stderr) {
            let message = presentable_error(stderr);
            tracing::warn!("Conversion of {} failed: {}", filename, message);
            return Err(PipelineError::Conversion {
                message,
                stdout: result.stdout,
            });
        }

        Ok(xml)
    }
}
