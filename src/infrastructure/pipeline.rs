use crate::config::AppConfig;
use crate::services::pipeline::XFormPipeline;
use crate::services::process::SystemProcessRunner;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub fn setup_pipeline(config: &AppConfig) -> Arc<XFormPipeline> {
    let runner = Arc::new(SystemProcessRunner::new(Duration::from_secs(
        config.tool_timeout_secs,
    )));

    info!("🔁 Converter: {}", config.converter);
    info!("🧪 Validator: {}", config.validator);

    // The jar is the one tool argument we can check before the first request
    for jar in config.validator.args.iter().filter(|a| a.ends_with(".jar")) {
        if !Path::new(jar).is_file() {
            tracing::warn!(
                "⚠️  Validator jar {} not found! Every validation will fail until it is installed.",
                jar
            );
        }
    }

    if let Some(sentinel) = &config.platform_warning {
        tracing::debug!("Ignoring platform warning on stderr: {:?}", sentinel);
    }

    Arc::new(XFormPipeline::from_config(runner, config))
}
