use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Harmless diagnostic that the converter prints on every invocation under Windows.
pub const WINDOWS_PLATFORM_WARNING: &str = "The system cannot find the path specified.\r\n";

/// Prefix the validator's JVM puts in front of every exception it reports.
pub const VALIDATOR_EXCEPTION_PREFIX: &str = "Exception in thread \"main\" org.pma2020.xform_test.";

/// Directory searched for the validator jar when none is configured.
pub const VALIDATOR_JAR_DIR: &str = "bin/xform-test";

/// An external command line: the program plus the arguments that always precede
/// the per-invocation file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Splits a whitespace separated command line. Blank input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runtime configuration for the conversion/validation service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum upload size in bytes (default: 64 MB)
    pub max_file_size: usize,

    /// Scratch directory for uploaded and converted forms (default: "temp")
    pub workspace_dir: PathBuf,

    /// Spreadsheet to XML converter (default: "xls2xform")
    pub converter: ToolCommand,

    /// Form validator (default: "java -jar bin/xform-test/<first jar>")
    pub validator: ToolCommand,

    /// Upper bound for a single external tool run, in seconds (default: 120)
    pub tool_timeout_secs: u64,

    /// Stderr text treated as "no error" when it is the tool's entire output
    pub platform_warning: Option<String>,

    /// Prefix stripped from the validator's error text
    pub validator_error_prefix: String,

    /// Allowed CORS origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: 64 * 1024 * 1024, // 64 MB
            workspace_dir: PathBuf::from("temp"),
            converter: ToolCommand::new("xls2xform", &[]),
            validator: default_validator(Path::new(VALIDATOR_JAR_DIR)),
            tool_timeout_secs: 120,
            platform_warning: default_platform_warning(),
            validator_error_prefix: VALIDATOR_EXCEPTION_PREFIX.to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let validator = match env::var("VALIDATOR_COMMAND").ok().and_then(|v| ToolCommand::parse(&v)) {
            Some(command) => command,
            None => match env::var("XFORM_TEST_JAR") {
                Ok(jar) if !jar.trim().is_empty() => {
                    ToolCommand::new("java", &["-jar", jar.trim()])
                }
                _ => default.validator,
            },
        };

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            workspace_dir: env::var("WORKSPACE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.workspace_dir),

            converter: env::var("CONVERTER_COMMAND")
                .ok()
                .and_then(|v| ToolCommand::parse(&v))
                .unwrap_or(default.converter),

            validator,

            tool_timeout_secs: env::var("TOOL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(default.tool_timeout_secs),

            // An explicitly empty value disables sentinel filtering
            platform_warning: match env::var("PLATFORM_WARNING_SENTINEL") {
                Ok(v) if v.is_empty() => None,
                Ok(v) => Some(v),
                Err(_) => default.platform_warning,
            },

            validator_error_prefix: default.validator_error_prefix,

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for local development (short tool timeout, local workspace)
    pub fn development() -> Self {
        Self {
            tool_timeout_secs: 30,
            workspace_dir: PathBuf::from("temp"),
            ..Self::default()
        }
    }
}

fn default_platform_warning() -> Option<String> {
    if cfg!(windows) {
        Some(WINDOWS_PLATFORM_WARNING.to_string())
    } else {
        None
    }
}

fn default_validator(jar_dir: &Path) -> ToolCommand {
    let jar = find_validator_jar(jar_dir)
        .unwrap_or_else(|| jar_dir.join("xform-test.jar"))
        .to_string_lossy()
        .into_owned();
    ToolCommand::new("java", &["-jar", &jar])
}

/// Returns the first `*.jar` in `dir` by name, if any.
pub fn find_validator_jar(dir: &Path) -> Option<PathBuf> {
    let mut jars: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "jar"))
        .collect();
    jars.sort();
    jars.into_iter().next()
}
