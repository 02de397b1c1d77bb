use anyhow::{Result, anyhow};

/// Path browsers request on their own; never a form.
pub const FAVICON_PATH: &str = "favicon.ico";

/// Longest sanitized filename, in bytes
pub const MAX_FILENAME_LEN: usize = 255;

/// Longest extension, dot included, kept intact when a name is shortened.
pub const MAX_EXTENSION_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        }));
    }
    Ok(())
}

/// True when a request names no form: an empty name or the browser's favicon request.
pub fn is_missing_form_name(filename: &str) -> bool {
    let name = filename.trim();
    name.is_empty() || name == FAVICON_PATH
}

/// Sanitizes a client-supplied filename so it can be joined onto the workspace path.
///
/// Directory components (either separator style) are dropped, characters that are
/// unsafe in a path or a shell argument become `_`, and leading dots are stripped so
/// the result can never name a parent directory or a hidden file.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from filename: {}", filename);
    }

    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c.is_whitespace()
                || matches!(
                    c,
                    ':' | '*' | '?' | '"' | '\'' | '<' | '>' | '|' | ';' | '&' | '$' | '`'
                )
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("'{}' is not a usable filename", filename),
        }));
    }

    if sanitized.len() <= MAX_FILENAME_LEN {
        return Ok(sanitized.to_string());
    }

    // Shorten the stem, keeping a short extension so the form type survives
    let (stem, ext) = match sanitized.rfind('.') {
        Some(dot) if dot > 0 && sanitized.len() - dot <= MAX_EXTENSION_LEN => sanitized.split_at(dot),
        _ => (sanitized, ""),
    };
    let mut end = MAX_FILENAME_LEN - ext.len();
    while !stem.is_char_boundary(end) {
        end -= 1;
    }

    Ok(format!("{}{}", &stem[..end], ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, 2048).is_ok());
        assert!(validate_file_size(2048, 2048).is_ok());
        assert!(validate_file_size(2049, 2048).is_err());
    }

    #[test]
    fn test_missing_form_name() {
        assert!(is_missing_form_name(""));
        assert!(is_missing_form_name("  "));
        assert!(is_missing_form_name("favicon.ico"));
        assert!(!is_missing_form_name("survey.xlsx"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("survey.xlsx").unwrap(), "survey.xlsx");
        assert_eq!(sanitize_filename("my survey v2.xls").unwrap(), "my_survey_v2.xls");
        assert_eq!(sanitize_filename("form<1>.xml").unwrap(), "form_1_.xml");
        assert_eq!(sanitize_filename("a;rm -rf.xls").unwrap(), "a_rm_-rf.xls");
        assert_eq!(sanitize_filename("調査.xlsx").unwrap(), "調査.xlsx");
    }

    #[test]
    fn test_long_names_keep_their_extension() {
        let long = format!("{}.xlsx", "a".repeat(300));
        let sanitized = sanitize_filename(&long).unwrap();
        assert_eq!(sanitized.len(), MAX_FILENAME_LEN);
        assert!(sanitized.ends_with(".xlsx"));

        let wide = format!("{}.xls", "調".repeat(100));
        let sanitized = sanitize_filename(&wide).unwrap();
        assert!(sanitized.len() <= MAX_FILENAME_LEN);
        assert!(sanitized.ends_with(".xls"));

        let no_ext = "b".repeat(300);
        assert_eq!(sanitize_filename(&no_ext).unwrap().len(), MAX_FILENAME_LEN);
    }

    #[test]
    fn test_sanitize_strips_paths() {
        assert_eq!(sanitize_filename("../../../etc/passwd").unwrap(), "passwd");
        assert_eq!(
            sanitize_filename("..\\..\\windows\\form.xls").unwrap(),
            "form.xls"
        );
        assert_eq!(sanitize_filename("C:\\Users\\me\\survey.xlsx").unwrap(), "survey.xlsx");
    }

    #[test]
    fn test_sanitize_rejects_unusable_names() {
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("uploads/").is_err());
        assert_eq!(sanitize_filename(".hidden.xml").unwrap(), "hidden.xml");
    }

    #[test]
    fn test_sanitize_limits_length() {
        let long = format!("{}.xlsx", "é".repeat(200));
        let sanitized = sanitize_filename(&long).unwrap();
        assert!(sanitized.len() <= MAX_FILENAME_LEN);
        assert!(sanitized.starts_with('é'));
    }
}
