//! Classification of the external tools' stderr text.
//!
//! Both tools report failure only through stderr, so everything the service tells a
//! user about a failed run is scraped from there. The rules live here, away from the
//! process plumbing, so they can be checked against fixed sample strings.

/// Marks stderr that contains a Python stack trace.
pub const STACK_TRACE_MARKER: &str = "Traceback";

/// Leading token of a stack frame line once surrounding whitespace is removed.
pub const STACK_FRAME_PREFIX: &str = "File";

/// Whether `line` is a stack frame, as opposed to a message that happens to start
/// with the same letters (`FileNotFoundError: ...`).
fn is_stack_frame(line: &str) -> bool {
    match line.trim().strip_prefix(STACK_FRAME_PREFIX) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// Decides whether a tool's stderr means the run failed.
#[derive(Debug, Clone, Default)]
pub struct StderrFilter {
    platform_warning: Option<String>,
}

impl StderrFilter {
    pub fn new(platform_warning: Option<String>) -> Self {
        Self { platform_warning }
    }

    /// Returns the error text of a run, or `None` when the tool reported nothing.
    ///
    /// Stderr consisting of exactly the platform warning counts as nothing. Any other
    /// output, whitespace included, is an error.
    pub fn error_text<'a>(&self, stderr: &'a str) -> Option<&'a str> {
        if stderr.is_empty() || self.platform_warning.as_deref() == Some(stderr) {
            None
        } else {
            Some(stderr)
        }
    }
}

/// Reduces error text to the part worth showing a user.
///
/// Text carrying a stack trace keeps only the lines after the last frame line, in
/// their original order. Anything else, or a trace with no message after its last
/// frame, is returned verbatim.
pub fn presentable_error(text: &str) -> String {
    if !text.contains(STACK_TRACE_MARKER) {
        return text.to_string();
    }

    let mut message: Vec<&str> = text
        .lines()
        .rev()
        .take_while(|line| !is_stack_frame(line))
        .collect();
    message.reverse();
    let message = message.join("\n");

    if message.trim().is_empty() {
        text.to_string()
    } else {
        message
    }
}

/// Removes every occurrence of the validator's exception prefix.
pub fn strip_exception_prefix(text: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return text.to_string();
    }
    text.replace(prefix, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WINDOWS_PLATFORM_WARNING;

    const CONVERTER_TRACE: &str = "Traceback (most recent call last):\n  File \"/usr/bin/xls2xform\", line 11, in <module>\n    sys.exit(main_cli())\n  File \"/usr/lib/python3/pyxform/xls2json.py\", line 412, in workbook_to_json\nPyXFormError: [row : 5] Question or group with no name.\nCheck the survey sheet.\n";

    #[test]
    fn test_only_empty_stderr_is_not_an_error() {
        let filter = StderrFilter::default();
        assert_eq!(filter.error_text(""), None);
        assert_eq!(filter.error_text("  \n\t"), Some("  \n\t"));
        assert_eq!(filter.error_text("bad xpath"), Some("bad xpath"));
    }

    #[test]
    fn test_platform_warning_matches_exactly() {
        let filter = StderrFilter::new(Some(WINDOWS_PLATFORM_WARNING.to_string()));
        assert_eq!(filter.error_text(WINDOWS_PLATFORM_WARNING), None);

        // Anything beyond the warning is a real error and is reported whole
        let noisy = format!("{}real problem", WINDOWS_PLATFORM_WARNING);
        assert_eq!(filter.error_text(&noisy), Some(noisy.as_str()));
    }

    #[test]
    fn test_warning_is_an_error_without_sentinel() {
        let filter = StderrFilter::new(None);
        assert_eq!(
            filter.error_text(WINDOWS_PLATFORM_WARNING),
            Some(WINDOWS_PLATFORM_WARNING)
        );
    }

    #[test]
    fn test_plain_error_is_verbatim() {
        assert_eq!(presentable_error("bad xpath"), "bad xpath");
        assert_eq!(
            presentable_error("  line one\nline two  \n"),
            "  line one\nline two  \n"
        );
    }

    #[test]
    fn test_trace_keeps_trailing_message_lines() {
        assert_eq!(
            presentable_error(CONVERTER_TRACE),
            "PyXFormError: [row : 5] Question or group with no name.\nCheck the survey sheet."
        );
    }

    #[test]
    fn test_trace_with_single_message_line() {
        let text = "Traceback (most recent call last):\r\n  File \"x.py\", line 1\r\nValueError: nope\r\n";
        assert_eq!(presentable_error(text), "ValueError: nope");
    }

    #[test]
    fn test_trace_ending_in_frame_falls_back_to_whole_text() {
        let text = "Traceback (most recent call last):\n  File \"x.py\", line 1";
        assert_eq!(presentable_error(text), text);
    }

    #[test]
    fn test_message_starting_with_file_is_not_a_frame() {
        let text = "Traceback (most recent call last):\n  File \"/usr/bin/xls2xform\", line 11, in <module>\n    sys.exit(main_cli())\n  File \"/usr/lib/python3/pyxform/xls2xform.py\", line 40, in xls2xform_convert\nFileNotFoundError: [Errno 2] No such file or directory: 'temp/survey.xls'\n";
        assert_eq!(
            presentable_error(text),
            "FileNotFoundError: [Errno 2] No such file or directory: 'temp/survey.xls'"
        );
    }

    #[test]
    fn test_bare_frame_token_is_a_frame() {
        assert!(is_stack_frame("  File \"x.py\", line 1"));
        assert!(is_stack_frame("File"));
        assert!(!is_stack_frame("FileExistsError: exists"));
        assert!(!is_stack_frame("Filename too long"));
    }

    #[test]
    fn test_strip_exception_prefix() {
        let stderr = "Exception in thread \"main\" org.pma2020.xform_test.XFormTestException: Assertion failed";
        assert_eq!(
            strip_exception_prefix(stderr, crate::config::VALIDATOR_EXCEPTION_PREFIX),
            "XFormTestException: Assertion failed"
        );
        assert_eq!(strip_exception_prefix("bad xpath", ""), "bad xpath");
    }
}
