//! Line-range extraction and patching.
//!
//! Both operations are 1-indexed and inclusive on both ends, and both
//! validate the range the same way before touching anything. `replace`
//! rewrites the whole file; there is no atomicity guarantee beyond that.

use std::path::Path;

use crate::error::{CallscopeError, Result};

/// Return the requested line range as text, preserving the original
/// line terminators.
///
/// A file that cannot be read degrades to error text rather than
/// failing; only the range conditions are hard errors.
pub fn extract<P: AsRef<Path>>(path: P, start_line: usize, end_line: usize) -> Result<String> {
    let content = match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => content,
        Err(e) => return Ok(format!("Error: {}", e)),
    };
    let lines: Vec<&str> = content.split_inclusive('\n').collect();

    check_range(start_line, end_line, lines.len())?;

    Ok(lines[start_line - 1..end_line].concat())
}

/// Replace the requested line range with `new_text`, split into lines
/// and each forced to end with a line terminator, then write the whole
/// file back.
pub fn replace<P: AsRef<Path>>(
    path: P,
    start_line: usize,
    end_line: usize,
    new_text: &str,
) -> Result<()> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();

    check_range(start_line, end_line, lines.len())?;

    let mut patched = String::new();
    for line in &lines[..start_line - 1] {
        patched.push_str(line);
        patched.push('\n');
    }
    for line in new_text.lines() {
        patched.push_str(line);
        patched.push('\n');
    }
    for line in &lines[end_line..] {
        patched.push_str(line);
        patched.push('\n');
    }

    std::fs::write(path, patched)?;
    Ok(())
}

fn check_range(start: usize, end: usize, total: usize) -> Result<()> {
    let reason = if start < 1 {
        "start line must be at least 1".to_string()
    } else if end > total {
        format!("end line exceeds file length {}", total)
    } else if start > end {
        "start line is after end line".to_string()
    } else {
        return Ok(());
    };

    Err(CallscopeError::InvalidRange { start, end, reason })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn five_line_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "one\ntwo\nthree\nfour\nfive\n").unwrap();
        file
    }

    #[test]
    fn test_extract_middle_range() {
        let file = five_line_file();
        let snippet = extract(file.path(), 2, 4).unwrap();
        assert_eq!(snippet, "two\nthree\nfour\n");
    }

    #[test]
    fn test_extract_single_line() {
        let file = five_line_file();
        assert_eq!(extract(file.path(), 5, 5).unwrap(), "five\n");
    }

    #[test]
    fn test_extract_zero_start_rejected() {
        let file = five_line_file();
        let result = extract(file.path(), 0, 4);
        assert!(matches!(result, Err(CallscopeError::InvalidRange { .. })));
    }

    #[test]
    fn test_extract_past_end_rejected() {
        let file = five_line_file();
        let result = extract(file.path(), 2, 9);
        assert!(matches!(result, Err(CallscopeError::InvalidRange { .. })));
    }

    #[test]
    fn test_extract_inverted_range_rejected() {
        let file = five_line_file();
        let result = extract(file.path(), 4, 2);
        assert!(matches!(result, Err(CallscopeError::InvalidRange { .. })));
    }

    #[test]
    fn test_extract_missing_file_degrades_to_error_text() {
        let text = extract("/nonexistent/void.py", 1, 1).unwrap();
        assert!(text.starts_with("Error: "));
    }

    #[test]
    fn test_replace_swaps_range() {
        let file = five_line_file();
        replace(file.path(), 2, 4, "TWO\nTHREE").unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "one\nTWO\nTHREE\nfive\n");
    }

    #[test]
    fn test_replace_forces_line_terminators() {
        let file = five_line_file();
        // no trailing newline on the replacement text
        replace(file.path(), 5, 5, "FIVE").unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "one\ntwo\nthree\nfour\nFIVE\n");
    }

    #[test]
    fn test_replace_validates_range() {
        let file = five_line_file();
        let result = replace(file.path(), 0, 2, "nope");
        assert!(matches!(result, Err(CallscopeError::InvalidRange { .. })));
    }
}
