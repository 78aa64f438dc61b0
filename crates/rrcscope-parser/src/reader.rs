//! Trace file reading.
//!
//! Capture tools occasionally write stray non-UTF-8 bytes into free-text
//! fields, so files are decoded lossily rather than rejected.

use std::path::Path;

use rrcscope_core::prelude::*;

/// Read a trace file into lines
///
/// Invalid UTF-8 sequences become `U+FFFD`; both `\n` and `\r\n` endings are
/// accepted.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read trace file {}", path.display()))?;
    let lines = decode_lines(&bytes);
    debug!("Read {} lines from {}", lines.len(), path.display());
    Ok(lines)
}

/// Decode raw bytes into owned lines
pub fn decode_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_decode_crlf_and_lf() {
        let lines = decode_lines(b"first\r\nsecond\nthird");
        assert_eq!(lines, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let lines = decode_lines(b"Freq = 5230\nbad \xff\xfe byte\n");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("bad "));
        assert!(lines[1].contains('\u{FFFD}'));
    }

    #[test]
    fn test_read_lines_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "%header\r\n\r\n2025 Dec 17  20:34:04.165  [A0]  0xB0C0  X\r\n").unwrap();

        let lines = read_lines(file.path()).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "%header");
        assert!(lines[1].is_empty());
        assert!(!lines[2].ends_with('\r'));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_lines(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_fatal());
    }
}
