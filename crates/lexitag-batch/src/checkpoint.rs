//! Resume offsets from existing output
//!
//! The number of non-blank lines already in an output file is the number of
//! input lines already processed. A trailing line without its newline was
//! interrupted mid-write; it is cut off before counting so that line is
//! redone.

use std::path::Path;

use lexitag_core::{LexitagError, Result};

/// Count finished lines in `output`, truncating a partial last line.
///
/// A missing file means nothing was processed yet.
pub async fn resume_offset(output: &Path) -> Result<usize> {
    let bytes = match tokio::fs::read(output).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(LexitagError::io(output, e)),
    };

    let complete = match bytes.iter().rposition(|&b| b == b'\n') {
        Some(last_newline) => last_newline + 1,
        None => 0,
    };

    if complete < bytes.len() {
        tracing::warn!(
            path = %output.display(),
            dropped_bytes = bytes.len() - complete,
            "truncating partial trailing line"
        );
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(output)
            .await
            .map_err(|e| LexitagError::io(output, e))?;
        file.set_len(complete as u64)
            .await
            .map_err(|e| LexitagError::io(output, e))?;
    }

    Ok(count_lines(&bytes[..complete]))
}

/// Lines holding anything besides whitespace
pub fn count_lines(bytes: &[u8]) -> usize {
    bytes
        .split(|&b| b == b'\n')
        .filter(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_count_lines_skips_blank() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"a\n\n  \nb\n"), 2);
        assert_eq!(count_lines(b"a\r\nb\r\n"), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_zero() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resume_offset(&dir.path().join("none.jsonl")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_complete_lines_counted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");
        std::fs::write(&path, "{}\n{}\n").unwrap();

        assert_eq!(resume_offset(&path).await.unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n{}\n");
    }

    #[tokio::test]
    async fn test_partial_line_truncated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");
        std::fs::write(&path, "{\"a\":1}\n{\"b\":").unwrap();

        assert_eq!(resume_offset(&path).await.unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}\n");
    }

    #[tokio::test]
    async fn test_single_partial_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");
        std::fs::write(&path, "{\"a\"").unwrap();

        assert_eq!(resume_offset(&path).await.unwrap(), 0);
        assert!(std::fs::read(&path).unwrap().is_empty());
    }
}
