//! Parenthesis cleanup pass over whole files
//!
//! Output is written to a temporary file beside the target and renamed over
//! it, so the target is either the old file or the complete new one.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use lexitag_core::{LexitagError, Record, Result};
use lexitag_extractor::cleanup::cleanup_record;
use tempfile::NamedTempFile;

/// Counters for one cleaned file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub output: PathBuf,
    /// Lines that parsed as records
    pub lines: usize,
    /// Lines copied as-is because they are not records
    pub skipped: usize,
    /// Messages whose content changed
    pub changed_messages: usize,
}

/// Where a cleaned file goes: the input itself, or the same name in `output_dir`
pub fn cleanup_target(input: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
    match output_dir {
        None => Ok(input.to_path_buf()),
        Some(dir) => {
            let name = input.file_name().ok_or_else(|| {
                LexitagError::MissingPrerequisite(format!("{} is not a file", input.display()))
            })?;
            Ok(dir.join(name))
        }
    }
}

/// Clean `input` into `output` (which may be the same path)
pub fn cleanup_file(input: &Path, output: &Path) -> Result<CleanupSummary> {
    let reader = BufReader::new(
        std::fs::File::open(input).map_err(|e| LexitagError::io(input, e))?,
    );

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| LexitagError::io(&dir, e))?;
    let temp = NamedTempFile::new_in(&dir).map_err(|e| LexitagError::io(&dir, e))?;

    let mut summary = CleanupSummary {
        output: output.to_path_buf(),
        ..CleanupSummary::default()
    };

    {
        let mut writer = BufWriter::new(temp.as_file());
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| LexitagError::io(input, e))?;

            let rewritten = match Record::parse(&line) {
                Ok(record) => {
                    summary.lines += 1;
                    let (cleaned, changed) = cleanup_record(&record);
                    summary.changed_messages += changed;
                    if changed > 0 {
                        cleaned.to_line()?
                    } else {
                        line
                    }
                }
                Err(err) => {
                    tracing::error!(line = index + 1, error = %err, "copying unparsable line");
                    summary.skipped += 1;
                    line
                }
            };

            writeln!(writer, "{rewritten}").map_err(|e| LexitagError::io(temp.path(), e))?;
        }
        writer
            .flush()
            .map_err(|e| LexitagError::io(temp.path(), e))?;
    }

    temp.persist(output)
        .map_err(|e| LexitagError::io(output, e.error))?;

    tracing::info!(
        file = %input.display(),
        lines = summary.lines,
        changed_messages = summary.changed_messages,
        "cleanup complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TAGGED: &str = r#"{"messages":[{"role":"user","content":"(<QUERY>q</QUERY>)"},{"role":"assistant","content":"see (<WORD>pei</WORD>)"}]}"#;
    const CLEAN: &str = r#"{"messages":[{"role":"user","content":"q"},{"role":"assistant","content":"a"}]}"#;

    #[test]
    fn test_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.jsonl");
        std::fs::write(&path, format!("{TAGGED}\nnot json\n{CLEAN}\n")).unwrap();

        let summary = cleanup_file(&path, &path).unwrap();

        assert_eq!(summary.lines, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.changed_messages, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(r#""content":"<QUERY>q</QUERY>""#));
        assert!(lines[0].contains(r#""content":"see <WORD>pei</WORD>""#));
        assert_eq!(lines[1], "not json");
        assert_eq!(lines[2], CLEAN);
    }

    #[test]
    fn test_output_dir_leaves_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("data.jsonl");
        std::fs::write(&input, format!("{TAGGED}\n")).unwrap();

        let out_dir = dir.path().join("cleaned");
        let target = cleanup_target(&input, Some(&out_dir)).unwrap();
        assert_eq!(target, out_dir.join("data.jsonl"));

        cleanup_file(&input, &target).unwrap();
        assert_eq!(std::fs::read_to_string(&input).unwrap(), format!("{TAGGED}\n"));
        assert!(!std::fs::read_to_string(&target).unwrap().contains("(<"));
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("none.jsonl");
        assert!(cleanup_file(&path, &path).is_err());
    }
}
