//! Which files a run processes

use std::path::{Path, PathBuf};

use lexitag_core::{LexitagError, Result};

/// One input file and where its output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl FileJob {
    fn new(input_dir: &Path, output_dir: &Path, name: &str) -> Self {
        Self {
            input: input_dir.join(name),
            output: output_dir.join(name),
        }
    }
}

/// Check that the input directory exists.
///
/// A missing directory is created so the operator can populate it, and the
/// run stops with [`LexitagError::MissingPrerequisite`].
pub fn ensure_input_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| LexitagError::io(dir, e))?;
    tracing::info!(dir = %dir.display(), "created input directory");
    Err(LexitagError::MissingPrerequisite(format!(
        "input directory {} did not exist; it has been created, place the JSONL files there and run again",
        dir.display()
    )))
}

/// Fixed list of files; the ones missing from `input_dir` are skipped
pub fn fixed_files(input_dir: &Path, output_dir: &Path, names: &[String]) -> Vec<FileJob> {
    names
        .iter()
        .map(|name| FileJob::new(input_dir, output_dir, name))
        .filter(|job| {
            let present = job.input.is_file();
            if !present {
                tracing::warn!(file = %job.input.display(), "input file not found, skipping");
            }
            present
        })
        .collect()
}

/// Every `.jsonl` file of `input_dir`, sorted by name.
///
/// When `requested` is non-empty only those base names are kept; the
/// `.jsonl` extension is optional in a request.
pub fn scan_dir(input_dir: &Path, output_dir: &Path, requested: &[String]) -> Result<Vec<FileJob>> {
    let entries = std::fs::read_dir(input_dir).map_err(|e| LexitagError::io(input_dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LexitagError::io(input_dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    if !requested.is_empty() {
        let wanted: Vec<String> = requested
            .iter()
            .map(|r| {
                if r.ends_with(".jsonl") {
                    r.clone()
                } else {
                    format!("{r}.jsonl")
                }
            })
            .collect();

        for name in &wanted {
            if !names.contains(name) {
                tracing::warn!(file = %name, "requested file not found");
            }
        }
        names.retain(|name| wanted.contains(name));
    }

    Ok(names
        .iter()
        .map(|name| FileJob::new(input_dir, output_dir, name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_input_dir_created() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input").join("add_special_token");

        let err = ensure_input_dir(&input).unwrap_err();
        assert!(matches!(err, LexitagError::MissingPrerequisite(_)));
        assert!(input.is_dir());
        assert!(ensure_input_dir(&input).is_ok());
    }

    #[test]
    fn test_fixed_files_skip_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("grammar.jsonl"), "").unwrap();

        let names = vec!["translations.jsonl".to_string(), "grammar.jsonl".to_string()];
        let jobs = fixed_files(dir.path(), Path::new("out"), &names);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].output, Path::new("out").join("grammar.jsonl"));
    }

    #[test]
    fn test_scan_dir_filters() {
        let dir = TempDir::new().unwrap();
        for name in ["b.jsonl", "a.jsonl", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let out = dir.path().join("out");

        let all = scan_dir(dir.path(), &out, &[]).unwrap();
        let names: Vec<&str> = all
            .iter()
            .map(|j| j.input.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.jsonl", "b.jsonl"]);

        let some = scan_dir(dir.path(), &out, &["b".to_string(), "zzz".to_string()]).unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].output, out.join("b.jsonl"));
    }
}
