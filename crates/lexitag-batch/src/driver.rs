//! Resumable batch driver
//!
//! Processes one JSONL file at a time, strictly in order. Every non-blank
//! input line yields exactly one output line: the processor's rewrite, or
//! the original line when there is nothing to do or processing failed.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lexitag_core::{BatchConfig, LexitagError, Result};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::checkpoint::resume_offset;
use crate::processor::{LineOutcome, LineProcessor};

/// Counters for one processed file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Non-blank lines in the input
    pub total_lines: usize,
    /// Lines already present in the output when the run started
    pub resumed_from: usize,
    pub tagged: usize,
    pub unchanged: usize,
    /// Lines written without the remote answer
    pub degraded: usize,
    /// Lines that faulted and were copied unchanged
    pub errors: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Whether the file was already complete and nothing ran
    pub fn skipped(&self) -> bool {
        self.resumed_from >= self.total_lines
    }

    /// Lines handled in this run
    pub fn processed(&self) -> usize {
        self.tagged + self.unchanged + self.degraded + self.errors
    }
}

/// Drives a [`LineProcessor`] over files
pub struct BatchDriver<P> {
    processor: P,
    config: BatchConfig,
}

impl<P: LineProcessor> BatchDriver<P> {
    pub fn new(processor: P, config: BatchConfig) -> Self {
        Self { processor, config }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Process `input` into `output`, resuming after any lines the output
    /// already holds.
    pub async fn run_file(&self, input: &Path, output: &Path) -> Result<BatchSummary> {
        let started = Instant::now();
        let content = tokio::fs::read(input)
            .await
            .map_err(|e| LexitagError::io(input, e))?;
        let lines = input_lines(&content);

        let resumed_from = resume_offset(output).await?;
        let mut summary = BatchSummary {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            total_lines: lines.len(),
            resumed_from,
            ..BatchSummary::default()
        };

        if summary.skipped() {
            tracing::info!(
                file = %input.display(),
                lines = lines.len(),
                "all lines already processed"
            );
            return Ok(summary);
        }

        if resumed_from > 0 {
            tracing::info!(
                file = %input.display(),
                from = resumed_from + 1,
                total = lines.len(),
                "resuming"
            );
        } else {
            tracing::info!(file = %input.display(), total = lines.len(), "processing");
        }

        let mut out = open_output(output, resumed_from > 0).await?;
        let interval = Duration::from_secs(self.config.progress_interval_secs);
        let remaining = lines.len() - resumed_from;
        let mut last_report = Instant::now();

        for (index, &line) in lines.iter().enumerate().skip(resumed_from) {
            if last_report.elapsed() > interval {
                let done = index - resumed_from;
                tracing::info!(
                    processor = self.processor.name(),
                    percent = done * 100 / remaining,
                    line = index + 1,
                    total = lines.len(),
                    elapsed_min = started.elapsed().as_secs() / 60,
                    "progress"
                );
                last_report = Instant::now();
            }

            let Ok(decoded) = std::str::from_utf8(line) else {
                tracing::warn!(line = index + 1, "line is not valid UTF-8, keeping original bytes");
                summary.errors += 1;
                self.write_line(&mut out, output, line).await?;
                continue;
            };

            let written = match self.processor.process(decoded).await {
                Ok(LineOutcome::Tagged(text)) => {
                    summary.tagged += 1;
                    text
                }
                Ok(LineOutcome::Degraded(text)) => {
                    summary.degraded += 1;
                    text
                }
                Ok(LineOutcome::Unchanged) => {
                    summary.unchanged += 1;
                    decoded.to_string()
                }
                Err(err) => {
                    tracing::warn!(line = index + 1, error = %err, "keeping original line");
                    summary.errors += 1;
                    decoded.to_string()
                }
            };

            self.write_line(&mut out, output, written.as_bytes()).await?;
        }

        summary.elapsed = started.elapsed();
        tracing::info!(
            file = %input.display(),
            tagged = summary.tagged,
            unchanged = summary.unchanged,
            degraded = summary.degraded,
            errors = summary.errors,
            elapsed_min = summary.elapsed.as_secs() / 60,
            output = %output.display(),
            "file complete"
        );

        Ok(summary)
    }

    async fn write_line(&self, out: &mut File, path: &Path, line: &[u8]) -> Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line);
        buf.push(b'\n');

        out.write_all(&buf)
            .await
            .map_err(|e| LexitagError::io(path, e))?;
        out.flush().await.map_err(|e| LexitagError::io(path, e))?;
        if self.config.sync_each_line {
            out.sync_data().await.map_err(|e| LexitagError::io(path, e))?;
        }
        Ok(())
    }
}

/// Non-blank input lines, without their line endings.
///
/// Lines stay raw bytes so one undecodable line cannot stop the file.
fn input_lines(content: &[u8]) -> Vec<&[u8]> {
    content
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .collect()
}

async fn open_output(path: &Path, append: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path).await.map_err(|e| LexitagError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Uppercases lines, fails on lines containing "bad"
    struct Upper;

    #[async_trait]
    impl LineProcessor for Upper {
        async fn process(&self, line: &str) -> Result<LineOutcome> {
            if line.contains("bad") {
                return Err(LexitagError::MalformedRecord("bad line".to_string()));
            }
            if line.starts_with('=') {
                return Ok(LineOutcome::Unchanged);
            }
            Ok(LineOutcome::Tagged(line.to_uppercase()))
        }

        fn name(&self) -> &str {
            "upper"
        }
    }

    fn driver() -> BatchDriver<Upper> {
        BatchDriver::new(Upper, BatchConfig::default())
    }

    #[tokio::test]
    async fn test_counts_and_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.jsonl");
        let output = dir.path().join("out.jsonl");
        std::fs::write(&input, "a\n\nbad\n=keep\n").unwrap();

        let summary = driver().run_file(&input, &output).await.unwrap();

        assert_eq!(summary.total_lines, 3);
        assert_eq!(summary.tagged, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.processed(), 3);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "A\nbad\n=keep\n");
    }

    #[test]
    fn test_input_lines_strip_endings() {
        let lines = input_lines(b"a\r\n\n \t\nb\xff\nc");
        assert_eq!(lines, vec![&b"a"[..], &b"b\xff"[..], &b"c"[..]]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_kept() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.jsonl");
        let output = dir.path().join("out.jsonl");
        std::fs::write(&input, b"a\n\xff\xfeb\nc\n").unwrap();

        let summary = driver().run_file(&input, &output).await.unwrap();

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.tagged, 2);
        assert_eq!(std::fs::read(&output).unwrap(), b"A\n\xff\xfeb\nC\n");
    }

    #[tokio::test]
    async fn test_truncates_stale_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.jsonl");
        let output = dir.path().join("out.jsonl");
        std::fs::write(&input, "a\nb\n").unwrap();
        std::fs::write(&output, "   \n").unwrap();

        driver().run_file(&input, &output).await.unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "A\nB\n");
    }

    #[tokio::test]
    async fn test_missing_input_is_error() {
        let dir = TempDir::new().unwrap();
        let result = driver()
            .run_file(&dir.path().join("none.jsonl"), &dir.path().join("out.jsonl"))
            .await;
        assert!(matches!(result, Err(LexitagError::Io { .. })));
    }

    #[tokio::test]
    async fn test_sync_each_line() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.jsonl");
        let output = dir.path().join("out.jsonl");
        std::fs::write(&input, "a\nb\n").unwrap();

        let config = BatchConfig {
            sync_each_line: true,
            ..BatchConfig::default()
        };
        let summary = BatchDriver::new(Upper, config)
            .run_file(&input, &output)
            .await
            .unwrap();
        assert_eq!(summary.tagged, 2);
    }
}
