//! lexitag CLI - Command-line interface
//!
//! Usage:
//!   lexitag tag [--input_dir D] [--output_dir D]
//!   lexitag remote [FILES...]
//!   lexitag cleanup FILES... [--output-dir D]
//!   lexitag check FILES...

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use lexitag_batch::{
    cleanup_file, cleanup_target, ensure_input_dir, fixed_files, scan_dir, BatchDriver,
    BatchSummary, FileJob, LineProcessor, LocalProcessor, RemoteProcessor,
};
use lexitag_core::{AppConfig, LoggingConfig, Record};
use lexitag_extractor::{validate_spans, LocalTagger, TagVocabulary};
use lexitag_remote::{create_completion_client, RemoteTagger};
use tracing_subscriber::EnvFilter;

const ENV_FILE: &str = ".env.generator";

#[derive(Parser)]
#[command(name = "lexitag")]
#[command(about = "Canonical tagging for lexicon Q/A datasets")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag the known dataset files with the regex cascades
    Tag {
        /// Directory holding the dataset files
        #[arg(long = "input_dir")]
        input_dir: Option<PathBuf>,
        /// Directory receiving the tagged files
        #[arg(long = "output_dir")]
        output_dir: Option<PathBuf>,
    },
    /// Tag answers through the completion service
    Remote {
        /// Base names to process (extension optional); all files by default
        files: Vec<String>,
    },
    /// Remove parentheses hugging tag markers
    Cleanup {
        /// JSONL files to clean
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Write cleaned files here instead of overwriting the inputs
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Check tag spans of every message
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = dotenvy::from_filename(ENV_FILE);

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match env_file {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "could not read {ENV_FILE}"),
    }

    match cli.command {
        Commands::Tag {
            input_dir,
            output_dir,
        } => {
            let input_dir = input_dir.unwrap_or_else(|| config.local.input_dir.clone());
            let output_dir = output_dir.unwrap_or_else(|| config.local.output_dir.clone());
            run_local(&config, &input_dir, &output_dir).await
        }
        Commands::Remote { files } => run_remote(&config, &files).await,
        Commands::Cleanup { files, output_dir } => run_cleanup(&files, output_dir.as_deref()),
        Commands::Check { files } => run_check(&config, &files),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_jobs<P: LineProcessor>(
    driver: &BatchDriver<P>,
    jobs: &[FileJob],
) -> anyhow::Result<Vec<BatchSummary>> {
    let mut summaries = Vec::with_capacity(jobs.len());
    for job in jobs {
        let summary = driver
            .run_file(&job.input, &job.output)
            .await
            .with_context(|| format!("processing {}", job.input.display()))?;
        summaries.push(summary);
    }
    Ok(summaries)
}

fn report(summaries: &[BatchSummary]) {
    for summary in summaries {
        tracing::info!(
            file = %summary.input.display(),
            entries = summary.total_lines,
            processed = summary.processed(),
            errors = summary.errors,
            "done"
        );
    }
    let errors: usize = summaries.iter().map(|s| s.errors).sum();
    let processed: usize = summaries.iter().map(BatchSummary::processed).sum();
    tracing::info!(files = summaries.len(), processed, errors, "run complete");
}

async fn run_local(config: &AppConfig, input_dir: &Path, output_dir: &Path) -> anyhow::Result<()> {
    ensure_input_dir(input_dir)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let tagger = LocalTagger::new(&config.language.name)?;
    let driver = BatchDriver::new(LocalProcessor::new(tagger), config.batch.clone());
    let jobs = fixed_files(input_dir, output_dir, &config.local.files);

    let summaries = run_jobs(&driver, &jobs).await?;
    report(&summaries);
    tracing::info!(output = %output_dir.display(), "tagged dataset saved");
    Ok(())
}

async fn run_remote(config: &AppConfig, files: &[String]) -> anyhow::Result<()> {
    let input_dir = &config.remote.input_dir;
    let output_dir = &config.remote.output_dir;

    ensure_input_dir(input_dir)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let client = create_completion_client(&config.llm)
        .context("set DATASET_GEN_API_KEY in the environment or in .env.generator")?;
    tracing::info!(model = client.model(), "using completion service");

    let vocabulary = Arc::new(TagVocabulary::new(&config.language.name));
    let tagger = RemoteTagger::new(Arc::from(client), vocabulary)
        .with_span_policy(config.remote.span_policy);
    let driver = BatchDriver::new(RemoteProcessor::new(tagger), config.batch.clone());

    let jobs = scan_dir(input_dir, output_dir, files)?;
    if jobs.is_empty() {
        tracing::warn!(dir = %input_dir.display(), "no JSONL files to process");
        return Ok(());
    }

    let summaries = run_jobs(&driver, &jobs).await?;
    report(&summaries);
    Ok(())
}

fn run_cleanup(files: &[PathBuf], output_dir: Option<&Path>) -> anyhow::Result<()> {
    let mut lines = 0;
    let mut changed = 0;

    for input in files {
        let target = cleanup_target(input, output_dir)?;
        let summary = cleanup_file(input, &target)?;
        lines += summary.lines;
        changed += summary.changed_messages;
    }

    tracing::info!(lines, changed_messages = changed, "cleanup finished");
    Ok(())
}

fn run_check(config: &AppConfig, files: &[PathBuf]) -> anyhow::Result<()> {
    let vocabulary = TagVocabulary::new(&config.language.name);
    let mut invalid = 0;

    for path in files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = match Record::parse(line) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(file = %path.display(), line = index + 1, error = %e, "unparsable line");
                    invalid += 1;
                    continue;
                }
            };
            for message in &record.messages {
                let Some(content) = message.content() else {
                    continue;
                };
                if let Err(e) = validate_spans(content, &vocabulary) {
                    tracing::warn!(
                        file = %path.display(),
                        line = index + 1,
                        role = message.role().unwrap_or_default(),
                        error = %e,
                        "invalid spans"
                    );
                    invalid += 1;
                }
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} problems found");
    }
    tracing::info!(files = files.len(), "all spans well-formed");
    Ok(())
}
