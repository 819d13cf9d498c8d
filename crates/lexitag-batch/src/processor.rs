//! Per-line processors
//!
//! A processor turns one input line into what should be written for it. An
//! `Err` is a per-line fault: the driver writes the original line and keeps
//! going.

use async_trait::async_trait;
use lexitag_core::{Record, Result};
use lexitag_extractor::LocalTagger;
use lexitag_remote::{RemoteTagged, RemoteTagger};

/// What to write for one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// A rewritten line
    Tagged(String),
    /// Nothing to do; the original line is written
    Unchanged,
    /// A rewritten line produced without the remote answer
    Degraded(String),
}

/// Trait for line processors used by the batch driver
#[async_trait]
pub trait LineProcessor: Send + Sync {
    /// Process one non-blank input line
    async fn process(&self, line: &str) -> Result<LineOutcome>;

    /// Name used in logs
    fn name(&self) -> &str;
}

// ============================================================================
// Local
// ============================================================================

/// Regex-only tagging
pub struct LocalProcessor {
    tagger: LocalTagger,
}

impl LocalProcessor {
    pub fn new(tagger: LocalTagger) -> Self {
        Self { tagger }
    }
}

#[async_trait]
impl LineProcessor for LocalProcessor {
    async fn process(&self, line: &str) -> Result<LineOutcome> {
        let record = Record::parse(line)?;
        match self.tagger.tag(&record)? {
            Some(tagged) => Ok(LineOutcome::Tagged(tagged.to_line()?)),
            None => Ok(LineOutcome::Unchanged),
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

// ============================================================================
// Remote
// ============================================================================

/// Remote-assisted tagging
pub struct RemoteProcessor {
    tagger: RemoteTagger,
}

impl RemoteProcessor {
    pub fn new(tagger: RemoteTagger) -> Self {
        Self { tagger }
    }
}

#[async_trait]
impl LineProcessor for RemoteProcessor {
    async fn process(&self, line: &str) -> Result<LineOutcome> {
        let record = Record::parse(line)?;
        match self.tagger.tag(&record).await? {
            RemoteTagged::Completed(tagged) => Ok(LineOutcome::Tagged(tagged.to_line()?)),
            RemoteTagged::Fallback(tagged) => Ok(LineOutcome::Degraded(tagged.to_line()?)),
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}
