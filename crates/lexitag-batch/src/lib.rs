//! lexitag Batch - Resumable processing of JSONL dataset files
//!
//! - Processors: what to write for one line (local or remote tagging)
//! - Checkpoint: resume offsets inferred from the output file
//! - Driver: one file at a time, one output line per input line
//! - Cleanup: whole-file parenthesis cleanup with atomic replace
//!
//! Author: hephaex@gmail.com

pub mod checkpoint;
pub mod cleanup;
pub mod driver;
pub mod plan;
pub mod processor;

pub use checkpoint::resume_offset;
pub use cleanup::{cleanup_file, cleanup_target, CleanupSummary};
pub use driver::{BatchDriver, BatchSummary};
pub use plan::{ensure_input_dir, fixed_files, scan_dir, FileJob};
pub use processor::{LineOutcome, LineProcessor, LocalProcessor, RemoteProcessor};
