//! Public and internal types for the permalift API and pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::utils::config::DEFAULT_BATCH_SIZE;

/// One name/value pair attached to an uploaded item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Tag {
        Tag {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A file discovered during the scan that has no ledger entry yet.
#[derive(Clone, Debug)]
pub struct WorkItem {
    pub abs_path: PathBuf,
    /// Ledger key: path relative to the folder root, forward slashes.
    pub rel_path: String,
    /// Size in bytes, captured at sift time for the cost estimate.
    pub size: u64,
}

/// Successful upload of one item.
#[derive(Debug)]
pub struct UploadSuccess {
    pub item: WorkItem,
    pub id: String,
}

/// Failed upload of one item. Never aborts sibling workers; collected and
/// surfaced after the batch drains.
#[derive(Debug)]
pub struct UploadFailure {
    pub item: WorkItem,
    pub error: anyhow::Error,
}

/// Result of one item passing through the batch scheduler.
#[derive(Debug)]
pub enum UploadOutcome {
    Success(UploadSuccess),
    Failure(UploadFailure),
}

/// Response from the storage service for one uploaded item. Round-trips as the
/// `<folder>-id.json` sidecar to short-circuit no-op re-runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub id: String,
}

/// Sink for user-facing progress lines ("Checked 120 files...").
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Interactive preflight confirmation. Returns false to decline the upload.
pub type ConfirmFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Batched completion callback from the batch scheduler (running count).
pub type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

/// Lib options for [`upload_folder`](crate::upload_folder). Use [`Opts`] for CLI and plan.
pub struct FolderOpts {
    /// Concurrent upload workers (also the "Checked N files" cadence).
    pub batch_size: usize,
    /// Keep previously uploaded but now deleted files in the manifest.
    pub keep_deleted: bool,
    /// Relative path recorded as the manifest index (e.g. `index.html`).
    pub index_file: Option<String>,
    /// Prompt for confirmation after the cost estimate, before any upload.
    pub interactive_preflight: bool,
    /// Extra tags attached to the manifest upload.
    pub manifest_tags: Vec<Tag>,
    /// Ledger path override. Default: `<folder>-ledger.csv` next to the folder.
    pub ledger_path: Option<PathBuf>,
    /// Exclude patterns (glob syntax, e.g. `node_modules`, `*.log`).
    pub exclude: Vec<String>,
    /// Follow symbolic links during the walk.
    pub follow_links: bool,
    /// Strict mode: fail on first walk error instead of skipping.
    pub strict: bool,
    /// Progress line sink. When None: stderr if `interactive_preflight`, else a no-op sink.
    pub log: Option<LogFn>,
    /// Confirmation prompt override. When None, reads y/n from stdin.
    pub confirm: Option<ConfirmFn>,
}

impl Default for FolderOpts {
    fn default() -> Self {
        FolderOpts {
            batch_size: DEFAULT_BATCH_SIZE,
            keep_deleted: true,
            index_file: None,
            interactive_preflight: false,
            manifest_tags: Vec::new(),
            ledger_path: None,
            exclude: Vec::new(),
            follow_links: false,
            strict: false,
            log: None,
            confirm: None,
        }
    }
}

impl fmt::Debug for FolderOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderOpts")
            .field("batch_size", &self.batch_size)
            .field("keep_deleted", &self.keep_deleted)
            .field("index_file", &self.index_file)
            .field("interactive_preflight", &self.interactive_preflight)
            .field("manifest_tags", &self.manifest_tags)
            .field("ledger_path", &self.ledger_path)
            .field("exclude", &self.exclude)
            .field("follow_links", &self.follow_links)
            .field("strict", &self.strict)
            .field("log", &self.log.as_ref().map(|_| "<fn>"))
            .field("confirm", &self.confirm.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Full options (CLI and plan). Use [`FolderOpts`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Concurrent upload workers / progress cadence.
    pub batch_size: usize,
    /// Keep previously uploaded but now deleted files in the manifest.
    pub keep_deleted: bool,
    /// Relative path recorded as the manifest index.
    pub index_file: Option<String>,
    /// Ledger path override. When None, uses `<folder>-ledger.csv` next to the folder.
    pub ledger_path: Option<PathBuf>,
    /// Exclude patterns (glob syntax).
    pub exclude: Vec<String>,
    /// Follow symbolic links.
    pub follow_links: bool,
    /// Strict mode: fail on first walk error instead of skipping.
    pub strict: bool,
    /// Show progress bar (verbose mode).
    pub verbose: bool,
    /// List each pending/gone path in the plan output.
    pub list_paths: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Opts {
            batch_size: DEFAULT_BATCH_SIZE,
            keep_deleted: true,
            index_file: None,
            ledger_path: None,
            exclude: Vec::new(),
            follow_links: false,
            strict: false,
            verbose: false,
            list_paths: false,
        }
    }
}

impl From<&Opts> for FolderOpts {
    fn from(o: &Opts) -> Self {
        FolderOpts {
            batch_size: o.batch_size,
            keep_deleted: o.keep_deleted,
            index_file: o.index_file.clone(),
            interactive_preflight: false,
            manifest_tags: Vec::new(),
            ledger_path: o.ledger_path.clone(),
            exclude: o.exclude.clone(),
            follow_links: o.follow_links,
            strict: o.strict,
            log: None,
            confirm: None,
        }
    }
}
