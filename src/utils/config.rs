//! Application configuration constants.
//! Tuning, chunk sizes, and sidecar file naming in one place.

use std::path::{Path, PathBuf};

// ---- Sidecar files ----

/// Sidecar files for one uploaded folder. All of them live in the folder's
/// parent directory so a re-run never sweeps them into the upload itself.
#[derive(Clone, Debug)]
pub struct FolderPaths {
    /// Durable upload ledger (`<base>-ledger.csv`).
    pub ledger: PathBuf,
    /// Generated JSON manifest (`<base>-manifest.json`).
    pub manifest: PathBuf,
    /// Receipt of the last published manifest (`<base>-id.json`).
    pub receipt: PathBuf,
    /// Error report for failed batch items (`<base>-errors.txt`).
    pub errors: PathBuf,
}

impl FolderPaths {
    /// Build sidecar paths for the folder at `root`.
    pub fn for_root(root: &Path) -> FolderPaths {
        let parent = root.parent().unwrap_or(Path::new("."));
        let base = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(env!("CARGO_PKG_NAME"));
        FolderPaths {
            ledger: parent.join(format!("{base}-ledger.csv")),
            manifest: parent.join(format!("{base}-manifest.json")),
            receipt: parent.join(format!("{base}-id.json")),
            errors: parent.join(format!("{base}-errors.txt")),
        }
    }

    /// Same, with an explicit ledger path override (`--ledger` / `FolderOpts::ledger_path`).
    pub fn with_ledger(root: &Path, ledger: Option<PathBuf>) -> FolderPaths {
        let mut paths = FolderPaths::for_root(root);
        if let Some(ledger) = ledger {
            paths.ledger = ledger;
        }
        paths
    }
}

// ---- Batch upload ----

/// Default number of concurrent upload workers. Caller-configurable via
/// `FolderOpts::batch_size`; also the progress-report cadence.
pub const DEFAULT_BATCH_SIZE: usize = 10;

// ---- Scan pipeline ----

/// Path and check channel capacity. Must be >= max path count so the walk
/// never blocks on send and can drop its sender promptly (lets sift workers
/// see the channel close and exit).
pub const SCAN_CHANNEL_CAP: usize = 50_000;

/// Sift worker threads (stat + ledger membership). The scan is metadata-bound,
/// not CPU-bound; a small fixed pool is enough.
pub const SIFT_WORKER_COUNT: usize = 4;
