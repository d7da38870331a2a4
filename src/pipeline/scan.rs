//! Folder scan: walk + sift streamed through channels, collected into the
//! pending/seen/byte-total view the orchestrator diffs against the ledger.

use anyhow::{Result, anyhow};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::ledger::Ledger;
use crate::types::{FolderOpts, Opts, WorkItem};
use crate::utils::config::SIFT_WORKER_COUNT;

use super::context::create_scan_channels;
use super::sift::{FileCheck, spawn_sift_workers};
use super::walk::spawn_walk_thread;

/// Walk/sift settings shared by the upload pipeline and the plan view.
#[derive(Clone, Debug)]
pub struct ScanOpts {
    pub exclude: Vec<String>,
    pub strict: bool,
    pub follow_links: bool,
    /// Files checked between `on_checked` callbacks.
    pub batch_size: usize,
}

impl From<&FolderOpts> for ScanOpts {
    fn from(o: &FolderOpts) -> Self {
        ScanOpts {
            exclude: o.exclude.clone(),
            strict: o.strict,
            follow_links: o.follow_links,
            batch_size: o.batch_size.max(1),
        }
    }
}

impl From<&Opts> for ScanOpts {
    fn from(o: &Opts) -> Self {
        ScanOpts {
            exclude: o.exclude.clone(),
            strict: o.strict,
            follow_links: o.follow_links,
            batch_size: o.batch_size.max(1),
        }
    }
}

/// Result of scanning one folder against a ledger.
#[derive(Debug, Default)]
pub struct FolderScan {
    /// Files with no ledger record, in need of upload.
    pub pending: Vec<WorkItem>,
    /// Every ledger key present on disk right now.
    pub seen: HashSet<String>,
    /// Byte total over the pending set.
    pub total_bytes: u64,
    /// Files checked in this scan.
    pub checked: usize,
}

/// Scan `root`: stream the walk through sift workers and collect the result.
/// `on_checked` fires with the running count every `batch_size` files.
/// The in-memory ledger key set is cloned before workers start and never
/// mutated concurrently.
pub fn scan_folder(
    root: &Path,
    ledger: &Ledger,
    opts: &ScanOpts,
    on_checked: Option<&dyn Fn(usize)>,
) -> Result<FolderScan> {
    let channels = create_scan_channels(root, opts);
    let walk_handle = spawn_walk_thread(channels.path_tx, channels.ctx);

    let known: Arc<HashSet<String>> = Arc::new(ledger.keys().map(String::from).collect());
    let worker_handles = spawn_sift_workers(
        channels.path_rx,
        &channels.check_tx,
        root,
        known,
        SIFT_WORKER_COUNT,
    );
    // Dropping the last sender closes the channel so the collector exits.
    drop(channels.check_tx);

    let mut scan = FolderScan::default();
    while let Ok(check) = channels.check_rx.recv() {
        scan.checked += 1;
        match check {
            FileCheck::Known { rel_path } => {
                scan.seen.insert(rel_path);
            }
            FileCheck::Pending(item) => {
                scan.total_bytes += item.size;
                scan.seen.insert(item.rel_path.clone());
                scan.pending.push(item);
            }
        }
        if scan.checked.is_multiple_of(opts.batch_size)
            && let Some(f) = on_checked
        {
            f(scan.checked);
        }
    }

    walk_handle
        .join()
        .map_err(|_| anyhow!("walk thread panicked"))?;
    for h in worker_handles {
        let _ = h.join();
    }

    check_scan_errors(opts.strict, &channels.first_error, &channels.skipped_paths)?;
    Ok(scan)
}

/// Check scan outcome: if strict and a first error was recorded, return it;
/// otherwise log a skipped-paths summary. Call after joining walk and workers.
fn check_scan_errors(
    strict: bool,
    first_error: &Arc<Mutex<Option<String>>>,
    skipped_paths: &Arc<Mutex<Vec<(PathBuf, String)>>>,
) -> Result<()> {
    if strict
        && let Some(msg) = first_error.lock().unwrap().take()
    {
        return Err(anyhow!("{}", msg));
    }
    let skipped = skipped_paths.lock().unwrap().len();
    if skipped > 0 {
        log::warn!(
            "Skipped {} paths due to permission errors or access issues",
            skipped
        );
    }
    Ok(())
}
