//! Sift workers: split walked paths into ledger-known files and pending uploads.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::types::WorkItem;
use crate::utils::paths::{ledger_key, path_relative_to};

/// Verdict for one walked file against the pre-scan ledger key set.
#[derive(Debug)]
pub enum FileCheck {
    /// Already in the ledger; counted as seen so deletion detection works.
    Known { rel_path: String },
    /// No ledger record; needs uploading.
    Pending(WorkItem),
}

/// Single sift worker: read paths from path_rx, classify, send on check_tx.
/// Only pending files are stat'ed (the size feeds the cost estimate).
fn sift_worker_loop(
    path_rx: Receiver<PathBuf>,
    check_tx: Sender<FileCheck>,
    root: PathBuf,
    known: Arc<HashSet<String>>,
) {
    while let Ok(abs_path) = path_rx.recv() {
        match check_path(&abs_path, &root, &known) {
            Ok(check) => {
                let _ = check_tx.send(check);
            }
            Err(e) => {
                // File vanished between walk and stat; treat like a skipped path.
                log::warn!("could not read metadata for {}: {:#}", abs_path.display(), e);
            }
        }
    }
    drop(check_tx);
}

fn check_path(abs_path: &Path, root: &Path, known: &HashSet<String>) -> Result<FileCheck> {
    let rel = path_relative_to(abs_path, root).unwrap_or_else(|| abs_path.to_path_buf());
    let rel_path = ledger_key(&rel);
    if known.contains(&rel_path) {
        return Ok(FileCheck::Known { rel_path });
    }
    let size = std::fs::metadata(abs_path)
        .with_context(|| format!("stat {}", abs_path.display()))?
        .len();
    Ok(FileCheck::Pending(WorkItem {
        abs_path: abs_path.to_path_buf(),
        rel_path,
        size,
    }))
}

/// Spawn sift workers: read paths from path_rx, classify against `known`, send
/// on check_tx. Caller must drop its check sender after this so the collector
/// sees the channel close.
pub fn spawn_sift_workers(
    path_rx: Receiver<PathBuf>,
    check_tx: &Sender<FileCheck>,
    root: &Path,
    known: Arc<HashSet<String>>,
    num_workers: usize,
) -> Vec<JoinHandle<()>> {
    let root = root.to_path_buf();
    (0..num_workers)
        .map(|_| {
            let path_rx = path_rx.clone();
            let check_tx = check_tx.clone();
            let root = root.clone();
            let known = Arc::clone(&known);
            thread::spawn(move || sift_worker_loop(path_rx, check_tx, root, known))
        })
        .collect()
}
