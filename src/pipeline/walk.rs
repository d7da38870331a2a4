//! Walk thread: streams regular-file paths under the root into the path channel.
//!
//! Depth-first and lazy; directories are recursed into, non-regular entries
//! are skipped, and symlinks are not followed unless asked (following links
//! can loop on cyclic trees). Restartable: every scan re-walks from scratch
//! and never consults the ledger.

use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use crate::utils::paths::should_include_in_walk;

use super::context::ScanContext;

pub fn spawn_walk_thread(path_tx: Sender<PathBuf>, ctx: ScanContext) -> JoinHandle<usize> {
    thread::spawn(move || run_walk_loop(path_tx, ctx))
}

/// Consume the walkdir iterator, keep regular files the exclude rules allow,
/// and stream them to `path_tx`. On a walk error: strict records the first
/// error and stops; otherwise the path is pushed to skipped_paths and the walk
/// continues. Drops `path_tx` when done so sift workers see the channel close.
/// Returns the count of paths sent.
pub fn run_walk_loop(path_tx: Sender<PathBuf>, ctx: ScanContext) -> usize {
    let mut count = 0_usize;
    for result in WalkDir::new(&ctx.root).follow_links(ctx.follow_links) {
        match result {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.into_path();
                if !should_include_in_walk(&path, &ctx.root, &ctx.exclude) {
                    continue;
                }
                if path_tx.send(path).is_err() {
                    break;
                }
                count += 1;
            }
            Err(err) => {
                let msg = format!("{}", err);
                if ctx.strict {
                    let _ = ctx.first_error.lock().unwrap().get_or_insert(msg);
                    break;
                }
                log::warn!("Permission denied or error accessing path: {}", msg);
                let path = err
                    .path()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("<no-path>"));
                ctx.skipped_paths.lock().unwrap().push((path, msg));
            }
        }
    }
    drop(path_tx);
    count
}
