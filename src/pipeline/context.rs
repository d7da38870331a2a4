//! Scan context and channel bundle: shared data passed into the walk thread
//! and the sift workers.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::pipeline::scan::ScanOpts;
use crate::pipeline::sift::FileCheck;
use crate::utils::config::SCAN_CHANNEL_CAP;

/// Shared context for the walk thread. Built in `scan_folder` so the walk loop
/// has root, exclude, strict, and error/skip state.
pub struct ScanContext {
    pub root: PathBuf,
    pub exclude: Vec<String>,
    pub strict: bool,
    pub follow_links: bool,
    pub first_error: Arc<Mutex<Option<String>>>,
    pub skipped_paths: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

/// Channels and shared state for the scan pipeline. Walk thread gets path_tx
/// and ctx; sift workers get path_rx and check_tx; the collector drains check_rx.
pub struct ScanChannels {
    pub path_tx: Sender<PathBuf>,
    pub path_rx: Receiver<PathBuf>,
    pub check_tx: Sender<FileCheck>,
    pub check_rx: Receiver<FileCheck>,
    pub first_error: Arc<Mutex<Option<String>>>,
    pub skipped_paths: Arc<Mutex<Vec<(PathBuf, String)>>>,
    pub ctx: ScanContext,
}

pub fn create_scan_channels(root: &Path, opts: &ScanOpts) -> ScanChannels {
    let (path_tx, path_rx) = bounded::<PathBuf>(SCAN_CHANNEL_CAP);
    let (check_tx, check_rx) = bounded::<FileCheck>(SCAN_CHANNEL_CAP);
    let first_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let skipped_paths: Arc<Mutex<Vec<(PathBuf, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let ctx = ScanContext {
        root: root.to_path_buf(),
        exclude: opts.exclude.clone(),
        strict: opts.strict,
        follow_links: opts.follow_links,
        first_error: Arc::clone(&first_error),
        skipped_paths: Arc::clone(&skipped_paths),
    };

    ScanChannels {
        path_tx,
        path_rx,
        check_tx,
        check_rx,
        first_error,
        skipped_paths,
        ctx,
    }
}
