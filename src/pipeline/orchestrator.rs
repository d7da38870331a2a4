//! Pipeline orchestrator: scan → diff → upload → manifest → publish.
//!
//! Every state that matters survives on disk: the ledger grows as uploads
//! complete, the receipt sidecar records the published root. A crash at any
//! point leaves a ledger that the next run resumes from.

use anyhow::{Context, Result};
use log::debug;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::error::UploadFolderError;
use crate::ledger::{Ledger, LedgerWriter};
use crate::manifest;
use crate::remote::{ItemPayload, ItemProcessor, PriceOracle, stdin_confirmation};
use crate::types::{FolderOpts, LogFn, ProgressFn, UploadReceipt};
use crate::utils::abort::abort_flag;
use crate::utils::config::FolderPaths;

use super::error_report::write_error_report;
use super::scan::{ScanOpts, scan_folder};
use super::scheduler::run_batch;

/// Upload every not-yet-recorded file under `root` and publish the manifest.
///
/// Returns the manifest upload receipt. `Ok(None)` only on a no-op re-run
/// where no manifest was ever published. See [`crate::upload_folder`].
pub fn upload_folder(
    root: &Path,
    processor: Arc<dyn ItemProcessor>,
    oracle: &dyn PriceOracle,
    opts: &FolderOpts,
) -> Result<Option<UploadReceipt>> {
    let root = root
        .canonicalize()
        .map_err(|source| UploadFolderError::Access {
            path: root.to_path_buf(),
            source,
        })?;
    if !root.is_dir() {
        return Err(UploadFolderError::Access {
            path: root,
            source: std::io::Error::from(std::io::ErrorKind::NotADirectory),
        }
        .into());
    }
    let paths = FolderPaths::with_ledger(&root, opts.ledger_path.clone());
    let log = resolve_log(opts);
    let abort = abort_flag();
    abort.store(false, Ordering::Relaxed);

    let ledger = Ledger::load(&paths.ledger)?;
    debug!("ledger has {} recorded upload(s)", ledger.len());

    let scan_opts = ScanOpts::from(opts);
    let scan_log = Arc::clone(&log);
    let on_checked = move |n: usize| (*scan_log)(&format!("Checked {n} files..."));
    let scan = scan_folder(&root, &ledger, &scan_opts, Some(&on_checked))?;
    debug!(
        "scan: {} checked, {} pending, {} bytes to upload",
        scan.checked,
        scan.pending.len(),
        scan.total_bytes
    );

    let gone: HashSet<String> = ledger.diff(&scan.seen).gone.into_iter().collect();
    if scan.pending.is_empty() && (gone.is_empty() || opts.keep_deleted) {
        (*log)("No items to process");
        return read_receipt(&paths.receipt);
    }

    // Per-item base fee plus the byte price over the whole batch.
    let per_item = oracle.price(0).context("estimate per-item base fee")?;
    let cost = oracle
        .price(scan.total_bytes)
        .context("estimate upload cost")?
        + per_item * scan.pending.len() as u128;
    let summary = format!(
        "Total amount of data: {} bytes over {} files - cost: {} {}",
        scan.total_bytes,
        scan.pending.len(),
        cost,
        oracle.base_symbol()
    );
    (*log)(&summary);

    if opts.interactive_preflight {
        let prompt = format!("Authorize upload?\n{summary}\n Y / N");
        let authorized = match &opts.confirm {
            Some(confirm) => (**confirm)(&prompt),
            None => stdin_confirmation(&prompt),
        };
        if !authorized {
            return Err(UploadFolderError::ConfirmationDeclined.into());
        }
    }

    let pending_count = scan.pending.len();
    let writer = LedgerWriter::spawn(ledger);
    let appender = writer.appender();
    let batch_log = Arc::clone(&log);
    let on_progress: ProgressFn = Arc::new(move |n| (*batch_log)(&format!("Processed {n} items...")));
    let batch = run_batch(
        scan.pending,
        opts.batch_size.max(1),
        Arc::clone(&processor),
        appender,
        Some(on_progress),
        Arc::clone(&abort),
    );
    // Workers are joined; every appender clone is gone, close cannot block.
    let ledger = writer.close()?;
    let batch = batch?;

    if !batch.failed.is_empty() {
        (*log)(&format!(
            "{} Errors detected, skipping manifest upload...",
            batch.failed.len()
        ));
        write_error_report(&paths.errors, &batch.failed)?;
        return Err(UploadFolderError::ItemFailures {
            failed: batch.failed.len(),
            report: paths.errors.clone(),
        }
        .into());
    }
    if abort.load(Ordering::Relaxed) {
        return Err(UploadFolderError::Cancelled.into());
    }
    (*log)(&format!("Finished processing {pending_count} Items"));

    (*log)("Generating JSON manifest...");
    let doc = manifest::build(
        ledger.entries(),
        &gone,
        opts.keep_deleted,
        opts.index_file.as_deref(),
    );
    manifest::write(&doc, &paths.manifest)?;

    (*log)("Uploading JSON manifest...");
    let tags = manifest::manifest_tags(&opts.manifest_tags);
    let receipt = processor
        .process(ItemPayload::File(paths.manifest.clone()), &tags)
        .map_err(UploadFolderError::ManifestPublish)?;
    write_receipt(&paths.receipt, &receipt)?;
    (*log)("Done!");
    Ok(Some(receipt))
}

/// Progress sink: caller's, or stderr when interactive, or a black hole.
fn resolve_log(opts: &FolderOpts) -> LogFn {
    match (&opts.log, opts.interactive_preflight) {
        (Some(log), _) => Arc::clone(log),
        (None, true) => Arc::new(|line: &str| eprintln!("{line}")),
        (None, false) => Arc::new(|_: &str| {}),
    }
}

/// Cached receipt from the last published manifest, if any. A damaged sidecar
/// is treated as absent, not fatal.
fn read_receipt(path: &Path) -> Result<Option<UploadReceipt>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read receipt at {}", path.display())),
    };
    match serde_json::from_str(&content) {
        Ok(receipt) => Ok(Some(receipt)),
        Err(e) => {
            log::warn!("ignoring damaged receipt at {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

fn write_receipt(path: &Path, receipt: &UploadReceipt) -> Result<()> {
    let json = serde_json::to_string(receipt).context("serialize manifest receipt")?;
    std::fs::write(path, json).with_context(|| format!("write receipt at {}", path.display()))
}
