//! Batch scheduler: bounded-concurrency upload of the pending work set.
//!
//! A fixed pool of workers drains a shared queue. Failures are isolated per
//! item and never stop sibling workers; the scheduler itself retries nothing.
//! A success is acked to the ledger before the item counts as done, so
//! durability precedes progress reporting.

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crate::ledger::LedgerAppender;
use crate::remote::{ItemPayload, ItemProcessor, content_type_tag};
use crate::types::{ProgressFn, UploadFailure, UploadOutcome, UploadSuccess, WorkItem};

/// What came out of one batch: both sides, in completion order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<UploadSuccess>,
    pub failed: Vec<UploadFailure>,
}

/// Run the processor over `items` with `concurrency` workers.
///
/// Empty input returns immediately with empty sets and performs no I/O.
/// `on_progress` fires with the running completed count (success or failure)
/// every `concurrency` items — the batch size doubles as the progress cadence.
/// When `abort` flips, queue items not yet started stay unstarted; in-flight
/// uploads finish naturally.
pub fn run_batch(
    items: Vec<WorkItem>,
    concurrency: usize,
    processor: Arc<dyn ItemProcessor>,
    appender: LedgerAppender,
    on_progress: Option<ProgressFn>,
    abort: Arc<AtomicBool>,
) -> Result<BatchOutcome> {
    if items.is_empty() {
        return Ok(BatchOutcome::default());
    }
    let progress_chunk = concurrency.max(1);
    let concurrency = concurrency.clamp(1, items.len());

    let (item_tx, item_rx) = bounded::<WorkItem>(items.len());
    let (outcome_tx, outcome_rx) = bounded::<UploadOutcome>(items.len());
    for item in items {
        item_tx
            .send(item)
            .map_err(|_| anyhow!("work queue closed before the batch started"))?;
    }
    drop(item_tx);

    let completed = Arc::new(AtomicUsize::new(0));
    let worker_handles: Vec<_> = (0..concurrency)
        .map(|_| {
            let item_rx = item_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let processor = Arc::clone(&processor);
            let appender = appender.clone();
            let on_progress = on_progress.clone();
            let completed = Arc::clone(&completed);
            let abort = Arc::clone(&abort);
            thread::spawn(move || {
                upload_worker_loop(
                    item_rx,
                    outcome_tx,
                    processor,
                    appender,
                    on_progress,
                    progress_chunk,
                    completed,
                    abort,
                )
            })
        })
        .collect();
    drop(outcome_tx);
    drop(item_rx);

    let mut outcome = BatchOutcome::default();
    while let Ok(res) = outcome_rx.recv() {
        match res {
            UploadOutcome::Success(s) => outcome.succeeded.push(s),
            UploadOutcome::Failure(f) => outcome.failed.push(f),
        }
    }
    for h in worker_handles {
        let _ = h.join();
    }
    Ok(outcome)
}

/// Single upload worker: take the next item, process it, ack the ledger, emit
/// the outcome. Stops taking items when the queue drains or `abort` flips.
fn upload_worker_loop(
    item_rx: Receiver<WorkItem>,
    outcome_tx: Sender<UploadOutcome>,
    processor: Arc<dyn ItemProcessor>,
    appender: LedgerAppender,
    on_progress: Option<ProgressFn>,
    progress_chunk: usize,
    completed: Arc<AtomicUsize>,
    abort: Arc<AtomicBool>,
) {
    while let Ok(item) = item_rx.recv() {
        if abort.load(Ordering::Relaxed) {
            break;
        }
        let outcome = match process_one(processor.as_ref(), &appender, &item) {
            Ok(id) => UploadOutcome::Success(UploadSuccess { item, id }),
            Err(error) => UploadOutcome::Failure(UploadFailure { item, error }),
        };
        let _ = outcome_tx.send(outcome);

        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done.is_multiple_of(progress_chunk)
            && let Some(cb) = on_progress.as_ref()
        {
            (**cb)(done);
        }
    }
    drop(outcome_tx);
}

/// Upload one item and record it. The ledger append must succeed before the
/// item counts as done; an append failure fails the item even though the
/// upload itself went through.
fn process_one(
    processor: &dyn ItemProcessor,
    appender: &LedgerAppender,
    item: &WorkItem,
) -> Result<String> {
    let tags = vec![content_type_tag(&item.abs_path)];
    let receipt = processor
        .process(ItemPayload::File(item.abs_path.clone()), &tags)
        .with_context(|| format!("upload {}", item.rel_path))?;
    appender
        .append(&item.rel_path, &receipt.id)
        .with_context(|| format!("record {} in ledger", item.rel_path))?;
    Ok(receipt.id)
}
