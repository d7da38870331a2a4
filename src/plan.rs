//! Preflight: scan a folder against its ledger and report what a real run
//! would upload, without touching the network.

use anyhow::Result;
use log::info;
use std::path::Path;

use crate::error::UploadFolderError;
use crate::ledger::Ledger;
use crate::pipeline::scan::{ScanOpts, scan_folder};
use crate::types::{Opts, WorkItem};
use crate::utils::Colors;
use crate::utils::config::FolderPaths;

/// What a real upload run would do: files to upload, ledger entries with no
/// file behind them anymore, and the byte total for the cost estimate.
#[derive(Debug, Default)]
pub struct Plan {
    pub pending: Vec<WorkItem>,
    pub gone: Vec<String>,
    pub total_bytes: u64,
    pub checked: usize,
}

/// Compare the folder at `root` to its ledger. Returns the pending/gone view;
/// nothing is uploaded and nothing is written.
pub fn plan_folder(
    root: &Path,
    opts: &Opts,
    on_checked: Option<&dyn Fn(usize)>,
) -> Result<Plan> {
    let root = root
        .canonicalize()
        .map_err(|source| UploadFolderError::Access {
            path: root.to_path_buf(),
            source,
        })?;
    let paths = FolderPaths::with_ledger(&root, opts.ledger_path.clone());
    let ledger = Ledger::load(&paths.ledger)?;
    let scan = scan_folder(&root, &ledger, &ScanOpts::from(opts), on_checked)?;
    let gone = ledger.diff(&scan.seen).gone;

    let mut pending = scan.pending;
    pending.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    let plan = Plan {
        pending,
        gone,
        total_bytes: scan.total_bytes,
        checked: scan.checked,
    };
    print_plan(&plan, opts.list_paths);
    Ok(plan)
}

/// Print plan summary
fn print_plan(plan: &Plan, list_paths: bool) {
    if plan.pending.is_empty() && plan.gone.is_empty() {
        info!("Nothing to upload; ledger is current.");
        return;
    }

    info!(
        "{} | {} | {}",
        Colors::colorize(
            Colors::PENDING,
            &format!("Pending: {}", plan.pending.len())
        ),
        Colors::colorize(Colors::GONE, &format!("Gone: {}", plan.gone.len())),
        Colors::colorize(
            Colors::BYTES,
            &format!("{} bytes to upload", plan.total_bytes)
        ),
    );

    if list_paths {
        for item in &plan.pending {
            println!("  pending: {}", item.rel_path);
        }
        for path in &plan.gone {
            println!("  gone: {}", path);
        }
    }
}
