//! Permalift: resumable folder uploads to content-addressed storage
//!
//! Walks a directory tree, uploads every file that has no record in the
//! durable ledger, and publishes a JSON manifest mapping each relative path to
//! its remote content id. Crash-consistent: a ledger record is durable the
//! instant its upload succeeds, so interrupted runs resume where they stopped
//! and never re-upload stored content.

pub mod cli;
pub mod error;
pub mod ledger;
pub mod manifest;
pub mod pipeline;
pub mod plan;
pub mod remote;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use error::UploadFolderError;
pub use remote::{ItemPayload, ItemProcessor, PriceOracle, upload_file};

use log::debug;
use std::path::Path;
use std::sync::Arc;

/// Result alias used by public permalift API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: upload every new file under `root`, record each success
/// in the ledger, and publish the path manifest through `processor`.
///
/// Safe to re-run: files already in the ledger are skipped, and a run with
/// nothing to do returns the previously published receipt (or `None` if no
/// manifest was ever published) without touching the network. On ≥1 item
/// failure the manifest is not published and the error points at the on-disk
/// report; successes from the run stay in the ledger either way.
pub fn upload_folder(
    root: &Path,
    processor: Arc<dyn ItemProcessor>,
    oracle: &dyn PriceOracle,
    opts: &FolderOpts,
) -> Result<Option<UploadReceipt>> {
    let config_str = format!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
    debug!("{}", config_str);

    pipeline::orchestrator::upload_folder(root, processor, oracle, opts)
}
