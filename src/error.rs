//! Error taxonomy for a single pipeline invocation.
//!
//! Everything surfaces through [`anyhow::Error`]; callers that need to tell
//! outcomes apart downcast to [`UploadFolderError`]. Per-item upload errors
//! are never propagated individually: they aggregate into the on-disk error
//! report and [`UploadFolderError::ItemFailures`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadFolderError {
    /// Root path unreadable. Nothing has been touched.
    #[error("unable to access path: {path}")]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// User declined the interactive preflight. No side effects beyond the
    /// cost estimate already computed.
    #[error("upload not authorized")]
    ConfirmationDeclined,

    /// One or more items failed. Successes from this run are already durable
    /// in the ledger; the manifest was not published.
    #[error("{failed} upload error(s) detected - check {} for more information", .report.display())]
    ItemFailures { failed: usize, report: PathBuf },

    /// The manifest itself failed to upload. The ledger remains valid and is
    /// reused on the next run.
    #[error("failed to upload manifest: {0}")]
    ManifestPublish(anyhow::Error),

    /// Interrupted by the user. Completed items are recorded; the rest upload
    /// on re-run.
    #[error("upload cancelled; completed items were recorded, re-run to resume")]
    Cancelled,
}
