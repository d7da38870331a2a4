//! Pipeline components: scan (walk + sift), batch scheduler, error report,
//! and the orchestrator that strings them together.

pub mod context;
pub mod error_report;
pub mod orchestrator;
pub mod scan;
pub mod scheduler;
pub mod sift;
pub mod walk;

pub use context::{ScanChannels, ScanContext, create_scan_channels};
pub use error_report::write_error_report;
pub use orchestrator::upload_folder;
pub use scan::{FolderScan, ScanOpts, scan_folder};
pub use scheduler::{BatchOutcome, run_batch};
pub use sift::{FileCheck, spawn_sift_workers};
pub use walk::{run_walk_loop, spawn_walk_thread};
