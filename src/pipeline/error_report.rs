//! On-disk report for failed batch items.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::types::UploadFailure;

/// Append a timestamped batch header and one line per failure. The file
/// accumulates across runs; each batch gets its own header.
pub fn write_error_report(path: &Path, failures: &[UploadFailure]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open error report at {}", path.display()))?;
    writeln!(
        file,
        "Errors from upload at {}:",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S %z")
    )?;
    for failure in failures {
        writeln!(file, "{}: {:#}", failure.item.rel_path, failure.error)?;
    }
    file.flush()
        .with_context(|| format!("flush error report at {}", path.display()))?;
    Ok(())
}
