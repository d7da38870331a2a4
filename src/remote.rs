//! Interfaces to the storage service: item processing, price estimation, and
//! content-type tagging. Network-specific signing/wallet adapters implement
//! these traits; the pipeline never sees transport details.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::error::UploadFolderError;
use crate::types::{Tag, UploadReceipt};

/// Data handed to the [`ItemProcessor`] for one upload. A small closed set of
/// variants, decided once at the orchestrator boundary.
#[derive(Clone, Debug)]
pub enum ItemPayload {
    /// Stream the file at this path.
    File(PathBuf),
    /// Raw bytes already in memory.
    Bytes(Vec<u8>),
}

/// Turns one item into a signed transaction and submits it, returning the
/// remote content identifier.
///
/// Transport and validation errors surface as per-item failures in the batch
/// scheduler; retry policy, if any, belongs to the implementation.
pub trait ItemProcessor: Send + Sync {
    fn process(&self, payload: ItemPayload, tags: &[Tag]) -> Result<UploadReceipt>;
}

/// Price estimation for a byte count, in the network's base unit.
/// `price(0)` is the per-item base fee.
pub trait PriceOracle: Send + Sync {
    fn price(&self, byte_count: u64) -> Result<u128>;

    /// Unit symbol for human-readable estimates (e.g. "winston").
    fn base_symbol(&self) -> &str;
}

/// Content-Type tag for a file path, from its extension.
pub fn content_type_tag(path: &Path) -> Tag {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Tag::new("Content-Type", mime.essence_str())
}

/// Upload a single file with a Content-Type tag plus `extra` tags.
pub fn upload_file(
    processor: &dyn ItemProcessor,
    path: &Path,
    extra: &[Tag],
) -> Result<UploadReceipt> {
    let meta = std::fs::metadata(path).map_err(|source| UploadFolderError::Access {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_file() {
        bail!("not a regular file: {}", path.display());
    }
    let mut tags = vec![content_type_tag(path)];
    tags.extend_from_slice(extra);
    processor
        .process(ItemPayload::File(path.to_path_buf()), &tags)
        .with_context(|| format!("upload {}", path.display()))
}

/// Read a y/n confirmation from stdin. Default confirmer for the interactive
/// preflight when the caller supplies none.
pub fn stdin_confirmation(message: &str) -> bool {
    eprintln!("{message}");
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    line.trim().eq_ignore_ascii_case("y")
}
