//! Manifest document: the published path → id map for one folder.
//!
//! Rebuilt from scratch on every run from the current ledger state, then
//! uploaded as one more item; its id is the folder's published root.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::ledger::LedgerEntry;
use crate::types::Tag;
use crate::utils::paths::ledger_key;

/// Format tag understood by the storage gateways.
pub const MANIFEST_FORMAT: &str = "arweave/paths";
/// Document schema version; fixed for the life of a ledger.
pub const MANIFEST_VERSION: &str = "0.1.0";
/// Content type the manifest is uploaded under.
pub const MANIFEST_CONTENT_TYPE: &str = "application/x.arweave-manifest+json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub manifest: String,
    pub version: String,
    pub paths: BTreeMap<String, ManifestPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<ManifestIndex>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPath {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIndex {
    pub path: String,
}

/// Build the manifest from a ledger snapshot.
///
/// Entries are taken in ledger order with last-write-wins on repeated paths;
/// entries whose path is in `gone` are dropped unless `retain_gone`; path
/// separators normalize to forward slashes, so no two keys collide.
pub fn build(
    entries: &[LedgerEntry],
    gone: &HashSet<String>,
    retain_gone: bool,
    index_file: Option<&str>,
) -> Manifest {
    let mut paths = BTreeMap::new();
    for entry in entries {
        let key = ledger_key(Path::new(&entry.path));
        if !retain_gone && gone.contains(&key) {
            continue;
        }
        paths.insert(key, ManifestPath { id: entry.id.clone() });
    }
    Manifest {
        manifest: MANIFEST_FORMAT.to_string(),
        version: MANIFEST_VERSION.to_string(),
        paths,
        index: index_file.map(|p| ManifestIndex {
            path: ledger_key(Path::new(p)),
        }),
    }
}

/// Serialize the manifest document as JSON at `path`.
pub fn write(manifest: &Manifest, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("create manifest at {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, manifest)
        .with_context(|| format!("serialize manifest to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush manifest at {}", path.display()))?;
    Ok(())
}

/// Tags for the manifest upload itself, with caller extras appended.
pub fn manifest_tags(extra: &[Tag]) -> Vec<Tag> {
    let mut tags = vec![
        Tag::new("Type", "manifest"),
        Tag::new("Content-Type", MANIFEST_CONTENT_TYPE),
    ];
    tags.extend_from_slice(extra);
    tags
}
