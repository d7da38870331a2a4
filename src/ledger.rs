//! Durable ledger of uploaded (path, id) pairs.
//!
//! The backing store is a two-column append-friendly text file with the fixed
//! header `path,id`. A missing, empty, or header-damaged file is treated as
//! empty and rewritten with a fresh header — loading never fails on damage.
//! Concurrent appends serialize through [`LedgerWriter`], a single owner
//! thread with a crossbeam mailbox; an append that returns `Ok` has been
//! flushed and synced, so a crash after N acked uploads leaves a ledger with
//! exactly those N records.

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crate::utils::paths::ledger_key;

/// Fixed two-column header of the backing file.
pub const LEDGER_HEADER: &str = "path,id";

/// One record: relative path (forward slashes) and the content id it uploaded as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub path: String,
    pub id: String,
}

/// Result of diffing the ledger against the paths currently on disk.
#[derive(Debug, Default)]
pub struct LedgerDiff {
    /// On disk but not in the ledger (needs uploading).
    pub added: Vec<String>,
    /// In the ledger but no longer on disk.
    pub gone: Vec<String>,
}

/// In-memory view of the backing file: raw entries in file order plus a
/// path → latest-id index. A path's effective value is its most recent record;
/// stale records are skipped at manifest-build time, not rewritten here.
pub struct Ledger {
    path: PathBuf,
    entries: Vec<LedgerEntry>,
    index: HashMap<String, String>,
}

impl Ledger {
    /// Load the ledger at `path`. Missing, empty, or header-damaged files are
    /// (re)initialized to a bare header; records are read fully into the
    /// index, last record winning for a repeated path.
    pub fn load(path: &Path) -> Result<Ledger> {
        let mut ledger = Ledger {
            path: path.to_path_buf(),
            entries: Vec::new(),
            index: HashMap::new(),
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ledger.rewrite_header()?;
                return Ok(ledger);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read ledger at {}", path.display()));
            }
        };

        let mut lines = content.lines();
        match lines.next() {
            Some(first) if first.trim_end() == LEDGER_HEADER => {}
            _ => {
                warn!("ledger at {} is empty or damaged; starting fresh", path.display());
                ledger.rewrite_header()?;
                return Ok(ledger);
            }
        }
        for line in lines {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            // ids never contain a comma; paths may, so split from the right.
            let Some((rel, id)) = line.rsplit_once(',') else {
                warn!("skipping malformed ledger record: {line}");
                continue;
            };
            if rel.is_empty() || id.is_empty() {
                warn!("skipping malformed ledger record: {line}");
                continue;
            }
            ledger.push_entry(ledger_key(Path::new(rel)), id.to_string());
        }
        debug!(
            "loaded {} ledger record(s) ({} live) from {}",
            ledger.entries.len(),
            ledger.index.len(),
            path.display()
        );
        Ok(ledger)
    }

    fn rewrite_header(&self) -> Result<()> {
        std::fs::write(&self.path, format!("{LEDGER_HEADER}\n"))
            .with_context(|| format!("initialize ledger at {}", self.path.display()))
    }

    fn push_entry(&mut self, path: String, id: String) {
        self.index.insert(path.clone(), id.clone());
        self.entries.push(LedgerEntry { path, id });
    }

    /// Path of the backing file.
    pub fn backing_path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Latest id recorded for `path`.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.index.get(path).map(String::as_str)
    }

    /// Raw records in file order (may contain stale duplicates).
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Live ledger keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Number of live (deduplicated) records.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Append one record durably: flushed and synced before this returns.
    pub fn append(&mut self, path: &str, id: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open ledger at {} for append", self.path.display()))?;
        writeln!(file, "{path},{id}")
            .with_context(|| format!("append ledger record for {path}"))?;
        file.sync_data()
            .with_context(|| format!("sync ledger at {}", self.path.display()))?;
        self.push_entry(path.to_string(), id.to_string());
        Ok(())
    }

    /// Diff against the set of ledger keys currently present on disk.
    /// Both sides sorted for deterministic output.
    pub fn diff(&self, current: &HashSet<String>) -> LedgerDiff {
        let mut added: Vec<String> = current
            .iter()
            .filter(|p| !self.index.contains_key(*p))
            .cloned()
            .collect();
        let mut gone: Vec<String> = self
            .index
            .keys()
            .filter(|p| !current.contains(*p))
            .cloned()
            .collect();
        added.sort();
        gone.sort();
        LedgerDiff { added, gone }
    }
}

/// Append request posted to the writer's mailbox.
struct AppendReq {
    path: String,
    id: String,
    ack: Sender<Result<()>>,
}

/// Clonable handle upload workers use to post appends.
#[derive(Clone)]
pub struct LedgerAppender {
    tx: Sender<AppendReq>,
}

impl LedgerAppender {
    /// Append one record and wait for the owner thread to make it durable.
    /// Returns only after the record is flushed; an error means the record may
    /// not be on disk and the caller must treat the item as failed.
    pub fn append(&self, path: &str, id: &str) -> Result<()> {
        let (ack_tx, ack_rx) = bounded(1);
        self.tx
            .send(AppendReq {
                path: path.to_string(),
                id: id.to_string(),
                ack: ack_tx,
            })
            .map_err(|_| anyhow!("ledger writer is gone"))?;
        ack_rx
            .recv()
            .map_err(|_| anyhow!("ledger writer dropped append ack"))?
    }
}

/// Sole owner of the mutable [`Ledger`] while a batch runs. Appends from any
/// number of workers serialize through its mailbox, so records never
/// interleave partial writes.
pub struct LedgerWriter {
    tx: Sender<AppendReq>,
    handle: JoinHandle<Ledger>,
}

impl LedgerWriter {
    pub fn spawn(mut ledger: Ledger) -> LedgerWriter {
        let (tx, rx): (Sender<AppendReq>, Receiver<AppendReq>) = unbounded();
        let handle = thread::spawn(move || {
            while let Ok(req) = rx.recv() {
                let res = ledger.append(&req.path, &req.id);
                let _ = req.ack.send(res);
            }
            ledger
        });
        LedgerWriter { tx, handle }
    }

    pub fn appender(&self) -> LedgerAppender {
        LedgerAppender {
            tx: self.tx.clone(),
        }
    }

    /// Drop the mailbox and return the final ledger state. Call after every
    /// appender clone is gone (workers joined), or this blocks.
    pub fn close(self) -> Result<Ledger> {
        drop(self.tx);
        self.handle
            .join()
            .map_err(|_| anyhow!("ledger writer thread panicked"))
    }
}
