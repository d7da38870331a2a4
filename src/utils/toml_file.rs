//! Load `.permalift.toml` from a directory (CLI only). Lib does not use this;
//! the consuming program injects config via FolderOpts.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Opts;

#[derive(Debug, Deserialize)]
pub(crate) struct PermaliftToml {
    #[serde(default)]
    settings: UploadSection,
}

#[derive(Debug, Default, Deserialize)]
struct UploadSection {
    ledger: Option<String>,
    index_file: Option<String>,
    batch_size: Option<usize>,
    keep_deleted: Option<bool>,
    exclude: Option<Vec<String>>,
    follow_links: Option<bool>,
    strict: Option<bool>,
    verbose: Option<bool>,
    list: Option<bool>,
}

/// Load `.permalift.toml` from `dir` if present. Returns None if file missing or unreadable. CLI only.
pub(crate) fn load_permalift_toml(dir: &Path) -> Option<PermaliftToml> {
    let path = dir.join(".permalift.toml");
    let s = std::fs::read_to_string(&path).ok()?;
    toml::from_str(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $file_field:ident => $opts_field:ident) => {
        if let Some(v) = $section.$file_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only set fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_opts(file: &PermaliftToml, opts: &mut Opts) {
    let s = &file.settings;
    if let Some(ref p) = s.ledger {
        opts.ledger_path = Some(PathBuf::from(p));
    }
    if let Some(ref p) = s.index_file {
        opts.index_file = Some(p.clone());
    }
    if let Some(ref v) = s.exclude {
        opts.exclude = v.clone();
    }
    apply_file_opt!(s, opts, batch_size => batch_size);
    apply_file_opt!(s, opts, keep_deleted => keep_deleted);
    apply_file_opt!(s, opts, follow_links => follow_links);
    apply_file_opt!(s, opts, strict => strict);
    apply_file_opt!(s, opts, verbose => verbose);
    apply_file_opt!(s, opts, list => list_paths);
}
