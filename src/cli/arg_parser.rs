use clap::Parser;
use std::path::PathBuf;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Resumable folder uploader for content-addressed storage.
#[derive(Clone, Parser)]
#[command(name = "permalift")]
#[command(about = "Scan a folder against its upload ledger and report what a run would upload.")]
pub struct Cli {
    /// Folder to scan. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Path to the upload ledger. Default: `<DIR>-ledger.csv` next to DIR.
    #[arg(long, short)]
    pub ledger: Option<PathBuf>,

    /// Relative path to record as the manifest index (e.g. index.html).
    #[arg(long, short)]
    pub index_file: Option<String>,

    /// Upload concurrency and progress cadence.
    #[arg(long, short)]
    pub batch_size: Option<usize>,

    /// Keep previously uploaded but now deleted files in the manifest.
    #[arg(long, short = 'k', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub keep_deleted: Option<bool>,

    /// List each pending and gone path.
    #[arg(long, short = 'L', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub list: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Follow symbolic links.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Strict mode: fail on first walk error instead of skipping.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub strict: Option<bool>,
}
