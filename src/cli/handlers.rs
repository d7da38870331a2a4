//! CLI command handler: preflight scan and report. Real uploads go through the
//! library with a network adapter wired in by the consuming program.

use anyhow::Result;
use log::debug;

use crate::Opts;
use crate::cli::arg_parser::Cli;
use crate::plan::plan_folder;
use crate::utils::progress::{create_counter, refresh_bar, update_progress_bar};
use crate::utils::setup_logging;
use crate::utils::toml_file::{apply_file_to_opts, load_permalift_toml};

/// Build Opts: defaults, then `.permalift.toml`, then CLI flags on top.
fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = load_permalift_toml(&cli.dir) {
        apply_file_to_opts(&file, &mut opts);
    }
    if let Some(ref ledger) = cli.ledger {
        opts.ledger_path = Some(ledger.clone());
    }
    if let Some(ref index_file) = cli.index_file {
        opts.index_file = Some(index_file.clone());
    }
    if let Some(batch_size) = cli.batch_size {
        opts.batch_size = batch_size;
    }
    if let Some(keep_deleted) = cli.keep_deleted {
        opts.keep_deleted = keep_deleted;
    }
    if !cli.exclude.is_empty() {
        opts.exclude = cli.exclude.clone();
    }
    if let Some(follow_links) = cli.follow_links {
        opts.follow_links = follow_links;
    }
    if let Some(strict) = cli.strict {
        opts.strict = strict;
    }
    if let Some(verbose) = cli.verbose {
        opts.verbose = verbose;
    }
    if let Some(list) = cli.list {
        opts.list_paths = list;
    }
    opts
}

/// Scan the folder against its ledger and report the pending upload plan.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli);
    setup_logging(opts.verbose);
    debug!("Scanning directory...");

    if opts.verbose {
        let bar = create_counter("Scanning");
        refresh_bar(&bar);
        // on_checked reports a running total; the bar wants deltas.
        let reported = std::sync::Mutex::new(0_usize);
        let on_checked = |n: usize| {
            let Ok(mut reported) = reported.lock() else {
                return;
            };
            let delta = n.saturating_sub(*reported);
            *reported = n;
            update_progress_bar(&bar, delta);
        };
        plan_folder(&cli.dir, &opts, Some(&on_checked))?;
    } else {
        plan_folder(&cli.dir, &opts, None)?;
    }
    Ok(())
}
