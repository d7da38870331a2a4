pub mod abort;
pub mod config;
pub mod logger;
pub mod paths;
pub mod progress;
pub(crate) mod toml_file;

pub use abort::abort_flag;
pub use config::*;
pub use logger::{Colors, setup_logging};
pub use paths::{glob_match, ledger_key, path_relative_to, should_include_in_walk};
