//! Process-wide abort flag, set from Ctrl-C.
//!
//! Workers check the flag before starting a new item; in-flight uploads finish
//! naturally and everything already acked to the ledger stays durable.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};

static ABORT_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Shared abort flag; the Ctrl-C handler is installed on first call.
/// One handler per process, so repeated pipeline invocations reuse the same
/// flag. Callers reset it at the start of a run.
pub fn abort_flag() -> Arc<AtomicBool> {
    Arc::clone(ABORT_FLAG.get_or_init(|| {
        let flag = Arc::new(AtomicBool::new(false));
        let handler_flag = Arc::clone(&flag);
        if let Err(e) = ctrlc::set_handler(move || {
            handler_flag.store(true, std::sync::atomic::Ordering::Relaxed);
        }) {
            log::warn!("Could not install Ctrl-C handler: {}", e);
        }
        flag
    }))
}
