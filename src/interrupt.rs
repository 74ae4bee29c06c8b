//! Process-wide interrupt flag set by Ctrl-C

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{self, Result};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Install the Ctrl-C handler
///
/// The handler only sets the flag; work in progress is unwound by the caller
/// at its next check so that backup guards run their restore.
pub fn install() -> Result<()> {
    ctrlc::set_handler(|| {
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            // Second Ctrl-C: stop waiting for a clean unwind
            std::process::exit(130);
        }
    })
    .map_err(|e| error::io_error(format!("failed to install interrupt handler: {e}")))
}

pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Set the flag as the handler would
pub fn trigger() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

pub fn reset() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_trigger_and_reset() {
        reset();
        assert!(!is_interrupted());
        trigger();
        assert!(is_interrupted());
        reset();
        assert!(!is_interrupted());
    }
}
