#![forbid(unsafe_code)]

//! Cooperative interrupt flag shared between a trial loop and whoever
//! wants to abort it (a signal handler, a watchdog thread, a test).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Raised when a trial loop observes the interrupt flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("run interrupted")]
pub struct Interrupted;

/// Clonable handle; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    raised: Arc<AtomicBool>,
}

impl InterruptFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` once the flag has been raised.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_raised() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}
