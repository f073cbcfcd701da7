//! Once-per-process warm-up.
//!
//! Some head units only route aux-in to applications they consider audio
//! capable. The embedding application registers as such (typically by
//! taking transient audio focus and rendering about a second of silence)
//! before the first switch attempt.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Once};

use tracing::{debug, warn};

/// Work done once before the first dispatched call.
///
/// Failures and panics are logged and never block the call that triggered
/// the warm-up.
pub trait WarmUp: Send + Sync {
    fn warm_up(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A warm-up that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWarmUp;

impl WarmUp for NoWarmUp {
    fn warm_up(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Runs a [`WarmUp`] at most once, however many threads ask.
///
/// Callers racing the first run wait for it to finish.
pub(crate) struct WarmUpOnce {
    once: Once,
    warm_up: Arc<dyn WarmUp>,
}

impl WarmUpOnce {
    pub(crate) fn new(warm_up: Arc<dyn WarmUp>) -> Self {
        Self {
            once: Once::new(),
            warm_up,
        }
    }

    pub(crate) fn ensure(&self) {
        self.once.call_once(|| {
            debug!("running warm-up");
            match catch_unwind(AssertUnwindSafe(|| self.warm_up.warm_up())) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "warm-up failed"),
                Err(_) => warn!("warm-up panicked"),
            }
        });
    }

    pub(crate) fn is_done(&self) -> bool {
        self.once.is_completed()
    }
}
