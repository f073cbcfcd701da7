use std::time::Duration;

use auxswitch_host::Host;

use crate::error::{AuxError, Result};

/// One vendor-specific way of driving a head unit's aux-in input.
///
/// Implementations are immutable once built. All operations block the
/// calling thread for at most about `timeout` (or an internal floor when
/// `timeout` is tiny) and release every connection they open before
/// returning.
pub trait AuxBackend: Send + Sync {
    /// Stable short identifier, unique across backends.
    fn id(&self) -> &'static str;

    /// Whether this backend applies to the current device.
    ///
    /// Never fails: any error while probing means "not supported".
    fn is_supported(&self, host: &dyn Host) -> bool;

    /// Switch to aux-in. `Ok(true)` means aux was observed active, not just
    /// that commands went out.
    fn switch_to_aux(&self, host: &dyn Host, timeout: Duration) -> Result<bool>;

    /// Whether the head unit's current input is aux-in.
    fn is_current_input_aux(&self, host: &dyn Host, timeout: Duration) -> Result<bool>;

    /// Leave aux-in. `Ok(true)` means aux was observed inactive.
    fn exit_aux(&self, host: &dyn Host, timeout: Duration) -> Result<bool> {
        let _ = (host, timeout);
        Err(AuxError::Unsupported(format!(
            "{} has no exit operation",
            self.id()
        )))
    }
}

impl std::fmt::Debug for dyn AuxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AuxBackend").field(&self.id()).finish()
    }
}
