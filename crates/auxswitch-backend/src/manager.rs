use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use auxswitch_host::Host;
use tracing::{debug, info, warn};

use crate::backend::AuxBackend;
use crate::config::ManagerConfig;
use crate::error::{AuxError, Result};
use crate::vendor::{standard_backends, DebugFake};

/// Probe-and-dispatch selector over a fixed, ordered backend list.
///
/// Every call probes the list afresh and dispatches to the first backend
/// whose probe succeeds; nothing about a previous selection is remembered.
pub struct AuxManager {
    backends: Vec<Box<dyn AuxBackend>>,
    config: ManagerConfig,
}

impl AuxManager {
    /// The standard backend list, plus the debug backend if configured.
    pub fn new(config: ManagerConfig) -> Self {
        let mut backends = standard_backends();
        if config.include_debug_backend {
            backends.push(Box::new(DebugFake::new()));
        }
        Self::with_backends(backends, config)
    }

    /// A selector over an explicit list, probed in the given order.
    pub fn with_backends(backends: Vec<Box<dyn AuxBackend>>, config: ManagerConfig) -> Self {
        debug!(
            backends = ?backends.iter().map(|b| b.id()).collect::<Vec<_>>(),
            "aux manager configured"
        );
        Self { backends, config }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn default_timeout(&self) -> Duration {
        self.config.default_timeout()
    }

    /// Ids of all configured backends, in probe order.
    pub fn backend_ids(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    /// First backend whose support probe succeeds.
    pub fn probe(&self, host: &dyn Host) -> Option<&dyn AuxBackend> {
        let found = self
            .backends
            .iter()
            .map(Box::as_ref)
            .find(|backend| probe_one(*backend, host));
        if found.is_none() {
            debug!("no backend supported");
        }
        found
    }

    /// Probe every backend, not just up to the first match. Diagnostic only.
    pub fn probe_all(&self, host: &dyn Host) -> Vec<(&'static str, bool)> {
        self.backends
            .iter()
            .map(|backend| (backend.id(), probe_one(backend.as_ref(), host)))
            .collect()
    }

    pub fn is_supported(&self, host: &dyn Host) -> bool {
        self.probe(host).is_some()
    }

    pub fn backend_id(&self, host: &dyn Host) -> Option<&'static str> {
        self.probe(host).map(|b| b.id())
    }

    fn select(&self, host: &dyn Host) -> Result<&dyn AuxBackend> {
        let backend = self.probe(host).ok_or_else(|| {
            AuxError::Unsupported("no supported head unit aux-in backend".into())
        })?;
        info!(backend = backend.id(), "selected backend");
        Ok(backend)
    }

    pub fn switch_to_aux(&self, host: &dyn Host, timeout: Duration) -> Result<bool> {
        self.select(host)?.switch_to_aux(host, timeout)
    }

    pub fn exit_aux(&self, host: &dyn Host, timeout: Duration) -> Result<bool> {
        self.select(host)?.exit_aux(host, timeout)
    }

    pub fn is_current_input_aux(&self, host: &dyn Host, timeout: Duration) -> Result<bool> {
        self.select(host)?.is_current_input_aux(host, timeout)
    }
}

/// A panicking probe counts as "not supported".
fn probe_one(backend: &dyn AuxBackend, host: &dyn Host) -> bool {
    match catch_unwind(AssertUnwindSafe(|| backend.is_supported(host))) {
        Ok(supported) => {
            debug!(backend = backend.id(), supported, "backend probed");
            supported
        }
        Err(_) => {
            warn!(backend = backend.id(), "backend probe panicked");
            false
        }
    }
}

impl Default for AuxManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl std::fmt::Debug for AuxManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuxManager")
            .field("backends", &self.backend_ids())
            .field("config", &self.config)
            .finish()
    }
}
