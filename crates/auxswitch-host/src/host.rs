use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;

use auxswitch_binder::BinderRef;

use crate::error::Result;
use crate::intent::{ComponentName, Intent};
use crate::object::ControlObject;

/// Opaque handle for one accepted bind request; released via
/// [`Host::unbind_service`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindToken(u64);

impl BindToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Outcome the platform posts for a bind request.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The service connected. `None` means it handed back a null binder.
    Connected(Option<BinderRef>),
    /// The service's bind hook returned no binding at all.
    NullBinding,
}

/// Single-slot delivery channel handed to [`Host::bind_service`].
///
/// Only the first event is kept; anything posted afterwards is dropped.
#[derive(Debug, Clone)]
pub struct ConnectionSink {
    tx: SyncSender<ConnectionEvent>,
}

impl ConnectionSink {
    pub(crate) fn channel() -> (Self, Receiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::sync_channel(1);
        (Self { tx }, rx)
    }

    /// Report a completed connection.
    pub fn connected(&self, binder: Option<BinderRef>) {
        let _ = self.tx.try_send(ConnectionEvent::Connected(binder));
    }

    /// Report that the service returned a null binding.
    pub fn null_binding(&self) {
        let _ = self.tx.try_send(ConnectionEvent::NullBinding);
    }
}

/// Everything a vendor backend may ask of the device platform.
///
/// Implementations must be callable from any worker thread. Calls that
/// report presence (`has_*`, `resolve_service`, `class_exists`) must not
/// block beyond a quick local lookup.
pub trait Host: Send + Sync {
    /// Package name of the calling application.
    fn package_name(&self) -> &str;

    /// Whether the calling application is a debuggable build.
    fn is_debuggable(&self) -> bool {
        false
    }

    /// Whether `package` is installed.
    fn has_package(&self, package: &str) -> bool;

    /// Whether `component` is a declared (exported) service.
    fn has_service(&self, component: &ComponentName) -> bool;

    /// Whether some installed service answers `intent`.
    fn resolve_service(&self, intent: &Intent) -> bool;

    /// Whether a framework class with this name can be loaded.
    fn class_exists(&self, class: &str) -> bool;

    /// Ask the platform to bind `intent`; the outcome arrives on `sink`.
    ///
    /// An `Ok` token means the request was accepted and must be released
    /// with [`Host::unbind_service`], whether or not it ever connects.
    fn bind_service(&self, intent: &Intent, sink: ConnectionSink) -> Result<BindToken>;

    /// Release a binding obtained from [`Host::bind_service`].
    fn unbind_service(&self, token: BindToken);

    /// Start (or deliver a command to) a service.
    fn start_service(&self, intent: &Intent) -> Result<()>;

    /// Send a broadcast.
    fn send_broadcast(&self, intent: &Intent) -> Result<()>;

    /// Look up a binder in the well-known service registry.
    fn service_registry_lookup(&self, name: &str) -> Option<BinderRef>;

    /// Resolve a named system service to a control object.
    fn system_service(&self, name: &str) -> Option<Arc<dyn ControlObject>>;

    /// Wrap a raw binder with the proxy produced by the vendor's `stub` class.
    fn interface_from_binder(&self, binder: BinderRef, stub: &str)
        -> Option<Arc<dyn ControlObject>>;

    /// Construct a framework class through its no-argument constructor.
    fn instantiate(&self, class: &str) -> Result<Arc<dyn ControlObject>>;

    /// Query audio HAL parameters (`key=value;key=value`).
    fn audio_parameters(&self, keys: &str) -> Option<String>;
}
