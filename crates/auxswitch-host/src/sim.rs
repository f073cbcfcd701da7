//! In-memory host for tests and bench runs.
//!
//! Every piece of device state can be changed while the host is shared, so
//! tests can make a vendor service appear or vanish between two calls.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use auxswitch_binder::BinderRef;
use tracing::debug;

use crate::error::{HostError, Result};
use crate::host::{BindToken, ConnectionSink, Host};
use crate::intent::{ComponentName, Intent};
use crate::object::ControlObject;

/// How the simulated platform answers a bind request.
#[derive(Clone)]
pub enum BindBehavior {
    /// Connect immediately with this binder.
    Connect(BinderRef),
    /// Connect, but hand back a null binder.
    ConnectNull,
    /// Report a null binding.
    NullBinding,
    /// Accept the bind but never connect.
    Never,
    /// Refuse the bind request.
    Reject,
    /// Connect with this binder after a delay.
    Delayed(Duration, BinderRef),
}

pub type StubFactory = Arc<dyn Fn(BinderRef) -> Option<Arc<dyn ControlObject>> + Send + Sync>;
pub type ClassFactory = Arc<dyn Fn() -> Arc<dyn ControlObject> + Send + Sync>;
pub type IntentHook = Arc<dyn Fn(&Intent) -> Result<()> + Send + Sync>;

#[derive(Clone, PartialEq, Eq, Hash)]
enum BindKey {
    Component(ComponentName),
    Action { action: String, package: String },
}

impl BindKey {
    fn for_intent(intent: &Intent) -> Option<Self> {
        if let Some(component) = &intent.component {
            return Some(BindKey::Component(component.clone()));
        }
        match (&intent.action, &intent.package) {
            (Some(action), Some(package)) => Some(BindKey::Action {
                action: action.clone(),
                package: package.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Default)]
struct SimState {
    debuggable: bool,
    packages: HashSet<String>,
    exported: HashSet<ComponentName>,
    classes: HashMap<String, ClassFactory>,
    bindings: HashMap<BindKey, BindBehavior>,
    registry: HashMap<String, BinderRef>,
    system_services: HashMap<String, Arc<dyn ControlObject>>,
    stubs: HashMap<String, StubFactory>,
    audio: HashMap<String, String>,
    start_hooks: Vec<IntentHook>,
    broadcast_hooks: Vec<IntentHook>,
    started: Vec<Intent>,
    broadcasts: Vec<Intent>,
    live: HashSet<u64>,
    parked: HashMap<u64, ConnectionSink>,
}

/// A scriptable [`Host`] that keeps all device state in memory.
pub struct SimHost {
    package: String,
    state: Mutex<SimState>,
    next_token: AtomicU64,
    binds: AtomicUsize,
    unbinds: AtomicUsize,
}

impl SimHost {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            state: Mutex::new(SimState::default()),
            next_token: AtomicU64::new(1),
            binds: AtomicUsize::new(0),
            unbinds: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_debuggable(&self, debuggable: bool) {
        self.state().debuggable = debuggable;
    }

    pub fn install_package(&self, package: &str) {
        self.state().packages.insert(package.to_string());
    }

    pub fn remove_package(&self, package: &str) {
        self.state().packages.remove(package);
    }

    pub fn export_service(&self, component: ComponentName) {
        self.state().exported.insert(component);
    }

    pub fn add_class(&self, class: &str, factory: ClassFactory) {
        self.state().classes.insert(class.to_string(), factory);
    }

    pub fn on_bind_component(&self, component: ComponentName, behavior: BindBehavior) {
        self.state()
            .bindings
            .insert(BindKey::Component(component), behavior);
    }

    pub fn on_bind_action(&self, action: &str, package: &str, behavior: BindBehavior) {
        self.state().bindings.insert(
            BindKey::Action {
                action: action.to_string(),
                package: package.to_string(),
            },
            behavior,
        );
    }

    pub fn register_service(&self, name: &str, binder: BinderRef) {
        self.state().registry.insert(name.to_string(), binder);
    }

    pub fn unregister_service(&self, name: &str) {
        self.state().registry.remove(name);
    }

    pub fn add_system_service(&self, name: &str, object: Arc<dyn ControlObject>) {
        self.state()
            .system_services
            .insert(name.to_string(), object);
    }

    pub fn add_stub(&self, stub: &str, factory: StubFactory) {
        self.state().stubs.insert(stub.to_string(), factory);
    }

    pub fn set_audio_parameter(&self, key: &str, value: &str) {
        self.state()
            .audio
            .insert(key.to_string(), value.to_string());
    }

    /// Run `hook` for every `start_service` call (before it is recorded).
    pub fn on_start_service(&self, hook: IntentHook) {
        self.state().start_hooks.push(hook);
    }

    /// Run `hook` for every `send_broadcast` call.
    pub fn on_broadcast(&self, hook: IntentHook) {
        self.state().broadcast_hooks.push(hook);
    }

    /// Number of accepted bind requests.
    pub fn bind_count(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    /// Number of released bindings.
    pub fn unbind_count(&self) -> usize {
        self.unbinds.load(Ordering::SeqCst)
    }

    /// Bindings accepted but not yet released.
    pub fn live_bindings(&self) -> usize {
        self.state().live.len()
    }

    pub fn started_services(&self) -> Vec<Intent> {
        self.state().started.clone()
    }

    pub fn broadcasts(&self) -> Vec<Intent> {
        self.state().broadcasts.clone()
    }

    fn run_hooks(hooks: Vec<IntentHook>, intent: &Intent) -> Result<()> {
        for hook in hooks {
            hook(intent)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SimHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimHost")
            .field("package", &self.package)
            .field("binds", &self.bind_count())
            .field("unbinds", &self.unbind_count())
            .finish()
    }
}

impl Host for SimHost {
    fn package_name(&self) -> &str {
        &self.package
    }

    fn is_debuggable(&self) -> bool {
        self.state().debuggable
    }

    fn has_package(&self, package: &str) -> bool {
        self.state().packages.contains(package)
    }

    fn has_service(&self, component: &ComponentName) -> bool {
        self.state().exported.contains(component)
    }

    fn resolve_service(&self, intent: &Intent) -> bool {
        let Some(key) = BindKey::for_intent(intent) else {
            return false;
        };
        let state = self.state();
        state.bindings.contains_key(&key)
            || matches!(&key, BindKey::Component(c) if state.exported.contains(c))
    }

    fn class_exists(&self, class: &str) -> bool {
        self.state().classes.contains_key(class)
    }

    fn bind_service(&self, intent: &Intent, sink: ConnectionSink) -> Result<BindToken> {
        let behavior = BindKey::for_intent(intent)
            .and_then(|key| self.state().bindings.get(&key).cloned());
        let behavior = match behavior {
            None | Some(BindBehavior::Reject) => {
                return Err(HostError::BindRejected(intent.to_string()));
            }
            Some(behavior) => behavior,
        };

        let id = self.next_token.fetch_add(1, Ordering::SeqCst);
        self.binds.fetch_add(1, Ordering::SeqCst);
        self.state().live.insert(id);
        debug!(%intent, token = id, "sim bind accepted");

        match behavior {
            BindBehavior::Connect(binder) => sink.connected(Some(binder)),
            BindBehavior::ConnectNull => sink.connected(None),
            BindBehavior::NullBinding => sink.null_binding(),
            BindBehavior::Never => {
                self.state().parked.insert(id, sink);
            }
            BindBehavior::Delayed(delay, binder) => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    sink.connected(Some(binder));
                });
            }
            BindBehavior::Reject => {}
        }

        Ok(BindToken::new(id))
    }

    fn unbind_service(&self, token: BindToken) {
        self.unbinds.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.live.remove(&token.id());
        state.parked.remove(&token.id());
    }

    fn start_service(&self, intent: &Intent) -> Result<()> {
        let (exists, hooks) = {
            let state = self.state();
            let exists = intent
                .component
                .as_ref()
                .is_some_and(|c| state.exported.contains(c));
            (exists, state.start_hooks.clone())
        };
        if !exists {
            return Err(HostError::NotFound(intent.to_string()));
        }
        Self::run_hooks(hooks, intent)?;
        self.state().started.push(intent.clone());
        Ok(())
    }

    fn send_broadcast(&self, intent: &Intent) -> Result<()> {
        let hooks = self.state().broadcast_hooks.clone();
        Self::run_hooks(hooks, intent)?;
        self.state().broadcasts.push(intent.clone());
        Ok(())
    }

    fn service_registry_lookup(&self, name: &str) -> Option<BinderRef> {
        self.state().registry.get(name).cloned()
    }

    fn system_service(&self, name: &str) -> Option<Arc<dyn ControlObject>> {
        self.state().system_services.get(name).cloned()
    }

    fn interface_from_binder(
        &self,
        binder: BinderRef,
        stub: &str,
    ) -> Option<Arc<dyn ControlObject>> {
        let factory = self.state().stubs.get(stub).cloned()?;
        factory(binder)
    }

    fn instantiate(&self, class: &str) -> Result<Arc<dyn ControlObject>> {
        let factory = self
            .state()
            .classes
            .get(class)
            .cloned()
            .ok_or_else(|| HostError::NotFound(class.to_string()))?;
        Ok(factory())
    }

    fn audio_parameters(&self, keys: &str) -> Option<String> {
        let state = self.state();
        let pairs: Vec<String> = keys
            .split(';')
            .filter_map(|key| state.audio.get(key).map(|v| format!("{key}={v}")))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join(";"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_presence_can_change() {
        let host = SimHost::new("test.app");
        assert!(!host.has_package("com.syu.ms"));
        host.install_package("com.syu.ms");
        assert!(host.has_package("com.syu.ms"));
        host.remove_package("com.syu.ms");
        assert!(!host.has_package("com.syu.ms"));
    }

    #[test]
    fn start_service_requires_exported_component() {
        let host = SimHost::new("test.app");
        let component = ComponentName::new("com.example", "com.example.Svc");
        let intent = Intent::component(component.clone()).with_action("open");

        assert!(matches!(
            host.start_service(&intent),
            Err(HostError::NotFound(_))
        ));

        host.export_service(component);
        host.start_service(&intent).unwrap();
        assert_eq!(host.started_services().len(), 1);
    }

    #[test]
    fn audio_parameters_join_known_keys() {
        let host = SimHost::new("test.app");
        host.set_audio_parameter("av_channel", "line");
        assert_eq!(
            host.audio_parameters("av_channel").as_deref(),
            Some("av_channel=line")
        );
        assert_eq!(host.audio_parameters("other"), None);
    }

    #[test]
    fn broadcast_hooks_see_extras() {
        let host = SimHost::new("test.app");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        host.on_broadcast(Arc::new(move |intent: &Intent| {
            sink.lock()
                .unwrap()
                .push(intent.extra("parameter").unwrap_or_default().to_string());
            Ok::<(), HostError>(())
        }));

        host.send_broadcast(&Intent::action("evt").with_extra("parameter", "x=1"))
            .unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), ["x=1".to_string()]);
        assert_eq!(host.broadcasts().len(), 1);
    }
}
