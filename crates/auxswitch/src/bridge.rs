//! Method-call bridge between an application and the selector.
//!
//! Calls arrive by name with a loosely typed argument map, run off the
//! caller's thread, and are answered exactly once with either a value or a
//! named error code. Nothing a backend does, panics included, escapes the
//! bridge as anything else.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use auxswitch_backend::{AuxError, AuxManager};
use auxswitch_host::Host;
use serde_json::Value;
use tracing::{debug, warn};

use crate::warmup::{NoWarmUp, WarmUp, WarmUpOnce};

pub const SWITCH_TO_AUX_FAILED: &str = "SWITCH_TO_AUX_FAILED";
pub const EXIT_AUX_FAILED: &str = "EXIT_AUX_FAILED";
pub const IS_CURRENT_INPUT_AUX_FAILED: &str = "IS_CURRENT_INPUT_AUX_FAILED";

/// Argument carrying the per-call timeout in milliseconds.
pub const TIMEOUT_ARG: &str = "timeoutMs";

/// One named call with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Value::Null,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.arguments = serde_json::json!({ TIMEOUT_ARG: timeout_ms });
        self
    }

    /// The `timeoutMs` argument, or `default` when absent or not a number.
    /// Negative values count as zero.
    pub fn timeout(&self, default: Duration) -> Duration {
        let Some(raw) = self.arguments.get(TIMEOUT_ARG) else {
            return default;
        };
        let millis = raw
            .as_u64()
            .or_else(|| raw.as_i64().map(|v| v.max(0) as u64))
            .or_else(|| {
                raw.as_f64()
                    .filter(|v| v.is_finite())
                    .map(|v| v.max(0.0) as u64)
            });
        millis.map_or(default, Duration::from_millis)
    }
}

/// A failed call, as the application sees it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// No operation has this name.
    #[error("method not implemented: {0}")]
    NotImplemented(String),

    /// The operation failed; `code` names the operation.
    #[error("{code}: {message}")]
    Failed { code: &'static str, message: String },
}

impl BridgeError {
    pub fn code(&self) -> Option<&'static str> {
        match self {
            BridgeError::NotImplemented(_) => None,
            BridgeError::Failed { code, .. } => Some(code),
        }
    }
}

pub type Reply = Result<Value, BridgeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    IsSupported,
    GetBackend,
    SwitchToAux,
    ExitAux,
    IsCurrentInputAux,
}

impl Operation {
    fn parse(method: &str) -> Option<Self> {
        match method {
            "isSupported" => Some(Operation::IsSupported),
            "getBackend" => Some(Operation::GetBackend),
            "switchToAux" => Some(Operation::SwitchToAux),
            "exitAux" => Some(Operation::ExitAux),
            "isCurrentInputAux" => Some(Operation::IsCurrentInputAux),
            _ => None,
        }
    }

    /// Answer given when the operation itself blew up. The two discovery
    /// calls degrade to "nothing supported"; the rest report their code.
    fn on_panic(self, message: String) -> Reply {
        match self {
            Operation::IsSupported => Ok(Value::Bool(false)),
            Operation::GetBackend => Ok(Value::Null),
            _ => Err(self.failed(message)),
        }
    }

    fn failed(self, message: String) -> BridgeError {
        let (code, fallback) = match self {
            Operation::ExitAux => (EXIT_AUX_FAILED, "Failed to exit aux input"),
            Operation::IsCurrentInputAux => {
                (IS_CURRENT_INPUT_AUX_FAILED, "Failed to query current input")
            }
            _ => (SWITCH_TO_AUX_FAILED, "Failed to switch to aux input"),
        };
        let message = if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        };
        BridgeError::Failed { code, message }
    }

    fn complete(self, result: Result<bool, AuxError>) -> Reply {
        result
            .map(Value::Bool)
            .map_err(|err| self.failed(err.to_string()))
    }
}

struct Inner {
    manager: AuxManager,
    host: Arc<dyn Host>,
    warm_up: WarmUpOnce,
}

/// Dispatches named calls to an [`AuxManager`] against one host.
#[derive(Clone)]
pub struct AuxBridge {
    inner: Arc<Inner>,
}

impl AuxBridge {
    pub fn new(manager: AuxManager, host: Arc<dyn Host>) -> Self {
        Self::with_warm_up(manager, host, Arc::new(NoWarmUp))
    }

    /// A bridge that runs `warm_up` before its first call.
    pub fn with_warm_up(
        manager: AuxManager,
        host: Arc<dyn Host>,
        warm_up: Arc<dyn WarmUp>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                manager,
                host,
                warm_up: WarmUpOnce::new(warm_up),
            }),
        }
    }

    pub fn manager(&self) -> &AuxManager {
        &self.inner.manager
    }

    pub fn warmed_up(&self) -> bool {
        self.inner.warm_up.is_done()
    }

    /// Run `call` on the current thread. Blocks up to the call's timeout.
    pub fn dispatch(&self, call: &MethodCall) -> Reply {
        self.inner.warm_up.ensure();

        let Some(operation) = Operation::parse(&call.method) else {
            debug!(method = %call.method, "unknown bridge method");
            return Err(BridgeError::NotImplemented(call.method.clone()));
        };
        let timeout = call.timeout(self.inner.manager.default_timeout());
        debug!(method = %call.method, ?timeout, "bridge call");

        match catch_unwind(AssertUnwindSafe(|| self.run(operation, timeout))) {
            Ok(reply) => reply,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(method = %call.method, %message, "bridge call panicked");
                operation.on_panic(message)
            }
        }
    }

    fn run(&self, operation: Operation, timeout: Duration) -> Reply {
        let manager = &self.inner.manager;
        let host = self.inner.host.as_ref();
        match operation {
            Operation::IsSupported => Ok(Value::Bool(manager.is_supported(host))),
            Operation::GetBackend => Ok(manager.backend_id(host).map_or(Value::Null, Value::from)),
            Operation::SwitchToAux => operation.complete(manager.switch_to_aux(host, timeout)),
            Operation::ExitAux => operation.complete(manager.exit_aux(host, timeout)),
            Operation::IsCurrentInputAux => {
                operation.complete(manager.is_current_input_aux(host, timeout))
            }
        }
    }

    /// Run `call` on a worker thread and hand the result to `reply`, which
    /// is invoked exactly once.
    pub fn call<F>(&self, call: MethodCall, reply: F) -> JoinHandle<()>
    where
        F: FnOnce(Reply) + Send + 'static,
    {
        let bridge = self.clone();
        thread::spawn(move || reply(bridge.dispatch(&call)))
    }

    /// Run `call` on the tokio blocking pool.
    #[cfg(feature = "async")]
    pub async fn call_async(&self, call: MethodCall) -> Reply {
        let bridge = self.clone();
        let operation = Operation::parse(&call.method);
        match tokio::task::spawn_blocking(move || bridge.dispatch(&call)).await {
            Ok(reply) => reply,
            Err(err) => match operation {
                Some(operation) => operation.on_panic(err.to_string()),
                None => Err(BridgeError::NotImplemented(err.to_string())),
            },
        }
    }
}

impl std::fmt::Debug for AuxBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuxBridge")
            .field("manager", &self.inner.manager)
            .field("warmed_up", &self.warmed_up())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    use auxswitch_backend::testing::{DeviceOptions, QfDevice};
    use auxswitch_backend::{AuxBackend, ManagerConfig};
    use auxswitch_host::sim::SimHost;

    use super::*;

    fn bridge_for(host: SimHost) -> AuxBridge {
        AuxBridge::new(AuxManager::default(), Arc::new(host))
    }

    fn qf_host() -> (SimHost, QfDevice) {
        let host = SimHost::new("com.example.dashcam");
        let device = QfDevice::new(DeviceOptions::default());
        device.install(&host);
        (host, device)
    }

    #[test]
    fn timeout_argument_defaults() {
        let default = Duration::from_millis(1500);
        assert_eq!(MethodCall::new("switchToAux").timeout(default), default);
        assert_eq!(
            MethodCall::new("switchToAux").with_timeout_ms(250).timeout(default),
            Duration::from_millis(250)
        );

        let mut call = MethodCall::new("switchToAux");
        call.arguments = serde_json::json!({ "timeoutMs": -4 });
        assert_eq!(call.timeout(default), Duration::ZERO);
        call.arguments = serde_json::json!({ "timeoutMs": 99.9 });
        assert_eq!(call.timeout(default), Duration::from_millis(99));
        call.arguments = serde_json::json!({ "timeoutMs": "soon" });
        assert_eq!(call.timeout(default), default);
    }

    #[test]
    fn discovery_on_bare_device() {
        let bridge = bridge_for(SimHost::new("com.example.dashcam"));

        assert_eq!(
            bridge.dispatch(&MethodCall::new("isSupported")),
            Ok(Value::Bool(false))
        );
        assert_eq!(bridge.dispatch(&MethodCall::new("getBackend")), Ok(Value::Null));

        let err = bridge
            .dispatch(&MethodCall::new("switchToAux"))
            .expect_err("switch should fail");
        assert_eq!(err.code(), Some(SWITCH_TO_AUX_FAILED));
        assert!(err.to_string().contains("no supported head unit"));
    }

    #[test]
    fn each_operation_has_its_error_code() {
        let bridge = bridge_for(SimHost::new("com.example.dashcam"));
        for (method, code) in [
            ("switchToAux", SWITCH_TO_AUX_FAILED),
            ("exitAux", EXIT_AUX_FAILED),
            ("isCurrentInputAux", IS_CURRENT_INPUT_AUX_FAILED),
        ] {
            let err = bridge
                .dispatch(&MethodCall::new(method).with_timeout_ms(10))
                .expect_err("operation should fail on a bare device");
            assert_eq!(err.code(), Some(code), "{method}");
        }
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let bridge = bridge_for(SimHost::new("com.example.dashcam"));
        assert_eq!(
            bridge.dispatch(&MethodCall::new("reboot")),
            Err(BridgeError::NotImplemented("reboot".into()))
        );
    }

    #[test]
    fn round_trip_through_bridge() {
        let (host, device) = qf_host();
        let bridge = bridge_for(host);

        assert_eq!(
            bridge.dispatch(&MethodCall::new("getBackend")),
            Ok(Value::from("qf_mcu"))
        );
        let call = MethodCall::new("switchToAux").with_timeout_ms(300);
        assert_eq!(bridge.dispatch(&call), Ok(Value::Bool(true)));
        assert_eq!(
            bridge.dispatch(&MethodCall::new("isCurrentInputAux")),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            bridge.dispatch(&MethodCall::new("exitAux")),
            Ok(Value::Bool(true))
        );
        assert_eq!(device.sets().len(), 2);
    }

    #[test]
    fn call_replies_once_from_a_worker() {
        let (host, _device) = qf_host();
        let bridge = bridge_for(host);
        let (tx, rx) = mpsc::channel();
        let caller = thread::current().id();

        bridge
            .call(MethodCall::new("switchToAux"), move |reply| {
                tx.send((thread::current().id(), reply))
                    .expect("receiver should be alive");
            })
            .join()
            .expect("worker should not panic");

        let (worker, reply) = rx.recv().expect("reply should arrive");
        assert_ne!(worker, caller);
        assert_eq!(reply, Ok(Value::Bool(true)));
        assert!(rx.try_recv().is_err());
    }

    struct Exploding;

    impl AuxBackend for Exploding {
        fn id(&self) -> &'static str {
            "exploding"
        }

        fn is_supported(&self, _host: &dyn Host) -> bool {
            true
        }

        fn switch_to_aux(&self, _host: &dyn Host, _timeout: Duration) -> Result<bool, AuxError> {
            panic!("vendor service crashed")
        }

        fn is_current_input_aux(
            &self,
            _host: &dyn Host,
            _timeout: Duration,
        ) -> Result<bool, AuxError> {
            Err(AuxError::RemoteFault(String::new()))
        }
    }

    #[test]
    fn panics_become_error_codes() {
        let manager = AuxManager::with_backends(vec![Box::new(Exploding)], ManagerConfig::default());
        let bridge = AuxBridge::new(manager, Arc::new(SimHost::new("com.example.dashcam")));

        assert_eq!(
            bridge.dispatch(&MethodCall::new("switchToAux")),
            Err(BridgeError::Failed {
                code: SWITCH_TO_AUX_FAILED,
                message: "vendor service crashed".into(),
            })
        );
        assert_eq!(
            bridge.dispatch(&MethodCall::new("isCurrentInputAux")),
            Err(BridgeError::Failed {
                code: IS_CURRENT_INPUT_AUX_FAILED,
                message: "remote fault: ".into(),
            })
        );
    }

    struct CountingWarmUp(AtomicUsize);

    impl WarmUp for CountingWarmUp {
        fn warm_up(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn warm_up_runs_before_first_call_only() {
        let warm_up = Arc::new(CountingWarmUp(AtomicUsize::new(0)));
        let bridge = AuxBridge::with_warm_up(
            AuxManager::default(),
            Arc::new(SimHost::new("com.example.dashcam")),
            warm_up.clone(),
        );
        assert!(!bridge.warmed_up());

        bridge.dispatch(&MethodCall::new("isSupported")).ok();
        bridge.dispatch(&MethodCall::new("nope")).ok();
        assert!(bridge.warmed_up());
        assert_eq!(warm_up.0.load(Ordering::SeqCst), 1);
    }

    struct PanickingWarmUp;

    impl WarmUp for PanickingWarmUp {
        fn warm_up(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            panic!("audio focus lost")
        }
    }

    #[test]
    fn panicking_warm_up_still_replies() {
        let (host, _device) = qf_host();
        let bridge = AuxBridge::with_warm_up(
            AuxManager::default(),
            Arc::new(host),
            Arc::new(PanickingWarmUp),
        );
        let (tx, rx) = mpsc::channel();

        bridge
            .call(MethodCall::new("isSupported"), move |reply| {
                tx.send(reply).expect("receiver should be alive");
            })
            .join()
            .expect("worker should not panic");

        assert_eq!(rx.recv().expect("reply should arrive"), Ok(Value::Bool(true)));
        assert!(bridge.warmed_up());
        assert_eq!(
            bridge.dispatch(&MethodCall::new("switchToAux")),
            Ok(Value::Bool(true))
        );
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn call_async_uses_blocking_pool() {
        let (host, _device) = qf_host();
        let bridge = bridge_for(host);
        let reply = bridge.call_async(MethodCall::new("switchToAux")).await;
        assert_eq!(reply, Ok(Value::Bool(true)));
    }
}
