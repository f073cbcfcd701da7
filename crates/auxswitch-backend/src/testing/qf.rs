use std::sync::{Arc, Mutex};

use auxswitch_binder::BinderRef;
use auxswitch_host::sim::SimHost;
use auxswitch_host::{ControlObject, InvokeError, MethodSignature, Value, ValueKind};

use super::{find_method, lock, DeviceOptions, InertBinder};
use crate::vendor::qf::{
    CHANNEL_AUX, CHANNEL_MEDIA, MCU_STUB, PACKAGES, RPC_GET_CHANNEL, RPC_SET_CHANNEL,
    SERVICE_NAME,
};

/// Where the MCU manager is reachable from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// `getSystemService("mcu_service")`.
    SystemService,
    /// Registry binder wrapped by `IMcuManager$Stub.asInterface`.
    Registry,
}

#[derive(Debug)]
struct State {
    channel: u8,
    stuck: bool,
    sets: Vec<Value>,
}

/// Simulated QF MCU manager.
#[derive(Debug, Clone)]
pub struct QfDevice {
    state: Arc<Mutex<State>>,
    exposure: Exposure,
    setter: ValueKind,
    getter: bool,
}

impl QfDevice {
    pub fn new(options: DeviceOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                channel: if options.aux_active {
                    CHANNEL_AUX
                } else {
                    CHANNEL_MEDIA
                },
                stuck: options.stuck,
                sets: Vec::new(),
            })),
            exposure: Exposure::SystemService,
            setter: ValueKind::Byte,
            getter: true,
        }
    }

    pub fn with_exposure(mut self, exposure: Exposure) -> Self {
        self.exposure = exposure;
        self
    }

    /// Parameter kind `RPC_SetChannel` declares.
    pub fn with_setter(mut self, kind: ValueKind) -> Self {
        self.setter = kind;
        self
    }

    /// The manager lacks `RPC_GetChannel` and fails the shape check.
    pub fn without_getter(mut self) -> Self {
        self.getter = false;
        self
    }

    pub fn install(&self, host: &SimHost) {
        host.install_package(PACKAGES[0]);
        let mcu: Arc<dyn ControlObject> = Arc::new(McuManager {
            state: self.state.clone(),
            setter: self.setter,
            getter: self.getter,
        });
        match self.exposure {
            Exposure::SystemService => host.add_system_service(SERVICE_NAME, mcu),
            Exposure::Registry => {
                host.register_service(SERVICE_NAME, Arc::new(InertBinder));
                host.add_stub(MCU_STUB, Arc::new(move |_binder: BinderRef| Some(mcu.clone())));
            }
        }
    }

    pub fn channel(&self) -> u8 {
        lock(&self.state).channel
    }

    /// Every `RPC_SetChannel` argument received.
    pub fn sets(&self) -> Vec<Value> {
        lock(&self.state).sets.clone()
    }
}

struct McuManager {
    state: Arc<Mutex<State>>,
    setter: ValueKind,
    getter: bool,
}

impl ControlObject for McuManager {
    fn class_name(&self) -> &str {
        "android.qf.mcu.McuManager"
    }

    fn methods(&self) -> Vec<MethodSignature> {
        let mut methods = vec![MethodSignature::new(
            RPC_SET_CHANNEL,
            &[self.setter],
            ValueKind::Void,
        )];
        if self.getter {
            methods.push(MethodSignature::new(RPC_GET_CHANNEL, &[], ValueKind::Byte));
        }
        methods
    }

    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
        let methods = self.methods();
        let signature = find_method(&methods, method, args)?;
        let mut state = lock(&self.state);
        if signature.name == RPC_GET_CHANNEL {
            return Ok(Value::Byte(state.channel as i8));
        }

        let channel = args[0]
            .as_integer()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| InvokeError::IllegalArgument(format!("{:?}", args[0])))?;
        state.sets.push(args[0].clone());
        if !state.stuck {
            state.channel = channel;
        }
        Ok(Value::Void)
    }
}
