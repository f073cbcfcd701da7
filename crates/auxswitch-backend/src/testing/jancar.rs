use std::sync::{Arc, Mutex};

use auxswitch_binder::{Binder, BinderError, BinderRef, Parcel, INTERFACE_TRANSACTION};
use auxswitch_host::sim::{BindBehavior, SimHost};
use auxswitch_host::{ComponentName, HostError, Intent};

use super::{lock, reply, DeviceOptions};
use crate::vendor::jancar::{
    ACTION_CLOSE_AV_IN, ACTION_IVI_AVIN, ACTION_OPEN_AV_IN, ACTION_QUIT_AV_IN, AVIN_SERVICE_CLASS,
    AV_ID_AUX, BACKCAR_PACKAGE, IVI_PACKAGE, TOKEN_AVIN, TX_CLOSE, TX_IS_OPEN, TX_OPEN,
};

#[derive(Debug)]
struct State {
    open: bool,
    stuck: bool,
    helper_actions: Vec<String>,
    binder_calls: Vec<u32>,
    callback_descriptor: Option<String>,
}

impl State {
    fn set_open(&mut self, open: bool) {
        if !self.stuck {
            self.open = open;
        }
    }
}

/// Simulated Autochips backcar helper service plus the IVI `IAVIn` service.
#[derive(Debug, Clone)]
pub struct JancarDevice {
    state: Arc<Mutex<State>>,
    helper_exported: bool,
    helper_blocked: bool,
    ivi: bool,
    ivi_hangs: bool,
}

impl JancarDevice {
    pub fn new(options: DeviceOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                open: options.aux_active,
                stuck: options.stuck,
                helper_actions: Vec::new(),
                binder_calls: Vec::new(),
                callback_descriptor: None,
            })),
            helper_exported: true,
            helper_blocked: false,
            ivi: true,
            ivi_hangs: false,
        }
    }

    /// The helper service is exported but starting it is refused.
    pub fn with_helper_blocked(mut self) -> Self {
        self.helper_blocked = true;
        self
    }

    /// Only the IVI service exists.
    pub fn without_helper(mut self) -> Self {
        self.helper_exported = false;
        self
    }

    /// The IVI service accepts binds but never connects.
    pub fn with_hanging_ivi(mut self) -> Self {
        self.ivi_hangs = true;
        self
    }

    pub fn install(&self, host: &SimHost) {
        let helper = ComponentName::new(BACKCAR_PACKAGE, AVIN_SERVICE_CLASS);
        if self.helper_exported {
            host.install_package(BACKCAR_PACKAGE);
            host.export_service(helper.clone());

            let state = self.state.clone();
            let blocked = self.helper_blocked;
            host.on_start_service(Arc::new(move |intent: &Intent| {
                if intent.component.as_ref() != Some(&helper) {
                    return Ok(());
                }
                if blocked {
                    return Err(HostError::Denied(intent.to_string()));
                }
                let action = intent.action.clone().unwrap_or_default();
                let mut state = lock(&state);
                match action.as_str() {
                    ACTION_OPEN_AV_IN => state.set_open(true),
                    ACTION_CLOSE_AV_IN | ACTION_QUIT_AV_IN => state.set_open(false),
                    _ => {}
                }
                state.helper_actions.push(action);
                Ok(())
            }));
        }

        if self.ivi {
            host.install_package(IVI_PACKAGE);
            let behavior = if self.ivi_hangs {
                BindBehavior::Never
            } else {
                let avin: BinderRef = Arc::new(AvIn {
                    state: self.state.clone(),
                });
                BindBehavior::Connect(avin)
            };
            host.on_bind_action(ACTION_IVI_AVIN, IVI_PACKAGE, behavior);
        }
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    pub fn helper_actions(&self) -> Vec<String> {
        lock(&self.state).helper_actions.clone()
    }

    /// `IAVIn` transaction codes received, excluding `isOpen`.
    pub fn binder_calls(&self) -> Vec<u32> {
        lock(&self.state).binder_calls.clone()
    }

    /// Descriptor reported by the callback passed to `IAVIn.open`.
    pub fn callback_descriptor(&self) -> Option<String> {
        lock(&self.state).callback_descriptor.clone()
    }
}

struct AvIn {
    state: Arc<Mutex<State>>,
}

impl AvIn {
    fn callback_descriptor(callback: &dyn Binder) -> Option<String> {
        let reply = callback
            .transact(INTERFACE_TRANSACTION, &Parcel::new(), 0)
            .ok()??;
        reply.reader().read_string().ok()?
    }
}

impl Binder for AvIn {
    fn descriptor(&self) -> Option<&str> {
        Some(TOKEN_AVIN)
    }

    fn transact(
        &self,
        code: u32,
        data: &Parcel,
        _flags: u32,
    ) -> auxswitch_binder::Result<Option<Parcel>> {
        let mut reader = data.reader();
        reader.enforce_interface(TOKEN_AVIN)?;
        let av_id = reader.read_i32()?;
        if av_id != AV_ID_AUX {
            let mut parcel = Parcel::new();
            parcel.write_exception(-3, "unknown av id");
            return Ok(Some(parcel));
        }

        match code {
            TX_OPEN => {
                let callback = reader.read_strong_binder()?;
                let _package = reader.read_string()?;
                let descriptor = callback.as_deref().and_then(Self::callback_descriptor);
                let mut state = lock(&self.state);
                state.callback_descriptor = descriptor;
                state.binder_calls.push(code);
                state.set_open(true);
                reply(|_| {})
            }
            TX_CLOSE => {
                let mut state = lock(&self.state);
                state.binder_calls.push(code);
                state.set_open(false);
                reply(|_| {})
            }
            TX_IS_OPEN => {
                let open = lock(&self.state).open;
                reply(|p| p.write_i32(i32::from(open)))
            }
            other => Err(BinderError::UnknownTransaction(other)),
        }
    }
}

