use std::sync::{Arc, Mutex};

use auxswitch_binder::{Binder, BinderError, BinderRef, Parcel};
use auxswitch_host::sim::{BindBehavior, SimHost};

use super::{lock, reply, DeviceOptions};
use crate::vendor::junsun::{
    ACTION_MAIN_UI, PACKAGE, TOKEN, TX_ENTER_MODE, TX_GET_WORK_MODE, WORKMODE_AUX,
};

/// How `MAIN_UI` answers a bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Connect,
    NullBinder,
    /// Accepted, never connected.
    Hang,
}

#[derive(Debug)]
struct State {
    mode: i32,
    stuck: bool,
    entered: Vec<i32>,
}

/// Simulated `com.ts.MainUI` common service.
#[derive(Debug, Clone)]
pub struct JunsunDevice {
    state: Arc<Mutex<State>>,
    binding: Binding,
}

impl JunsunDevice {
    pub fn new(options: DeviceOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                mode: if options.aux_active { WORKMODE_AUX } else { 0 },
                stuck: options.stuck,
                entered: Vec::new(),
            })),
            binding: Binding::Connect,
        }
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = binding;
        self
    }

    pub fn install(&self, host: &SimHost) {
        host.install_package(PACKAGE);
        let behavior = match self.binding {
            Binding::Connect => {
                let common: BinderRef = Arc::new(TsCommon {
                    state: self.state.clone(),
                });
                BindBehavior::Connect(common)
            }
            Binding::NullBinder => BindBehavior::ConnectNull,
            Binding::Hang => BindBehavior::Never,
        };
        host.on_bind_action(ACTION_MAIN_UI, PACKAGE, behavior);
    }

    pub fn work_mode(&self) -> i32 {
        lock(&self.state).mode
    }

    /// Every `enterMode` argument received.
    pub fn entered_modes(&self) -> Vec<i32> {
        lock(&self.state).entered.clone()
    }
}

struct TsCommon {
    state: Arc<Mutex<State>>,
}

impl Binder for TsCommon {
    fn descriptor(&self) -> Option<&str> {
        Some(TOKEN)
    }

    fn transact(
        &self,
        code: u32,
        data: &Parcel,
        _flags: u32,
    ) -> auxswitch_binder::Result<Option<Parcel>> {
        let mut reader = data.reader();
        reader.enforce_interface(TOKEN)?;
        match code {
            TX_ENTER_MODE => {
                let mode = reader.read_i32()?;
                let mut state = lock(&self.state);
                state.entered.push(mode);
                if !state.stuck {
                    state.mode = mode;
                }
                reply(|_| {})
            }
            TX_GET_WORK_MODE => {
                let mode = lock(&self.state).mode;
                reply(|p| p.write_i32(mode))
            }
            other => Err(BinderError::UnknownTransaction(other)),
        }
    }
}
