use std::sync::{Arc, Mutex};

use auxswitch_binder::{Binder, BinderError, BinderRef, Parcel};
use auxswitch_host::sim::SimHost;
use auxswitch_host::{HostError, Intent};

use super::{lock, reply, DeviceOptions};
use crate::vendor::microntek::{
    ACTION_CAR_MANAGER_EVENT, CHANNEL_LINE, CHANNEL_SYS, EXTRA_PARAMETER, KEY_AV_CHANNEL,
    PACKAGES, SERVICE_NAME, TOKEN, TX_GET_STRING_STATE, TX_SET_PARAMETERS,
};

#[derive(Debug)]
struct State {
    channel: String,
    stuck: bool,
    set_rc: i32,
    set_calls: Vec<String>,
    events: Vec<String>,
}

impl State {
    fn apply(&mut self, parameter: &str) {
        if self.stuck {
            return;
        }
        match parameter.split_once('=') {
            Some(("av_channel_enter", channel)) => self.channel = channel.to_string(),
            Some(("av_channel_exit", channel)) if self.channel == channel => {
                self.channel = CHANNEL_SYS.to_string();
            }
            _ => {}
        }
    }
}

/// Simulated MTC car service plus the ROM's car-manager broadcast receiver.
#[derive(Debug, Clone)]
pub struct MicrontekDevice {
    state: Arc<Mutex<State>>,
    broadcasts_honored: bool,
    car_service: bool,
}

impl MicrontekDevice {
    pub fn new(options: DeviceOptions) -> Self {
        let channel = if options.aux_active {
            CHANNEL_LINE
        } else {
            CHANNEL_SYS
        };
        Self {
            state: Arc::new(Mutex::new(State {
                channel: channel.to_string(),
                stuck: options.stuck,
                set_rc: 0,
                set_calls: Vec::new(),
                events: Vec::new(),
            })),
            broadcasts_honored: true,
            car_service: true,
        }
    }

    /// The ROM ignores car-manager broadcasts; only `setParameters` works.
    pub fn ignoring_broadcasts(mut self) -> Self {
        self.broadcasts_honored = false;
        self
    }

    /// No `carservice` binder is registered.
    pub fn without_car_service(mut self) -> Self {
        self.car_service = false;
        self
    }

    /// Status `setParameters` answers with.
    pub fn with_set_rc(self, rc: i32) -> Self {
        lock(&self.state).set_rc = rc;
        self
    }

    pub fn install(&self, host: &SimHost) {
        host.install_package(PACKAGES[0]);

        if self.car_service {
            let binder: BinderRef = Arc::new(CarService {
                state: self.state.clone(),
            });
            host.register_service(SERVICE_NAME, binder);
        }

        let state = self.state.clone();
        let honored = self.broadcasts_honored;
        host.on_broadcast(Arc::new(move |intent: &Intent| {
            if intent.action.as_deref() != Some(ACTION_CAR_MANAGER_EVENT) {
                return Ok::<(), HostError>(());
            }
            let parameter = intent.extra(EXTRA_PARAMETER).unwrap_or_default();
            let mut state = lock(&state);
            state.events.push(parameter.to_string());
            if honored {
                state.apply(parameter);
            }
            Ok(())
        }));
    }

    pub fn channel(&self) -> String {
        lock(&self.state).channel.clone()
    }

    pub fn set_calls(&self) -> Vec<String> {
        lock(&self.state).set_calls.clone()
    }

    pub fn events(&self) -> Vec<String> {
        lock(&self.state).events.clone()
    }
}

struct CarService {
    state: Arc<Mutex<State>>,
}

impl Binder for CarService {
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
        let arg = reader.read_string()?.unwrap_or_default();
        let mut state = lock(&self.state);
        match code {
            TX_GET_STRING_STATE => {
                let value = (arg == KEY_AV_CHANNEL).then(|| state.channel.clone());
                reply(|p| p.write_string(value.as_deref()))
            }
            TX_SET_PARAMETERS => {
                state.set_calls.push(arg.clone());
                let rc = state.set_rc;
                if rc >= 0 {
                    state.apply(&arg);
                }
                reply(|p| p.write_i32(rc))
            }
            other => Err(BinderError::UnknownTransaction(other)),
        }
    }
}
