use std::sync::{Arc, Mutex};

use auxswitch_binder::{Binder, BinderError, BinderRef, Parcel, FLAG_ONEWAY};
use auxswitch_host::sim::{BindBehavior, SimHost};
use auxswitch_host::ComponentName;

use super::{lock, reply, DeviceOptions};
use crate::vendor::fyt::{
    ACTION_MAIN, APP_ID_AUX, CMD_SELECT_APP, PACKAGE, TOKEN_MODULE, TOKEN_TOOLKIT, TOOLKIT_CLASS,
    TX_CMD, TX_GET, TX_GET_REMOTE_MODULE,
};

/// How the toolkit service answers a bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Connect,
    NullBinder,
    Absent,
}

#[derive(Debug)]
struct State {
    app: i32,
    stuck: bool,
    commands: Vec<(i32, Vec<i32>)>,
}

/// Simulated `com.syu.ms` module service.
#[derive(Debug, Clone)]
pub struct FytDevice {
    state: Arc<Mutex<State>>,
    toolkit: Route,
    module_action: Route,
}

impl FytDevice {
    pub fn new(options: DeviceOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                app: if options.aux_active { APP_ID_AUX } else { 1 },
                stuck: options.stuck,
                commands: Vec::new(),
            })),
            toolkit: Route::Connect,
            module_action: Route::Connect,
        }
    }

    pub fn with_toolkit(mut self, route: Route) -> Self {
        self.toolkit = route;
        self
    }

    pub fn with_module_action(mut self, route: Route) -> Self {
        self.module_action = route;
        self
    }

    pub fn install(&self, host: &SimHost) {
        host.install_package(PACKAGE);
        let module: BinderRef = Arc::new(Module {
            state: self.state.clone(),
        });
        let toolkit: BinderRef = Arc::new(Toolkit {
            module: module.clone(),
        });

        let component = ComponentName::new(PACKAGE, TOOLKIT_CLASS);
        match self.toolkit {
            Route::Connect => host.on_bind_component(component, BindBehavior::Connect(toolkit)),
            Route::NullBinder => host.on_bind_component(component, BindBehavior::ConnectNull),
            Route::Absent => {}
        }
        match self.module_action {
            Route::Connect => host.on_bind_action(ACTION_MAIN, PACKAGE, BindBehavior::Connect(module)),
            Route::NullBinder => host.on_bind_action(ACTION_MAIN, PACKAGE, BindBehavior::ConnectNull),
            Route::Absent => {}
        }
    }

    pub fn current_app(&self) -> i32 {
        lock(&self.state).app
    }

    /// Every `cmd` received, as `(code, ints)`.
    pub fn commands(&self) -> Vec<(i32, Vec<i32>)> {
        lock(&self.state).commands.clone()
    }
}

struct Toolkit {
    module: BinderRef,
}

impl Binder for Toolkit {
    fn descriptor(&self) -> Option<&str> {
        Some(TOKEN_TOOLKIT)
    }

    fn transact(
        &self,
        code: u32,
        data: &Parcel,
        _flags: u32,
    ) -> auxswitch_binder::Result<Option<Parcel>> {
        if code != TX_GET_REMOTE_MODULE {
            return Err(BinderError::UnknownTransaction(code));
        }
        let mut reader = data.reader();
        reader.enforce_interface(TOKEN_TOOLKIT)?;
        let _module_code = reader.read_i32()?;
        reply(|p| p.write_strong_binder(Some(&self.module)))
    }
}

struct Module {
    state: Arc<Mutex<State>>,
}

impl Binder for Module {
    fn descriptor(&self) -> Option<&str> {
        Some(TOKEN_MODULE)
    }

    fn transact(
        &self,
        code: u32,
        data: &Parcel,
        flags: u32,
    ) -> auxswitch_binder::Result<Option<Parcel>> {
        let mut reader = data.reader();
        reader.enforce_interface(TOKEN_MODULE)?;
        match code {
            TX_CMD => {
                let cmd = reader.read_i32()?;
                let ints = reader.read_i32_array()?.unwrap_or_default();
                let mut state = lock(&self.state);
                if cmd == CMD_SELECT_APP && !state.stuck {
                    if let Some(app) = ints.first() {
                        state.app = *app;
                    }
                }
                state.commands.push((cmd, ints));
                if flags & FLAG_ONEWAY != 0 {
                    Ok(None)
                } else {
                    reply(|_| {})
                }
            }
            TX_GET => {
                let app = lock(&self.state).app;
                reply(|p| {
                    p.write_i32(1);
                    p.write_i32_array(Some(&[app]));
                })
            }
            other => Err(BinderError::UnknownTransaction(other)),
        }
    }
}
