//! Simulated vendor head units for tests and bench runs.
//!
//! Each device installs itself into a [`SimHost`] the way the real vendor
//! firmware presents itself (packages, exported services, registry binders,
//! framework classes) and answers the vendor protocol from shared state
//! that tests can inspect afterwards.

pub mod fyt;
pub mod jancar;
pub mod junsun;
pub mod microntek;
pub mod qf;
pub mod topway;

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use auxswitch_binder::{Binder, BinderError, Parcel};
use auxswitch_host::sim::SimHost;
use auxswitch_host::{InvokeError, MethodSignature, Value};

pub use fyt::FytDevice;
pub use jancar::JancarDevice;
pub use junsun::JunsunDevice;
pub use microntek::MicrontekDevice;
pub use qf::QfDevice;
pub use topway::TopwayDevice;

/// How a simulated device reacts to commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Commands are accepted but the input never changes.
    pub stuck: bool,
    /// The device starts with aux-in already active.
    pub aux_active: bool,
}

/// Named head-unit profiles for simulated runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProfile {
    /// No vendor software at all.
    Bare,
    Fyt,
    Microntek,
    Jancar,
    Qf,
    Junsun,
    Topway,
    /// No vendor software, debuggable build.
    Debug,
}

impl DeviceProfile {
    pub const ALL: [DeviceProfile; 8] = [
        DeviceProfile::Bare,
        DeviceProfile::Fyt,
        DeviceProfile::Microntek,
        DeviceProfile::Jancar,
        DeviceProfile::Qf,
        DeviceProfile::Junsun,
        DeviceProfile::Topway,
        DeviceProfile::Debug,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DeviceProfile::Bare => "bare",
            DeviceProfile::Fyt => "fyt",
            DeviceProfile::Microntek => "microntek",
            DeviceProfile::Jancar => "jancar",
            DeviceProfile::Qf => "qf",
            DeviceProfile::Junsun => "junsun",
            DeviceProfile::Topway => "topway",
            DeviceProfile::Debug => "debug",
        }
    }

    /// Install this profile's vendor software into `host`.
    pub fn install(self, host: &SimHost, options: DeviceOptions) {
        match self {
            DeviceProfile::Bare => {}
            DeviceProfile::Fyt => FytDevice::new(options).install(host),
            DeviceProfile::Microntek => MicrontekDevice::new(options).install(host),
            DeviceProfile::Jancar => JancarDevice::new(options).install(host),
            DeviceProfile::Qf => QfDevice::new(options).install(host),
            DeviceProfile::Junsun => JunsunDevice::new(options).install(host),
            DeviceProfile::Topway => TopwayDevice::new().install(host),
            DeviceProfile::Debug => host.set_debuggable(true),
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
                format!("unknown device profile '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reply with the no-exception header and whatever `body` writes.
pub(crate) fn reply(body: impl FnOnce(&mut Parcel)) -> auxswitch_binder::Result<Option<Parcel>> {
    let mut parcel = Parcel::new();
    parcel.write_no_exception();
    body(&mut parcel);
    Ok(Some(parcel))
}

/// Resolve `method(args)` against `methods` by exact signature.
pub(crate) fn find_method<'m>(
    methods: &'m [MethodSignature],
    name: &str,
    args: &[Value],
) -> Result<&'m MethodSignature, InvokeError> {
    methods
        .iter()
        .find(|m| {
            m.name == name
                && m.params.len() == args.len()
                && m.params.iter().zip(args).all(|(kind, arg)| *kind == arg.kind())
        })
        .ok_or_else(|| InvokeError::NoSuchMethod {
            name: name.to_string(),
            params: args.iter().map(Value::kind).collect(),
        })
}

/// A registry binder that implements nothing; only its presence matters.
#[derive(Debug)]
pub struct InertBinder;

impl Binder for InertBinder {
    fn transact(
        &self,
        code: u32,
        _data: &Parcel,
        _flags: u32,
    ) -> auxswitch_binder::Result<Option<Parcel>> {
        Err(BinderError::UnknownTransaction(code))
    }
}
