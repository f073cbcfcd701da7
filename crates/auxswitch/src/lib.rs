//! Switch Android head units to their aux-in input.
//!
//! auxswitch drives the proprietary input-switch services of several head
//! unit families (FYT, Microntek, JanCar/Autochips, QF, Junsun, Topway)
//! behind one probe-and-dispatch API, and exposes it to an application
//! through a method-call bridge.
//!
//! # Crate Structure
//!
//! - [`binder`]: parcel encoding and the transaction builder
//! - [`host`]: the device platform boundary
//! - [`backend`]: vendor backends and the selector
//! - [`bridge`]: method-name dispatch with one reply per call
//! - [`warmup`]: the once-per-process warm-up hook

pub mod bridge;
pub mod warmup;

/// Re-export wire types.
pub mod binder {
    pub use auxswitch_binder::*;
}

/// Re-export platform boundary types.
pub mod host {
    pub use auxswitch_host::*;
}

/// Re-export backend types.
pub mod backend {
    pub use auxswitch_backend::*;
}

pub use auxswitch_backend::{AuxBackend, AuxError, AuxManager, ManagerConfig};
pub use bridge::{AuxBridge, BridgeError, MethodCall, Reply};
pub use warmup::{NoWarmUp, WarmUp};
