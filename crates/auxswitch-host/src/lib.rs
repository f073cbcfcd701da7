//! Platform boundary for head-unit vendor services.
//!
//! Everything a vendor backend needs from the device goes through the
//! [`Host`] trait:
//! - package and service discovery
//! - transient service bindings (see [`connect`])
//! - helper-service starts and broadcasts
//! - well-known service registry lookups
//! - dynamically resolved control objects ([`ControlObject`])
//!
//! An in-memory [`sim::SimHost`] is available behind the `sim` feature.

pub mod connector;
pub mod error;
pub mod host;
pub mod intent;
pub mod object;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use connector::{connect, BoundService, CONNECT_FLOOR};
pub use error::{ConnectError, HostError, InvokeError, Result};
pub use host::{BindToken, ConnectionEvent, ConnectionSink, Host};
pub use intent::{ComponentName, Intent};
pub use object::{ControlObject, MethodSignature, Value, ValueKind};
