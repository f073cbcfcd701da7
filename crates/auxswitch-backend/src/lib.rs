//! Vendor aux-in backends for Android head units.
//!
//! Each supported head-unit family exposes its input switch through a
//! different proprietary service. Every family is wrapped in an
//! [`AuxBackend`], and [`AuxManager`] probes them in a fixed priority order
//! and dispatches each call to the first one the device supports.
//!
//! # Crate Structure
//!
//! - [`backend`]: the backend contract
//! - [`vendor`]: one backend per head-unit family
//! - [`manager`]: probe-and-dispatch selection
//! - [`poll`]: deadlines and read-back polling shared by the backends
//! - [`testing`]: simulated head units (behind the `testing` feature)

pub mod backend;
pub mod config;
pub mod error;
pub mod manager;
pub mod poll;
pub mod vendor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::AuxBackend;
pub use config::{ManagerConfig, DEFAULT_TIMEOUT_MS};
pub use error::{AuxError, ConfigError, Result};
pub use manager::AuxManager;
pub use poll::{poll_until, Deadline};
