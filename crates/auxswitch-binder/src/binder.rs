use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::parcel::Parcel;

/// First user-defined transaction code.
pub const FIRST_CALL_TRANSACTION: u32 = 0x0000_0001;

/// Interface query ('_NTF'): answered with the object's descriptor.
pub const INTERFACE_TRANSACTION: u32 = 0x5F4E_5446;

/// Fire-and-forget transaction; the caller receives no reply.
pub const FLAG_ONEWAY: u32 = 0x0000_0001;

/// A remote (or local) object that accepts transactions.
///
/// Implementations return `Ok(None)` for one-way transactions and
/// `Ok(Some(reply))` for two-way transactions.
pub trait Binder: Send + Sync {
    /// Interface descriptor, when the object knows it locally.
    fn descriptor(&self) -> Option<&str> {
        None
    }

    /// Deliver a transaction to the object.
    fn transact(&self, code: u32, data: &Parcel, flags: u32) -> Result<Option<Parcel>>;
}

/// Shared handle to a binder object.
pub type BinderRef = Arc<dyn Binder>;

impl fmt::Debug for dyn Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("descriptor", &self.descriptor().unwrap_or("<remote>"))
            .finish()
    }
}
