//! Binder-style parcel marshaling for vendor head-unit services.
//!
//! Vendor services on head units publish no interface description, so every
//! call is built by hand:
//! - an interface token naming the remote interface
//! - a numeric transaction code
//! - ordered typed arguments (ints, arrays, strings, binder objects)
//!
//! Two-way calls come back as a [`Reply`], which can only be obtained after
//! the remote exception header has been read and checked.

pub mod binder;
pub mod error;
pub mod parcel;
pub mod reader;
pub mod reply;
pub mod transaction;

pub use binder::{
    Binder, BinderRef, FIRST_CALL_TRANSACTION, FLAG_ONEWAY, INTERFACE_TRANSACTION,
};
pub use error::{BinderError, ParcelError, Result};
pub use parcel::Parcel;
pub use reader::ParcelReader;
pub use reply::Reply;
pub use transaction::{Arg, Transaction};
