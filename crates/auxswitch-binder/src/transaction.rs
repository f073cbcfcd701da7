use std::fmt;

use tracing::trace;

use crate::binder::{Binder, BinderRef, FLAG_ONEWAY};
use crate::error::{BinderError, Result};
use crate::parcel::Parcel;
use crate::reply::Reply;

/// One typed argument of a transaction, in wire order.
#[derive(Clone)]
pub enum Arg {
    Int(i32),
    IntArray(Option<Vec<i32>>),
    FloatArray(Option<Vec<f32>>),
    StringArray(Option<Vec<String>>),
    Str(Option<String>),
    Binder(Option<BinderRef>),
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "int({v})"),
            Arg::IntArray(v) => write!(f, "int[]({v:?})"),
            Arg::FloatArray(v) => write!(f, "float[]({v:?})"),
            Arg::StringArray(v) => write!(f, "String[]({v:?})"),
            Arg::Str(v) => write!(f, "String({v:?})"),
            Arg::Binder(Some(_)) => write!(f, "binder(..)"),
            Arg::Binder(None) => write!(f, "binder(null)"),
        }
    }
}

/// A request to a remote interface: descriptor, code, ordered arguments.
#[derive(Clone, Debug)]
pub struct Transaction {
    descriptor: String,
    code: u32,
    args: Vec<Arg>,
}

impl Transaction {
    pub fn new(descriptor: impl Into<String>, code: u32) -> Self {
        Self {
            descriptor: descriptor.into(),
            code,
            args: Vec::new(),
        }
    }

    pub fn int(self, value: i32) -> Self {
        self.arg(Arg::Int(value))
    }

    pub fn int_array(self, values: Option<&[i32]>) -> Self {
        self.arg(Arg::IntArray(values.map(<[i32]>::to_vec)))
    }

    pub fn float_array(self, values: Option<&[f32]>) -> Self {
        self.arg(Arg::FloatArray(values.map(<[f32]>::to_vec)))
    }

    pub fn string_array(self, values: Option<&[&str]>) -> Self {
        self.arg(Arg::StringArray(
            values.map(|v| v.iter().map(|s| s.to_string()).collect()),
        ))
    }

    pub fn string(self, value: Option<&str>) -> Self {
        self.arg(Arg::Str(value.map(str::to_string)))
    }

    pub fn binder(self, value: Option<BinderRef>) -> Self {
        self.arg(Arg::Binder(value))
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Marshal the interface token and arguments into a parcel.
    pub fn encode(&self) -> Parcel {
        let mut parcel = Parcel::new();
        parcel.write_interface_token(&self.descriptor);
        for arg in &self.args {
            match arg {
                Arg::Int(v) => parcel.write_i32(*v),
                Arg::IntArray(v) => parcel.write_i32_array(v.as_deref()),
                Arg::FloatArray(v) => parcel.write_f32_array(v.as_deref()),
                Arg::StringArray(v) => parcel.write_string_array(v.as_deref()),
                Arg::Str(v) => parcel.write_string(v.as_deref()),
                Arg::Binder(v) => parcel.write_strong_binder(v.as_ref()),
            }
        }
        parcel
    }

    /// Issue as a one-way call. Nothing is read back.
    pub fn send_oneway(&self, target: &dyn Binder) -> Result<()> {
        trace!(descriptor = %self.descriptor, code = self.code, args = ?self.args, "oneway transact");
        target.transact(self.code, &self.encode(), FLAG_ONEWAY)?;
        Ok(())
    }

    /// Issue as a two-way call and check the reply's exception header.
    pub fn call(&self, target: &dyn Binder) -> Result<Reply> {
        trace!(descriptor = %self.descriptor, code = self.code, args = ?self.args, "transact");
        let reply = target
            .transact(self.code, &self.encode(), 0)?
            .ok_or(BinderError::NoReply(self.code))?;
        Reply::check(reply)
    }
}
