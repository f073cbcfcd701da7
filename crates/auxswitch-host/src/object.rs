use std::fmt;

use crate::error::InvokeError;

/// Parameter and return kinds a control object method can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Void,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Str,
    ShortArray,
}

/// An argument to, or result of, a control object call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Void,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Str(String),
    ShortArray(Vec<i16>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Void => ValueKind::Void,
            Value::Bool(_) => ValueKind::Bool,
            Value::Byte(_) => ValueKind::Byte,
            Value::Short(_) => ValueKind::Short,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Str(_) => ValueKind::Str,
            Value::ShortArray(_) => ValueKind::ShortArray,
        }
    }

    /// Widen a numeric result to `i64`. Bytes are read as unsigned.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v as u8)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }
}

/// Name and shape of one method exposed by a control object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<ValueKind>,
    pub returns: ValueKind,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, params: &[ValueKind], returns: ValueKind) -> Self {
        Self {
            name: name.into(),
            params: params.to_vec(),
            returns,
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}({:?})", self.returns, self.name, self.params)
    }
}

/// A vendor control object resolved at runtime with no interface description.
///
/// Callers must check [`ControlObject::methods`] for the shape they need
/// before trusting the object, and must treat [`InvokeError::NoSuchMethod`]
/// as "this calling convention is not the one the vendor uses".
pub trait ControlObject: Send + Sync {
    /// Runtime class name, for diagnostics.
    fn class_name(&self) -> &str;

    /// All methods the object exposes.
    fn methods(&self) -> Vec<MethodSignature>;

    /// Invoke the method whose name and parameter kinds exactly match.
    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvokeError>;

    /// Whether a method with `name` and exactly `arity` parameters exists.
    fn has_method(&self, name: &str, arity: usize) -> bool {
        self.methods()
            .iter()
            .any(|m| m.name == name && m.params.len() == arity)
    }
}

impl fmt::Debug for dyn ControlObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlObject")
            .field("class", &self.class_name())
            .finish()
    }
}
