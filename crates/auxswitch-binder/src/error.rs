/// Errors raised while encoding or decoding a parcel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParcelError {
    /// A read ran past the end of the parcel.
    #[error("parcel truncated (needed {needed} bytes, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },

    /// A length prefix was negative (other than the absent marker) or absurd.
    #[error("invalid length prefix {0}")]
    InvalidLength(i32),

    /// A string field was not valid UTF-16 or lacked its terminator.
    #[error("invalid string16 payload")]
    InvalidString,

    /// A binder object referenced an index outside the object table.
    #[error("binder object index {0} missing from parcel")]
    MissingObject(u32),

    /// The interface token did not match the expected descriptor.
    #[error("interface mismatch (expected '{expected}', got '{actual}')")]
    InterfaceMismatch { expected: String, actual: String },
}

/// Errors that can occur while issuing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BinderError {
    /// The remote process hosting the object is gone.
    #[error("remote object is dead")]
    DeadObject,

    /// The transport refused or lost the transaction.
    #[error("transaction failed: {0}")]
    FailedTransaction(String),

    /// The remote side does not implement this transaction code.
    #[error("unknown transaction code {0}")]
    UnknownTransaction(u32),

    /// A two-way transaction completed without a reply buffer.
    #[error("no reply for two-way transaction {0}")]
    NoReply(u32),

    /// The reply carried a remote exception.
    #[error("remote exception {code}: {message}")]
    RemoteException { code: i32, message: String },

    /// The payload could not be encoded or decoded.
    #[error("parcel error: {0}")]
    Parcel(#[from] ParcelError),
}

pub type Result<T> = std::result::Result<T, BinderError>;
