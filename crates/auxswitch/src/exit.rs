use std::fmt;

use auxswitch_backend::{AuxError, ConfigError};

// Exit code constants aligned with sysexits-style semantics.
pub const SUCCESS: i32 = 0;
/// The operation ran but the input did not reach the requested state.
pub const FAILURE: i32 = 1;
pub const CONNECT_ERROR: i32 = 3;
pub const REMOTE_ERROR: i32 = 4;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const UNSUPPORTED: i32 = 69;
pub const CONFIG_ERROR: i32 = 78;
pub const TIMEOUT: i32 = 124;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn aux_error(context: &str, err: AuxError) -> CliError {
    let code = match err {
        AuxError::Unsupported(_) => UNSUPPORTED,
        AuxError::ConnectTimeout(_) => TIMEOUT,
        AuxError::ConnectFailed(_) => CONNECT_ERROR,
        AuxError::RemoteFault(_) | AuxError::CommandRejected { .. } => REMOTE_ERROR,
        AuxError::UnexpectedReply(_) => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn config_error(err: ConfigError) -> CliError {
    CliError::new(CONFIG_ERROR, format!("config: {err}"))
}
