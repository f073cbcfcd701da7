use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::cmd::{parse_timeout, OperationArgs, Session};
use crate::exit::{aux_error, CliResult, FAILURE, SUCCESS};
use crate::output::{emit, or_none, OutputFormat, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Switch,
    Exit,
    Status,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::Switch => "switch",
            Kind::Exit => "exit",
            Kind::Status => "status",
        }
    }
}

#[derive(Serialize)]
struct OperationReport {
    device: String,
    operation: &'static str,
    backend: Option<&'static str>,
    /// Switch/exit: the input reached the requested state.
    /// Status: aux-in is the current input.
    result: bool,
    elapsed_ms: u64,
}

impl Report for OperationReport {
    fn header(&self) -> Vec<&'static str> {
        vec!["OPERATION", "BACKEND", "RESULT", "ELAPSED"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![
            self.operation.to_string(),
            or_none(self.backend),
            self.result.to_string(),
            format!("{}ms", self.elapsed_ms),
        ]]
    }

    fn pretty(&self) -> String {
        format!(
            "{} via {} on {}: {} ({}ms)",
            self.operation,
            or_none(self.backend),
            self.device,
            self.result,
            self.elapsed_ms
        )
    }

    fn raw(&self) -> String {
        self.result.to_string()
    }
}

/// Run one operation. Switch and exit exit with [`FAILURE`] when the input
/// did not change; status always succeeds once it has an answer.
pub fn run(
    session: &Session,
    kind: Kind,
    args: &OperationArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let timeout = match &args.timeout {
        Some(raw) => parse_timeout(raw)?,
        None => session.manager.default_timeout(),
    };
    let manager = &session.manager;
    let host = &session.host;

    let started = Instant::now();
    let outcome = match kind {
        Kind::Switch => manager.switch_to_aux(host, timeout),
        Kind::Exit => manager.exit_aux(host, timeout),
        Kind::Status => manager.is_current_input_aux(host, timeout),
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let result = outcome.map_err(|err| aux_error(kind.name(), err))?;
    info!(operation = kind.name(), result, elapsed_ms, "operation finished");

    let report = OperationReport {
        device: session.profile.to_string(),
        operation: kind.name(),
        backend: manager.backend_id(host),
        result,
        elapsed_ms,
    };
    emit(&report, format);

    Ok(match kind {
        Kind::Status => SUCCESS,
        _ if result => SUCCESS,
        _ => FAILURE,
    })
}
