use serde::Serialize;

use crate::cmd::Session;
use crate::exit::{CliResult, SUCCESS, UNSUPPORTED};
use crate::output::{emit, or_none, yes_no, OutputFormat, Report};

#[derive(Serialize)]
struct BackendProbe {
    id: &'static str,
    supported: bool,
}

#[derive(Serialize)]
struct ProbeReport {
    device: String,
    selected: Option<&'static str>,
    backends: Vec<BackendProbe>,
}

impl Report for ProbeReport {
    fn header(&self) -> Vec<&'static str> {
        vec!["BACKEND", "SUPPORTED", "SELECTED"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.backends
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    yes_no(b.supported).to_string(),
                    yes_no(self.selected == Some(b.id)).to_string(),
                ]
            })
            .collect()
    }

    fn pretty(&self) -> String {
        let mut out = format!("Device: {}\n", self.device);
        for b in &self.backends {
            let marker = if self.selected == Some(b.id) { "*" } else { " " };
            out.push_str(&format!(
                "  {marker} {:<22} {}\n",
                b.id,
                if b.supported { "supported" } else { "-" }
            ));
        }
        out.push_str(&format!("Selected: {}", or_none(self.selected)));
        out
    }

    fn raw(&self) -> String {
        or_none(self.selected)
    }
}

pub fn run(session: &Session, format: OutputFormat) -> CliResult<i32> {
    let backends = session
        .manager
        .probe_all(&session.host)
        .into_iter()
        .map(|(id, supported)| BackendProbe { id, supported })
        .collect();
    let report = ProbeReport {
        device: session.profile.to_string(),
        selected: session.manager.backend_id(&session.host),
        backends,
    };
    emit(&report, format);
    Ok(SUCCESS)
}

#[derive(Serialize)]
struct BackendReport {
    device: String,
    backend: Option<&'static str>,
}

impl Report for BackendReport {
    fn header(&self) -> Vec<&'static str> {
        vec!["DEVICE", "BACKEND"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![self.device.clone(), or_none(self.backend)]]
    }

    fn pretty(&self) -> String {
        format!("Backend: {}", or_none(self.backend))
    }

    fn raw(&self) -> String {
        or_none(self.backend)
    }
}

/// Prints the selected backend; exits non-zero when there is none.
pub fn run_backend(session: &Session, format: OutputFormat) -> CliResult<i32> {
    let report = BackendReport {
        device: session.profile.to_string(),
        backend: session.manager.backend_id(&session.host),
    };
    emit(&report, format);
    Ok(if report.backend.is_some() {
        SUCCESS
    } else {
        UNSUPPORTED
    })
}
