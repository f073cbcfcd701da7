use std::path::PathBuf;
use std::time::Duration;

use auxswitch_backend::testing::{DeviceOptions, DeviceProfile};
use auxswitch_backend::{AuxManager, ManagerConfig};
use auxswitch_host::sim::SimHost;
use clap::{Args, Subcommand};
use tracing::debug;

use crate::exit::{config_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod operation;
pub mod probe;
pub mod version;

/// Package name the CLI presents to the simulated device.
pub const CLI_PACKAGE: &str = "dev.auxswitch.cli";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe every backend and show which one would be selected.
    Probe,
    /// Print the selected backend id.
    Backend,
    /// Switch the head unit to aux-in.
    Switch(OperationArgs),
    /// Leave aux-in.
    Exit(OperationArgs),
    /// Report whether aux-in is the current input.
    Status(OperationArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Version(args) => version::run(args),
        Command::Probe => probe::run(&Session::open(device)?, format),
        Command::Backend => probe::run_backend(&Session::open(device)?, format),
        Command::Switch(args) => {
            operation::run(&Session::open(device)?, operation::Kind::Switch, &args, format)
        }
        Command::Exit(args) => {
            operation::run(&Session::open(device)?, operation::Kind::Exit, &args, format)
        }
        Command::Status(args) => {
            operation::run(&Session::open(device)?, operation::Kind::Status, &args, format)
        }
    }
}

/// Which simulated head unit to run against, and how the selector is set up.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Simulated head unit profile.
    #[arg(
        long,
        value_name = "PROFILE",
        default_value = "bare",
        env = "AUXSWITCH_DEVICE",
        global = true
    )]
    pub device: DeviceProfile,
    /// The device accepts commands but its input never changes.
    #[arg(long, global = true)]
    pub stuck: bool,
    /// The device starts with aux-in already active.
    #[arg(long, global = true)]
    pub aux_active: bool,
    /// Selector configuration file (JSON).
    #[arg(long, value_name = "FILE", env = "AUXSWITCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct OperationArgs {
    /// Operation timeout (e.g. 1500ms, 2s). Defaults to the configured timeout.
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// A simulated device with its selector, built once per invocation.
pub struct Session {
    pub profile: DeviceProfile,
    pub host: SimHost,
    pub manager: AuxManager,
}

impl Session {
    pub fn open(args: &DeviceArgs) -> CliResult<Self> {
        let config = match &args.config {
            Some(path) => ManagerConfig::load(path).map_err(config_error)?,
            None => ManagerConfig::default(),
        };
        let host = SimHost::new(CLI_PACKAGE);
        args.device.install(
            &host,
            DeviceOptions {
                stuck: args.stuck,
                aux_active: args.aux_active,
            },
        );
        debug!(device = %args.device, ?config, "simulated device ready");
        Ok(Self {
            profile: args.device,
            host,
            manager: AuxManager::new(config),
        })
    }
}

/// Parse `1500ms`, `2s` or a bare number of milliseconds. Zero is allowed;
/// every backend applies its own minimum.
pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, to_duration): (&str, fn(u64) -> Duration) =
        if let Some(num) = input.strip_suffix("ms") {
            (num, Duration::from_millis)
        } else if let Some(num) = input.strip_suffix('s') {
            (num, Duration::from_secs)
        } else {
            (input, Duration::from_millis)
        };

    number
        .trim()
        .parse::<u64>()
        .map(to_duration)
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))
}
