#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn auxswitch(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_auxswitch"))
        .env_remove("AUXSWITCH_DEVICE")
        .env_remove("AUXSWITCH_CONFIG")
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("auxswitch should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be one JSON document")
}

fn temp_config(tag: &str, json: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "auxswitch-{tag}-{}-{}.json",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::write(&path, json).expect("config should be writable");
    path
}

#[test]
fn probe_lists_every_backend() {
    let output = auxswitch(&["--device", "junsun", "probe"]);
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["device"], "junsun");
    assert_eq!(report["selected"], "junsun_ts_mainui");
    let backends = report["backends"]
        .as_array()
        .expect("backends should be an array");
    assert_eq!(backends.len(), 6);
    assert_eq!(backends[0]["id"], "fyt_syu_ms");
    assert_eq!(backends[0]["supported"], false);
}

#[test]
fn backend_on_bare_device_exits_69() {
    let output = auxswitch(&["backend"]);
    assert_eq!(output.status.code(), Some(69));
    assert_eq!(stdout_json(&output)["backend"], serde_json::Value::Null);
}

#[test]
fn switch_succeeds_on_fyt() {
    let output = auxswitch(&["--device", "fyt", "switch", "--timeout", "500ms"]);
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["operation"], "switch");
    assert_eq!(report["backend"], "fyt_syu_ms");
    assert_eq!(report["result"], true);
}

#[test]
fn oversized_timeout_is_accepted() {
    let output = auxswitch(&[
        "--device",
        "fyt",
        "switch",
        "--timeout",
        "18446744073709551615s",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["result"], true);
}

#[test]
fn stuck_device_exits_1() {
    let output = auxswitch(&["--device", "qf", "--stuck", "switch", "--timeout", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["result"], false);
}

#[test]
fn unsupported_switch_reports_error() {
    let output = auxswitch(&["switch"]);
    assert_eq!(output.status.code(), Some(69));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no supported head unit"));
}

#[test]
fn status_on_topway_is_unsupported() {
    let output = auxswitch(&["--device", "topway", "status"]);
    assert_eq!(output.status.code(), Some(69));
}

#[test]
fn status_reports_active_aux() {
    let output = auxswitch(&["--device", "jancar", "--aux-active", "status"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["result"], true);
}

#[test]
fn config_enables_debug_backend() {
    let config = temp_config("debug", r#"{ "include_debug_backend": true }"#);
    let output = auxswitch(&[
        "--device",
        "debug",
        "--config",
        config.to_str().expect("temp path should be utf-8"),
        "backend",
    ]);
    let _ = std::fs::remove_file(&config);

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["backend"], "debug_fake");
}

#[test]
fn invalid_config_exits_78() {
    let config = temp_config("invalid", r#"{ "retries": 3 }"#);
    let output = auxswitch(&[
        "--config",
        config.to_str().expect("temp path should be utf-8"),
        "probe",
    ]);
    let _ = std::fs::remove_file(&config);

    assert_eq!(output.status.code(), Some(78));
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_auxswitch"))
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(&format!("auxswitch {}", env!("CARGO_PKG_VERSION"))));
}
