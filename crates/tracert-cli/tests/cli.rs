//! Exercises the `tracert` binary's argument and configuration handling.

use std::process::Command;

fn tracert() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tracert"))
}

#[test]
fn test_zero_max_hops_is_invalid_configuration() {
    let output = tracert()
        .args(["--max-hops", "0", "192.0.2.1"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid configuration"), "stderr: {}", stderr);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_zero_timeout_is_invalid_configuration() {
    let output = tracert().args(["-w", "0", "192.0.2.1"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timeout must be greater than zero"), "stderr: {}", stderr);
}

#[test]
fn test_missing_target_is_usage_error() {
    let output = tracert().output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr: {}", stderr);
}
