use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn rscontrol() -> Command {
    let mut cmd = Command::cargo_bin("rscontrol").unwrap();
    cmd.env("RUST_LOG", "error");
    cmd
}

fn write_registry(dir: &Path, components: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("components.json");
    std::fs::write(&path, serde_json::json!({ "components": components }).to_string()).unwrap();
    path
}

#[test]
fn help_lists_commands() {
    rscontrol()
        .arg("help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available commands:"));

    rscontrol()
        .args(["help", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rasa_shell, rasa_actions, main, hardware"));
}

#[test]
fn unknown_component_is_reported_not_exit_code() {
    rscontrol()
        .args(["status", "weather"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown component: weather"));
}

#[test]
fn hardware_status_without_sensors_or_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    rscontrol()
        .args(["status", "hardware", "--thermal-dir"])
        .arg(dir.path())
        .arg("--snapshot")
        .arg(dir.path().join("missing.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("CPU Temp: Unavailable"))
        .stdout(predicate::str::contains("Network Interfaces:"))
        .stdout(predicate::str::contains("last hour").not());
}

#[test]
fn stop_and_status_of_idle_components() {
    let dir = tempfile::tempdir().unwrap();
    let registry = write_registry(
        dir.path(),
        serde_json::json!([
            {"name": "ghost", "command": ["rscontrol-it-ghost-7f3a"], "working_directory": dir.path()},
            {"name": "phantom", "command": ["rscontrol-it-phantom-7f3a"], "working_directory": dir.path()}
        ]),
    );

    rscontrol()
        .args(["stop", "all", "--registry"])
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("ghost is not running"))
        .stdout(predicate::str::contains("phantom is not running"));

    rscontrol()
        .args(["status", "--registry"])
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("❌ ghost is not running"))
        .stdout(predicate::str::contains("❌ phantom is not running"));
}

#[test]
fn start_with_missing_workdir_spawns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone");
    let registry = write_registry(
        dir.path(),
        serde_json::json!([
            {"name": "ghost", "command": ["rscontrol-it-ghost-7f3a"], "working_directory": missing}
        ]),
    );

    rscontrol()
        .args(["start", "ghost", "--registry"])
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("Working directory does not exist"));
}

#[test]
fn failed_dependency_is_reported_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone");
    let path = dir.path().join("components.json");
    let registry = serde_json::json!({
        "components": [
            {"name": "api", "command": ["rscontrol-it-api-7f3a"], "working_directory": dir.path()},
            {"name": "db", "command": ["rscontrol-it-db-7f3a"], "working_directory": missing}
        ],
        "dependency": {"dependent": "api", "requires": "db"}
    });
    std::fs::write(&path, registry.to_string()).unwrap();

    rscontrol()
        .args(["start", "api", "-y", "--registry"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("❌ Failed to start db: Working directory does not exist"))
        .stdout(predicate::str::contains("❌ db failed to start (Working directory does not exist"))
        .stdout(predicate::str::contains("Aborting api startup."));
}

#[test]
fn start_then_stop_real_process() {
    let dir = tempfile::tempdir().unwrap();
    let registry = write_registry(
        dir.path(),
        serde_json::json!([{
            "name": "worker",
            "command": ["sh", "-c", "echo 'rscontrol-it-worker READY'; sleep 30; true"],
            "working_directory": dir.path(),
            "readiness_signal": "rscontrol-it-worker ready"
        }]),
    );

    rscontrol()
        .args(["start", "worker", "--ready-timeout", "10", "--registry"])
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("worker is now running (PID"));

    rscontrol()
        .args(["status", "worker", "--registry"])
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ worker is running (PID"));

    rscontrol()
        .args(["stop", "worker", "--registry"])
        .arg(&registry)
        .assert()
        .success()
        .stdout(predicate::str::contains("🛑 Stopped worker"));
}
