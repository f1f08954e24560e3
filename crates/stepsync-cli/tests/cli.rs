use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_commands() {
    Command::cargo_bin("stepsync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn sync_requires_api_config() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("steps");
    std::fs::write(&counter, "100").unwrap();

    Command::cargo_bin("stepsync")
        .unwrap()
        .env_remove("STEPSYNC_API_URL")
        .env_remove("STEPSYNC_API_SECRET")
        .arg("sync")
        .arg("--counter-file")
        .arg(&counter)
        .assert()
        .failure()
        .stderr(predicate::str::contains("STEPSYNC_API_URL"));
}

#[test]
fn sync_fails_cleanly_when_collector_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("steps");
    std::fs::write(&counter, "250").unwrap();

    Command::cargo_bin("stepsync")
        .unwrap()
        .env("STEPSYNC_API_URL", "http://127.0.0.1:1/entries")
        .env("STEPSYNC_API_SECRET", "hunter2")
        .env("STEPSYNC_UPLOAD_TIMEOUT_SECS", "1")
        .arg("sync")
        .arg("--counter-file")
        .arg(&counter)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Sync failed"))
        .stderr(predicate::str::contains("did not complete"));
}

#[test]
fn sync_reports_missing_counter_file() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("stepsync")
        .unwrap()
        .env("STEPSYNC_API_URL", "http://127.0.0.1:1/entries")
        .env("STEPSYNC_API_SECRET", "hunter2")
        .arg("sync")
        .arg("--counter-file")
        .arg(dir.path().join("absent"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("counter_unavailable"));
}
