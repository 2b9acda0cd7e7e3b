#![allow(deprecated)] // cargo_bin is deprecated but still functional

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A filesystem-backed store in a scratch directory, shared across invocations.
struct Store {
    temp: TempDir,
    config: PathBuf,
}

impl Store {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("store");
        let config = temp.path().join("fragments.toml");
        fs::write(
            &config,
            format!(
                "[storage]\ntype = \"filesystem\"\npath = {:?}\n",
                data_dir.display().to_string()
            ),
        )
        .unwrap();
        Self { temp, config }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("fragmentctl").unwrap();
        cmd.env_remove("FRAGMENTS_OWNER")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    fn create(&self, owner: &str, fragment_type: &str, input: &Path) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["create", "--owner", owner, "--type", fragment_type])
            .arg(input)
            .output()
            .unwrap();
        assert!(output.status.success(), "create failed: {output:?}");
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

#[test]
fn create_info_get_roundtrip() {
    let store = Store::new();
    let input = store.path("note.md");
    fs::write(&input, "# Title").unwrap();

    let record = store.create("alice", "text/markdown", &input);
    assert_eq!(record["ownerId"], "alice");
    assert_eq!(record["type"], "text/markdown");
    assert_eq!(record["size"], 7);
    let id = record["id"].as_str().unwrap().to_string();

    let output = store
        .cmd()
        .args(["info", &id, "--owner", "alice"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info, record);

    store
        .cmd()
        .args(["get", &id, "--owner", "alice"])
        .assert()
        .success()
        .stdout("# Title");

    store
        .cmd()
        .args(["get", &format!("{id}.html"), "--owner", "alice"])
        .assert()
        .success()
        .stdout("<h1>Title</h1>\n");
}

#[test]
fn create_from_stdin_and_convert_json() {
    let store = Store::new();

    let output = store
        .cmd()
        .args(["create", "--owner", "alice", "--type", "application/json", "-"])
        .write_stdin(r#"{"content":"x"}"#)
        .output()
        .unwrap();
    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = record["id"].as_str().unwrap();

    let out_file = store.path("out.txt");
    store
        .cmd()
        .args(["get", &format!("{id}.txt"), "--owner", "alice", "--output"])
        .arg(&out_file)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&out_file).unwrap(), "{content:x}");
}

#[test]
fn other_owner_gets_not_found() {
    let store = Store::new();
    let input = store.path("a.txt");
    fs::write(&input, "secret").unwrap();
    let record = store.create("alice", "text/plain", &input);
    let id = record["id"].as_str().unwrap();

    for args in [
        vec!["info", id],
        vec!["get", id],
        vec!["delete", id],
    ] {
        store
            .cmd()
            .args(&args)
            .args(["--owner", "mallory"])
            .assert()
            .failure()
            .stderr(contains("fragment not found"));
    }
}

#[test]
fn update_rejects_type_change() {
    let store = Store::new();
    let input = store.path("a.txt");
    fs::write(&input, "one").unwrap();
    let record = store.create("alice", "text/plain", &input);
    let id = record["id"].as_str().unwrap();

    store
        .cmd()
        .args(["update", id, "--owner", "alice", "--type", "text/html", "-"])
        .write_stdin("<p>two</p>")
        .assert()
        .failure()
        .stderr(contains("fragment type cannot change"));

    let output = store
        .cmd()
        .args(["update", id, "--owner", "alice", "--type", "text/plain", "-"])
        .write_stdin("two, longer")
        .output()
        .unwrap();
    assert!(output.status.success());
    let updated: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(updated["size"], 11);
}

#[test]
fn list_and_delete() {
    let store = Store::new();
    let input = store.path("a.txt");
    fs::write(&input, "x").unwrap();
    let first = store.create("alice", "text/plain", &input);
    store.create("bob", "text/plain", &input);

    let output = store
        .cmd()
        .args(["list", "--owner", "alice"])
        .output()
        .unwrap();
    let ids: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ids, serde_json::json!([first["id"]]));

    let output = store
        .cmd()
        .args(["list", "--owner", "alice", "--expand"])
        .output()
        .unwrap();
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["type"], "text/plain");

    let id = first["id"].as_str().unwrap();
    store
        .cmd()
        .args(["delete", id, "--owner", "alice"])
        .assert()
        .success();

    store
        .cmd()
        .args(["list", "--owner", "alice"])
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn unsupported_type_is_rejected() {
    let store = Store::new();
    let input = store.path("clip.mp4");
    fs::write(&input, "not really").unwrap();

    store
        .cmd()
        .args(["create", "--owner", "alice", "--type", "video/mp4"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("validation error"));
}

#[test]
fn unknown_extension_is_unsupported() {
    let store = Store::new();
    let input = store.path("a.txt");
    fs::write(&input, "x").unwrap();
    let record = store.create("alice", "text/plain", &input);
    let id = record["id"].as_str().unwrap();

    store
        .cmd()
        .args(["get", &format!("{id}.exe"), "--owner", "alice"])
        .assert()
        .failure()
        .stderr(contains("unsupported conversion"));
}

#[test]
fn formats_lists_conversion_targets() {
    let store = Store::new();
    let output = store
        .cmd()
        .args(["formats", "--type", "text/markdown"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let targets: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        targets,
        serde_json::json!(["text/plain", "text/markdown", "text/html"])
    );

    store
        .cmd()
        .args(["formats", "--type", "video/mp4"])
        .assert()
        .failure()
        .stderr(contains("unsupported fragment type"));
}

#[test]
fn health_reports_backend() {
    let store = Store::new();
    store
        .cmd()
        .arg("health")
        .assert()
        .success()
        .stdout(contains("Status: ok"))
        .stdout(contains("Backend: filesystem"));
}

#[test]
fn info_logs_go_to_stderr_by_default() {
    let store = Store::new();
    store
        .cmd()
        .arg("health")
        .assert()
        .success()
        .stderr(contains("storage backend initialized"))
        .stdout(contains("storage backend initialized").not());
}

#[test]
fn missing_config_file_fails() {
    let temp = TempDir::new().unwrap();
    Command::cargo_bin("fragmentctl")
        .unwrap()
        .arg("--config")
        .arg(temp.path().join("absent.toml"))
        .arg("health")
        .assert()
        .failure()
        .stderr(contains("config file not found"));
}
