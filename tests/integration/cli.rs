//! Runs the built `treesync` binary with an isolated home directory

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Command with HOME and XDG directories pointed into `home`
fn treesync(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_treesync"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("TREESYNC_LOG")
        .env_remove("TREESYNC__WALKER__WORKERS")
        .env_remove("TREESYNC__WALKER__CACHE_POLICY")
        .env_remove("TREESYNC__STORAGE__STORE_PATH");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn sample(dir: &TempDir) -> std::path::PathBuf {
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), "hi").unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub").join("b.txt"), "").unwrap();
    root
}

#[test]
fn test_cli_sync_logs_and_summarizes() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let root = sample(&work);

    let output = treesync(home.path()).arg(&root).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("Entries: 4"), "stdout: {}", out);
    assert!(out.contains("Files: 2"));

    let err = stderr(&output);
    assert!(err.contains("Sync started"), "stderr: {}", err);
    assert!(err.contains("Sync total: 4 entries"));
    assert!(err.contains("Sync finished"));

    assert!(home.path().join("data").join("treesync").join("store").exists());
}

#[test]
fn test_cli_second_run_hits_cache() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let root = sample(&work);

    let first = treesync(home.path()).arg(&root).arg("--quiet").output().unwrap();
    assert!(first.status.success());
    assert!(stdout(&first).contains("0 hits, 2 misses"));

    let second = treesync(home.path()).arg(&root).arg("--quiet").output().unwrap();
    assert!(second.status.success());
    assert!(stdout(&second).contains("2 hits, 0 misses"));
    assert!(!stderr(&second).contains("Sync started"));
}

#[test]
fn test_cli_json_output() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let root = sample(&work);

    let output = treesync(home.path())
        .arg(&root)
        .args(["--format", "json", "--no-cache", "--quiet"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["count"], 4);
    assert_eq!(json["tree"]["name"], "root");
    assert!(!home.path().join("data").join("treesync").exists());
}

#[test]
fn test_cli_explicit_store_and_config_file() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let root = sample(&work);
    let store = work.path().join("custom-store");
    let config = work.path().join("treesync.toml");
    fs::write(&config, "[walker]\nworkers = 2\n\n[logging]\nlevel = \"warn\"\n").unwrap();

    let output = treesync(home.path())
        .arg(&root)
        .arg("--store")
        .arg(&store)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(store.exists());
    assert!(!stderr(&output).contains("Sync started"));
}

#[test]
fn test_cli_missing_path_exits_with_error() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let output = treesync(home.path())
        .arg(work.path().join("missing"))
        .arg("--no-cache")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error:"));
}

#[test]
fn test_cli_rejects_zero_workers() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let output = treesync(home.path())
        .arg(work.path())
        .args(["--workers", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("workers must be at least 1"));
}
