//! End-to-end tests that drive the iplists binary on temporary files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Helper to get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_iplists"))
}

/// Run iplists and return output
fn run_iplists(args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .output()
        .expect("Failed to execute iplists")
}

/// Run iplists with `input` on stdin
fn run_iplists_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(get_binary_path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn iplists");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for iplists")
}

fn write_list(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_version_command() {
    let output = run_iplists(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("iplists"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_command() {
    let output = run_iplists(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("aggregate"));
    assert!(stdout.contains("prune"));
    assert!(stdout.contains("clean"));
}

#[test]
fn test_clean_filters_stdin() {
    let input = "8.8.8.8\n10.0.0.1\n# comment\n\n1.1.1.0/24\ngarbage\n::1\n2606:4700::/32\n";
    let output = run_iplists_with_stdin(&["clean"], input);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "8.8.8.8\n1.1.1.0/24\n2606:4700::/32\n"
    );
}

#[test]
fn test_aggregate_prints_to_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let list = write_list(
        &temp_dir,
        "list.txt",
        "10.0.0.128/25\n2001:db8::1\n10.0.0.0/25\n9.9.9.9\n",
    );

    let output = run_iplists(&["aggregate", path_arg(&list)]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "9.9.9.9\n10.0.0.0/24\n2001:db8::/64\n"
    );

    // Source untouched without --write
    assert_eq!(
        std::fs::read_to_string(&list).unwrap(),
        "10.0.0.128/25\n2001:db8::1\n10.0.0.0/25\n9.9.9.9\n"
    );
}

#[test]
fn test_aggregate_write_rewrites_file() {
    let temp_dir = TempDir::new().unwrap();
    let list = write_list(&temp_dir, "list.txt", "1.1.1.0/25\n1.1.1.128/25\n1.1.1.0/24\n");

    let output = run_iplists(&["aggregate", "--write", path_arg(&list)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Aggregated 1 from 3 IPs & CIDRs"));
    assert_eq!(std::fs::read_to_string(&list).unwrap(), "1.1.1.0/24\n");
}

#[test]
fn test_aggregate_write_no_change() {
    let temp_dir = TempDir::new().unwrap();
    let list = write_list(&temp_dir, "list.txt", "8.8.8.8\n1.1.1.1\n");

    let output = run_iplists(&["aggregate", "-w", path_arg(&list)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No aggregation needed"));
    // Equal counts: the file keeps its original order
    assert_eq!(std::fs::read_to_string(&list).unwrap(), "8.8.8.8\n1.1.1.1\n");
}

#[test]
fn test_aggregate_stats_only() {
    let temp_dir = TempDir::new().unwrap();
    let list = write_list(&temp_dir, "list.txt", "1.1.1.0/25\n1.1.1.128/25\n");

    let output = run_iplists(&["aggregate", "-s", "-w", path_arg(&list)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Aggregated 1 from 2 IPs & CIDRs"));
    assert!(stdout.contains("(256 addresses)"));
    assert_eq!(
        std::fs::read_to_string(&list).unwrap(),
        "1.1.1.0/25\n1.1.1.128/25\n"
    );
}

#[test]
fn test_aggregate_malformed_fails() {
    let temp_dir = TempDir::new().unwrap();
    let list = write_list(&temp_dir, "list.txt", "1.1.1.1\n1.1.1.1/40\n");

    let output = run_iplists(&["aggregate", "-w", path_arg(&list)]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1.1.1.1/40"));
    assert_eq!(
        std::fs::read_to_string(&list).unwrap(),
        "1.1.1.1\n1.1.1.1/40\n"
    );
}

#[test]
fn test_aggregate_empty_fails() {
    let temp_dir = TempDir::new().unwrap();
    let list = write_list(&temp_dir, "list.txt", "\n# nothing\n");

    let output = run_iplists(&["aggregate", path_arg(&list)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No entries found"));
}

#[test]
fn test_aggregate_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.txt");

    let output = run_iplists(&["aggregate", path_arg(&missing)]);
    assert!(!output.status.success());
}

#[test]
fn test_prune_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let target = write_list(
        &temp_dir,
        "target.txt",
        "1.1.1.1\n2.2.2.2\n3.3.3.0/24\n2001:db8::5\n",
    );
    let reference = write_list(
        &temp_dir,
        "reference.txt",
        "1.1.1.0/24\n3.3.3.0/24\n2001:db8::/32\nnot-an-ip\n",
    );

    let output = run_iplists(&["prune", path_arg(&target), path_arg(&reference)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pruned 3 entries from"));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "2.2.2.2\n");
}

#[test]
fn test_prune_nothing_removed() {
    let temp_dir = TempDir::new().unwrap();
    let target = write_list(&temp_dir, "target.txt", "8.8.8.8\n");
    let reference = write_list(&temp_dir, "reference.txt", "1.1.1.0/24\n");

    let output = run_iplists(&["prune", path_arg(&target), path_arg(&reference)]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No entries pruned"));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "8.8.8.8\n");
}

#[test]
fn test_adb_build_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let cache = write_list(
        &temp_dir,
        "adb.json",
        r#"[{"ip":"9.9.9.9","last_seen":"2020-01-01"},{"ip":"5.5.5.5","last_seen":"2020-01-02"}]"#,
    );
    let output_list = temp_dir.path().join("adb.txt");

    let output = run_iplists(&[
        "adb",
        "build",
        path_arg(&cache),
        path_arg(&output_list),
        "--days",
        "0",
    ]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wrote 2 entries"));
    assert_eq!(
        std::fs::read_to_string(&output_list).unwrap(),
        "5.5.5.5\n9.9.9.9\n"
    );
}

#[test]
fn test_adb_fetch_without_key_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_list(
        &temp_dir,
        "config.yaml",
        "adb:\n  key_env: IPLISTS_CLI_TEST_UNSET_KEY\n",
    );
    let cache = temp_dir.path().join("adb.json");

    let output = run_iplists(&[
        "--config",
        path_arg(&config),
        "adb",
        "fetch",
        path_arg(&cache),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("IPLISTS_CLI_TEST_UNSET_KEY"));
    assert!(!cache.exists());
}

#[test]
fn test_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_list(&temp_dir, "config.yaml", "http:\n  timeout_secs: 0\n");
    let output_list = temp_dir.path().join("o365.txt");

    let output = run_iplists(&["--config", path_arg(&config), "o365-ips", path_arg(&output_list)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("timeout_secs"));
}

#[test]
fn test_missing_config_fails_for_aggregate() {
    let temp_dir = TempDir::new().unwrap();
    let list = write_list(&temp_dir, "list.txt", "1.1.1.0/25\n1.1.1.128/25\n");
    let config = temp_dir.path().join("missing.yaml");

    let output = run_iplists(&["--config", path_arg(&config), "aggregate", path_arg(&list)]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.yaml"));
}

#[test]
fn test_invalid_config_fails_for_prune() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_list(&temp_dir, "config.yaml", "http:\n  max_body_bytes: 0\n");
    let target = write_list(&temp_dir, "target.txt", "1.1.1.1\n");
    let reference = write_list(&temp_dir, "reference.txt", "1.1.1.0/24\n");

    let output = run_iplists(&[
        "--config",
        path_arg(&config),
        "prune",
        path_arg(&target),
        path_arg(&reference),
    ]);
    assert!(!output.status.success());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "1.1.1.1\n");
}
