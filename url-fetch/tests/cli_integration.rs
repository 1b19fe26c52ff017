// url-fetch/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command with config discovery and URL_FETCH_* variables isolated to `dir`.
fn url_fetch(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("url-fetch").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("URL_FETCH_CONCURRENCY")
        .env_remove("URL_FETCH_TIMEOUT")
        .env_remove("URL_FETCH_USER_AGENT")
        .env_remove("URL_FETCH_FILE")
        .env_remove("URL_FETCH_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Write `item-<i>` files into `dir` and return their file:// URLs.
fn create_resources(dir: &Path, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("item-{}.txt", i));
            fs::write(&path, format!("item-{}\n", i)).expect("Failed to write resource");
            format!("file://{}", path.display())
        })
        .collect()
}

#[test]
fn test_help_lists_flags() {
    let dir = TempDir::new().unwrap();
    url_fetch(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--concurrency"))
        .stdout(predicate::str::contains("--sequential"))
        .stdout(predicate::str::contains("--md5"))
        .stdout(predicate::str::contains("--compare"));
}

#[test]
fn test_no_urls_is_an_error() {
    let dir = TempDir::new().unwrap();
    url_fetch(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("You must specify URLs"));
}

#[test]
fn test_zero_concurrency_is_rejected() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 1);
    url_fetch(dir.path())
        .args(&urls)
        .args(["-c", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Concurrency must be at least 1"));
}

#[test]
fn test_invalid_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 1);
    url_fetch(dir.path())
        .args(&urls)
        .args(["--timeout", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timeout"));
}

#[test]
fn test_contents_printed_in_input_order() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 4);

    let output = url_fetch(dir.path())
        .args(&urls)
        .args(["-c", "2"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let positions: Vec<usize> = (0..4)
        .map(|i| stdout.find(&format!("item-{}\n", i)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(stdout.contains(&format!("==> {} <==", urls[0])));
}

#[test]
fn test_single_url_has_no_banner() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 1);
    url_fetch(dir.path())
        .args(&urls)
        .assert()
        .success()
        .stdout("item-0\n");
}

#[test]
fn test_sequential_mode() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 3);
    url_fetch(dir.path())
        .args(&urls)
        .arg("--sequential")
        .assert()
        .success()
        .stdout(predicate::str::contains("item-2"));
}

#[test]
fn test_md5_output() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 1);
    url_fetch(dir.path())
        .args(&urls)
        .arg("--md5")
        .assert()
        .success()
        .stdout(format!(
            "{}  {}\n",
            url_fetch_lib::md5_hex(b"item-0\n"),
            urls[0]
        ));
}

#[test]
fn test_json_output() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 2);

    let output = url_fetch(dir.path())
        .args(&urls)
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["url"], urls[1].as_str());
    assert_eq!(entries[1]["content"], "item-1\n");
    assert_eq!(entries[1]["length"], 7);
}

#[test]
fn test_url_list_file() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 2);
    let list = dir.path().join("urls.txt");
    fs::write(&list, format!("# resources\n{}\n\n{}\n", urls[0], urls[1])).unwrap();

    url_fetch(dir.path())
        .args(["--file", list.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("item-0"))
        .stdout(predicate::str::contains("item-1"));
}

#[test]
fn test_missing_resource_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let mut urls = create_resources(dir.path(), 2);
    urls.push(format!("file://{}/absent.txt", dir.path().display()));

    url_fetch(dir.path())
        .args(&urls)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("absent.txt"));
}

#[test]
fn test_unsupported_scheme_exits_with_error() {
    let dir = TempDir::new().unwrap();
    url_fetch(dir.path())
        .arg("gopher://127.0.0.1/1/menu")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported scheme"));
}

#[test]
fn test_compare_reports_both_strategies() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 3);
    url_fetch(dir.path())
        .args(&urls)
        .args(["--compare", "-c", "2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("sequential"))
        .stderr(predicate::str::contains("throttled (max 2)"));
}

#[test]
fn test_compare_conflicts_with_sequential() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 1);
    url_fetch(dir.path())
        .args(&urls)
        .args(["--compare", "--sequential"])
        .assert()
        .failure();
}

#[test]
fn test_config_file_concurrency_is_used() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 2);
    fs::write(
        dir.path().join("url-fetch.toml"),
        "[defaults]\nconcurrency = 3\n",
    )
    .unwrap();

    url_fetch(dir.path())
        .args(&urls)
        .args(["--compare"])
        .assert()
        .success()
        .stderr(predicate::str::contains("throttled (max 3)"));
}

#[test]
fn test_invalid_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let urls = create_resources(dir.path(), 1);
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[defaults]\nconcurrency = 0\n").unwrap();

    url_fetch(dir.path())
        .args(&urls)
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}
