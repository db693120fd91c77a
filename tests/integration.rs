use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn goopss_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("goopss");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let listings_dir = root.join("data").join("listings");
    fs::create_dir_all(&listings_dir).unwrap();

    fs::write(
        listings_dir.join("shop-1.json"),
        r#"{"results": [
            {"listing_id": 1, "title": "A", "price": {"amount": 1200}},
            {"listing_id": "2", "title": "B"}
        ]}"#,
    )
    .unwrap();
    fs::write(
        root.join("data").join("optimizations.json"),
        r#"[
            {"id": "x", "listing_id": 1, "optimizedTitle": "A+", "optimizationStatus": true, "title": "A"},
            {"id": "stale", "listing_id": 99, "optimizedTitle": "Gone"}
        ]"#,
    )
    .unwrap();
    fs::write(
        root.join("data").join("tasks.json"),
        r#"[
            {"customerId": "c1", "category": "SEO", "dateCompleted": "2024-01-05"},
            {"customerId": "c1", "category": "undefined", "dateCompleted": "2024-01-10"},
            {"customerId": "c2", "category": "SEO", "dateCompleted": "2024-01-05"}
        ]"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[sources.listings]
kind = "file"
path = "{root}/data/listings/{{owner}}.json"

[sources.optimizations]
kind = "file"
path = "{root}/data/optimizations.json"

[sources.tasks]
kind = "file"
path = "{root}/data/tasks.json"

[server]
bind = "127.0.0.1:7340"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("goopss.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_goopss(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = goopss_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run goopss binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn run_json(config_path: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, success) = run_goopss(config_path, args);
    assert!(success, "{:?} failed: stdout={}, stderr={}", args, stdout, stderr);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, stdout))
}

#[test]
fn test_listings_json_reconciled() {
    let (_tmp, config_path) = setup_test_env();

    let body = run_json(&config_path, &["listings", "shop-1", "--json"]);
    assert_eq!(body["owner"], "shop-1");

    let listings = body["listings"].as_array().unwrap();
    assert_eq!(listings.len(), 2);

    assert_eq!(listings[0]["listing_id"], 1);
    assert_eq!(listings[0]["isOptimized"], true);
    assert_eq!(listings[0]["optimizedTitle"], "A+");
    assert_eq!(listings[0]["optimizationStatus"], true);
    assert_eq!(listings[0]["originalTitle"], "A");
    assert_eq!(listings[0]["id"], "x");
    assert_eq!(listings[0]["price"]["amount"], 1200);

    assert_eq!(listings[1]["listing_id"], 2);
    assert_eq!(listings[1]["isOptimized"], false);
    assert_eq!(listings[1]["optimizedTitle"], "");
    assert_eq!(listings[1]["optimizedTags"], serde_json::json!([]));
    assert!(listings[1].get("id").is_none());

    assert_eq!(body["stats"]["total"], 2);
    assert_eq!(body["stats"]["optimized"], 1);
    assert_eq!(body["stats"]["completed"], 1);
    assert_eq!(body["stats"]["orphaned_records"], 1);
}

#[test]
fn test_listings_only_optimized() {
    let (_tmp, config_path) = setup_test_env();

    let body = run_json(
        &config_path,
        &["listings", "shop-1", "--only-optimized", "--json"],
    );
    let listings = body["listings"].as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["listing_id"], 1);
    assert_eq!(body["stats"]["total"], 2);
}

#[test]
fn test_listings_table() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_goopss(&config_path, &["listings", "shop-1"]);
    assert!(success, "listings failed: {}", stderr);
    assert!(stdout.contains("LISTING ID"));
    assert!(stdout.contains("A+"));
    assert!(stdout.contains("complete"));
    assert!(stdout.contains("1 optimization record(s)"));
}

#[test]
fn test_listings_unknown_shop_is_empty() {
    let (_tmp, config_path) = setup_test_env();

    let body = run_json(&config_path, &["listings", "shop-unknown", "--json"]);
    assert_eq!(body["listings"].as_array().unwrap().len(), 0);
    assert_eq!(body["stats"]["total"], 0);
    assert_eq!(body["stats"]["orphaned_records"], 2);
}

#[test]
fn test_tasks_all_time() {
    let (_tmp, config_path) = setup_test_env();

    let body = run_json(&config_path, &["tasks", "c1", "--json"]);
    assert_eq!(body["owner"], "c1");
    assert_eq!(body["total"], 2);
    assert_eq!(
        body["categories"],
        serde_json::json!([
            {"category": "SEO", "count": 1},
            {"category": "Other", "count": 1}
        ])
    );
    assert!(body.get("range").is_none());
}

#[test]
fn test_tasks_with_range() {
    let (_tmp, config_path) = setup_test_env();

    let body = run_json(
        &config_path,
        &[
            "tasks",
            "c1",
            "--since",
            "2024-01-06",
            "--until",
            "2024-01-31",
            "--json",
        ],
    );
    assert_eq!(
        body["categories"],
        serde_json::json!([{"category": "Other", "count": 1}])
    );
    assert_eq!(body["total"], 1);
}

#[test]
fn test_tasks_table() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_goopss(&config_path, &["tasks", "c2"]);
    assert!(success, "tasks failed: {}", stderr);
    assert!(stdout.contains("CATEGORY"));
    assert!(stdout.contains("SEO"));
    assert!(stdout.contains("TOTAL"));
}

#[test]
fn test_tasks_half_open_range_errors() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_goopss(&config_path, &["tasks", "c1", "--since", "2024-01-06"]);
    assert!(!success, "a lone --since should fail");
    assert!(stderr.contains("invalid range"), "got: {}", stderr);
}

#[test]
fn test_tasks_bad_date_errors() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_goopss(
        &config_path,
        &["tasks", "c1", "--since", "last week", "--until", "2024-01-31"],
    );
    assert!(!success);
    assert!(stderr.contains("last week"), "got: {}", stderr);
}

#[test]
fn test_sources() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_goopss(&config_path, &["sources"]);
    assert!(success);
    assert!(stdout.contains("listings"));
    assert!(stdout.contains("optimizations"));
    assert!(stdout.contains("tasks"));
    assert!(stdout.contains("per-owner files"));
    assert!(!stdout.contains("false"));
}

#[test]
fn test_missing_source_file_errors() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_file(tmp.path().join("data").join("tasks.json")).unwrap();

    let (_, stderr, success) = run_goopss(&config_path, &["tasks", "c1"]);
    assert!(!success, "missing tasks file should fail");
    assert!(stderr.contains("file:tasks"), "got: {}", stderr);
}

#[test]
fn test_missing_config_errors() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_goopss(&tmp.path().join("nope.toml"), &["sources"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
