//! Persistence round-trip and edge case tests.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tempfile::TempDir;

use crate::persistence::{ensure_dir, load_config, load_config_or_default, load_json, save_json};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct SampleConfig {
    app_name: String,
    manifest: Vec<String>,
    skip_waiting: bool,
}

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load_json_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    let config = SampleConfig {
        app_name: "kaohsiung-bus".into(),
        manifest: vec!["/".into(), "/index.html".into()],
        skip_waiting: true,
    };

    save_json(&file_path, &config).await.unwrap();
    let loaded: SampleConfig = load_json(&file_path).await.unwrap();

    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("config.json");

    save_json(&nested_path, &serde_json::json!({"key": "value"}))
        .await
        .unwrap();
    assert!(nested_path.exists());
}

#[tokio::test]
async fn test_save_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    save_json(&file_path, &SampleConfig::default()).await.unwrap();
    assert!(!file_path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let file_path = PathBuf::from("/nonexistent/path/config.json");
    let result: Result<SampleConfig, _> = load_json(&file_path).await;
    assert!(result.is_err());
}

// ============================================================================
// YAML / format selection
// ============================================================================

#[tokio::test]
async fn test_load_yaml_config() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.yaml");
    tokio::fs::write(
        &file_path,
        "app_name: bus\nmanifest:\n  - /\n  - /app.css\nskip_waiting: true\n",
    )
    .await
    .unwrap();

    let loaded: SampleConfig = load_config(&file_path).await.unwrap();
    assert_eq!(loaded.app_name, "bus");
    assert_eq!(loaded.manifest, vec!["/", "/app.css"]);
    assert!(loaded.skip_waiting);
}

#[tokio::test]
async fn test_load_config_or_default_on_garbage() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");
    tokio::fs::write(&file_path, "{ not json").await.unwrap();

    let loaded: SampleConfig = load_config_or_default(&file_path).await;
    assert_eq!(loaded, SampleConfig::default());
}

#[tokio::test]
async fn test_ensure_dir_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir_path = temp_dir.path().join("test_dir");

    ensure_dir(&dir_path).await.unwrap();
    ensure_dir(&dir_path).await.unwrap();

    assert!(dir_path.is_dir());
}
