use std::env;
use std::fs;

use serial_test::serial;
use tempfile::tempdir;
use trailblaze::action_primitives::DriverType;
use trailblaze::config::{ENV_LLM_MODEL, ENV_LOG_JSON, ENV_LOG_LEVEL, ENV_MAX_STEPS};
use trailblaze::load_config;

fn clear_env() {
    for key in [ENV_MAX_STEPS, ENV_LLM_MODEL, ENV_LOG_LEVEL, ENV_LOG_JSON] {
        env::remove_var(key);
    }
}

#[tokio::test]
#[serial]
async fn loads_explicit_yaml_file() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("trailblaze.yaml");
    fs::write(
        &path,
        "llm:\n  model: gpt-4o\n  vision: false\ndriver: ios\nagent:\n  max_steps: 12\nlogging:\n  level: debug\n",
    )
    .unwrap();

    let loaded = load_config(Some(path.as_path())).await.unwrap();

    assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
    assert_eq!(loaded.config.llm.model, "gpt-4o");
    assert!(!loaded.config.llm.vision);
    assert_eq!(loaded.config.driver, DriverType::Ios);
    assert_eq!(loaded.config.agent.max_steps, 12);
    assert_eq!(loaded.config.agent.retry.max_attempts, 3);
    assert_eq!(loaded.config.logging.level, "debug");
}

#[tokio::test]
#[serial]
async fn missing_explicit_file_falls_back_to_defaults() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let loaded = load_config(Some(path.as_path())).await.unwrap();

    assert!(loaded.path.is_none());
    assert_eq!(loaded.config.agent.max_steps, 50);
    assert_eq!(loaded.config.scroll.default_timeout_ms, 20_000);
}

#[tokio::test]
#[serial]
async fn malformed_yaml_is_an_error() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "agent:\n  max_steps: many\n").unwrap();

    let err = load_config(Some(path.as_path())).await.err().unwrap();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[tokio::test]
#[serial]
async fn environment_overrides_file_values() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("trailblaze.yaml");
    fs::write(&path, "agent:\n  max_steps: 12\n").unwrap();

    env::set_var(ENV_MAX_STEPS, "7");
    env::set_var(ENV_LLM_MODEL, "claude-sonnet");
    env::set_var(ENV_LOG_LEVEL, "trace");
    env::set_var(ENV_LOG_JSON, "true");
    let loaded = load_config(Some(path.as_path())).await;
    clear_env();

    let config = loaded.unwrap().config;
    assert_eq!(config.agent.max_steps, 7);
    assert_eq!(config.llm.model, "claude-sonnet");
    assert_eq!(config.logging.level, "trace");
    assert!(config.logging.json);
}

#[tokio::test]
#[serial]
async fn invalid_override_is_rejected() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    env::set_var(ENV_MAX_STEPS, "lots");
    let loaded = load_config(Some(path.as_path())).await;
    clear_env();

    assert!(loaded.is_err());
}
