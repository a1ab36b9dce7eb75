use gemini_chat_widget::config::{AppConfig, LogFormat};
use gemini_chat_widget::widget::LoadingPolicy;
use serial_test::serial;
use std::env;
use std::fs;

const BIN: &str = "gemini-chat-widget";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("GCW_SERVER__PORT");
        env::remove_var("GCW_WIDGET__LOADING_POLICY");
        env::remove_var("GCW_LOG__FORMAT");
        env::remove_var("CONFIG_FILE");
        env::remove_var("HOST");
        env::remove_var("PORT");
        env::remove_var("CHAT_ENDPOINT");
        env::remove_var("LOADING_POLICY");
        env::remove_var("LOG_FORMAT");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(
        config.widget.endpoint.as_str(),
        "https://gemini-ai-assistant.onrender.com/chat"
    );
    assert_eq!(config.widget.loading_policy, LoadingPolicy::FirstSettlement);
    assert_eq!(config.widget.request_timeout(), None);
    assert_eq!(config.session.idle_timeout_secs, 1800);
    assert_eq!(config.ui.title, "🤖 Gemini AI Assistant");
    assert_eq!(config.log.format, LogFormat::Compact);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("GCW_SERVER__PORT", "9090");
        env::set_var("GCW_WIDGET__LOADING_POLICY", "all_settled");
        env::set_var("GCW_LOG__FORMAT", "json");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.widget.loading_policy, LoadingPolicy::AllSettled);
    assert_eq!(config.log.format, LogFormat::Json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("GCW_SERVER__PORT", "9090");
    }

    let config =
        AppConfig::load_from_args([BIN, "--port", "8181"]).expect("Failed to load config");
    assert_eq!(config.server.port, 8181);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = dir.path().join("widget.yaml");
    fs::write(
        &file_path,
        r#"
server:
  port: 7070
widget:
  endpoint: "http://127.0.0.1:5000/chat"
  request_timeout_secs: 20
session:
  idle_timeout_secs: 60
"#,
    )
    .expect("Failed to write temp config");

    // Tell AppConfig to use this file via Env Var (read by the CLI layer)
    unsafe {
        env::set_var("CONFIG_FILE", &file_path);
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.widget.endpoint.as_str(), "http://127.0.0.1:5000/chat");
    assert_eq!(
        config.widget.request_timeout(),
        Some(std::time::Duration::from_secs(20))
    );
    assert_eq!(config.session.idle_timeout_secs, 60);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args([BIN, "--config", "/nonexistent/widget.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    // Create ./config.yaml
    let cwd_path = "config.yaml";
    fs::write(cwd_path, "server:\n  port: 6060\n").expect("Failed to write ./config.yaml");

    let config = AppConfig::load_from_args([BIN]);

    // Clean up before asserting so a failure doesn't leave the file behind
    fs::remove_file(cwd_path).unwrap();

    assert_eq!(config.expect("Failed to load config").server.port, 6060);
}
