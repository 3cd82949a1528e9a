use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config with the cycle loop disabled
fn minimal_config(port: u16, base_folder: &std::path::Path) -> String {
    format!(
        r#"
[folders]
base_folder = "{}"

[portal]
cases_url = "http://127.0.0.1:9/cases"
status_url = "http://127.0.0.1:9/status"
constants_get_url = "http://127.0.0.1:9/constants/"
constants_post_url = "http://127.0.0.1:9/constants"

[storage]
access_token = "secret-token"

[ingest]
enabled = false

[server]
host = "127.0.0.1"
port = {}
"#,
        base_folder.display(),
        port
    )
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_casemirror"))
        .env("CASEMIRROR_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[tokio::test]
async fn test_health_and_config_endpoints() {
    let port = get_available_port();
    let base = TempDir::new().unwrap();
    let temp_file = write_config(&minimal_config(port, base.path()));

    let mut server = spawn_server(temp_file.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");
    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["storage"]["access_token_configured"], true);
    assert!(!json.to_string().contains("secret-token"));

    // Loop disabled in config
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/cycles/status", port))
        .send()
        .await
        .expect("Failed to send request");
    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["running"], false);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_casemirror"))
            .env("CASEMIRROR_CONFIG", "/nonexistent/config.toml")
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Server did not exit in time")
    .expect("Failed to run server");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let base = TempDir::new().unwrap();
    let content = minimal_config(get_available_port(), base.path())
        .replace("http://127.0.0.1:9/cases", "ftp://portal/cases");
    let temp_file = write_config(&content);

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_casemirror"))
            .env("CASEMIRROR_CONFIG", temp_file.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Server did not exit in time")
    .expect("Failed to run server");

    assert!(!result.status.success());
}
