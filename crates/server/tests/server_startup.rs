use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config
fn minimal_config(port: u16, temp_dir: &std::path::Path) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[processor]
temp_dir = "{}"
download_timeout_secs = 5
"#,
        port,
        temp_dir.display()
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_archiver"))
        .env("ARCHIVER_CONFIG", config_path)
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
            .get(format!("http://127.0.0.1:{}/health", port))
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

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, temp_dir.path()));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_task_is_archived_from_remote_files() {
    let files = MockServer::start().await;
    for (name, body) in [("a.pdf", "pdf"), ("b.jpg", "jpg"), ("c.jpeg", "jpeg")] {
        Mock::given(method("GET"))
            .and(path(format!("/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&files)
            .await;
    }

    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, temp_dir.path()));
    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let base = format!("http://127.0.0.1:{}", port);

    let task: Value = client
        .post(format!("{}/tasks", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let task_id = task["id"].as_str().unwrap().to_string();

    for name in ["a.pdf", "b.jpg", "c.jpeg"] {
        let response = client
            .post(format!("{}/tasks/{}/items", base, task_id))
            .json(&json!({ "url": format!("{}/{}", files.uri(), name) }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 204);
    }

    let mut task = Value::Null;
    for _ in 0..100 {
        task = client
            .get(format!("{}/tasks/{}", base, task_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if task["status"] == "done" || task["status"] == "error" {
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(task["status"], "done");
    let archive_path = task["result"].as_str().unwrap();
    assert!(archive_path.starts_with(temp_dir.path().to_str().unwrap()));
    let archive = zip::ZipArchive::new(std::fs::File::open(archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 3);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_env_overrides_without_config_file() {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();

    let mut server = tokio::process::Command::new(env!("CARGO_BIN_EXE_archiver"))
        .env("ARCHIVER_CONFIG", "/nonexistent/config.toml")
        .env("ARCHIVER_SERVER__HOST", "127.0.0.1")
        .env("ARCHIVER_SERVER__PORT", port.to_string())
        .env("ARCHIVER_PROCESSOR__TEMP_DIR", temp_dir.path())
        .env("RUST_LOG", "error")
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server");

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    server.kill().await.ok();
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let config = write_config(
        r#"
[server]
port = 8080

[processor]
max_concurrent = 0
"#,
    );

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_archiver"))
            .env("ARCHIVER_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_malformed_config_exits_with_error() {
    let config = write_config("[server\nport = ");

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_archiver"))
            .env("ARCHIVER_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
