//! Tests for main.rs startup validation (SESSION_SECRET_KEY, API URL, origin)

use std::process::{Command, Output, Stdio};
use std::time::Duration;

const SECRET: &str = "test-secret-that-is-long-enough!!";

fn cargo_bin() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps
    path.push("bikebroker");
    path
}

fn command() -> Command {
    let mut command = Command::new(cargo_bin());
    command
        .env_remove("SESSION_SECRET_KEY")
        .env_remove("NEXT_PUBLIC_API_URL")
        .env_remove("PUBLIC_ORIGIN")
        .env_remove("PORT")
        .stderr(Stdio::piped())
        .stdout(Stdio::piped());
    command
}

fn combined_output(output: &Output) -> String {
    // tracing logs to stdout by default
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn test_missing_session_secret_exits_with_error() {
    let output = command()
        .args(["--api-url", "http://127.0.0.1:5000"])
        .output()
        .expect("Failed to run binary");

    assert_eq!(output.status.code(), Some(1));
    let combined = combined_output(&output);
    assert!(
        combined.contains("SESSION_SECRET_KEY") && combined.contains("required"),
        "Should mention SESSION_SECRET_KEY is required, got: {}",
        combined
    );
}

#[test]
fn test_short_session_secret_exits_with_error() {
    let output = command()
        .env("SESSION_SECRET_KEY", "too-short")
        .args(["--api-url", "http://127.0.0.1:5000"])
        .output()
        .expect("Failed to run binary");

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("shorter than 32"));
}

#[test]
fn test_secret_file_is_accepted() {
    let path = std::env::temp_dir().join(format!("bikebroker-secret-{}", std::process::id()));
    std::fs::write(&path, format!("{}\n", SECRET)).unwrap();

    let mut child = command()
        .args([
            "--api-url",
            "http://127.0.0.1:5000",
            "--session-secret-file",
            path.to_str().unwrap(),
            "--port",
            "0",
        ])
        .spawn()
        .expect("Failed to run binary");

    std::thread::sleep(Duration::from_millis(500));
    let still_running = child.try_wait().unwrap().is_none();
    child.kill().ok();
    child.wait().ok();
    std::fs::remove_file(&path).ok();

    assert!(still_running, "Server should start with a secret file");
}

#[test]
fn test_invalid_api_url_exits_with_error() {
    let output = command()
        .env("SESSION_SECRET_KEY", SECRET)
        .args(["--api-url", "not a url"])
        .output()
        .expect("Failed to run binary");

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Invalid API URL"));
}

#[test]
fn test_http_non_localhost_origin_exits_with_error() {
    let output = command()
        .env("SESSION_SECRET_KEY", SECRET)
        .args([
            "--api-url",
            "http://127.0.0.1:5000",
            "--origin",
            "http://dashboard.example.com",
        ])
        .output()
        .expect("Failed to run binary");

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("HTTPS"));
}
