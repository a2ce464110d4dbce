//! End-to-end tests for the `swolegen` binary.
//!
//! Each test runs the binary with a scrubbed environment and a temp config
//! home, so a developer's real config and keys never leak in. Provider
//! traffic goes to a wiremock server.

use std::path::Path;
use std::process::Output;

use serde_json::json;
use tempfile::TempDir;
use tokio::process::Command;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use swolegen_test_utils::{plan_json, sample_inputs, workout_json};

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn swolegen(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_swolegen"));
    cmd.env_clear()
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("RUST_LOG", "warn");
    cmd
}

async fn run(cmd: &mut Command) -> Output {
    cmd.output().await.expect("failed to spawn swolegen")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

async fn mount_phase(server: &MockServer, format: &str, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": {"json_schema": {"name": format}}
        })))
        .respond_with(chat_reply(content))
        .mount(server)
        .await;
}

fn write_inputs(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("inputs.json");
    std::fs::write(&path, serde_json::to_string(&sample_inputs()).unwrap()).unwrap();
    path
}

// -----------------------------------------------------------------------
// Offline commands
// -----------------------------------------------------------------------

#[tokio::test]
async fn schema_prints_document() {
    let home = TempDir::new().unwrap();
    let out = run(swolegen(home.path()).args(["schema", "plan"])).await;
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let doc: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(doc["title"], "AnalyzerPlan");
}

#[tokio::test]
async fn schema_fingerprint_is_hex() {
    let home = TempDir::new().unwrap();
    let out = run(swolegen(home.path()).args(["schema", "workout", "--fingerprint"])).await;
    assert!(out.status.success());
    let text = stdout(&out);
    let hash = text.split_whitespace().next().unwrap();
    assert_eq!(hash.len(), 64);
    assert!(text.contains("generator_output"));
}

#[tokio::test]
async fn validate_accepts_and_rejects() {
    let home = TempDir::new().unwrap();
    let good = home.path().join("workout.json");
    std::fs::write(&good, workout_json()).unwrap();
    let out = run(swolegen(home.path()).arg("validate").arg("workout").arg(&good)).await;
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("valid workout"));

    let out = run(swolegen(home.path()).arg("validate").arg("plan").arg(&good)).await;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("is not a valid analyzer plan"));
}

#[tokio::test]
async fn init_writes_private_config_once() {
    let home = TempDir::new().unwrap();
    let out = run(swolegen(home.path()).args(["init", "--api-key", "sk-init"])).await;
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let config_path = home.path().join("swolegen").join("config.toml");
    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("api_key = \"sk-init\""));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&config_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    let again = run(swolegen(home.path()).args(["init"])).await;
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));
}

// -----------------------------------------------------------------------
// Configuration errors fail before any network activity
// -----------------------------------------------------------------------

#[tokio::test]
async fn negative_retries_is_rejected_before_network() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    let inputs = write_inputs(home.path());

    let out = run(swolegen(home.path())
        .env("OPENAI_API_KEY", "sk-test")
        .env("LLM_BASE_URL", format!("{}/v1", server.uri()))
        .env("LLM_RETRIES", "-1")
        .arg("analyze")
        .arg(&inputs))
    .await;

    assert!(!out.status.success());
    assert!(stderr(&out).contains("retry count must be non-negative"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_api_key_is_rejected_before_network() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    let inputs = write_inputs(home.path());

    let out = run(swolegen(home.path())
        .env("LLM_BASE_URL", format!("{}/v1", server.uri()))
        .arg("analyze")
        .arg(&inputs))
    .await;

    assert!(!out.status.success());
    assert!(stderr(&out).contains("api key not set"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// -----------------------------------------------------------------------
// Full pipeline against a mock provider
// -----------------------------------------------------------------------

#[tokio::test]
async fn run_produces_workout_document_and_plan() {
    let server = MockServer::start().await;
    mount_phase(&server, "analyzer_plan", &plan_json()).await;
    mount_phase(&server, "generator_output", &workout_json()).await;

    let home = TempDir::new().unwrap();
    let inputs = write_inputs(home.path());
    let plan_out = home.path().join("plan.json");

    let out = run(swolegen(home.path())
        .env("OPENAI_API_KEY", "sk-test")
        .env("LLM_BASE_URL", format!("{}/v1", server.uri()))
        .arg("run")
        .arg(&inputs)
        .arg("--plan-output")
        .arg(&plan_out))
    .await;

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let document = stdout(&out);
    assert!(document.contains("exercise: Bench Press"));
    assert!(document.contains("1.2"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&plan_out).unwrap()).unwrap();
    assert_eq!(saved["meta"]["location"], "gym:downtown");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn analyze_exhaustion_reports_every_attempt() {
    let server = MockServer::start().await;
    mount_phase(&server, "analyzer_plan", "{\"meta\": null}").await;

    let home = TempDir::new().unwrap();
    let inputs = write_inputs(home.path());

    let out = run(swolegen(home.path())
        .env("OPENAI_API_KEY", "sk-test")
        .env("LLM_BASE_URL", format!("{}/v1", server.uri()))
        .args(["--retries", "1", "analyze"])
        .arg(&inputs))
    .await;

    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("analyze failed after 2 attempt(s)"), "stderr: {err}");
    assert!(err.contains("attempt 1: ") && err.contains("attempt 2: "));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
