use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a test command isolated from the user's configuration
fn tableauctl(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tableauctl").unwrap();
    cmd.arg("--config-file")
        .arg(config_dir.path().join("config.toml"))
        .env_remove("TABLEAUCTL_CONN_ID")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tableau Server CLI"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tableauctl"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_json() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"tableauctl\""));
}

#[test]
fn test_no_args_shows_help() {
    Command::cargo_bin("tableauctl")
        .unwrap()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_invalid_refresh_target() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .args(["refresh", "dashboard", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_invalid_wait_target() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .args(["job", "wait", "abc", "--target", "finished"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_connection_path_uses_config_file() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .args(["connection", "path", "-o", "jsonl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_connection_list_empty() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .args(["connection", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 0"));
}

#[test]
fn test_connection_set_show_remove() {
    let dir = TempDir::new().unwrap();

    tableauctl(&dir)
        .args([
            "connection",
            "set",
            "prod",
            "--host",
            "https://tableau.example.com",
            "--login",
            "admin",
            "--password",
            "hunter2",
            "--site-id",
            "finance",
            "--verify",
            "no",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"added\""));

    let saved = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(saved.contains("[connections.prod]"));
    assert!(saved.contains("default_connection = \"prod\""));

    tableauctl(&dir)
        .args(["connection", "show", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("finance"))
        .stdout(predicate::str::contains("\"verify\": false"))
        .stdout(predicate::str::contains("***"))
        .stdout(predicate::str::contains("hunter2").not());

    tableauctl(&dir)
        .args(["connection", "list", "-o", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("id: prod"));

    tableauctl(&dir)
        .args(["connection", "remove", "prod"])
        .assert()
        .success();

    tableauctl(&dir)
        .args(["connection", "show", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Connection 'prod' not found"));
}

#[test]
fn test_connection_commands_follow_output_format() {
    let dir = TempDir::new().unwrap();

    tableauctl(&dir)
        .args([
            "-o",
            "yaml",
            "connection",
            "set",
            "dev",
            "--host",
            "https://tableau.example.com",
            "--jwt-token",
            "eyJ.token",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("status: added"))
        .stdout(predicate::str::contains("\"status\"").not());

    tableauctl(&dir)
        .args(["-o", "jsonl", "connection", "default", "dev"])
        .assert()
        .success()
        .stdout(predicate::eq("{\"default_connection\":\"dev\"}\n"));

    tableauctl(&dir)
        .args(["-o", "yaml", "connection", "remove", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("status: removed"));
}

#[test]
fn test_corrupt_config_only_breaks_registry_commands() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "this is = = not toml [").unwrap();

    tableauctl(&dir).arg("version").assert().success();

    tableauctl(&dir)
        .args(["connection", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    tableauctl(&dir)
        .args(["connection", "list"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_connection_set_requires_login_and_password() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .args([
            "connection",
            "set",
            "prod",
            "--host",
            "https://tableau.example.com",
            "--login",
            "admin",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--login and --password"));
}

#[test]
fn test_unknown_connection_fails_with_hint() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .args(["--conn-id", "nope", "job", "status", "job-1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Connection 'nope' not found"))
        .stderr(predicate::str::contains("tableauctl connection list"));
}

#[test]
fn test_unknown_resource_fails_before_connecting() {
    let dir = TempDir::new().unwrap();
    tableauctl(&dir)
        .args(["list", "dashboards"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Resource name dashboards is not found.",
        ));
}

async fn mock_tableau() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/2.4/serverinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "serverInfo": { "restApiVersion": "3.19" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3.19/auth/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "credentials": { "token": "tok", "site": { "id": "site-luid" } }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3.19/auth/signout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_job_status_against_server() {
    let server = mock_tableau().await;
    Mock::given(method("GET"))
        .and(path("/api/3.19/sites/site-luid/jobs/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": { "id": "job-1", "finishCode": "2" }
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let connection = json!({
        "host": server.uri(),
        "login": "admin",
        "password": "s3cret"
    });

    tableauctl(&dir)
        .env("TABLEAU_CONN_CLI_TEST", connection.to_string())
        .args(["--conn-id", "cli_test", "job", "status", "job-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"CANCELED\""))
        .stdout(predicate::str::contains("\"finish_code\": 2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_streams_json_lines() {
    let server = mock_tableau().await;
    Mock::given(method("GET"))
        .and(path("/api/3.19/sites/site-luid/workbooks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pagination": { "pageNumber": "1", "pageSize": "100", "totalAvailable": "2" },
            "workbooks": { "workbook": [
                { "id": "wb-1", "name": "Sales" },
                { "id": "wb-2", "name": "Ops" }
            ] }
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let connection = json!({
        "host": server.uri(),
        "login": "admin",
        "password": "s3cret"
    });

    let output = tableauctl(&dir)
        .env("TABLEAU_CONN_CLI_LIST", connection.to_string())
        .args(["-c", "cli_list", "-o", "jsonl", "list", "workbooks"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"wb-1\""));
}
