use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const REGISTRY: &str = r#"
help: true
exit_command: exit
commands:
  - template: start [[Url]] [[ThreadsCount]]
    description: Starts the crawler
    fields:
      Url: text
      ThreadsCount: uint
  - template: add user [[Username]] [[Age]]
    fields:
      Username: text
      Age: uint
  - name: docker run
    description: Runs a container
    fields:
      Name: text
      Detached: bool
      Removed: bool
      Volumes:
        list:
          Name: text
          MapTo: text
      Image:
        composite:
          Name: text
          Tag: text
    parameters:
      - { name: --name, required: true, value: "[[Name]]", description: Container name }
      - { name: --detach, alias: -d, composite: Image, value: "[[Name]]:[[Tag]]", description: Image to run }
      - { name: --rm, flag: Removed }
      - { name: --volume, alias: -v, repeatable: true, composite: Volumes, value: "[[Name]]:[[MapTo]]" }
"#;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_command-shell")
}

fn write_registry(dir: &TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("registry.yaml");
    fs::write(&path, yaml).expect("failed to write registry");
    path
}

fn run_with_input(registry: &Path, extra: &[&str], input: &str) -> Output {
    let mut child = Command::new(bin())
        .arg("run")
        .arg(registry)
        .args(extra)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn command-shell");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for command-shell")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn check_accepts_valid_registry() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(&dir, REGISTRY);

    let output = Command::new(bin()).arg("check").arg(&registry).output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok: 4 commands");
}

#[test]
fn check_reports_duplicate_templates() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(
        &dir,
        "commands:\n  - template: docker run\n  - name: docker run\n",
    );

    let output = Command::new(bin()).arg("check").arg(&registry).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: invalid registry: duplicate input template: docker run"));
}

#[test]
fn check_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(bin())
        .arg("check")
        .arg(dir.path().join("missing.yaml"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load registry"));
}

#[test]
fn help_prints_generated_text() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(&dir, REGISTRY);

    let output = Command::new(bin()).arg("help").arg(&registry).output().unwrap();

    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Command: start [[Url]] [[ThreadsCount]]\nDescription: Starts the crawler\n"));
    assert!(text.contains(
        "Command: docker run\nDescription: Runs a container\nParameters:\n\
         --name            Container name\n\
         --detach    -d    Image to run\n\
         --rm\n\
         --volume    -v\n"
    ));
    assert!(text.contains("Command: exit\nDescription: Ends the session\n"));
}

#[test]
fn help_works_without_generated_help_command() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(
        &dir,
        "help: false\ncommands:\n  - template: help [[Topic]]\n    description: Custom help\n    fields: { Topic: text }\n",
    );

    let output = Command::new(bin()).arg("help").arg(&registry).output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout)
        .contains("Command: help [[Topic]]\nDescription: Custom help\n"));
}

#[test]
fn run_dispatches_lines_until_exit() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(&dir, REGISTRY);

    let output = run_with_input(
        &registry,
        &[],
        concat!(
            "start http://site.com 4\n",
            "\n",
            "add user \"Alex Smith\" 24\n",
            "dock run --name x\n",
            "docker run --name web -v /etc/timezone:/etc/timezone:ro --rm -d my-service:v1\n",
            "exit\n",
            "start http://never.com 1\n",
        ),
    );

    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 4, "unexpected output: {lines:?}");

    let start: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(
        start,
        serde_json::json!({
            "command": "start [[Url]] [[ThreadsCount]]",
            "fields": { "Url": "http://site.com", "ThreadsCount": 4 }
        })
    );

    let user: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(user["fields"]["Username"], "Alex Smith");

    assert_eq!(
        lines[2],
        "Command not found. Type 'help' for getting available commands."
    );

    let run: serde_json::Value = serde_json::from_str(&lines[3]).unwrap();
    assert_eq!(
        run["fields"],
        serde_json::json!({
            "Name": "web",
            "Removed": true,
            "Image": { "Name": "my-service", "Tag": "v1" },
            "Volumes": [{ "Name": "/etc/timezone", "MapTo": "/etc/timezone:ro" }],
        })
    );
}

#[test]
fn run_reports_parse_errors_and_logs_them() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(&dir, REGISTRY);
    let log = dir.path().join("errors.log");

    let output = run_with_input(
        &registry,
        &["--log-errors", log.to_str().unwrap()],
        concat!(
            "docker run --rm\n",
            "docker run --name a --name b\n",
            "docker run --name a -x 1\n",
            "start http://site.com many\n",
        ),
    );

    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        [
            "Missing required parameters --name for command docker run.",
            "Found duplicated parameter --name for command docker run.",
            "Parameter -x is unknown for command docker run.",
            "Incorrect command format.",
        ]
    );

    let logged = fs::read_to_string(&log).unwrap();
    let logged: Vec<&str> = logged.lines().collect();
    assert_eq!(logged.len(), 4);
    assert!(logged[0].starts_with("Missing required parameters during command parsing: docker run --rm. Error:"));
    assert!(logged[3].starts_with(
        "Format error during command parsing: start http://site.com many. Error: cannot convert 'many'"
    ));
}

#[test]
fn run_with_invalid_registry_fails() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(&dir, "help: true\ncommands:\n  - template: help [[Topic]]\n    fields: { Topic: text }\n");

    let output = run_with_input(&registry, &[], "");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("reserved command name"));
}
