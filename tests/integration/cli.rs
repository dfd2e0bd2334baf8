//! The `widgetbar` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use widgetbar::test_utils::{SAMPLE_CONFIG, TestWorkspace};

fn widgetbar() -> Command {
    let mut cmd = Command::cargo_bin("widgetbar").unwrap();
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_render_with_vars() {
    widgetbar()
        .args(["render", "{% if n > 1 %}{{ n }} items{% else %}one item{% end if %}"])
        .args(["--var", "n=3"])
        .assert()
        .success()
        .stdout("3 items\n");
}

#[test]
fn test_render_with_context_file() {
    let workspace = TestWorkspace::new().unwrap();
    let context = workspace
        .write("ctx.yaml", "user:\n  name: Ada\nitems: [a, b]\n")
        .unwrap();

    widgetbar()
        .args(["render", "{{ user.name }}:{% for i in items %}{{ i }}{% end for %}"])
        .arg("--context")
        .arg(&context)
        .assert()
        .success()
        .stdout("Ada:ab\n");
}

#[test]
fn test_render_syntax_error_points_at_offset() {
    widgetbar()
        .args(["render", "CPU {% if cpu %}hot"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("'if' block is never closed"))
        .stderr(predicate::str::contains("    ^"));
}

#[test]
fn test_render_rejects_bad_var() {
    widgetbar()
        .args(["render", "x", "--var", "oops"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid variable 'oops'"));
}

#[test]
fn test_check_valid_config() {
    let workspace = TestWorkspace::new().unwrap();
    let config = workspace.write("bar.yaml", SAMPLE_CONFIG).unwrap();
    let providers = workspace
        .write(
            "providers.json",
            r#"{"battery": {"level": 90, "status": "full"}, "cpu": {"usage": 5}}"#,
        )
        .unwrap();

    widgetbar()
        .arg("check")
        .arg(&config)
        .arg("--providers")
        .arg(&providers)
        .arg("--render")
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("window bar"))
        .stdout(predicate::str::contains("template cpu"))
        .stdout(predicate::str::contains("CPU 5%"))
        .stdout(predicate::str::contains("-90"));
}

#[test]
fn test_check_json_output() {
    let workspace = TestWorkspace::new().unwrap();
    let config = workspace
        .write("bar.json", r#"{"window/w": {"width": "{{ 40 + 2 }}"}}"#)
        .unwrap();

    let output = widgetbar()
        .arg("check")
        .arg(&config)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["valid"], true);
    assert_eq!(result["config"]["windows"][0]["id"], "w");
    assert_eq!(result["config"]["windows"][0]["width"], "42");
}

#[test]
fn test_check_reports_property_diagnostic() {
    let workspace = TestWorkspace::new().unwrap();
    let config = workspace
        .write("bar.yaml", "window/bar:\n  styles: 'color: {{ 1 + }}'\n")
        .unwrap();

    widgetbar()
        .arg("check")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid template in property 'window/bar.styles'"))
        .stderr(predicate::str::contains("Property: window/bar.styles"))
        .stderr(predicate::str::contains("color: {{ 1 + }}"));
}

#[test]
fn test_check_unknown_field() {
    let workspace = TestWorkspace::new().unwrap();
    let config = workspace.write("bar.yaml", "window/bar:\n  colour: red\n").unwrap();

    widgetbar()
        .args(["--quiet", "check"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config section 'window/bar'"))
        .stderr(predicate::str::contains("colour"));
}
