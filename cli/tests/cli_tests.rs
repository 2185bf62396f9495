//! End-to-end CLI tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn cmd() -> Command {
    Command::cargo_bin("json-tools").unwrap()
}

fn write_input(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn flatten_a_file() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", r#"{"user":{"name":"John"}}"#);

    cmd()
        .arg("-f")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""user.name":"John""#));
}

#[test]
fn schema_from_a_batch() {
    let dir = tempdir().unwrap();
    let input = write_input(
        &dir,
        "in.json",
        r#"[{"id":1,"name":"a"},{"id":2,"name":"b","active":true}]"#,
    );

    cmd()
        .arg("--schema")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("draft-07"))
        .stdout(predicate::str::contains(r#""required":["id","name"]"#));
}

#[test]
fn remove_empty_and_nulls_compose() {
    let dir = tempdir().unwrap();
    let input = write_input(
        &dir,
        "in.json",
        r#"{"name":"John","email":"","phone":"555","address":null}"#,
    );

    cmd()
        .arg("-e")
        .arg("-n")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"name":"John","phone":"555"}"#));
}

#[test]
fn replace_keys_takes_two_values() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", r#"{"old_a":1,"keep":3}"#);

    cmd()
        .args(["-r", "^old_a$", "new_a"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"new_a":1,"keep":3}"#));
}

#[test]
fn replace_values_takes_two_values() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", r#"{"k":"secret stuff"}"#);

    cmd()
        .args(["-v", "secret", "[gone]"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"k":"[gone]"}"#));
}

#[test]
fn reads_stdin_with_dash() {
    cmd()
        .arg("-f")
        .arg("-")
        .write_stdin(r#"{"a":{"b":1}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"a.b":1}"#));
}

#[test]
fn writes_to_output_file() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", r#"{"a":{"b":1}}"#);
    let out_path = dir.path().join("out.json");

    cmd()
        .arg("-f")
        .arg("-o")
        .arg(&out_path)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&out_path).unwrap();
    assert_eq!(written, "{\"a.b\":1}\n");
}

#[test]
fn pretty_flag_indents() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", r#"{"a":{"b":1}}"#);

    cmd()
        .args(["-f", "-p"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("{\n  \"a.b\": 1\n}"));
}

#[test]
fn later_action_flag_wins() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", r#"{"a":{"b":1}}"#);

    // -f then -s: schema wins.
    cmd()
        .args(["-f", "-s"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("draft-07"));

    // -s then -f: flatten wins.
    cmd()
        .args(["-s", "-f"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"a.b":1}"#));
}

#[test]
fn threads_flag_accepts_optional_value() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", r#"{"a":{"b":1}}"#);

    cmd().args(["-f", "-t", "2"]).arg(&input).assert().success();
    // Bare `-t` (auto thread count) must come after the positional so it
    // does not swallow the path as its value.
    cmd().arg(&input).args(["-f", "-t"]).assert().success();
}

#[test]
fn no_action_validates_and_reserializes() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", r#"{ "a" : 1 }"#);

    cmd()
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"a":1}"#));
}

#[test]
fn parse_error_exits_nonzero() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", "{ not json");

    cmd()
        .arg("-f")
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Parse").or(predicate::str::contains("parse")));
}

#[test]
fn missing_file_exits_nonzero() {
    cmd()
        .arg("-f")
        .arg("/nonexistent/input.json")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read input file"));
}

#[test]
fn invalid_pattern_exits_nonzero() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "in.json", "{}");

    cmd()
        .args(["-r", "([", "x"])
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid pattern"));
}

#[test]
fn help_lists_the_flag_surface() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--flatten"))
        .stdout(predicate::str::contains("--schema"))
        .stdout(predicate::str::contains("--remove-empty"))
        .stdout(predicate::str::contains("--remove-nulls"))
        .stdout(predicate::str::contains("--replace-keys"))
        .stdout(predicate::str::contains("--replace-values"))
        .stdout(predicate::str::contains("--threads"))
        .stdout(predicate::str::contains("--pretty"))
        .stdout(predicate::str::contains("--output"));
}
