#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("宣言されたトポロジーを、そのままAzureへ"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("outputs"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("soraflow"));
}

/// upコマンドのヘルプが正しく表示されることを確認
#[test]
fn test_up_help() {
    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.arg("up")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
}

/// outputsコマンドのヘルプが正しく表示されることを確認
#[test]
fn test_outputs_help() {
    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.arg("outputs")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--show-secrets"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

/// プロジェクト外で実行するとエラーになることを確認
#[test]
fn test_validate_without_project() {
    let project = TestProject::new();

    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.current_dir(project.path())
        .env_remove("SORA_PROJECT_ROOT")
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("プロジェクトルートが見つかりません"));
}

/// sora.kdl があるプロジェクトで validate が成功することを確認
#[test]
fn test_validate_inside_project() {
    let project = TestProject::new();
    project.write_sora_kdl(
        r#"
stack "webstack" {
    location "southeastasia"
}
"#,
    );

    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.current_dir(project.path())
        .env_remove("SORA_PROJECT_ROOT")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("webstack"))
        .stdout(predicate::str::contains("webstack-rg"))
        .stdout(predicate::str::contains("webstack-sql"))
        .stdout(predicate::str::contains("primaryStorageKey"));
}

/// ローカル上書きが反映されることを確認
#[test]
fn test_validate_with_local_override() {
    let project = TestProject::new();
    project.write_sora_kdl(
        r#"
stack "webstack" {
    location "southeastasia"
}
"#,
    );
    project.write_local_override(
        r#"
stack {
    location "eastasia"
}
"#,
    );

    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.current_dir(project.path())
        .env_remove("SORA_PROJECT_ROOT")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("eastasia"));
}

/// ステートが無い状態での status を確認
#[test]
fn test_status_with_empty_state() {
    let project = TestProject::new();
    project.write_sora_kdl(
        r#"
stack "webstack" {
    location "southeastasia"
}
"#,
    );

    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.current_dir(project.path())
        .env_remove("SORA_PROJECT_ROOT")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("リソースは記録されていません"));
}

/// ステートが無い状態での down は何もせず成功することを確認
#[test]
fn test_down_with_empty_state() {
    let project = TestProject::new();
    project.write_sora_kdl(
        r#"
stack "webstack" {
    location "southeastasia"
}
"#,
    );

    let mut cmd = Command::cargo_bin("sora").unwrap();
    cmd.current_dir(project.path())
        .env_remove("SORA_PROJECT_ROOT")
        .arg("down")
        .assert()
        .success()
        .stdout(predicate::str::contains("リソースは記録されていません"));
}
