//! Integration tests for the pmg CLI

use assert_cmd::Command;
use git2::{Repository, Signature};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create `<root>/<full_name>.git` with one commit holding `files`
fn bare_repo(root: &Path, full_name: &str, files: &[(&str, &str)]) {
    let repo = Repository::init_bare(root.join(format!("{full_name}.git"))).unwrap();
    let mut builder = repo.treebuilder(None).unwrap();
    for (name, content) in files {
        let oid = repo.blob(content.as_bytes()).unwrap();
        builder.insert(name, oid, 0o100644).unwrap();
    }
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();
    let sig = Signature::now("pmg", "pmg@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();
}

/// Temp dir holding a `pmg.toml` plus a `git` directory for mirrors
fn workspace(extra: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let githome = dir.path().join("git");
    fs::create_dir_all(&githome).unwrap();
    fs::write(
        dir.path().join("pmg.toml"),
        format!(
            "[hook]\ngithome = \"{}\"\npuppetservers = [\"ps1.example.com\", \"ps2.example.com\"]\n{extra}",
            githome.display()
        ),
    )
    .unwrap();
    dir
}

fn pmg(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pmg").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("PMG_CONFIG")
        .arg("--config")
        .arg(dir.path().join("pmg.toml"));
    cmd
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("pmg").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("push webhooks"))
        .stdout(predicate::str::contains("classify"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("pmg").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_classify_module_repository() {
    let dir = workspace("");
    bare_repo(
        &dir.path().join("git"),
        "acme/apache",
        &[("metadata.json", r#"{"name":"acme-apache","version":"2.1.0"}"#)],
    );

    pmg(&dir)
        .args(["classify", "acme/apache"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "r10k deploy module apache --config /etc/r10k/puppet_r10k.yaml",
        ))
        .stdout(predicate::str::contains("ps2.example.com"));
}

#[test]
fn test_classify_legacy_modulefile() {
    let dir = workspace("");
    bare_repo(
        &dir.path().join("git"),
        "acme/ntp",
        &[("Modulefile", "name    'acme-ntp'\nversion '0.0.1'\n")],
    );

    pmg(&dir)
        .args(["classify", "acme/ntp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("r10k deploy module ntp"))
        .stdout(predicate::str::contains("obsolete"));
}

#[test]
fn test_classify_control_repository_without_mirror() {
    let dir = workspace("");

    pmg(&dir)
        .args(["classify", "ops/hiera_r10k"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "r10k deploy environment -p --config /etc/r10k/hiera_r10k.yaml",
        ));
}

#[test]
fn test_classify_nothing_to_deploy() {
    let dir = workspace("");
    bare_repo(&dir.path().join("git"), "acme/docs", &[("README.md", "docs")]);

    pmg(&dir)
        .args(["classify", "acme/docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to deploy"));
}

#[test]
fn test_classify_rejects_invalid_repository_name() {
    let dir = workspace("");

    pmg(&dir)
        .args(["classify", "../etc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid repository.full_name"));
}

#[test]
fn test_config_show_merges_file_over_defaults() {
    let dir = workspace("");

    pmg(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ps1.example.com"))
        .stdout(predicate::str::contains("listen = \"0.0.0.0:8666\""))
        .stdout(predicate::str::contains("user = \"root\""));
}

#[test]
fn test_environment_overrides_config_file() {
    let dir = workspace("");

    pmg(&dir)
        .env("PMG_SSH__USER", "deploy")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user = \"deploy\""));
}

#[test]
fn test_config_validate_rejects_bad_listen_address() {
    let dir = workspace("listen = \"nowhere\"\n");

    pmg(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid listen address"));
}

#[test]
fn test_config_validate_accepts_workspace() {
    let dir = workspace("");

    pmg(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

/// `echo` stands in for ssh so the deploy runs end to end without a network
#[cfg(unix)]
#[test]
fn test_deploy_runs_on_every_server() {
    let dir = workspace("[ssh]\nbinary = \"echo\"\n");

    pmg(&dir)
        .args(["-v", "deploy", "ops/puppet_r10k"])
        .assert()
        .success()
        .stdout(predicate::str::contains("root@ps1.example.com"))
        .stdout(predicate::str::contains("root@ps2.example.com"))
        .stdout(predicate::str::contains("Deploy finished"));
}

/// A failing server is logged, the command itself still succeeds
#[cfg(unix)]
#[test]
fn test_deploy_survives_failing_servers() {
    let dir = workspace("[ssh]\nbinary = \"false\"\n");

    pmg(&dir)
        .args(["-v", "deploy", "ops/puppet_r10k"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Remote command failed"))
        .stdout(predicate::str::contains("Deploy finished"));
}
