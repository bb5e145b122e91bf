//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess against
//! throwaway git repositories to verify that the release workflow
//! behaves correctly from a user's perspective.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd(repo: &Path) -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.current_dir(repo);
    cmd.env("TAGVER_LOG_DIR", repo.join(".logs"));
    cmd
}

fn git(repo: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(repo)
        .status()
        .expect("failed to spawn git");
    assert!(status.success(), "git {args:?} failed");
}

fn git_stdout(repo: &Path, args: &[&str]) -> String {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .expect("failed to spawn git");
    assert!(output.status.success(), "git {args:?} failed");
    String::from_utf8(output.stdout).unwrap()
}

/// Creates a git repository with one commit and an identity configured.
fn init_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path();
    git(repo, &["init", "-q"]);
    git(repo, &["config", "user.email", "release@example.com"]);
    git(repo, &["config", "user.name", "Release Bot"]);
    git(repo, &["config", "commit.gpgsign", "false"]);
    std::fs::write(repo.join("README.md"), "# demo\n").unwrap();
    git(repo, &["add", "README.md"]);
    git(repo, &["commit", "-q", "-m", "chore: initial commit"]);
    tmp
}

fn write_package_json(repo: &Path, version: &str) {
    std::fs::write(
        repo.join("package.json"),
        format!("{{\n  \"name\": \"demo\",\n  \"version\": \"{version}\"\n}}\n"),
    )
    .unwrap();
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    let tmp = init_repo();
    cmd(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Options:"))
        .stdout(predicate::str::contains("--release-as"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn version_flag_shows_version() {
    let tmp = init_repo();
    cmd(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn invalid_flag_shows_error() {
    let tmp = init_repo();
    cmd(tmp.path())
        .arg("--not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_skip_step_shows_error() {
    let tmp = init_repo();
    cmd(tmp.path())
        .args(["--skip", "everything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn chdir_nonexistent_fails() {
    let tmp = init_repo();
    cmd(tmp.path())
        .args(["-C", "/nonexistent/path/that/does/not/exist"])
        .assert()
        .failure();
}

// =============================================================================
// Release Workflow
// =============================================================================

#[test]
fn release_as_patch_bumps_commits_and_tags() {
    let tmp = init_repo();
    let repo = tmp.path();
    write_package_json(repo, "1.0.0");
    git(repo, &["add", "package.json"]);
    git(repo, &["commit", "-q", "-m", "feat: add package manifest"]);

    cmd(repo)
        .args(["--release-as", "patch", "--skip", "changelog"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "bumping version in package.json from 1.0.0 to 1.0.1",
        ))
        .stdout(predicate::str::contains("tagging release v1.0.1"));

    let manifest = std::fs::read_to_string(repo.join("package.json")).unwrap();
    assert!(manifest.contains("\"version\": \"1.0.1\""));

    let tags = git_stdout(repo, &["tag", "--list"]);
    assert!(tags.contains("v1.0.1"), "missing tag in: {tags}");

    let subject = git_stdout(repo, &["log", "-1", "--format=%s"]);
    assert_eq!(subject.trim(), "chore(release): 1.0.1");
}

#[test]
fn dry_run_leaves_repository_untouched() {
    let tmp = init_repo();
    let repo = tmp.path();
    write_package_json(repo, "2.1.0");
    git(repo, &["add", "package.json"]);
    git(repo, &["commit", "-q", "-m", "feat: manifest"]);

    cmd(repo)
        .args(["--dry-run", "--release-as", "minor", "--skip", "changelog"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "bumping version in package.json from 2.1.0 to 2.2.0",
        ))
        .stdout(predicate::str::contains("tagging release v2.2.0"));

    let manifest = std::fs::read_to_string(repo.join("package.json")).unwrap();
    assert!(manifest.contains("\"version\": \"2.1.0\""));
    assert!(git_stdout(repo, &["tag", "--list"]).trim().is_empty());
}

#[test]
fn first_release_tags_without_bumping() {
    let tmp = init_repo();
    let repo = tmp.path();
    write_package_json(repo, "0.9.0");
    git(repo, &["add", "package.json"]);
    git(repo, &["commit", "-q", "-m", "feat: manifest"]);

    cmd(repo)
        .args(["--first-release", "--skip", "changelog", "--skip", "commit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skip version bump on first release"))
        .stdout(predicate::str::contains("tagging release v0.9.0"));

    // The manifest stays as-is, only a tag is created.
    let manifest = std::fs::read_to_string(repo.join("package.json")).unwrap();
    assert!(manifest.contains("\"version\": \"0.9.0\""));
    assert!(git_stdout(repo, &["tag", "--list"]).contains("v0.9.0"));
}

#[test]
fn falls_back_to_tags_without_package_files() {
    let tmp = init_repo();
    let repo = tmp.path();
    git(repo, &["tag", "v2.3.4"]);

    cmd(repo)
        .args(["--dry-run", "--release-as", "minor", "--skip", "changelog"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tagging release v2.4.0"));
}

#[test]
fn gitignored_bump_target_is_not_updated() {
    let tmp = init_repo();
    let repo = tmp.path();
    write_package_json(repo, "1.2.0");
    std::fs::write(repo.join(".gitignore"), "package.json\n").unwrap();
    git(repo, &["add", ".gitignore"]);
    git(repo, &["commit", "-q", "-m", "chore: ignore manifest"]);

    cmd(repo)
        .args(["--dry-run", "--release-as", "patch", "--skip", "changelog"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bumping version in package.json").not());
}

#[test]
fn custom_tag_prefix_is_used() {
    let tmp = init_repo();
    let repo = tmp.path();
    write_package_json(repo, "1.0.0");
    git(repo, &["add", "package.json"]);
    git(repo, &["commit", "-q", "-m", "feat: manifest"]);

    cmd(repo)
        .args([
            "--dry-run",
            "--release-as",
            "major",
            "--skip",
            "changelog",
            "--tag-prefix",
            "release-",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("tagging release release-2.0.0"));
}

#[test]
fn silent_flag_suppresses_output() {
    let tmp = init_repo();
    let repo = tmp.path();
    write_package_json(repo, "1.0.0");
    git(repo, &["add", "package.json"]);
    git(repo, &["commit", "-q", "-m", "feat: manifest"]);

    cmd(repo)
        .args(["--dry-run", "--release-as", "patch", "--skip", "changelog", "--silent"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn prerelease_flag_appends_identifier() {
    let tmp = init_repo();
    let repo = tmp.path();
    write_package_json(repo, "1.4.0");
    git(repo, &["add", "package.json"]);
    git(repo, &["commit", "-q", "-m", "feat: manifest"]);

    cmd(repo)
        .args([
            "--dry-run",
            "--release-as",
            "minor",
            "--prerelease",
            "alpha",
            "--skip",
            "changelog",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("tagging release v1.5.0-alpha.0"));
}

#[test]
fn changelog_is_written_with_custom_engine() {
    let tmp = init_repo();
    let repo = tmp.path();
    write_package_json(repo, "1.0.0");
    git(repo, &["add", "package.json"]);
    git(repo, &["commit", "-q", "-m", "feat: manifest"]);
    std::fs::write(
        repo.join(".tagver.toml"),
        "[commands]\nchangelog = \"printf '## {{tag}}\\\\ncontent for {{version}}\\\\n'\"\n",
    )
    .unwrap();

    cmd(repo)
        .args(["--release-as", "patch", "--skip", "commit", "--skip", "tag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("outputting changes to CHANGELOG.md"));

    let changelog = std::fs::read_to_string(repo.join("CHANGELOG.md")).unwrap();
    assert!(changelog.contains("# Changelog"), "header missing: {changelog}");
    assert!(changelog.contains("## v1.0.1"), "section missing: {changelog}");
    assert!(changelog.contains("content for 1.0.1"));
}
