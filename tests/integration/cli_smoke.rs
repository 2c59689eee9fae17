//! Smoke tests running the real binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn podbuild() -> Command {
    Command::cargo_bin("podbuild").expect("binary should build")
}

#[test]
fn help_lists_the_build_command() {
    podbuild()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("--project-dir"));
}

#[test]
fn build_requires_at_least_one_pod() {
    podbuild().arg("build").assert().failure();
}

#[test]
fn verbose_and_quiet_conflict() {
    podbuild()
        .args(["--verbose", "--quiet", "build", "Alamofire"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn missing_graph_reports_error_and_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    podbuild()
        .args(["--project-dir", dir.path().to_str().unwrap()])
        .args(["build", "Alamofire"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("resolved dependency graph not found"))
        .stderr(predicate::str::contains("--update-sources"));
}

#[test]
fn unknown_pod_suggests_the_closest_name() {
    let dir = tempfile::tempdir().unwrap();
    let podbuild_dir = dir.path().join(".podbuild");
    std::fs::create_dir_all(&podbuild_dir).unwrap();
    std::fs::write(
        podbuild_dir.join("resolved-graph.json"),
        serde_json::json!({
            "items": [{ "name": "Alamofire", "version": "5.8.0" }],
            "targets": ["Pods-App"],
            "pods_by_target": { "App": ["Alamofire"] }
        })
        .to_string(),
    )
    .unwrap();

    podbuild()
        .args(["--project-dir", dir.path().to_str().unwrap()])
        .args(["build", "Alamofir"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("was not found"))
        .stderr(predicate::str::contains("did you mean 'Alamofire'?"));
}
