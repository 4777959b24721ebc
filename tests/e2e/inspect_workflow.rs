//! E2E Scenario: `depage inspect`

use depage::archive::MANIFEST_PATH;
use depage::test_utils::fixtures::{JarBuilder, JarEntry, ProjectFixture};
use predicates::prelude::*;
use serde_json::Value;

use super::common::{depage, noon, stderr_of};

#[test]
fn shows_both_tiers_and_the_verdict() {
    let fixture = ProjectFixture::new();
    let jar = fixture.install_jar(
        "g",
        "a",
        "1",
        &JarBuilder::new().entry(JarEntry::file(MANIFEST_PATH).local_created(noon(2011, 5, 3))),
    );

    let output = depage(&fixture)
        .args(["--robot", "inspect"])
        .arg(&jar)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr_of(&output));
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["data"]["index_created"], Value::Null);
    assert_eq!(json["data"]["manifest"]["is_dir"], false);
    assert!(json["data"]["manifest"]["created"]
        .as_str()
        .is_some_and(|created| created.starts_with("2011-05-03T12:00:00")));
    assert_eq!(json["data"]["created"], "2011-05-03");
}

#[test]
fn human_output_names_the_age() {
    let fixture = ProjectFixture::new();
    let jar = fixture.install_jar(
        "g",
        "a",
        "1",
        &JarBuilder::new().entry(JarEntry::file(MANIFEST_PATH).central_created(noon(2007, 2, 16))),
    );

    depage(&fixture)
        .arg("inspect")
        .arg(&jar)
        .assert()
        .success()
        .stdout(predicate::str::contains("2007-02-16"))
        .stdout(predicate::str::contains("Age"));
}

#[test]
fn archive_without_manifest_is_undetermined() {
    let fixture = ProjectFixture::new();
    let jar = fixture.install_jar(
        "g",
        "bare",
        "1",
        &JarBuilder::new().entry(JarEntry::file("Main.class")),
    );

    depage(&fixture)
        .arg("inspect")
        .arg(&jar)
        .assert()
        .success()
        .stdout(predicate::str::contains("absent"))
        .stdout(predicate::str::contains("undetermined"));
}

#[test]
fn unreadable_archive_fails() {
    let fixture = ProjectFixture::new();
    let path = fixture.install_file("g", "bad", "1", "jar", "not a zip archive");

    depage(&fixture)
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not open jar of:"));
}
