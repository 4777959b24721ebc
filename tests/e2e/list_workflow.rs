//! E2E Scenario: `depage list`
//!
//! - A jar whose manifest carries only a DOS stamp is reported with its date
//! - A pom dependency gets exactly one warning
//! - Unchanged descriptors skip the run; `--force` and edits re-run it
//! - Resolution failures and unreadable jars fail the build

use depage::archive::MANIFEST_PATH;
use depage::test_utils::fixtures::{JarBuilder, JarEntry, ProjectFixture};
use serde_json::Value;

use super::common::{count, depage, noon, stderr_of};

const STAX_UTILS: &str = r#"
[[dependencies]]
group = "stax-utils"
name = "stax-utils"
version = "20070216"
"#;

const INFO_PREFIX: &str = "The creation date of:";
const WARN_PREFIX: &str = "Could not determine age of:";

fn stax_fixture() -> ProjectFixture {
    let fixture = ProjectFixture::new();
    let jar = JarBuilder::new()
        .entry(JarEntry::directory("META-INF"))
        .entry(
            JarEntry::file(MANIFEST_PATH)
                .contents("Manifest-Version: 1.0\n")
                .modified(noon(2007, 2, 16)),
        )
        .entry(JarEntry::file("javanet/staxutils/Indentation.class"));
    let _ = fixture.install_jar("stax-utils", "stax-utils", "20070216", &jar);
    let _ = fixture.write_descriptor(STAX_UTILS);
    fixture
}

#[test]
fn reports_the_creation_date_of_a_dated_jar() {
    let fixture = stax_fixture();

    let output = depage(&fixture).arg("list").output().unwrap();

    assert!(output.status.success(), "{}", stderr_of(&output));
    let stderr = stderr_of(&output);
    assert_eq!(count(&stderr, INFO_PREFIX), 1, "{stderr}");
    assert!(stderr.contains(
        "The creation date of: stax-utils:stax-utils:20070216:jar is: 2007-02-16"
    ));
    assert_eq!(count(&stderr, WARN_PREFIX), 0, "{stderr}");
}

#[test]
fn pom_dependency_gets_one_warning() {
    let fixture = ProjectFixture::new();
    let _ = fixture.install_file("org.example", "parent", "3", "pom", "<project/>");
    let _ = fixture.write_descriptor(
        r#"
[[dependencies]]
group = "org.example"
name = "parent"
version = "3"
type = "pom"
"#,
    );

    let output = depage(&fixture).arg("list").output().unwrap();

    assert!(output.status.success(), "{}", stderr_of(&output));
    let stderr = stderr_of(&output);
    assert_eq!(count(&stderr, WARN_PREFIX), 1, "{stderr}");
    assert!(stderr.contains("Could not determine age of: org.example:parent:3:pom"));
    assert_eq!(count(&stderr, INFO_PREFIX), 0, "{stderr}");
}

#[test]
fn creation_time_from_the_local_header_is_found() {
    let fixture = ProjectFixture::new();
    let jar = JarBuilder::new()
        .entry(JarEntry::file(MANIFEST_PATH).local_created(noon(2011, 5, 3)));
    let _ = fixture.install_jar("g", "local", "1", &jar);
    let _ = fixture.write_descriptor(
        "[[dependencies]]\ngroup = \"g\"\nname = \"local\"\nversion = \"1\"\n",
    );

    let output = depage(&fixture).arg("list").output().unwrap();
    assert!(stderr_of(&output).contains("The creation date of: g:local:1:jar is: 2011-05-03"));

    let output = depage(&fixture)
        .args(["list", "--force", "--no-fallback"])
        .output()
        .unwrap();
    assert!(stderr_of(&output).contains("Could not determine age of: g:local:1:jar"));
}

#[test]
fn unchanged_descriptor_skips_the_run() {
    let fixture = stax_fixture();

    let first = depage(&fixture).arg("list").output().unwrap();
    assert_eq!(count(&stderr_of(&first), INFO_PREFIX), 1);

    let second = depage(&fixture).arg("list").output().unwrap();
    assert!(second.status.success());
    let stderr = stderr_of(&second);
    assert_eq!(count(&stderr, INFO_PREFIX), 0, "{stderr}");
    assert_eq!(count(&stderr, WARN_PREFIX), 0, "{stderr}");

    let forced = depage(&fixture).args(["list", "--force"]).output().unwrap();
    assert_eq!(count(&stderr_of(&forced), INFO_PREFIX), 1);

    let _ = fixture.write_descriptor(&format!("{STAX_UTILS}\n# edited\n"));
    let edited = depage(&fixture).arg("list").output().unwrap();
    assert_eq!(count(&stderr_of(&edited), INFO_PREFIX), 1);
}

#[test]
fn transitive_dependencies_are_reported_in_resolution_order() {
    let fixture = stax_fixture();
    let _ = fixture.install_jar(
        "org.example",
        "lib",
        "2",
        &JarBuilder::new().entry(JarEntry::file(MANIFEST_PATH).central_created(noon(2015, 1, 9))),
    );
    let _ = fixture.install_artifact_descriptor("org.example", "lib", "2", STAX_UTILS);
    let _ = fixture.write_descriptor(
        "[[dependencies]]\ngroup = \"org.example\"\nname = \"lib\"\nversion = \"2\"\n",
    );

    let output = depage(&fixture).arg("list").output().unwrap();

    let stderr = stderr_of(&output);
    let lib = stderr.find("org.example:lib:2:jar is: 2015-01-09").unwrap();
    let stax = stderr.find("stax-utils:stax-utils:20070216:jar is: 2007-02-16").unwrap();
    assert!(lib < stax, "{stderr}");
}

#[test]
fn missing_artifact_fails_resolution() {
    let fixture = ProjectFixture::new();
    let _ = fixture.write_descriptor(STAX_UTILS);

    let output = depage(&fixture).arg("list").output().unwrap();

    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Error: could not resolve dependencies"), "{stderr}");
    assert!(stderr.contains("caused by:"), "{stderr}");
    assert_eq!(count(&stderr, INFO_PREFIX) + count(&stderr, WARN_PREFIX), 0);
}

#[test]
fn unreadable_jar_fails_the_build() {
    let fixture = ProjectFixture::new();
    let _ = fixture.install_file("g", "bad", "1", "jar", "not a zip archive");
    let _ = fixture.write_descriptor(
        "[[dependencies]]\ngroup = \"g\"\nname = \"bad\"\nversion = \"1\"\n",
    );

    let output = depage(&fixture).arg("list").output().unwrap();

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("Error: could not open jar of: g:bad:1:jar"));

    // A failed run records nothing, so the next run is not gated.
    let again = depage(&fixture).arg("list").output().unwrap();
    assert!(stderr_of(&again).contains("could not open jar of: g:bad:1:jar"));
}

#[test]
fn missing_descriptor_is_an_error() {
    let fixture = ProjectFixture::new();

    depage(&fixture)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicates::str::contains("depage.toml"));
}

#[test]
fn robot_mode_emits_a_json_summary() {
    let fixture = stax_fixture();

    let output = depage(&fixture).args(["--robot", "list"]).output().unwrap();

    assert!(output.status.success(), "{}", stderr_of(&output));
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["skipped"], false);
    assert_eq!(json["data"]["dated"], 1);
    assert_eq!(
        json["data"]["dependencies"][0]["dependency"],
        "stax-utils:stax-utils:20070216:jar"
    );
    assert_eq!(json["data"]["dependencies"][0]["created"], "2007-02-16");

    let skipped = depage(&fixture).args(["--robot", "list"]).output().unwrap();
    let json: Value = serde_json::from_slice(&skipped.stdout).unwrap();
    assert_eq!(json["data"]["skipped"], true);
}

#[test]
fn robot_mode_reports_errors_as_json() {
    let fixture = ProjectFixture::new();
    let _ = fixture.write_descriptor(STAX_UTILS);

    let output = depage(&fixture).args(["--robot", "list"]).output().unwrap();

    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"]["error"]["code"], "resolution_failure");
    assert!(json["status"]["error"]["causes"].as_array().is_some_and(|c| !c.is_empty()));
}

#[test]
fn quiet_mode_silences_report_lines() {
    let fixture = stax_fixture();

    let output = depage(&fixture).args(["--quiet", "list"]).output().unwrap();

    assert!(output.status.success());
    assert!(output.stderr.is_empty());
}
