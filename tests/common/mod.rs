//! Helpers shared by the integration and e2e tests.

use assert_cmd::Command;
use chrono::{DateTime, TimeZone, Utc};
use depage::test_utils::fixtures::ProjectFixture;

/// Noon UTC; `depage` runs with `TZ=UTC`, so this is also the reported date.
pub fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .unwrap()
}

/// `depage` isolated from the user's environment and bound to `fixture`.
pub fn depage(fixture: &ProjectFixture) -> Command {
    let mut cmd = Command::cargo_bin("depage").unwrap();
    cmd.current_dir(&fixture.project_dir)
        .env("DEPAGE_CONFIG", fixture.temp_dir.path().join("no-config.toml"))
        .env("DEPAGE_LOCAL_REPOSITORY", &fixture.repository)
        .env("TZ", "UTC")
        .env_remove("DEPAGE_PROJECT")
        .env_remove("DEPAGE_STATE_DIR")
        .env_remove("DEPAGE_FORCE")
        .env_remove("DEPAGE_FILESYSTEM_FALLBACK")
        .env_remove("RUST_LOG");
    cmd
}

pub fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
