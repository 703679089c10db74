//! End-to-end tests of the lettore binary.

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

fn lettore() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("lettore"));
    cmd.env_remove("LETTORE_SITE_URL")
        .env_remove("LETTORE_API_KEY")
        .env_remove("LETTORE_SESSION_DIR")
        .env_remove("LETTORE_CONFIG_FILE");
    cmd
}

fn seed_entries(session_file: &std::path::Path, entries: serde_json::Value) {
    let mut doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(session_file).expect("session file"))
            .expect("session json");
    doc["entries"] = entries;
    std::fs::write(
        session_file,
        serde_json::to_vec_pretty(&doc).expect("session json"),
    )
    .expect("write session file");
}

#[test]
fn anonymous_read_prints_post_and_login_hint() {
    let server = MockServer::start();
    let post_mock = server.mock(|when, then| {
        when.method("GET").path("/api/posts/42");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({
                "id": 42,
                "title": "Incremental build pipelines",
                "content": "Post body goes here.",
                "category": "ENGINEERING",
                "authorUsername": "amara",
                "views": 10,
                "likes": 3,
                "createdAt": "2026-01-05T09:30:00Z",
                "updatedAt": "2026-01-05T09:30:00Z"
            }));
    });

    let dir = TempDir::new().expect("tmp dir");
    lettore()
        .arg("read")
        .arg("42")
        .arg("--site")
        .arg(server.base_url())
        .arg("--session-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("Incremental build pipelines"))
        .stdout(contains("3 likes"))
        .stdout(contains("Log in to like posts"));

    post_mock.assert();
}

#[test]
fn read_without_site_fails_fast() {
    let dir = TempDir::new().expect("tmp dir");
    lettore()
        .arg("read")
        .arg("42")
        .arg("--session-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(contains("site url is not configured"));
}

#[test]
fn login_logout_round_trip_clears_flags() {
    let dir = TempDir::new().expect("tmp dir");

    lettore()
        .arg("login")
        .arg("--user")
        .arg("7")
        .arg("--session-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("Logged in as user 7."));

    // Seed flags the way a viewing session would leave them.
    seed_entries(
        &dir.path().join("session.json"),
        serde_json::json!({
            "liked_post_42_user_7": "true",
            "viewed_post_42_user_7": "true",
            "viewed_post_9_user_8": "true"
        }),
    );

    lettore()
        .arg("session")
        .arg("show")
        .arg("--session-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("user 7"))
        .stdout(contains("liked_post_42_user_7 = true"));

    lettore()
        .arg("logout")
        .arg("--session-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("Logged out user 7; cleared 2 session flags."));

    // The other user's flag survives; the departing user's are gone.
    lettore()
        .arg("session")
        .arg("show")
        .arg("--session-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("user (none)"))
        .stdout(contains("viewed_post_9_user_8 = true"))
        .stdout(contains("liked_post_42_user_7").not());
}

#[test]
fn session_clear_viewed_removes_only_viewed_flags() {
    let dir = TempDir::new().expect("tmp dir");

    lettore()
        .arg("login")
        .arg("--user")
        .arg("7")
        .arg("--session-dir")
        .arg(dir.path())
        .assert()
        .success();

    seed_entries(
        &dir.path().join("session.json"),
        serde_json::json!({
            "liked_post_42_user_7": "true",
            "viewed_post_42_user_7": "true",
            "viewed_post_43_user_7": "true"
        }),
    );

    lettore()
        .arg("session")
        .arg("clear-viewed")
        .arg("--session-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("Removed 2 viewed flags."));

    lettore()
        .arg("session")
        .arg("show")
        .arg("--session-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("liked_post_42_user_7 = true"))
        .stdout(contains("viewed_post_42_user_7").not());
}
