use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const USERS_LAYOUT: &str = r#"
tables:
  - name: users
    fields:
      - { name: id, type: BIGINT, primary: true, not_null: true }
      - { name: name, type: TEXT }
    records:
      - { id: 1, name: Ann }
      - { id: 2, name: Bob }
  - name: audit
    fields:
      - { name: at, type: DATETIME }
"#;

fn write_layout(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("layout.yaml");
    fs::write(&path, yaml).expect("failed to write layout");
    path
}

fn mason(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqlite-mason"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run sqlite-mason")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_render_prints_create_and_insert() {
    let dir = tempfile::tempdir().unwrap();
    let layout = write_layout(dir.path(), USERS_LAYOUT);

    let out = mason(&["render", "--layout", layout.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        stdout(&out),
        "CREATE TABLE IF NOT EXISTS [audit] (\n    [at] DATETIME\n);\n\
         \n\
         CREATE TABLE IF NOT EXISTS [users] (\n    [id] BIGINT PRIMARY KEY ON CONFLICT ABORT NOT NULL,\n    [name] TEXT\n);\n\
         INSERT OR REPLACE INTO users (id, name) VALUES\n(1,'Ann'),\n(2,'Bob');\n"
    );
}

#[test]
fn test_render_single_table_with_escaped_quotes() {
    let dir = tempfile::tempdir().unwrap();
    let layout = write_layout(
        dir.path(),
        r#"
tables:
  - name: notes
    fields:
      - { name: body, type: TEXT }
    records:
      - { body: "it's" }
"#,
    );
    let layout = layout.to_str().unwrap();

    let literal = mason(&["render", "--layout", layout, "--table", "notes"]);
    assert!(stdout(&literal).contains("('it's');"));

    let escaped = mason(&["render", "--layout", layout, "--table", "notes", "--escape-quotes"]);
    assert!(stdout(&escaped).contains("('it''s');"));
}

#[test]
fn test_render_unknown_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    let layout = write_layout(dir.path(), USERS_LAYOUT);

    let out = mason(&["render", "--layout", layout.to_str().unwrap(), "--table", "ghost"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("ghost"));
}

#[test]
fn test_render_invalid_type_fails() {
    let dir = tempfile::tempdir().unwrap();
    let layout = write_layout(
        dir.path(),
        r#"
tables:
  - name: t
    fields:
      - { name: doc, type: JSON }
"#,
    );

    let out = mason(&["render", "--layout", layout.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("JSON"));
}

#[test]
fn test_commit_then_status() {
    let dir = tempfile::tempdir().unwrap();
    let layout = write_layout(dir.path(), USERS_LAYOUT);
    let db = dir.path().join("app.db");
    let db = db.to_str().unwrap();

    let commit = mason(&["commit", "--layout", layout.to_str().unwrap(), "--db", db]);
    assert!(commit.status.success(), "stderr: {}", String::from_utf8_lossy(&commit.stderr));
    let text = stdout(&commit);
    assert!(text.contains("Tables created: 2"));
    assert!(text.contains("Records written: 2"));

    let status = mason(&["status", "--db", db]);
    assert!(status.status.success());
    let text = stdout(&status);
    assert!(text.contains("Tables: 2"));
    assert!(text.contains("audit: 0 rows"));
    assert!(text.contains("users: 2 rows"));
}

#[test]
fn test_sync_json_mirrors_committed_tables() {
    let dir = tempfile::tempdir().unwrap();
    let layout = write_layout(dir.path(), USERS_LAYOUT);
    let db = dir.path().join("app.db");
    let db = db.to_str().unwrap();

    assert!(
        mason(&["commit", "--layout", layout.to_str().unwrap(), "--db", db])
            .status
            .success()
    );

    let out = mason(&["sync", "--db", db, "--format", "json"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let json: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let tables = json.as_array().unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[1]["name"], "users");
    assert_eq!(tables[1]["fields"][0]["primary"], true);
    assert_eq!(tables[1]["records"][1]["name"], "Bob");
}

#[test]
fn test_sync_sql_matches_render() {
    let dir = tempfile::tempdir().unwrap();
    let layout = write_layout(dir.path(), USERS_LAYOUT);
    let layout = layout.to_str().unwrap();
    let db = dir.path().join("app.db");
    let db = db.to_str().unwrap();

    assert!(mason(&["commit", "--layout", layout, "--db", db]).status.success());

    let rendered = stdout(&mason(&["render", "--layout", layout]));
    let synced = stdout(&mason(&["sync", "--db", db]));
    assert_eq!(synced, rendered);
}
