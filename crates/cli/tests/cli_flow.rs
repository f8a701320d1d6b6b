use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use storykit_project_store::{LocalProjectStore, ProjectArchive, StoredDocument};
use storykit_protocol::{CodexEntry, DocumentKind};
use tempfile::TempDir;

fn seed_project(data_dir: &Path) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    runtime.block_on(async {
        let store = LocalProjectStore::new(data_dir);
        let mut archive = ProjectArchive::new("novel");
        archive.upsert_codex_entry(CodexEntry {
            id: "anna".to_string(),
            project_id: "novel".to_string(),
            name: "Anna".to_string(),
            aliases: Vec::new(),
        });
        archive.upsert_codex_entry(CodexEntry {
            id: "smith".to_string(),
            project_id: "novel".to_string(),
            name: "Dr. Smith".to_string(),
            aliases: vec!["Smith".to_string()],
        });
        archive.upsert_document(StoredDocument {
            id: "scene-1".to_string(),
            kind: DocumentKind::Scene,
            content: serde_json::json!({
                "type": "doc",
                "content": [
                    { "type": "paragraph", "content": [ { "text": "Anna met Dr. Smith." } ] }
                ]
            }),
        });
        archive.upsert_document(StoredDocument {
            id: "anna".to_string(),
            kind: DocumentKind::CodexEntry,
            content: serde_json::json!("Anna is the protagonist."),
        });
        store.save_archive(&archive).await.expect("save archive");
    });
}

fn storykit(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("storykit").expect("binary");
    cmd.arg("--data-dir").arg(data_dir).arg("--quiet");
    cmd
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("storykit")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rebuild"))
        .stdout(predicate::str::contains("mentions"))
        .stdout(predicate::str::contains("mark-stale"));
}

#[test]
fn rebuild_then_query_roundtrip() {
    let tmp = TempDir::new().unwrap();
    seed_project(tmp.path());

    let output = storykit(tmp.path())
        .args(["rebuild", "--project", "novel", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).expect("report json");
    assert_eq!(report["documents"], 2);
    assert_eq!(report["mentions"], 3);
    assert_eq!(report["skipped"], 0);

    storykit(tmp.path())
        .args(["count", "--project", "novel", "--entry", "anna"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));

    let output = storykit(tmp.path())
        .args([
            "mentions",
            "--project",
            "novel",
            "--entry",
            "anna",
            "--exclude-self",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let mentions: serde_json::Value = serde_json::from_slice(&output).expect("mentions json");
    let mentions = mentions.as_array().expect("array");
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0]["source_document_id"], "scene-1");

    storykit(tmp.path())
        .args(["state", "--project", "novel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fresh"));

    storykit(tmp.path())
        .args(["report", "--project", "novel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dr. Smith"))
        .stdout(predicate::str::contains("Mentions: 3"));
}

#[test]
fn mark_stale_is_reflected_in_state() {
    let tmp = TempDir::new().unwrap();
    seed_project(tmp.path());

    storykit(tmp.path())
        .args(["rebuild", "--project", "novel"])
        .assert()
        .success();
    storykit(tmp.path())
        .args(["mark-stale", "--project", "novel"])
        .assert()
        .success();
    storykit(tmp.path())
        .args(["state", "--project", "novel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stale"));
}

#[test]
fn queries_on_an_unindexed_project_return_empty() {
    let tmp = TempDir::new().unwrap();

    storykit(tmp.path())
        .args(["count", "--project", "ghost", "--entry", "anna"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0\n"));
}
