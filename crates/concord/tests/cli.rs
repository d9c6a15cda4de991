//! CLI integration tests for concord commands.
//!
//! These tests focus on exit codes and the plain window layout; JSON output is
//! checked structurally.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a temp directory for tests.
fn temp_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Helper to get a concord command.
fn concord() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("concord").unwrap()
}

/// Helper to run `concord` inside `dir` with HOME isolated to `home`.
fn concord_in(dir: &Path, home: &Path) -> Command {
    let mut cmd = concord();
    cmd.env("HOME", home).current_dir(dir);
    cmd
}

/// A project directory holding an indexed two-document corpus at `idx`.
struct Corpus {
    /// Project directory.
    dir: TempDir,
    /// Isolated home directory.
    home: TempDir,
}

impl Corpus {
    /// Writes the documents and indexes them with `concord index`.
    fn new() -> Self {
        let dir = temp_dir();
        let home = temp_dir();
        fs::write(
            dir.path().join("docs.jsonl"),
            concat!(
                r#"{"id": "a", "body": "the quick brown fox jumps"}"#,
                "\n",
                r#"{"id": "b", "body": ["the lazy dog", "sleeps all day"]}"#,
                "\n",
            ),
        )
        .unwrap();
        concord_in(dir.path(), home.path())
            .args(["index", "idx", "docs.jsonl", "--text", "body", "--keyword", "id"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Indexed 2 documents"));
        Self { dir, home }
    }

    /// A command running in the project directory.
    fn cmd(&self) -> Command {
        concord_in(self.dir.path(), self.home.path())
    }
}

mod init {
    use super::*;

    #[test]
    fn creates_config_file() {
        let dir = temp_dir();
        let home = temp_dir();

        concord_in(dir.path(), home.path())
            .arg("init")
            .assert()
            .success();

        let contents = fs::read_to_string(dir.path().join(".concord.toml")).unwrap();
        assert!(contents.contains("[window]"));
    }

    #[test]
    fn fails_if_config_exists() {
        let dir = temp_dir();
        let home = temp_dir();
        fs::write(dir.path().join(".concord.toml"), "existing").unwrap();

        concord_in(dir.path(), home.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn force_overwrites() {
        let dir = temp_dir();
        let home = temp_dir();
        fs::write(dir.path().join(".concord.toml"), "existing").unwrap();

        concord_in(dir.path(), home.path())
            .args(["init", "--force"])
            .assert()
            .success();

        let contents = fs::read_to_string(dir.path().join(".concord.toml")).unwrap();
        assert_ne!(contents, "existing");
    }
}

mod config {
    use super::*;

    #[test]
    fn shows_merged_settings() {
        let dir = temp_dir();
        let home = temp_dir();
        fs::write(dir.path().join(".concord.toml"), "[window]\ntokens_before = 3\n").unwrap();

        concord_in(dir.path(), home.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("tokens_before = 3"))
            .stdout(predicate::str::contains("tokens_after = 10"));
    }

    #[test]
    fn warns_about_huge_context() {
        let dir = temp_dir();
        let home = temp_dir();
        fs::write(
            dir.path().join(".concord.toml"),
            "[window]\ntokens_after = 1000000000\n",
        )
        .unwrap();

        concord_in(dir.path(), home.path())
            .arg("config")
            .assert()
            .success()
            .stderr(predicate::str::contains("warning: tokens_after = 1000000000"));
    }

    #[test]
    fn invalid_config_fails() {
        let dir = temp_dir();
        let home = temp_dir();
        fs::write(dir.path().join(".concord.toml"), "[window\n").unwrap();

        concord_in(dir.path(), home.path())
            .arg("config")
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to load configuration"));
    }
}

mod index {
    use super::*;

    #[test]
    fn refuses_existing_corpus() {
        let corpus = Corpus::new();
        corpus
            .cmd()
            .args(["index", "idx", "docs.jsonl", "--text", "body"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already holds a corpus"));
    }

    #[test]
    fn rejects_malformed_lines() {
        let dir = temp_dir();
        let home = temp_dir();
        fs::write(dir.path().join("bad.jsonl"), "{\"body\": 1}\n").unwrap();

        concord_in(dir.path(), home.path())
            .args(["index", "idx", "bad.jsonl", "--text", "body"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("line 1"));
    }
}

mod search {
    use super::*;

    #[test]
    fn phrase_prints_window() {
        let corpus = Corpus::new();
        corpus
            .cmd()
            .args(["search", "idx", "--phrase", "Brown Fox", "-B", "1", "-A", "1"])
            .assert()
            .success()
            .stdout("quick [brown fox] jumps\n");
    }

    #[test]
    fn json_query_argument() {
        let corpus = Corpus::new();
        let query = r#"{"type": "term", "field": "body", "text": "sleeps"}"#;
        corpus
            .cmd()
            .args(["search", "idx", query, "-B", "2", "-A", "1"])
            .assert()
            .success()
            .stdout("[sleeps] all\n");
    }

    #[test]
    fn json_output_is_structured() {
        let corpus = Corpus::new();
        let output = corpus
            .cmd()
            .args(["search", "idx", "--phrase", "the", "-B", "0", "-A", "1"])
            .args(["--metadata", "id", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["field"], "body");
        assert_eq!(json["stats"]["windows"], 2);
        let windows = json["windows"].as_array().unwrap();
        assert_eq!(windows[0]["target"], "the");
        assert_eq!(windows[0]["post"], "quick");
        assert_eq!(windows[0]["metadata"]["id"], "a");
        assert_eq!(windows[1]["post"], "lazy");
    }

    #[test]
    fn max_hits_stops_early() {
        let corpus = Corpus::new();
        corpus
            .cmd()
            .args(["search", "idx", "--phrase", "the", "-B", "0", "-A", "0", "-n", "1"])
            .assert()
            .success()
            .stdout("[the]\n");
    }

    #[test]
    fn sorted_by_post_context() {
        let corpus = Corpus::new();
        corpus
            .cmd()
            .args(["search", "idx", "--phrase", "the", "-B", "0", "-A", "1"])
            .args(["--sort", "post"])
            .assert()
            .success()
            .stdout("[the] lazy\n[the] quick\n");
    }

    #[test]
    fn configured_sort_key_applies() {
        let corpus = Corpus::new();
        fs::write(
            corpus.dir.path().join(".concord.toml"),
            "[window]\nsort_key = \"post\"\n",
        )
        .unwrap();
        corpus
            .cmd()
            .args(["search", "idx", "--phrase", "the", "-B", "0", "-A", "1"])
            .assert()
            .success()
            .stdout("[the] lazy\n[the] quick\n");
    }

    #[test]
    fn unknown_field_fails() {
        let corpus = Corpus::new();
        corpus
            .cmd()
            .args(["search", "idx", "--phrase", "fox", "--field", "title"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown field 'title'"));
    }

    #[test]
    fn missing_index_fails() {
        let dir = temp_dir();
        let home = temp_dir();
        concord_in(dir.path(), home.path())
            .args(["search", "nowhere", "--phrase", "fox"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"));
    }
}

mod stats {
    use super::*;

    #[test]
    fn terms_with_doc_freq() {
        let corpus = Corpus::new();
        corpus
            .cmd()
            .args(["terms", "idx", "-n", "1", "--include-df"])
            .assert()
            .success()
            .stdout("the\t2\n");
    }

    #[test]
    fn terms_to_directory() {
        let corpus = Corpus::new();
        let out = corpus.dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(corpus.dir.path().join("start.txt"), "zebra\n").unwrap();

        corpus
            .cmd()
            .args(["terms", "idx", "-n", "1", "--start-words", "start.txt", "-o", "out"])
            .assert()
            .success();

        let content = fs::read_to_string(out.join("body")).unwrap();
        assert_eq!(content, "zebra\nthe\n");
    }

    #[test]
    fn fields_report() {
        let corpus = Corpus::new();
        corpus
            .cmd()
            .args(["fields", "idx"])
            .assert()
            .success()
            .stdout(predicate::str::contains("body:"))
            .stdout(predicate::str::contains("\tDocCount: 2"))
            .stdout(predicate::str::contains("\tTotalTokens: 11"));
    }

    #[test]
    fn idf_of_terms() {
        let corpus = Corpus::new();
        corpus
            .cmd()
            .args(["idf", "idx", "The", "fox"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("the\t2\t"))
            .stdout(predicate::str::contains("fox\t1\t"));
    }
}
