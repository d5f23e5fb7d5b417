use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CORPUS: &str = "The cat sat. The cat ran! The dog sat, and the dog slept.";

fn temp_workspace() -> TempDir {
    tempfile::tempdir().expect("create tempdir")
}

fn write_corpus(dir: &Path, text: &str) -> String {
    let path = dir.join("corpus.txt");
    fs::write(&path, text).expect("write corpus");
    path.to_str().expect("utf-8 path").to_owned()
}

fn nextword() -> Command {
    Command::cargo_bin("nextword").expect("binary exists")
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("stdout is utf-8")
}

#[test]
fn predict_prints_ranked_words() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), CORPUS);

    let stdout = stdout_of(nextword().args(["--quiet", "predict", "--input", corpus.as_str(), "-k", "5", "I", "saw", "the"]));
    let words: Vec<&str> = stdout.lines().collect();
    // "the" -> cat x2, dog x2: tie broken alphabetically
    assert_eq!(words, vec!["cat", "dog"]);
}

#[test]
fn predict_json_output() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), CORPUS);

    let stdout = stdout_of(nextword().args(["--quiet", "predict", "--input", corpus.as_str(), "--json", "-k", "1", "cat"]));
    let words: Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(words, serde_json::json!(["ran"]));
}

#[test]
fn train_saves_snapshot_next_to_input() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), CORPUS);

    let stdout = stdout_of(nextword().args(["--quiet", "train", "--input", corpus.as_str(), "--save", "--json"]));
    let report: Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(report["file_name"], "corpus.txt");
    assert_eq!(report["token_count"], 13);
    assert_eq!(report["stats"]["vocab_size"], 7);

    let snapshot = workspace.path().join("corpus.bin");
    assert!(snapshot.exists(), "snapshot was written");

    let stdout = stdout_of(nextword().args([
        "--quiet",
        "predict",
        "--model",
        snapshot.to_str().unwrap(),
        "dog",
    ]));
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["sat", "slept"]);
}

#[test]
fn stats_json_matches_table() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), "the cat sat the cat ran");

    let stdout = stdout_of(nextword().args(["--quiet", "stats", "--input", corpus.as_str(), "--json"]));
    let stats: Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(stats["vocab_size"], 4);
    assert_eq!(stats["unique_transitions"], 4);
    assert_eq!(stats["total_transitions"], 5);
    assert_eq!(stats["compression_ratio"], 1.0);
}

#[test]
fn empty_corpus_is_not_trained() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), "");

    let output = nextword()
        .args(["--quiet", "predict", "--input", corpus.as_str(), "anything"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("not trained"));
}

#[test]
fn unseen_prefix_fails_distinctly() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), CORPUS);

    let output = nextword()
        .args(["--quiet", "predict", "--input", corpus.as_str(), "zebra"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("no prediction available for 'zebra'"));
}

#[test]
fn missing_input_file_fails() {
    let workspace = temp_workspace();
    let missing = workspace.path().join("missing.txt");
    nextword()
        .args(["--quiet", "stats", "--input", missing.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn seeded_generation_is_reproducible() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), CORPUS);
    let args = ["--quiet", "generate", "--input", corpus.as_str(), "--seed", "11", "--words", "4", "the"];

    let first = stdout_of(nextword().args(args));
    let second = stdout_of(nextword().args(args));
    assert_eq!(first, second);
    assert!(first.starts_with("the "));
}

#[test]
fn repl_answers_each_line() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), CORPUS);

    let stdout = stdout_of(
        nextword()
            .args(["--quiet", "repl", "--input", corpus.as_str(), "-k", "2"])
            .write_stdin("the\nzebra\n:quit\nthe\n"),
    );
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["cat, dog", "no prediction available for 'zebra'"]);
}

#[test]
fn rust_log_applies_without_verbosity_flags() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), CORPUS);

    let output = nextword()
        .env("RUST_LOG", "debug")
        .args(["stats", "--input", corpus.as_str()])
        .assert()
        .success()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("DEBUG"));
}

#[test]
fn quiet_flag_overrides_rust_log() {
    let workspace = temp_workspace();
    let corpus = write_corpus(workspace.path(), CORPUS);

    let output = nextword()
        .env("RUST_LOG", "debug")
        .args(["--quiet", "stats", "--input", corpus.as_str()])
        .assert()
        .success()
        .get_output()
        .stderr
        .clone();
    assert!(!String::from_utf8_lossy(&output).contains("DEBUG"));
}
