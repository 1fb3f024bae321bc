use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_subcommands() {
    let mut cmd = Command::cargo_bin("doclens").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("query"));
}

#[test]
fn unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("doclens").unwrap();
    cmd.arg("frobnicate").assert().failure();
}

#[test]
fn ingest_requires_a_file_argument() {
    let mut cmd = Command::cargo_bin("doclens").unwrap();
    cmd.arg("ingest")
        .assert()
        .failure()
        .stderr(predicate::str::contains("FILE"));
}
