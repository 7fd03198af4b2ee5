use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;

#[test]
fn requires_target_or_pid() {
    Command::cargo_bin("strex").unwrap().assert().failure();
}

#[test]
fn finds_ascii_run_in_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("sample.bin");
    file.write_binary(&[0x00, 0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x57, 0x6F, 0x72, 0x6C, 0x64, 0x00, 0x41, 0x42]).unwrap();

    Command::cargo_bin("strex")
        .unwrap()
        .args(["--encoding", "ASCII", "--min-length", "3"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello World"));
}

#[test]
fn filters_out_non_matching_results() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("sample.bin");
    file.write_binary(b"\x00Hello World\x00AB").unwrap();

    Command::cargo_bin("strex")
        .unwrap()
        .args(["--encoding", "ASCII", "--min-length", "3", "--regex", "^world$"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello World").not());
}

#[test]
fn writes_to_output_file_and_skips_it_as_a_target() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("in.bin");
    input.write_binary(b"\x00Hello World\x00").unwrap();
    let output = temp.child("out.txt");

    Command::cargo_bin("strex")
        .unwrap()
        .args(["--encoding", "ASCII", "--min-length", "3", "--output"])
        .arg(output.path())
        .arg(temp.path())
        .assert()
        .success();

    output.assert(predicate::str::contains("Hello World"));
}

#[test]
fn rejects_out_of_range_start_offset() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("sample.bin");
    file.write_binary(b"short").unwrap();

    Command::cargo_bin("strex")
        .unwrap()
        .args(["--start-offset", "1000"])
        .arg(file.path())
        .assert()
        .failure();
}

#[test]
fn mutually_exclusive_target_and_pid() {
    Command::cargo_bin("strex").unwrap().args(["--pid", "1", "somefile"]).assert().failure();
}
