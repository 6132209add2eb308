extern crate assert_cmd;
extern crate predicates;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn computes_a_small_grid() {
    Command::cargo_bin("mandelgrid")
        .unwrap()
        .args(&[
            "--width",
            "16",
            "--height",
            "8",
            "--iterations",
            "32",
            "--tasks",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("computed 16x8 matrix"));
}

#[test]
fn custom_bounds_are_accepted() {
    Command::cargo_bin("mandelgrid")
        .unwrap()
        .args(&[
            "--width",
            "8",
            "--height",
            "4",
            "--iterations",
            "16",
            "--x-range",
            "-1.0,1.0",
            "--y-range",
            "-1.0,1.0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("escaped pixels"));
}

#[test]
fn rejects_zero_width() {
    Command::cargo_bin("mandelgrid")
        .unwrap()
        .args(&["--width", "0"])
        .assert()
        .failure();
}

#[test]
fn rejects_unparseable_range() {
    Command::cargo_bin("mandelgrid")
        .unwrap()
        .args(&["--x-range", "sideways"])
        .assert()
        .failure();
}
