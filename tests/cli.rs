use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const STANDARD: &str = "\
width: 48
height: 32
minRe: -2.25
minIm: -1.0
maxRe: 0.75
maxIm: 1.0
nMax: 80
gradient: [0, 255, 16777215]
color: 0
";

fn setup(config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("view.yaml"), config).unwrap();
    dir
}

#[test]
fn renders_a_png() {
    let dir = setup(STANDARD);
    let output = dir.path().join("view.png");
    Command::cargo_bin("mandel")
        .unwrap()
        .arg("-c")
        .arg(dir.path().join("view.yaml"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("[done]"));

    let decoded = image::open(&output).unwrap().to_rgb();
    assert_eq!(decoded.dimensions(), (48, 32));
}

#[test]
fn verbose_prints_a_summary() {
    let dir = setup(STANDARD);
    Command::cargo_bin("mandel")
        .unwrap()
        .arg("-c")
        .arg(dir.path().join("view.yaml"))
        .arg("-o")
        .arg(dir.path().join("view.png"))
        .args(&["-v", "-q", "-t", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("picture dimension: 48x32"))
        .stdout(predicate::str::contains("max iterations: 80"))
        .stdout(predicate::str::contains("average number of iterations per pixel"))
        .stdout(predicate::str::contains("[done]").not());
}

#[test]
fn zoom_option_is_applied() {
    let dir = setup(STANDARD);
    Command::cargo_bin("mandel")
        .unwrap()
        .arg("-c")
        .arg(dir.path().join("view.yaml"))
        .arg("-o")
        .arg(dir.path().join("zoom.png"))
        .args(&["-q", "-v", "-z", "-0.75,0,2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("min complex number: -1.5-0.5i"));
}

#[test]
fn bad_aspect_ratio_fails() {
    let dir = setup(&STANDARD.replace("height: 32", "height: 40"));
    let output = dir.path().join("view.png");
    Command::cargo_bin("mandel")
        .unwrap()
        .arg("-c")
        .arg(dir.path().join("view.yaml"))
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("aspect ratio"));
    assert!(!output.exists());
}

#[test]
fn missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("mandel")
        .unwrap()
        .arg("-c")
        .arg(dir.path().join("nowhere.yaml"))
        .arg("-o")
        .arg(dir.path().join("view.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read configuration"));
}
