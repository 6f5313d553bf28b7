use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

#[test]
fn cli_prints_one_line_per_frame() {
    let mut cmd = Command::cargo_bin("lighting-cube").expect("binary exists");
    cmd.args(["--frames", "2", "--fps", "4"]);
    cmd.assert()
        .success()
        .stdout(contains("frame 0 t=0.000s light=(1.00, 0.00, 2.00) draws=2"))
        .stdout(contains("frame 1 t=0.250s"));
}

#[test]
fn cli_applies_config_file() {
    let mut config = NamedTempFile::new().expect("temp config");
    config
        .write_all(br#"{ "light_orbit": { "origin": [0, 4, 0], "amplitude": [0, 0, 0] } }"#)
        .expect("write config");

    let mut cmd = Command::cargo_bin("lighting-cube").expect("binary exists");
    cmd.arg("--config").arg(config.path()).args(["--frames", "1"]);
    cmd.assert()
        .success()
        .stdout(contains("light=(0.00, 4.00, 0.00) draws=2"));
}

#[test]
fn cli_rejects_invalid_config() {
    let mut config = NamedTempFile::new().expect("temp config");
    config
        .write_all(br#"{ "near": 10.0, "far": 1.0 }"#)
        .expect("write config");

    let mut cmd = Command::cargo_bin("lighting-cube").expect("binary exists");
    cmd.arg("--config").arg(config.path());
    cmd.assert()
        .failure()
        .stderr(contains("failed to load config"))
        .stderr(contains("must be greater than near"));
}

#[test]
fn cli_reports_missing_config() {
    let mut cmd = Command::cargo_bin("lighting-cube").expect("binary exists");
    cmd.args(["--config", "/no/such/scene.json"]);
    cmd.assert().failure().stderr(contains("Error:"));
}

#[test]
fn cli_rejects_frame_times_that_overflow() {
    let mut cmd = Command::cargo_bin("lighting-cube").expect("binary exists");
    cmd.args(["--frames", "2", "--fps", "1e-300"]);
    cmd.assert()
        .failure()
        .stdout(contains("frame 0 t=0.000s"))
        .stderr(contains("out of range"));
}

#[test]
fn cli_uploads_texture() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("container.png");
    image::RgbaImage::from_pixel(8, 4, image::Rgba([200, 100, 50, 255]))
        .save(&path)
        .expect("write png");

    let mut cmd = Command::cargo_bin("lighting-cube").expect("binary exists");
    cmd.arg("--texture").arg(&path).args(["--frames", "1"]);
    cmd.assert().success().stdout(contains("8x4"));
}
