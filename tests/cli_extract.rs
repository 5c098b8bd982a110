//! CLI-level tests: the `extract` driver and the built binary

#![cfg(feature = "cli")]

mod common;

use common::Dataset;
use image::GrayImage;
use oval_annotate::cli::{failed_preview, run_extract};
use oval_annotate::services::io::ImageIOService;
use oval_annotate::NoOpProgressReporter;
use std::process::Command;

#[tokio::test]
async fn test_run_extract_writes_run_artifacts() {
    let dataset = Dataset::new();
    for i in 0..6 {
        if i == 4 {
            dataset.add_image(i, 80, 60);
            dataset.add_mask(i, &GrayImage::new(80, 60));
        } else if i != 1 {
            dataset.add_disk_item(i, 80, 60, (40.0, 30.0, 20.0));
        }
    }

    let config = dataset.config(0, 6);
    let report = run_extract(&config, &NoOpProgressReporter)
        .await
        .expect("extract should complete");

    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, vec![1, 4]);

    let failed_log = report.failed_log.expect("failures are logged");
    assert_eq!(
        ImageIOService::read_failed_log(&failed_log).expect("log parses"),
        vec![1, 4]
    );

    let summary: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&report.summary_path).expect("summary exists"))
            .expect("summary is JSON");
    let indices: Vec<u64> = summary
        .as_array()
        .expect("summary is a list")
        .iter()
        .map(|entry| entry["index"].as_u64().expect("index"))
        .collect();
    assert_eq!(indices, vec![0, 2, 3, 5]);
    assert!(summary[0]["num_pixels"].as_u64().expect("pixel count") > 0);
}

#[tokio::test]
async fn test_clean_run_writes_no_failure_log() {
    let dataset = Dataset::new();
    for i in 0..3 {
        dataset.add_disk_item(i, 64, 64, (30.0, 34.0, 16.0));
    }

    let report = run_extract(&dataset.config(0, 3), &NoOpProgressReporter)
        .await
        .expect("extract should complete");

    assert_eq!(report.succeeded, 3);
    assert!(report.failed.is_empty());
    assert!(report.failed_log.is_none());
    assert!(!dataset.output_dir().join("failed.json").exists());
    assert!(report.summary_path.is_file());
}

#[test]
fn test_failed_preview_truncates_long_lists() {
    let many: Vec<usize> = (0..25).collect();
    let line = failed_preview(&many);
    assert!(line.starts_with("First 10 failed:"), "{line}");
    assert!(line.ends_with("8, 9]"), "{line}");
}

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_oval-annotate"))
}

#[test]
fn test_binary_extract_then_inspect() {
    let dataset = Dataset::new();
    dataset.add_disk_item(2, 64, 64, (32.0, 32.0, 20.0));
    let out = dataset.output_dir();
    let missing_config = dataset.root().join("absent.yaml");

    let status = binary()
        .arg("--config")
        .arg(&missing_config)
        .arg("--no-progress")
        .args(["--workers", "2", "extract", "--start", "2", "--end", "3"])
        .arg("--image-dir")
        .arg(dataset.root().join("images"))
        .arg("--mask-dir")
        .arg(dataset.root().join("masks"))
        .arg("--output-dir")
        .arg(&out)
        .env("RUST_LOG", "error")
        .status()
        .expect("Failed to run oval-annotate");
    assert!(status.success());
    assert!(out.join("00002.bin").is_file());

    let output = binary()
        .arg("--config")
        .arg(&missing_config)
        .args(["inspect", "--index", "2", "--output-dir"])
        .arg(&out)
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to run oval-annotate");
    assert!(output.status.success());
    let printed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("inspect prints JSON");
    assert!((printed["center_x"].as_f64().expect("center_x") - 32.0).abs() < 1.0);

    let output = binary()
        .arg("--config")
        .arg(&missing_config)
        .args(["inspect", "--index", "3", "--output-dir"])
        .arg(&out)
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to run oval-annotate");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--start 3 --end 4"), "{stderr}");
}
