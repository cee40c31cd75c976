use assert_cmd::Command;
use serde_json::Value;
use tempfile::tempdir;

#[test]
fn simulated_dataset_is_readable() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("synthetic");
    let out_str = out.to_str().unwrap();
    Command::cargo_bin("peakmark")
        .unwrap()
        .args([
            "simulate",
            "--out",
            out_str,
            "--subjects",
            "2",
            "--minutes",
            "0.5",
            "--seed",
            "11",
        ])
        .assert()
        .success();
    assert!(out.join("subjects/subject_001/ekg/v.txt").exists());
    assert!(out.join("subjects/subject_002/fix/attrs.json").exists());

    let output = Command::cargo_bin("peakmark")
        .unwrap()
        .args(["subjects", "--data", out_str])
        .output()
        .unwrap();
    let ids: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ids, vec!["subject_001", "subject_002"]);

    // 30 s at 125 Hz fills exactly three 10 s windows
    let output = Command::cargo_bin("peakmark")
        .unwrap()
        .args([
            "window",
            "--data",
            out_str,
            "--subject",
            "subject_002",
            "--window",
            "2",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let slice: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(slice["ppg"].as_array().unwrap().len(), 1250);
    assert_eq!(slice["fs"], 125.0);

    Command::cargo_bin("peakmark")
        .unwrap()
        .args([
            "window",
            "--data",
            out_str,
            "--subject",
            "subject_002",
            "--window",
            "3",
        ])
        .assert()
        .failure();
}

#[test]
fn config_overrides_apply() {
    let temp = tempdir().unwrap();
    let out = temp.path().to_str().unwrap().to_string();
    Command::cargo_bin("peakmark")
        .unwrap()
        .args([
            "--fs", "50", "simulate", "--out", &out, "--subjects", "1", "--minutes", "0.1",
        ])
        .assert()
        .success();
    let output = Command::cargo_bin("peakmark")
        .unwrap()
        .args([
            "--fs",
            "50",
            "--window-seconds",
            "2",
            "window",
            "--data",
            &out,
            "--subject",
            "subject_001",
            "--window",
            "0",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let slice: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(slice["end"], 100);

    Command::cargo_bin("peakmark")
        .unwrap()
        .args(["--num-windows", "0", "subjects", "--data", &out])
        .assert()
        .failure();
}
