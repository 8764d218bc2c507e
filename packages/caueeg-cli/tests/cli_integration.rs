use assert_cmd::Command;
use predicates::prelude::*;

use caueeg_rs::fixtures;
use caueeg_rs::source::SourceLayout;

fn caueeg() -> Command {
    Command::cargo_bin("caueeg").unwrap()
}

/// A minimal but complete source tree with one clean recording.
fn write_source_tree(root: &std::path::Path) -> SourceLayout {
    let source = SourceLayout::new(root);
    fixtures::write_annotation_csv(&source.annotation_table(), &[("00001", "normal")]).unwrap();
    fixtures::write_split(&source.dementia_split(), &[("00001", "Normal")], &[], &[]).unwrap();
    fixtures::write_split(&source.dementia_split_no_overlap(), &[("00001", "Normal")], &[], &[])
        .unwrap();
    fixtures::write_split(&source.normality_split(), &[("00001", "Normal")], &[], &[]).unwrap();
    fixtures::write_split(&source.normality_split_no_overlap(), &[], &[], &[]).unwrap();
    fixtures::write_edf(
        &source.edf_file("00001"),
        &["Fp1-AVG", "T3-AVG", "EKG"],
        200,
        10,
    )
    .unwrap();
    fixtures::write_events_json(
        &source.event_file("00001"),
        &[(0, "Eyes Open"), (1000, "Paused")],
    )
    .unwrap();
    source
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    caueeg()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    caueeg()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("caueeg"));
}

#[test]
fn test_help_flag() {
    caueeg()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("BIDS"));
}

// =============================================================================
// INFO SUBCOMMAND
// =============================================================================

#[test]
fn test_info_missing_source() {
    caueeg()
        .arg("info")
        .arg("--source")
        .arg("/nonexistent_dir_12345")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("does not exist"));
}

#[test]
fn test_info_json() {
    let tmp = tempfile::tempdir().unwrap();
    write_source_tree(tmp.path());

    let output = caueeg()
        .arg("info")
        .arg("--source")
        .arg(tmp.path().to_str().unwrap())
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.get("exists").unwrap(), true);
    assert_eq!(parsed.get("edf_files").unwrap(), 1);
    assert_eq!(parsed.get("event_files").unwrap(), 1);
    assert_eq!(parsed.get("annotation_table").unwrap(), true);
    assert!(parsed.get("cli_version").is_some());
}

// =============================================================================
// VALIDATE SUBCOMMAND
// =============================================================================

#[test]
fn test_validate_nonexistent_file() {
    caueeg()
        .arg("validate")
        .arg("--edf")
        .arg("/nonexistent/file.edf")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_validate_clean_recording() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source_tree(tmp.path());

    caueeg()
        .arg("validate")
        .arg("--edf")
        .arg(source.edf_file("00001").to_str().unwrap())
        .arg("--events")
        .arg(source.event_file("00001").to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_validate_unresolvable_channel() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad.edf");
    fixtures::write_edf(&path, &["Fp1-AVG", "XYZ-AVG"], 100, 5).unwrap();

    caueeg()
        .arg("validate")
        .arg("--edf")
        .arg(path.to_str().unwrap())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("XYZ-AVG"));
}

#[test]
fn test_validate_json_reports_out_of_range_events() {
    let tmp = tempfile::tempdir().unwrap();
    let edf = tmp.path().join("rec.edf");
    let events = tmp.path().join("rec.json");
    fixtures::write_edf(&edf, &["Fp1-AVG"], 100, 10).unwrap();
    // drowsy at 20 s in a 10 s recording
    fixtures::write_events_json(&events, &[(2000, "drowsy")]).unwrap();

    let output = caueeg()
        .arg("validate")
        .arg("--edf")
        .arg(edf.to_str().unwrap())
        .arg("--events")
        .arg(events.to_str().unwrap())
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.get("header_ok").unwrap(), true);
    assert_eq!(parsed.get("events_reliable").unwrap(), false);
    assert_eq!(parsed.get("out_of_range_events").unwrap(), 1);
    assert_eq!(parsed.get("event_count").unwrap(), 1);
}

// =============================================================================
// PARTICIPANTS SUBCOMMAND
// =============================================================================

#[test]
fn test_participants_tsv_output() {
    let tmp = tempfile::tempdir().unwrap();
    write_source_tree(tmp.path());

    caueeg()
        .arg("participants")
        .arg("--source")
        .arg(tmp.path().to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("participant_id\tnormality_label"))
        .stdout(predicate::str::contains("sub-00001\tnormal\tnormal\ttrain"));
}

#[test]
fn test_participants_merge_conflict_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source_tree(tmp.path());
    // Contradict the annotation-derived label.
    fixtures::write_split(&source.dementia_split(), &[("00001", "Dementia")], &[], &[]).unwrap();

    caueeg()
        .arg("participants")
        .arg("--source")
        .arg(tmp.path().to_str().unwrap())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("conflict"));
}

#[test]
fn test_participants_missing_source() {
    caueeg()
        .arg("participants")
        .arg("--source")
        .arg("/nonexistent_dir_12345")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

// =============================================================================
// CONVERT SUBCOMMAND
// =============================================================================

#[test]
fn test_convert_dry_run_lists_recordings() {
    let tmp = tempfile::tempdir().unwrap();
    write_source_tree(tmp.path());

    caueeg()
        .arg("convert")
        .arg("--source")
        .arg(tmp.path().to_str().unwrap())
        .arg("--output")
        .arg(tmp.path().join("rawdata").to_str().unwrap())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("00001"));
}

#[test]
fn test_convert_full_run() {
    let tmp = tempfile::tempdir().unwrap();
    write_source_tree(tmp.path());
    let out = tmp.path().join("rawdata");

    caueeg()
        .arg("convert")
        .arg("--source")
        .arg(tmp.path().to_str().unwrap())
        .arg("--output")
        .arg(out.to_str().unwrap())
        .assert()
        .success()
        .stderr(predicate::str::contains("1/1 recordings converted"));

    assert!(out.join("participants.tsv").is_file());
    assert!(out.join("sub-00001/eeg/sub-00001_task-rest_eeg.edf").is_file());
    assert!(out.join("sub-00001/eeg/sub-00001_task-rest_events.tsv").is_file());
}

#[test]
fn test_convert_partial_failure_exit_code() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source_tree(tmp.path());
    // Second participant whose EDF has an unresolvable channel.
    fixtures::write_annotation_csv(
        &source.annotation_table(),
        &[("00001", "normal"), ("00002", "normal")],
    )
    .unwrap();
    fixtures::write_edf(&source.edf_file("00002"), &["BOGUS-AVG"], 100, 5).unwrap();
    fixtures::write_events_json(&source.event_file("00002"), &[]).unwrap();

    caueeg()
        .arg("convert")
        .arg("--source")
        .arg(tmp.path().to_str().unwrap())
        .arg("--output")
        .arg(tmp.path().join("rawdata").to_str().unwrap())
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("1 of 2 recordings failed"));
}

#[test]
fn test_convert_missing_source_dir() {
    let tmp = tempfile::tempdir().unwrap();
    caueeg()
        .arg("convert")
        .arg("--source")
        .arg("/nonexistent_dir_12345")
        .arg("--output")
        .arg(tmp.path().join("rawdata").to_str().unwrap())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_convert_summary_out() {
    let tmp = tempfile::tempdir().unwrap();
    write_source_tree(tmp.path());
    let summary_path = tmp.path().join("summary.json");

    caueeg()
        .arg("convert")
        .arg("--source")
        .arg(tmp.path().to_str().unwrap())
        .arg("--output")
        .arg(tmp.path().join("rawdata").to_str().unwrap())
        .arg("--summary-out")
        .arg(summary_path.to_str().unwrap())
        .arg("--quiet")
        .assert()
        .success();

    let text = std::fs::read_to_string(&summary_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.get("total").unwrap(), 1);
    assert_eq!(parsed.get("converted").unwrap(), 1);
    assert!(parsed.get("created_at").is_some());
}
