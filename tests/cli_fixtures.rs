use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lullaby_cli"))
}

fn fixture_file(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout UTF-8");
    serde_json::from_str(stdout.trim()).expect("JSON payload on stdout")
}

#[test]
fn classify_fixtures_match_expectations() {
    for fixture in [
        "steady_wail",
        "high_pitch_scream",
        "empty_recording",
        "ambiguous_no_context",
        "ambiguous_overdue_feed",
        "ambiguous_recent_feed",
        "ambiguous_wake_window",
    ] {
        let output = cli()
            .args(["classify", "--fixture", fixture])
            .output()
            .expect("failed to run lullaby_cli classify");
        assert!(
            output.status.success(),
            "{fixture}: CLI exited with {:?}, stderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        );

        let json = stdout_json(&output);
        assert_eq!(json["fixture"], fixture);
        assert!(json["result"]["label"].is_string());
    }
}

#[test]
fn classify_fixture_reports_features_and_result() {
    let output = cli()
        .args(["classify", "--fixture", "high_pitch_scream"])
        .output()
        .expect("failed to run lullaby_cli classify");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["features"]["origin"], "measured");
    assert!(json["features"]["features"]["pitch"].as_f64().unwrap() > 600.0);
    assert_eq!(json["result"]["label"], "Discomfort");
    assert_eq!(json["result"]["is_real_ai"], true);
}

#[test]
fn classify_fixture_detects_mismatch() {
    let output = cli()
        .args([
            "classify",
            "--fixture",
            "steady_wail",
            "--expect",
            &fixture_file("steady_wail_incorrect.expect.json"),
        ])
        .output()
        .expect("failed to run mismatch classify");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"failures\""),
        "expected diff JSON in stderr, got {stderr}"
    );
}

#[test]
fn classify_unknown_fixture_fails() {
    let output = cli()
        .args(["classify", "--fixture", "no_such_fixture"])
        .output()
        .expect("failed to run classify");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn dump_fixtures_lists_assets() {
    let output = cli()
        .arg("dump-fixtures")
        .output()
        .expect("failed to run dump-fixtures");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(
        stdout.contains("steady_wail") && stdout.contains("ambiguous_wake_window"),
        "expected fixture listing, got {stdout}"
    );
}

#[test]
fn analyze_applies_context_flags() {
    let output = cli()
        .args([
            "analyze",
            "--file",
            &fixture_file("ambiguous_no_context.wav"),
            "--hours-since-feeding",
            "3",
        ])
        .output()
        .expect("failed to run analyze");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["label"], "Hunger");
    assert_eq!(json["confidence"], 0.88);
}

#[test]
fn analyze_unreadable_file_takes_context_only_path() {
    let output = cli()
        .args(["analyze", "--file", "definitely/missing.wav"])
        .output()
        .expect("failed to run analyze");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["label"], "Discomfort");
    assert_eq!(json["confidence"], 0.7);
    assert_eq!(json["is_real_ai"], false);
}

#[test]
fn features_prints_silent_vector_for_empty_recording() {
    let output = cli()
        .args(["features", "--file", &fixture_file("empty_recording.wav")])
        .output()
        .expect("failed to run features");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["origin"], "silent");
    assert_eq!(json["features"]["volume"], 0.0);
    assert_eq!(json["features"]["is_rhythmic"], false);
}

#[test]
fn analyze_appends_to_history_file() {
    let history = std::env::temp_dir().join(format!("lullaby_cli_history_{}.json", std::process::id()));
    let history_arg = history.to_string_lossy().into_owned();

    let clear = cli()
        .args(["history", "--path", &history_arg, "--clear"])
        .output()
        .expect("failed to clear history");
    assert!(clear.status.success());

    for fixture in ["steady_wail.wav", "high_pitch_scream.wav"] {
        let output = cli()
            .args([
                "analyze",
                "--file",
                &fixture_file(fixture),
                "--history",
                &history_arg,
            ])
            .output()
            .expect("failed to run analyze");
        assert!(output.status.success());
    }

    let listed = cli()
        .args(["history", "--path", &history_arg])
        .output()
        .expect("failed to list history");
    assert!(listed.status.success());
    let json = stdout_json(&listed);
    let entries = json.as_array().expect("history array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["label"], "Discomfort");
    assert_eq!(entries[1]["label"], "Hunger");
    assert!(entries[0]["timestamp_ms"].as_u64().unwrap() > 0);

    let _ = std::fs::remove_file(history);
}
