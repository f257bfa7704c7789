use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "scorebook-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_scorebook-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("inherited-runner"));
}

#[test]
fn cli_runs_scripted_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_scorebook-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "closer-save,d3k-illegal",
            "--iterations",
            "1",
            "--seeds",
            "1",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Scorebook Automated Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Closer Earns Save"));
    assert!(content.contains("\"passed\": true"));
}

#[test]
fn cli_rejects_invalid_rules_file() {
    let exe = env!("CARGO_BIN_EXE_scorebook-tester");
    let rules_path = temp_path("rules");
    std::fs::write(&rules_path, r#"{ "hold_min_outs": 6 }"#).expect("write rules");
    let output = Command::new(exe)
        .args(["--scenarios", "smoke", "--iterations", "1", "--rules"])
        .arg(&rules_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid rules file"));
}
