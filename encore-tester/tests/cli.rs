use std::hash::Hasher;
use std::process::Command;
use twox_hash::XxHash64;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "encore-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

#[test]
fn cli_list_strategies_writes_output() {
    let exe = env!("CARGO_BIN_EXE_encore-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-strategies", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available strategies"));
    for key in ["safe", "gambler", "grinder", "balanced"] {
        assert!(content.contains(key), "missing {key}");
    }
}

#[test]
fn cli_json_report_is_deterministic() {
    let exe = env!("CARGO_BIN_EXE_encore-tester");
    let run = |label: &str| {
        let output_path = temp_path(label);
        let status = Command::new(exe)
            .args([
                "--strategies",
                "safe,balanced",
                "--seeds",
                "7",
                "--iterations",
                "1",
                "--report",
                "json",
                "--output",
            ])
            .arg(&output_path)
            .status()
            .expect("run cli");
        assert!(status.success());
        std::fs::read_to_string(output_path).expect("read output")
    };

    let first = run("json-a");
    let value: serde_json::Value = serde_json::from_str(&first).expect("valid json");
    let runs = value.as_array().expect("array of results");
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r["passed"] == true));

    let strip = |text: &str| -> String {
        let mut value: serde_json::Value = serde_json::from_str(text).expect("valid json");
        for run in value.as_array_mut().into_iter().flatten() {
            run["average_duration"] = serde_json::Value::Null;
        }
        value.to_string()
    };
    let second = run("json-b");
    assert_eq!(
        snapshot_hash(strip(&first).as_bytes()),
        snapshot_hash(strip(&second).as_bytes())
    );
}

#[test]
fn cli_persists_careers_to_save_dir() {
    let exe = env!("CARGO_BIN_EXE_encore-tester");
    let save_dir = temp_path("saves");
    let output = Command::new(exe)
        .args([
            "--strategies",
            "grinder",
            "--seeds",
            "DC-ENCORE42",
            "--iterations",
            "1",
            "--report",
            "markdown",
            "--save-dir",
        ])
        .arg(&save_dir)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Encore Season Simulation Results"));
    assert!(stdout.contains("DC-ENCORE42"));

    let saves: Vec<_> = std::fs::read_dir(&save_dir)
        .expect("save dir exists")
        .filter_map(Result::ok)
        .collect();
    assert_eq!(saves.len(), 1);
    let blob = std::fs::read_to_string(saves[0].path()).expect("read save");
    assert!(blob.contains("\"version\":3"));
    let _ = std::fs::remove_dir_all(save_dir);
}

#[test]
fn cli_rejects_unknown_strategy() {
    let exe = env!("CARGO_BIN_EXE_encore-tester");
    let output = Command::new(exe)
        .args(["--strategies", "reckless", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown strategy"));
}
