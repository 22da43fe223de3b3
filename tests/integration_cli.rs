use std::path::PathBuf;
use std::process::{Command, Output};

fn data_file(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("data");
    path.push(name);
    path.to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ttk-analyzer"))
        .arg("--weapons")
        .arg(data_file("weapons.yaml"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let output = run(args);
    assert!(output.status.success(), "Command should succeed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_cli_stk_point_blank() {
    let value = run_json(&["--output", "json", "stk", "--range", "0", "--headshots", "1"]);
    let by_shots = &value["by_shots"];
    assert_eq!(by_shots["3"], serde_json::json!(["AK4D", "M60"]));
    assert_eq!(by_shots["4"], serde_json::json!(["B36A4", "TR-7", "QBZ-192"]));
    assert_eq!(by_shots["5"], serde_json::json!(["SGX"]));
    assert_eq!(value["unreachable"], serde_json::json!([]));
}

#[test]
fn test_cli_grid_text() {
    let output = run(&["grid", "--weapon", "AK4D"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== AK4D"));
    assert!(stdout.contains("[Base]"));
    assert!(stdout.contains("[HP]"));
    assert!(!stdout.contains("[Synth]"));
}

#[test]
fn test_cli_grid_json_with_config_file() {
    let config = data_file("analysis.yaml");
    let value = run_json(&["--config", &config, "--output", "json", "--parallel", "grid", "--health", "80"]);
    let weapons = value.as_array().expect("one entry per weapon");
    assert_eq!(weapons.len(), 6);
    assert_eq!(weapons[0]["health_target"], serde_json::json!(80.0));
}

#[test]
fn test_cli_tiers_only_synthetic_capable() {
    let value = run_json(&["--output", "json", "tiers"]);
    let names: Vec<&str> = value["synthetic"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["weapon"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"B36A4"));
    assert!(names.contains(&"QBZ-192"));
    assert_eq!(value["hollow_point"].as_array().unwrap().len(), 6);
}

#[test]
fn test_cli_ranges_alias() {
    let value = run_json(&["--output", "json", "ranges", "--weapon", "TR7"]);
    assert_eq!(value[0]["name"], "TR-7");
    assert_eq!(value[0]["ranges"].as_array().unwrap().len(), 4);
}

#[test]
fn test_cli_unknown_weapon_fails() {
    let output = run(&["grid", "--weapon", "Nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown weapon"));
}

#[test]
fn test_cli_missing_weapon_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_ttk-analyzer"))
        .args(["--weapons", "/nonexistent/weapons.yaml", "tiers"])
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error loading weapons"));
}

#[test]
fn test_cli_tiers_class_filter() {
    let value = run_json(&["--output", "json", "tiers", "--class", "carbine"]);
    let hollow_point = value["hollow_point"].as_array().unwrap();
    assert_eq!(hollow_point.len(), 2);
    assert!(hollow_point.iter().all(|s| s["class"] == "Carbine"));
    let synthetic = value["synthetic"].as_array().unwrap();
    assert_eq!(synthetic.len(), 1);
    assert_eq!(synthetic[0]["weapon"], "QBZ-192");
}

#[test]
fn test_cli_ranges_class_filter_reports_percentages() {
    let value = run_json(&["--output", "json", "ranges", "--class", "LMG"]);
    let weapons = value.as_array().unwrap();
    assert_eq!(weapons.len(), 1);
    assert_eq!(weapons[0]["name"], "M60");
    for report in weapons[0]["ranges"].as_array().unwrap() {
        let ranges = report["ranges"].as_array().unwrap();
        let base = ranges[0]["range_m"].as_f64().unwrap();
        for r in ranges {
            let pct = r["extension_pct"].as_f64().unwrap();
            if base > 0.0 {
                let expected = r["extension_m"].as_f64().unwrap() / base * 100.0;
                assert!((pct - expected).abs() < 1e-9);
            } else {
                assert_eq!(pct, 0.0);
            }
        }
    }
}
