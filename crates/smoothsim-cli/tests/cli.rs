//! Command-line tests for the `smoothsim` binary.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SMALL_RECIPE: &str = r#"
interest_rate = 0.01
eis = 0.5
income_log_std = 0.2
income_share = 0.5

[assets]
max = 200.0
points = 40

[income]
persistence = 0.9
std = 0.5
states = 3
"#;

fn write_recipe(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn smoothsim() -> Command {
    let mut cmd = Command::cargo_bin("smoothsim").unwrap();
    cmd.env_remove("SMOOTHSIM_CALIBRATION").env_remove("RUST_LOG");
    cmd
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help_lists_commands() {
    smoothsim()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("policy"))
        .stdout(predicate::str::contains("income"));
}

#[test]
fn test_solve_table() {
    let dir = TempDir::new().unwrap();
    let recipe = write_recipe(&dir, "small.toml", SMALL_RECIPE);

    smoothsim()
        .args(["solve", "--calibration"])
        .arg(&recipe)
        .assert()
        .success()
        .stdout(predicate::str::contains("Aggregate assets"))
        .stdout(predicate::str::contains("By Income State"));
}

#[test]
fn test_solve_json_reports_consistent_aggregates() {
    let dir = TempDir::new().unwrap();
    let recipe = write_recipe(&dir, "small.toml", SMALL_RECIPE);

    let report = json_output(
        smoothsim()
            .args(["--format", "json", "solve", "--calibration"])
            .arg(&recipe),
    );

    let assets = report["aggregate_assets"].as_f64().unwrap();
    let consumption = report["aggregate_consumption"].as_f64().unwrap();
    assert!(assets > 0.0);
    // C = r A + E[y] with E[y] = 1.
    assert!((consumption - (0.01 * assets + 1.0)).abs() < 1e-9);

    let states = report["states"].as_array().unwrap();
    assert_eq!(states.len(), 3);
    let total: f64 = states
        .iter()
        .map(|s| s["probability"].as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-12);
    assert!(report.get("sensitivity").is_none());
}

#[test]
fn test_solve_overrides_and_sensitivity() {
    let dir = TempDir::new().unwrap();
    let recipe = write_recipe(&dir, "small.toml", SMALL_RECIPE);

    let base = json_output(
        smoothsim()
            .args(["-f", "json", "solve", "-c"])
            .arg(&recipe),
    );
    let patient = json_output(
        smoothsim()
            .args(["-f", "json", "solve", "--beta", "0.96", "--sequential", "-c"])
            .arg(&recipe)
            .args(["--sensitivity", "1e-4"]),
    );

    assert!(
        patient["aggregate_assets"].as_f64().unwrap() > base["aggregate_assets"].as_f64().unwrap()
    );
    assert!(patient["sensitivity"]["aggregate_assets"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_solve_csv_and_save() {
    let dir = TempDir::new().unwrap();
    let recipe = write_recipe(&dir, "small.toml", SMALL_RECIPE);
    let saved = dir.path().join("steady_state.json");

    smoothsim()
        .args(["--format", "csv", "solve", "--calibration"])
        .arg(&recipe)
        .arg("--save")
        .arg(&saved)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "state,income,probability,mean_assets,mean_consumption,constrained_share",
        ));

    let ss: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(ss["cdf"]["dim"], serde_json::json!([3, 40]));
    assert!(ss["policy"].get("coefficients").is_some());
}

#[test]
fn test_policy_json() {
    let dir = TempDir::new().unwrap();
    let recipe = write_recipe(&dir, "small.toml", SMALL_RECIPE);

    let rows = json_output(
        smoothsim()
            .args(["-f", "json", "policy", "--state", "0", "--points", "5", "-c"])
            .arg(&recipe),
    );
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 5);

    // The first point sits inside the constrained region.
    assert_eq!(rows[0]["savings"].as_f64().unwrap(), 0.0);
    assert_eq!(rows[0]["mpc"].as_f64().unwrap(), 1.0);

    let last = &rows[4];
    let coh = last["cash_on_hand"].as_f64().unwrap();
    let c = last["consumption"].as_f64().unwrap();
    assert!(c > 0.0 && c < coh);
    assert!(last["savings"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_policy_rejects_missing_state() {
    let dir = TempDir::new().unwrap();
    let recipe = write_recipe(&dir, "small.toml", SMALL_RECIPE);

    smoothsim()
        .args(["policy", "--state", "7", "--calibration"])
        .arg(&recipe)
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_income_defaults_to_benchmark_chain() {
    let rows = json_output(smoothsim().args(["--format", "json", "income"]));
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 11);

    let mean: f64 = rows
        .iter()
        .map(|r| r["income"].as_f64().unwrap() * r["probability"].as_f64().unwrap())
        .sum();
    assert!((mean - 1.0).abs() < 1e-12);
    assert!(rows.iter().all(|r| r["discount_factor"].as_f64() == Some(0.95)));
}

#[test]
fn test_income_with_discount_types_from_json() {
    let dir = TempDir::new().unwrap();
    let recipe = write_recipe(
        &dir,
        "types.json",
        r#"{"income": {"states": 3}, "discount_types": {"types": 2, "spread": 0.02}}"#,
    );

    let rows = json_output(
        smoothsim()
            .args(["--format", "json", "income", "--calibration"])
            .arg(&recipe),
    );
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert!(rows[0]["discount_factor"].as_f64().unwrap() < 0.94);
    assert_eq!(rows[5]["discount_factor"].as_f64(), Some(0.95));
}

#[test]
fn test_calibration_from_environment() {
    let dir = TempDir::new().unwrap();
    let recipe = write_recipe(&dir, "env.toml", "[income]\nstates = 4\n");

    let rows = json_output(
        smoothsim()
            .env("SMOOTHSIM_CALIBRATION", &recipe)
            .args(["--format", "json", "income"]),
    );
    assert_eq!(rows.as_array().unwrap().len(), 4);
}

#[test]
fn test_bad_recipe_is_reported() {
    let dir = TempDir::new().unwrap();
    let recipe = write_recipe(&dir, "bad.toml", "interest = 0.01\n");

    smoothsim()
        .args(["solve", "--calibration"])
        .arg(&recipe)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid calibration recipe"));

    smoothsim()
        .args(["income", "--income-states", "3", "--beta=-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid calibration"));
}
