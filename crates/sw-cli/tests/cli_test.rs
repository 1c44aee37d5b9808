use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_statwb"))
}

fn repo_root() -> PathBuf {
    // crates/sw-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures").join(name)
}

fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("statwb_cli_{}_{}_{}", std::process::id(), nanos, name));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let out = run(args);
    assert!(
        out.status.success(),
        "{:?} should succeed, stderr={}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout should be valid JSON")
}

#[test]
fn test_one_proportion_from_json() {
    let input = fixture_path("one_proportion.json");
    let v = run_json(&["test", "--input", input.to_string_lossy().as_ref()]);

    assert_eq!(v["kind"], "one_proportion");
    let test = &v["test"];
    assert!((test["statistic"].as_f64().unwrap() + 1.0).abs() < 1e-12);
    assert!((test["p_value"].as_f64().unwrap() - 0.31731050786291415).abs() < 1e-9);
    assert_eq!(test["decision"], "fail_to_reject");
    assert!((v["standard_error"].as_f64().unwrap() - 0.05).abs() < 1e-12);
}

#[test]
fn test_one_way_anova_from_yaml() {
    let input = fixture_path("one_way_anova.yaml");
    let v = run_json(&["test", "--input", input.to_string_lossy().as_ref()]);

    assert_eq!(v["kind"], "one_way_anova");
    assert!((v["decomposition"]["ss_between"].as_f64().unwrap() - 54.0).abs() < 1e-9);
    assert!((v["decomposition"]["ss_within"].as_f64().unwrap() - 6.0).abs() < 1e-9);
    assert!((v["test"]["statistic"].as_f64().unwrap() - 27.0).abs() < 1e-9);
    assert_eq!(v["test"]["decision"], "reject");
}

#[test]
fn test_fisher_exact_writes_output_file() {
    let input = fixture_path("fisher_exact.json");
    let output = tmp_path("fisher.json");
    let out = run(&[
        "test",
        "--input",
        input.to_string_lossy().as_ref(),
        "--output",
        output.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty(), "results go to the output file only");

    let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(v["kind"], "fisher");
    assert!((v["odds_ratio"].as_f64().unwrap() - 20.0).abs() < 1e-12);
    assert!((v["test"]["p_value"].as_f64().unwrap() - 400.0 / 11440.0).abs() < 1e-12);
    assert!(v["test"]["critical_value"].is_null());
    std::fs::remove_file(output).ok();
}

#[test]
fn test_alpha_flag_overrides_document() {
    let input = fixture_path("one_proportion.json");
    let v = run_json(&["test", "--input", input.to_string_lossy().as_ref(), "--alpha", "0.4"]);
    assert_eq!(v["test"]["alpha"], 0.4);
    assert_eq!(v["test"]["decision"], "reject");
}

#[test]
fn test_invalid_alpha_fails_with_message() {
    let input = fixture_path("invalid_alpha.json");
    let out = run(&["test", "--input", input.to_string_lossy().as_ref()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("alpha"), "stderr={}", stderr);
    assert!(out.stdout.is_empty());
}

#[test]
fn test_version_prints_crate_version() {
    let out = run(&["version"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("statwb "), "stdout={}", stdout);
}
