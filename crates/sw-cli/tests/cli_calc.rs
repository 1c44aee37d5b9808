use std::path::PathBuf;
use std::process::Command;

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_statwb"))
}

fn repo_root() -> PathBuf {
    // crates/sw-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn calc(fixture: &str) -> serde_json::Value {
    let input = repo_root().join("tests/fixtures").join(fixture);
    let out = Command::new(bin_path())
        .args(["calc", "--input", input.to_string_lossy().as_ref()])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn test_binomial_at_most() {
    let v = calc("calc_binomial.yaml");
    assert_eq!(v["output"], "probability");
    assert!((v["probability"].as_f64().unwrap() - 638.0 / 1024.0).abs() < 1e-12);
}

#[test]
fn test_normal_probability() {
    let v = calc("calc_normal.json");
    assert_eq!(v["output"], "normal_probability");
    assert!((v["z"].as_f64().unwrap() - 1.0).abs() < 1e-12);
    assert!((v["p_at_most"].as_f64().unwrap() - 0.8413447460685429).abs() < 1e-9);
    assert!((v["p_greater"].as_f64().unwrap() - 0.15865525393145707).abs() < 1e-9);
}

#[test]
fn test_dice_sum_lists_favorable_outcomes() {
    let v = calc("calc_dice.json");
    assert_eq!(v["output"], "classical");
    assert_eq!(v["total"], 36);
    let favorable = v["favorable"].as_array().unwrap();
    assert_eq!(favorable.len(), 6);
    assert_eq!(favorable[0], serde_json::json!([1, 6]));
}
