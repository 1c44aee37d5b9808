//! Request and dataset documents (YAML or JSON).

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Read a YAML or JSON document.
///
/// The YAML parser also accepts JSON (YAML is a superset), so there is one
/// code path for both formats.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let doc = serde_yaml_ng::from_slice(&bytes)
        .with_context(|| format!("invalid document {}", path.display()))?;
    Ok(doc)
}

/// Write `value` as pretty JSON to `output`, or to stdout.
pub fn write_json<T: Serialize>(output: Option<&PathBuf>, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    if let Some(path) = output {
        std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    } else {
        println!("{}", text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_inference::TestRequest;

    fn tmp_file(name: &str, contents: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("statwb_doc_{}_{}", std::process::id(), name));
        std::fs::write(&p, contents).unwrap();
        p
    }

    #[test]
    fn test_reads_yaml_and_json_alike() {
        let json = tmp_file(
            "req.json",
            r#"{"test": "one_proportion", "sample": {"successes": 45, "trials": 100}, "p0": 0.5}"#,
        );
        let yaml = tmp_file(
            "req.yaml",
            "test: one_proportion\nsample:\n  successes: 45\n  trials: 100\np0: 0.5\n",
        );
        let a: TestRequest = read_document(&json).unwrap();
        let b: TestRequest = read_document(&yaml).unwrap();
        assert_eq!(a, b);
        std::fs::remove_file(json).ok();
        std::fs::remove_file(yaml).ok();
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_document::<TestRequest>(Path::new("/nonexistent/statwb.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/statwb.yaml"));
    }
}
