//! Shared fixtures for harness integration tests

use fers_tests::{Dataset, DatasetReader, SuiteConfig, TestError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Dataset reader for the integration tests: a container file is a JSON map
/// of dataset name to shape and values. Lets the suite exercise the full
/// container-comparison path without a native HDF5 library.
pub struct JsonReader;

#[derive(Deserialize)]
struct RawDataset {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl DatasetReader for JsonReader {
    fn read_datasets(&self, path: &Path) -> Result<Vec<Dataset>, TestError> {
        let text = fs::read_to_string(path)?;
        let raw: BTreeMap<String, RawDataset> = serde_json::from_str(&text)
            .map_err(|e| TestError::Container(format!("{}: {}", path.display(), e)))?;
        Ok(raw
            .into_iter()
            .map(|(name, d)| Dataset::new(name, d.shape, d.values))
            .collect())
    }
}

/// Serialize datasets into the JSON container format
pub fn container_json(datasets: &[(&str, &[f64])]) -> String {
    let map: BTreeMap<&str, serde_json::Value> = datasets
        .iter()
        .map(|(name, values)| {
            (
                *name,
                serde_json::json!({ "shape": [values.len()], "values": values }),
            )
        })
        .collect();
    serde_json::to_string(&map).unwrap()
}

/// Write an executable fake-simulator script
#[cfg(unix)]
pub fn write_simulator(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// A script that writes the given files (name, content) into the case
/// directory and exits 0
#[cfg(unix)]
pub fn emitting_simulator(files: &[(&str, &str)]) -> String {
    let mut script = String::from("#!/bin/sh\n");
    for (name, content) in files {
        script.push_str(&format!("cat > '{}' <<'FERS_EOF'\n{}\nFERS_EOF\n", name, content));
        // The heredoc appends a trailing newline; tests record expected
        // content the same way via expect_file.
    }
    script.push_str("exit 0\n");
    script
}

/// Create a test-case directory with an input file under the suite root
pub fn make_case(root: &Path, name: &str) -> PathBuf {
    let case = root.join(name);
    fs::create_dir_all(case.join("expected_output")).unwrap();
    fs::write(case.join("input.fersxml"), b"<simulation name=\"sim1\"/>").unwrap();
    case
}

/// Record an expected artifact, content terminated by a newline to match the
/// fake simulator's heredoc output
pub fn expect_file(case: &Path, relative: &str, content: &str) {
    let path = case.join("expected_output").join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("{}\n", content)).unwrap();
}

/// Quiet config pointing at the given simulator and suite root
pub fn base_config(simulator: PathBuf, test_root: PathBuf) -> SuiteConfig {
    let mut config = SuiteConfig::new(simulator, test_root);
    config.quiet = true;
    config
}
