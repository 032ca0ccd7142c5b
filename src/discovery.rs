//! Test case discovery

use crate::config::SuiteConfig;
use crate::TestError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the expected-output subtree inside each test case
pub const EXPECTED_DIR: &str = "expected_output";

/// One simulation test case: a directory holding the input file, the
/// expected-output tree, and (transiently) whatever the simulator writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Case name (the directory's file name)
    pub name: String,
    /// Path to the case directory
    pub path: PathBuf,
}

impl TestCase {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Self { name, path }
    }

    /// Path to the simulation input file
    pub fn input_file(&self, input_name: &str) -> PathBuf {
        self.path.join(input_name)
    }

    /// Path to the recorded expected-output tree
    pub fn expected_dir(&self) -> PathBuf {
        self.path.join(EXPECTED_DIR)
    }
}

/// Test discovery engine: every direct subdirectory of the test root is one
/// test case.
pub struct CaseDiscovery;

impl CaseDiscovery {
    /// Discover all test cases selected by the configuration.
    ///
    /// Cases are sorted by name for stable output; they are independent and
    /// their order never affects outcomes.
    pub fn discover(config: &SuiteConfig) -> Result<Vec<TestCase>, TestError> {
        Self::discover_in(&config.test_root, &config.tests)
    }

    fn discover_in(test_root: &Path, patterns: &[String]) -> Result<Vec<TestCase>, TestError> {
        let entries = fs::read_dir(test_root).map_err(|e| {
            TestError::Discovery(format!("Failed to read {}: {}", test_root.display(), e))
        })?;

        let mut cases = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                TestError::Discovery(format!("Failed to read {}: {}", test_root.display(), e))
            })?;

            if !entry.path().is_dir() {
                continue;
            }

            let case = TestCase::new(entry.path());

            if !patterns.is_empty()
                && !patterns.iter().any(|pattern| case.name.contains(pattern.as_str()))
            {
                continue;
            }

            cases.push(case);
        }

        cases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cases)
    }
}
