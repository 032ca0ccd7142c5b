//! Output comparison: expected-output trees against generated artifacts
//!
//! The differ walks a case's `expected_output/` tree and pairs every file in
//! it with a generated counterpart found directly under the case directory.
//! Dataset containers are compared through the `DatasetReader` seam under the
//! configured tolerance; everything else is compared byte for byte. The
//! comparison is one-directional: generated files with no expected
//! counterpart are ignored.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SuiteConfig;
use crate::dataset::{compare_datasets, DatasetReader};
use crate::discovery::TestCase;

/// Upper bound on file size for unified-diff generation in mismatch reasons.
const DIFF_SIZE_LIMIT: u64 = 64 * 1024;

/// Outcome of comparing one expected file against its generated counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOutcome {
    /// Contents agree (byte-exact, or within tolerance for datasets)
    Match,
    /// Both files exist but their contents disagree
    Mismatch { reason: String },
    /// The expected file has no generated counterpart. Comparison is
    /// one-directional, so only the generated side can ever be absent.
    Missing,
}

impl ComparisonOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, ComparisonOutcome::Match)
    }

    /// Human-readable failure description, `None` for a match
    pub fn describe(&self) -> Option<String> {
        match self {
            ComparisonOutcome::Match => None,
            ComparisonOutcome::Mismatch { reason } => Some(reason.clone()),
            ComparisonOutcome::Missing => Some("missing from generated output".to_string()),
        }
    }
}

/// Comparison record for one expected file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileComparison {
    /// File name used for the generated-side lookup
    pub name: String,
    /// Full path of the expected file
    pub expected_path: PathBuf,
    pub outcome: ComparisonOutcome,
}

/// All file comparisons for one test case
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseComparison {
    pub files: Vec<FileComparison>,
}

impl CaseComparison {
    /// A case passes only if every expected file found a matching counterpart.
    /// An empty expected tree passes vacuously.
    pub fn passed(&self) -> bool {
        self.files.iter().all(|f| f.outcome.is_match())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileComparison> {
        self.files.iter().filter(|f| !f.outcome.is_match())
    }
}

/// Deep byte-for-byte comparison of two files.
///
/// A missing or unreadable generated file is reported as missing/mismatch,
/// never raised. For UTF-8 text pairs under a size cap the mismatch reason
/// carries a unified diff; otherwise it names the first differing offset.
pub fn compare_bytes(expected_path: &Path, generated_path: &Path) -> ComparisonOutcome {
    if !generated_path.exists() {
        return ComparisonOutcome::Missing;
    }

    let expected = match fs::read(expected_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return ComparisonOutcome::Mismatch {
                reason: format!("failed to read expected file: {}", e),
            }
        }
    };
    let generated = match fs::read(generated_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return ComparisonOutcome::Mismatch {
                reason: format!("failed to read generated file: {}", e),
            }
        }
    };

    if expected == generated {
        return ComparisonOutcome::Match;
    }

    let offset = expected
        .iter()
        .zip(generated.iter())
        .position(|(e, g)| e != g)
        .unwrap_or_else(|| expected.len().min(generated.len()));

    let mut reason = format!(
        "byte content differs at offset {} (expected {} bytes, generated {} bytes)",
        offset,
        expected.len(),
        generated.len()
    );

    if expected.len() as u64 <= DIFF_SIZE_LIMIT && generated.len() as u64 <= DIFF_SIZE_LIMIT {
        if let (Ok(expected_text), Ok(generated_text)) =
            (std::str::from_utf8(&expected), std::str::from_utf8(&generated))
        {
            let diff = TextDiff::from_lines(expected_text, generated_text)
                .unified_diff()
                .header("expected", "generated")
                .to_string();
            reason.push('\n');
            reason.push_str(&diff);
        }
    }

    ComparisonOutcome::Mismatch { reason }
}

/// Walks a case's expected-output tree and compares every file in it against
/// the simulator's generated output.
#[derive(Clone)]
pub struct OutputTreeDiffer {
    config: Arc<SuiteConfig>,
    reader: Option<Arc<dyn DatasetReader>>,
}

impl OutputTreeDiffer {
    pub fn new(config: Arc<SuiteConfig>, reader: Option<Arc<dyn DatasetReader>>) -> Self {
        Self { config, reader }
    }

    /// Compare the full expected-output tree of one test case.
    ///
    /// Runs to completion so the result records every mismatch, not only the
    /// first. Expected-output subdirectories organize the recorded artifacts
    /// only: the generated counterpart is always looked up by plain file name
    /// directly under the case directory, so a file name appearing twice in
    /// the expected tree is a configuration error, not a silent pick.
    pub fn diff(&self, case: &TestCase) -> CaseComparison {
        let mut comparison = CaseComparison::default();

        let expected_dir = case.expected_dir();
        if !expected_dir.is_dir() {
            // Nothing recorded for this case: vacuous pass.
            return comparison;
        }

        let generated = self.generated_lookup(&case.path);
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for entry in walkdir::WalkDir::new(&expected_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let expected_path = entry.path().to_path_buf();
            let name = entry.file_name().to_string_lossy().to_string();

            let outcome = if let Some(earlier) = seen.get(&name) {
                ComparisonOutcome::Mismatch {
                    reason: format!(
                        "ambiguous expected file name: also recorded at {}",
                        earlier.display()
                    ),
                }
            } else {
                seen.insert(name.clone(), expected_path.clone());
                self.compare_pair(&name, &expected_path, generated.get(&name))
            };

            if let Some(detail) = outcome.describe() {
                warn!("Case {}: {} failed: {}", case.name, name, detail);
            } else {
                debug!("Case {}: {} matched", case.name, name);
            }

            comparison.files.push(FileComparison { name, expected_path, outcome });
        }

        comparison
    }

    /// Name-keyed lookup table over the files the simulator wrote directly
    /// into the case directory.
    fn generated_lookup(&self, case_path: &Path) -> HashMap<String, PathBuf> {
        let mut table = HashMap::new();

        let entries = match fs::read_dir(case_path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list generated output in {}: {}", case_path.display(), e);
                return table;
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            if entry.path().is_file() {
                table.insert(entry.file_name().to_string_lossy().to_string(), entry.path());
            }
        }

        table
    }

    fn compare_pair(
        &self,
        name: &str,
        expected_path: &Path,
        generated_path: Option<&PathBuf>,
    ) -> ComparisonOutcome {
        let Some(generated_path) = generated_path else {
            return ComparisonOutcome::Missing;
        };

        if self.config.is_container(name) {
            self.compare_containers(expected_path, generated_path)
        } else {
            compare_bytes(expected_path, generated_path)
        }
    }

    /// Compare two dataset containers: every expected top-level dataset not on
    /// the exclusion list must exist in the generated file and agree within
    /// tolerance. Extra generated datasets are ignored.
    fn compare_containers(
        &self,
        expected_path: &Path,
        generated_path: &Path,
    ) -> ComparisonOutcome {
        let Some(reader) = &self.reader else {
            return ComparisonOutcome::Mismatch {
                reason: "no dataset reader available (rebuild with --features hdf5)".to_string(),
            };
        };

        let expected = match reader.read_datasets(expected_path) {
            Ok(datasets) => datasets,
            Err(e) => {
                return ComparisonOutcome::Mismatch {
                    reason: format!("failed to read expected container: {}", e),
                }
            }
        };
        let generated = match reader.read_datasets(generated_path) {
            Ok(datasets) => datasets,
            Err(e) => {
                return ComparisonOutcome::Mismatch {
                    reason: format!("failed to read generated container: {}", e),
                }
            }
        };

        let generated: HashMap<&str, &crate::dataset::Dataset> =
            generated.iter().map(|d| (d.name.as_str(), d)).collect();

        let mut reasons = Vec::new();
        for dataset in &expected {
            if self.config.excluded_datasets.iter().any(|x| x == &dataset.name) {
                continue;
            }

            match generated.get(dataset.name.as_str()) {
                None => reasons.push(format!("dataset {} missing in generated file", dataset.name)),
                Some(counterpart) => {
                    if let Err(reason) =
                        compare_datasets(dataset, counterpart, self.config.tolerance)
                    {
                        reasons.push(reason);
                    }
                }
            }
        }

        if reasons.is_empty() {
            ComparisonOutcome::Match
        } else {
            ComparisonOutcome::Mismatch { reason: reasons.join("; ") }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::TestError;
    use std::collections::HashMap as Map;

    /// Dataset reader backed by an in-memory map keyed on file name.
    struct StubReader {
        files: Map<String, Vec<Dataset>>,
    }

    impl DatasetReader for StubReader {
        fn read_datasets(&self, path: &Path) -> Result<Vec<Dataset>, TestError> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            // Generated files live directly in the case dir, expected ones
            // under expected_output; disambiguate by the parent component.
            let key = if path
                .parent()
                .and_then(|p| p.file_name())
                .is_some_and(|p| p == crate::discovery::EXPECTED_DIR)
            {
                format!("expected/{}", name)
            } else {
                format!("generated/{}", name)
            };
            self.files
                .get(&key)
                .cloned()
                .ok_or_else(|| TestError::Container(format!("no datasets for {}", key)))
        }
    }

    fn case_with(config: &SuiteConfig) -> (tempfile::TempDir, TestCase) {
        let dir = tempfile::tempdir().unwrap();
        let case_path = dir.path().join("case1");
        fs::create_dir_all(case_path.join(crate::discovery::EXPECTED_DIR)).unwrap();
        fs::write(case_path.join(&config.input_name), b"<simulation/>").unwrap();
        (dir, TestCase::new(case_path))
    }

    fn test_config() -> SuiteConfig {
        SuiteConfig::new(PathBuf::from("fers"), PathBuf::from("."))
    }

    fn differ_with_reader(
        config: SuiteConfig,
        files: Map<String, Vec<Dataset>>,
    ) -> OutputTreeDiffer {
        OutputTreeDiffer::new(Arc::new(config), Some(Arc::new(StubReader { files })))
    }

    #[test]
    fn empty_expected_tree_passes_vacuously() {
        let config = test_config();
        let (_dir, case) = case_with(&config);
        let differ = OutputTreeDiffer::new(Arc::new(config), None);
        let result = differ.diff(&case);
        assert!(result.passed());
        assert!(result.files.is_empty());
    }

    #[test]
    fn missing_generated_file_fails_the_case() {
        let config = test_config();
        let (_dir, case) = case_with(&config);
        fs::write(case.expected_dir().join("log.txt"), b"OK").unwrap();

        let differ = OutputTreeDiffer::new(Arc::new(config), None);
        let result = differ.diff(&case);
        assert!(!result.passed());
        assert_eq!(
            result.files[0].outcome,
            ComparisonOutcome::Missing
        );
    }

    #[test]
    fn extra_generated_files_are_ignored() {
        let config = test_config();
        let (_dir, case) = case_with(&config);
        fs::write(case.expected_dir().join("log.txt"), b"OK").unwrap();
        fs::write(case.path.join("log.txt"), b"OK").unwrap();
        fs::write(case.path.join("debug_dump.bin"), b"\x00\x01").unwrap();

        let differ = OutputTreeDiffer::new(Arc::new(config), None);
        let result = differ.diff(&case);
        assert!(result.passed());
        assert_eq!(result.files.len(), 1);
    }

    #[test]
    fn byte_mismatch_fails_with_diff() {
        let config = test_config();
        let (_dir, case) = case_with(&config);
        fs::write(case.expected_dir().join("log.txt"), b"OK\n").unwrap();
        fs::write(case.path.join("log.txt"), b"FAIL\n").unwrap();

        let differ = OutputTreeDiffer::new(Arc::new(config), None);
        let result = differ.diff(&case);
        let reason = result.files[0].outcome.describe().unwrap();
        assert!(reason.contains("byte content differs"), "{reason}");
        assert!(reason.contains("-OK"), "{reason}");
        assert!(reason.contains("+FAIL"), "{reason}");
    }

    #[test]
    fn expected_subdirectories_are_flattened_for_lookup() {
        let config = test_config();
        let (_dir, case) = case_with(&config);
        let nested = case.expected_dir().join("csv_exports");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("range.csv"), b"0,1,2\n").unwrap();
        fs::write(case.path.join("range.csv"), b"0,1,2\n").unwrap();

        let differ = OutputTreeDiffer::new(Arc::new(config), None);
        assert!(differ.diff(&case).passed());
    }

    #[test]
    fn duplicate_expected_names_are_a_configuration_error() {
        let config = test_config();
        let (_dir, case) = case_with(&config);
        let a = case.expected_dir().join("a");
        let b = case.expected_dir().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("out.csv"), b"1\n").unwrap();
        fs::write(b.join("out.csv"), b"1\n").unwrap();
        fs::write(case.path.join("out.csv"), b"1\n").unwrap();

        let differ = OutputTreeDiffer::new(Arc::new(config), None);
        let result = differ.diff(&case);
        assert!(!result.passed());
        let reason = result.failures().next().unwrap().outcome.describe().unwrap();
        assert!(reason.contains("ambiguous expected file name"), "{reason}");
    }

    #[test]
    fn container_files_route_through_the_reader() {
        let mut config = test_config();
        config.tolerance = 0.0;
        let (_dir, case) = case_with(&config);
        fs::write(case.expected_dir().join("result.h5"), b"expected").unwrap();
        fs::write(case.path.join("result.h5"), b"generated").unwrap();

        let mut files = Map::new();
        files.insert(
            "expected/result.h5".to_string(),
            vec![Dataset::one_dim("signal", vec![1.0, 2.0, 3.0])],
        );
        files.insert(
            "generated/result.h5".to_string(),
            vec![Dataset::one_dim("signal", vec![1.0, 2.0, 3.0])],
        );

        let differ = differ_with_reader(config, files);
        assert!(differ.diff(&case).passed());
    }

    #[test]
    fn dataset_outside_tolerance_fails_within_tolerance_passes() {
        let (_dir, case) = case_with(&test_config());
        fs::write(case.expected_dir().join("result.h5"), b"e").unwrap();
        fs::write(case.path.join("result.h5"), b"g").unwrap();

        let mut files = Map::new();
        files.insert(
            "expected/result.h5".to_string(),
            vec![Dataset::one_dim("signal", vec![1.0, 2.0, 3.0])],
        );
        files.insert(
            "generated/result.h5".to_string(),
            vec![Dataset::one_dim("signal", vec![1.0, 2.0, 3.1])],
        );

        let mut strict = test_config();
        strict.tolerance = 0.0;
        let differ = differ_with_reader(strict, files.clone());
        assert!(!differ.diff(&case).passed());

        let mut loose = test_config();
        loose.tolerance = 0.1;
        let differ = differ_with_reader(loose, files);
        assert!(differ.diff(&case).passed());
    }

    #[test]
    fn missing_dataset_in_generated_container_fails() {
        let (_dir, case) = case_with(&test_config());
        fs::write(case.expected_dir().join("result.h5"), b"e").unwrap();
        fs::write(case.path.join("result.h5"), b"g").unwrap();

        let mut files = Map::new();
        files.insert(
            "expected/result.h5".to_string(),
            vec![
                Dataset::one_dim("chunk_000000_I", vec![1.0]),
                Dataset::one_dim("chunk_000000_Q", vec![2.0]),
            ],
        );
        files.insert(
            "generated/result.h5".to_string(),
            vec![Dataset::one_dim("chunk_000000_I", vec![1.0])],
        );

        let differ = differ_with_reader(test_config(), files);
        let result = differ.diff(&case);
        let reason = result.failures().next().unwrap().outcome.describe().unwrap();
        assert!(reason.contains("chunk_000000_Q missing"), "{reason}");
    }

    #[test]
    fn extra_generated_datasets_are_ignored_and_exclusions_skipped() {
        let mut config = test_config();
        config.excluded_datasets = vec!["metadata".to_string()];
        let (_dir, case) = case_with(&config);
        fs::write(case.expected_dir().join("result.h5"), b"e").unwrap();
        fs::write(case.path.join("result.h5"), b"g").unwrap();

        let mut files = Map::new();
        files.insert(
            "expected/result.h5".to_string(),
            vec![
                Dataset::one_dim("metadata", vec![99.0]),
                Dataset::one_dim("signal", vec![1.0]),
            ],
        );
        files.insert(
            "generated/result.h5".to_string(),
            vec![
                Dataset::one_dim("signal", vec![1.0]),
                Dataset::one_dim("extra_debug", vec![0.0]),
            ],
        );

        let differ = differ_with_reader(config, files);
        assert!(differ.diff(&case).passed());
    }

    #[test]
    fn container_without_reader_is_a_mismatch() {
        let config = test_config();
        let (_dir, case) = case_with(&config);
        fs::write(case.expected_dir().join("result.h5"), b"e").unwrap();
        fs::write(case.path.join("result.h5"), b"g").unwrap();

        let differ = OutputTreeDiffer::new(Arc::new(config), None);
        let result = differ.diff(&case);
        let reason = result.failures().next().unwrap().outcome.describe().unwrap();
        assert!(reason.contains("no dataset reader"), "{reason}");
    }

    #[test]
    fn identical_and_differing_binary_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, [0u8, 1, 2, 3]).unwrap();
        fs::write(&b, [0u8, 1, 2, 3]).unwrap();
        assert!(compare_bytes(&a, &b).is_match());

        fs::write(&b, [0u8, 1, 9, 3]).unwrap();
        match compare_bytes(&a, &b) {
            ComparisonOutcome::Mismatch { reason } => {
                assert!(reason.contains("offset 2"), "{reason}")
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }
}
