//! Configuration and settings for the test framework

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Test execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ExecutionMode {
    /// Run test cases one at a time
    Sequential,
    /// Run test cases concurrently (case directories are disjoint)
    Parallel,
}

/// Configuration for the test framework
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "fers-tests")]
#[command(about = "FERS simulation regression test harness")]
pub struct SuiteConfig {
    /// Path to the fers simulator binary to test
    #[arg(short, long)]
    pub simulator: PathBuf,

    /// Directory whose direct subdirectories are the test cases
    #[arg(short, long, default_value = "test/sim_tests")]
    pub test_root: PathBuf,

    /// Maximum absolute per-element deviation for dataset comparison
    /// (0 means exact numeric equality)
    #[arg(long, default_value_t = 0.0)]
    pub tolerance: f64,

    /// Timeout for one simulator run in seconds (0 = no timeout)
    #[arg(long, default_value_t = 0)]
    pub timeout: u64,

    /// Name of the simulation input file inside each test case
    #[arg(long, default_value = "input.fersxml")]
    pub input_name: String,

    /// Fixture files that must survive cleanup, by name
    #[arg(long = "fixture", default_values_t = [String::from("waveform.csv")])]
    pub fixtures: Vec<String>,

    /// File extensions treated as dataset containers
    #[arg(long = "container-ext", default_values_t = [String::from("h5")])]
    pub container_extensions: Vec<String>,

    /// Container member names excluded from comparison (metadata entries)
    #[arg(long = "exclude-dataset")]
    pub excluded_datasets: Vec<String>,

    /// Substring patterns selecting which test cases to run
    #[arg(long = "tests")]
    pub tests: Vec<String>,

    /// Extra arguments passed to the simulator before the input file
    #[arg(long)]
    pub simulator_args: Option<String>,

    /// Execution mode
    #[arg(long, value_enum, default_value_t = ExecutionMode::Sequential)]
    pub execution_mode: ExecutionMode,

    /// Number of concurrent cases in parallel mode (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Write the full suite report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

impl SuiteConfig {
    /// Create a new configuration with sensible defaults
    pub fn new(simulator: PathBuf, test_root: PathBuf) -> Self {
        Self {
            simulator,
            test_root,
            tolerance: 0.0,
            timeout: 0,
            input_name: "input.fersxml".to_string(),
            fixtures: vec!["waveform.csv".to_string()],
            container_extensions: vec!["h5".to_string()],
            excluded_datasets: Vec::new(),
            tests: Vec::new(),
            simulator_args: None,
            execution_mode: ExecutionMode::Sequential,
            jobs: 0,
            report: None,
            verbose: false,
            quiet: false,
        }
    }

    /// Get the number of concurrent cases to use in parallel mode
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            std::thread::available_parallelism().map(|p| p.get()).unwrap_or(1)
        } else {
            self.jobs
        }
    }

    /// Extra simulator arguments, split shell-style
    pub fn extra_simulator_args(&self) -> Result<Vec<String>, crate::TestError> {
        match &self.simulator_args {
            None => Ok(Vec::new()),
            Some(raw) => shlex::split(raw).ok_or_else(|| {
                crate::TestError::Config(format!("Unparseable simulator arguments: {}", raw))
            }),
        }
    }

    /// Check whether a generated file name is a dataset container
    pub fn is_container(&self, name: &str) -> bool {
        std::path::Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.container_extensions.iter().any(|c| c == ext))
            .unwrap_or(false)
    }

    /// Names that the workspace cleaner must leave in place
    pub fn keep_list(&self) -> Vec<String> {
        let mut keep = vec![self.input_name.clone(), crate::discovery::EXPECTED_DIR.to_string()];
        keep.extend(self.fixtures.iter().cloned());
        keep
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::TestError> {
        if !self.simulator.exists() {
            return Err(crate::TestError::Config(format!(
                "Simulator binary not found at: {}",
                self.simulator.display()
            )));
        }

        if !self.test_root.exists() || !self.test_root.is_dir() {
            return Err(crate::TestError::Config(format!(
                "Test root not found or not a directory: {}",
                self.test_root.display()
            )));
        }

        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(crate::TestError::Config(format!(
                "Tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }

        self.extra_simulator_args()?;

        Ok(())
    }
}
