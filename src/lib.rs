//! # FERS Regression Test Framework
//!
//! A regression-test harness for the FERS radar simulator. Each test case is
//! one directory under the test root containing an `input.fersxml` simulation
//! input and an `expected_output/` tree of previously recorded artifacts. The
//! harness runs the simulator in the case directory, compares what it wrote
//! against the expected tree (HDF5 datasets under an absolute tolerance,
//! everything else byte for byte), cleans the case directory back to its
//! pre-run state, and reports a suite-level verdict.
//!
//! ## Architecture
//!
//! - `config`: CLI and runtime configuration
//! - `discovery`: test-case discovery under the test root
//! - `dataset`: dataset model, tolerance comparison, and the reader seam
//! - `comparison`: expected-vs-generated output tree comparison
//! - `execution`: simulator invocation and per-case results
//! - `cleanup`: post-case workspace restoration
//! - `harness`: suite orchestration
//! - `reporting`: result aggregation and output
//! - `hdf5`: native HDF5 dataset reader (feature `hdf5`)

pub mod cleanup;
pub mod comparison;
pub mod config;
pub mod dataset;
pub mod discovery;
pub mod execution;
pub mod harness;
pub mod reporting;

#[cfg(feature = "hdf5")]
pub mod hdf5;

// Re-exports for easier access
pub use cleanup::WorkspaceCleaner;
pub use comparison::{CaseComparison, ComparisonOutcome, OutputTreeDiffer};
pub use config::{ExecutionMode, SuiteConfig};
pub use dataset::{Dataset, DatasetReader};
pub use discovery::{CaseDiscovery, TestCase};
pub use execution::{CaseResult, CaseStatus, RunOutcome, SimulatorRunner};
pub use harness::FersHarness;
pub use reporting::{SuiteReport, SuiteStatistics};

/// Current version of the test framework
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Test framework errors
#[derive(thiserror::Error, Debug)]
pub enum TestError {
    #[error("Test discovery failed: {0}")]
    Discovery(String),

    #[error("Test execution failed: {0}")]
    Execution(String),

    #[error("Container read failed: {0}")]
    Container(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] indicatif::style::TemplateError),
}
