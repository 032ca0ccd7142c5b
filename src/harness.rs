//! Suite orchestration
//!
//! Drives the per-case state machine: run the simulator, compare the output
//! tree, clean the workspace, tally the verdict. Cleanup is sequenced
//! unconditionally after run and comparison, both of which report failure
//! through values rather than unwinding, so a case can never leave its
//! directory dirty for the next invocation.

use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::cleanup::WorkspaceCleaner;
use crate::comparison::OutputTreeDiffer;
use crate::config::{ExecutionMode, SuiteConfig};
use crate::dataset::DatasetReader;
use crate::discovery::{CaseDiscovery, TestCase};
use crate::execution::{CaseResult, CaseStatus, SimulatorRunner};
use crate::reporting::SuiteReport;
use crate::TestError;

/// Main harness for running the FERS regression suite
pub struct FersHarness {
    config: Arc<SuiteConfig>,
    runner: SimulatorRunner,
    differ: OutputTreeDiffer,
    cleaner: WorkspaceCleaner,
}

impl FersHarness {
    /// Create a harness with the default dataset reader for this build
    pub fn new(config: SuiteConfig) -> Result<Self, TestError> {
        Self::with_reader(config, Self::default_reader())
    }

    /// Create a harness with an explicit dataset reader (or none)
    pub fn with_reader(
        config: SuiteConfig,
        reader: Option<Arc<dyn DatasetReader>>,
    ) -> Result<Self, TestError> {
        config.validate()?;

        if reader.is_none() && !config.container_extensions.is_empty() {
            warn!(
                "No dataset reader in this build: container files ({}) will fail comparison",
                config.container_extensions.join(", ")
            );
        }

        let config = Arc::new(config);
        let runner = SimulatorRunner::new(&config)?;
        let differ = OutputTreeDiffer::new(Arc::clone(&config), reader);
        let cleaner = WorkspaceCleaner::new(&config);

        Ok(Self { config, runner, differ, cleaner })
    }

    #[cfg(feature = "hdf5")]
    fn default_reader() -> Option<Arc<dyn DatasetReader>> {
        Some(Arc::new(crate::hdf5::Hdf5Reader))
    }

    #[cfg(not(feature = "hdf5"))]
    fn default_reader() -> Option<Arc<dyn DatasetReader>> {
        None
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run every discovered test case and aggregate the suite report
    pub async fn run_suite(&self) -> Result<SuiteReport, TestError> {
        let start = Instant::now();

        let cases = CaseDiscovery::discover(&self.config)?;
        if cases.is_empty() {
            // Zero discovered cases pass vacuously: the exit contract is
            // "0 if every discovered test case passed".
            warn!("No test cases found under {}", self.config.test_root.display());
        }

        info!("Discovered {} test cases", cases.len());

        let progress = if self.config.quiet {
            None
        } else {
            let pb = indicatif::ProgressBar::new(cases.len() as u64);
            pb.set_style(indicatif::ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?);
            Some(pb)
        };

        let mut results = match self.config.execution_mode {
            ExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(cases.len());
                for case in &cases {
                    results.push(self.run_case(case).await);
                    if let Some(pb) = &progress {
                        pb.inc(1);
                    }
                }
                results
            }
            ExecutionMode::Parallel => {
                // Case directories are disjoint and each child gets its own
                // working directory, so cases can run concurrently.
                let jobs = self.config.effective_jobs().max(1);
                stream::iter(cases.iter())
                    .map(|case| {
                        let progress = progress.clone();
                        async move {
                            let result = self.run_case(case).await;
                            if let Some(pb) = &progress {
                                pb.inc(1);
                            }
                            result
                        }
                    })
                    .buffer_unordered(jobs)
                    .collect::<Vec<_>>()
                    .await
            }
        };

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        // Completion order is nondeterministic in parallel mode; the report
        // is presented in discovery order either way.
        results.sort_by(|a, b| a.case.name.cmp(&b.case.name));

        Ok(SuiteReport::new(results, start.elapsed()))
    }

    /// One case end to end: run, compare, clean, tally.
    async fn run_case(&self, case: &TestCase) -> CaseResult {
        let start = Instant::now();

        let run = self.runner.run(case).await;

        // A failed simulation skips comparison but never cleanup.
        let comparison = run.succeeded().then(|| self.differ.diff(case));

        self.cleaner.clean(&case.path);

        let (status, failure) = if !run.succeeded() {
            let status = if run.timed_out { CaseStatus::Timeout } else { CaseStatus::Failed };
            (status, Some(format!("simulation failed: {}", run.failure_detail())))
        } else if comparison.as_ref().is_some_and(|c| c.passed()) {
            (CaseStatus::Passed, None)
        } else {
            let mismatched: Vec<&str> = comparison
                .iter()
                .flat_map(|c| c.failures())
                .map(|f| f.name.as_str())
                .collect();
            (CaseStatus::Failed, Some(format!("output mismatch: {}", mismatched.join(", "))))
        };

        CaseResult { case: case.clone(), status, failure, run, comparison, duration: start.elapsed() }
    }
}
