//! Suite-level result aggregation and output

use console::style;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::execution::{CaseResult, CaseStatus};

/// Overall suite statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteStatistics {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub timeouts: usize,
    pub total_duration: Duration,
}

impl SuiteStatistics {
    pub fn from_results(results: &[CaseResult]) -> Self {
        let mut stats = Self {
            total: results.len(),
            passed: 0,
            failed: 0,
            timeouts: 0,
            total_duration: Duration::ZERO,
        };

        for result in results {
            match result.status {
                CaseStatus::Passed => stats.passed += 1,
                CaseStatus::Failed => stats.failed += 1,
                CaseStatus::Timeout => stats.timeouts += 1,
            }
            stats.total_duration += result.duration;
        }

        stats
    }

    /// The sole external contract: the suite succeeds only if every
    /// discovered case passed.
    pub fn all_passed(&self) -> bool {
        self.total == self.passed
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }
}

/// Complete suite report
#[derive(Debug, Serialize, Deserialize)]
pub struct SuiteReport {
    pub results: Vec<CaseResult>,
    pub statistics: SuiteStatistics,
    /// Wall-clock duration of the whole suite
    pub duration: Duration,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl SuiteReport {
    pub fn new(results: Vec<CaseResult>, duration: Duration) -> Self {
        let statistics = SuiteStatistics::from_results(&results);
        Self { results, statistics, duration, timestamp: chrono::Utc::now() }
    }

    pub fn failed_cases(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|r| !r.passed())
    }

    /// Print per-case verdict lines and the suite summary
    pub fn print_summary(&self) {
        for result in &self.results {
            match result.status {
                CaseStatus::Passed => {
                    println!("{} Test {} passed.", style("✓").green(), result.case.name)
                }
                CaseStatus::Failed => {
                    println!("{} Test {} failed.", style("✗").red(), result.case.name)
                }
                CaseStatus::Timeout => {
                    println!("{} Test {} timed out.", style("⏱").red(), result.case.name)
                }
            }
        }

        if !self.statistics.all_passed() {
            self.print_failures();
        }

        println!();
        let summary = format!(
            "Passed {} out of {} tests.",
            self.statistics.passed, self.statistics.total
        );
        if self.statistics.all_passed() {
            println!("{}", style(summary).bold().green());
        } else {
            println!("{}", style(summary).bold().red());
        }
        println!(
            "{}",
            style(format!("Duration: {:.2?}", self.duration)).dim()
        );
    }

    /// Print failure diagnostics for every non-passing case
    pub fn print_failures(&self) {
        println!("\n{}", style("FAILED TESTS:").bold().red());
        for result in self.failed_cases() {
            println!(
                "\n  {} {} [{:.2?}]",
                style("✗").red(),
                result.case.name,
                result.duration
            );

            if let Some(failure) = &result.failure {
                println!("    {}", style(failure).red());
            }

            if let Some(comparison) = &result.comparison {
                for file in comparison.failures() {
                    let detail = file.outcome.describe().unwrap_or_default();
                    println!("    {}:", style(&file.name).bold());
                    for line in detail.lines() {
                        if line.starts_with('+') {
                            println!("      {}", style(line).green());
                        } else if line.starts_with('-') {
                            println!("      {}", style(line).red());
                        } else {
                            println!("      {}", style(line).dim());
                        }
                    }
                }
            }

            if !result.run.stderr.trim().is_empty() && result.comparison.is_none() {
                println!("    {}", style("Simulator stderr:").bold());
                for line in result.run.stderr.lines() {
                    println!("      {}", style(line).dim());
                }
            }
        }
    }

    /// Export report as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save report to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), crate::TestError> {
        let json = self
            .to_json()
            .map_err(|e| crate::TestError::Report(format!("JSON serialization failed: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Suite Results:")?;
        writeln!(f, "  Total:    {}", self.statistics.total)?;
        writeln!(f, "  Passed:   {}", self.statistics.passed)?;
        writeln!(f, "  Failed:   {}", self.statistics.failed)?;
        writeln!(f, "  Timeouts: {}", self.statistics.timeouts)?;
        writeln!(f, "  Success rate: {:.1}%", self.statistics.success_rate())?;
        writeln!(f, "  Duration: {:.2?}", self.duration)?;
        Ok(())
    }
}
