//! Main binary for running FERS regression tests

use clap::Parser;
use std::process;

use fers_tests::{FersHarness, SuiteConfig};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match SuiteConfig::try_parse() {
        Ok(config) => config,
        Err(e) => e.exit(),
    };

    let harness = match FersHarness::new(config) {
        Ok(harness) => harness,
        Err(e) => {
            eprintln!("Failed to create test harness: {}", e);
            process::exit(1);
        }
    };

    match harness.run_suite().await {
        Ok(report) => {
            if !harness.config().quiet {
                report.print_summary();
            } else {
                println!(
                    "Passed {} out of {} tests.",
                    report.statistics.passed, report.statistics.total
                );
            }

            if harness.config().verbose {
                print!("{}", report);
            }

            if let Some(path) = &harness.config().report {
                if let Err(e) = report.save_to_file(path) {
                    eprintln!("Failed to write report {}: {}", path.display(), e);
                    process::exit(1);
                }
            }

            // Exit status is the external contract: 0 only if all passed.
            if !report.statistics.all_passed() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Test execution failed: {}", e);
            process::exit(1);
        }
    }
}
