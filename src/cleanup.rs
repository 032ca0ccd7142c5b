//! Post-case workspace restoration
//!
//! The simulator writes its output files directly into the case directory.
//! After each case, pass or fail, the cleaner removes everything there except
//! the fixed allow-list (input file, fixtures, the expected-output tree) so
//! the next run starts from a pristine workspace.

use log::warn;
use std::fs;
use std::path::Path;

use crate::config::SuiteConfig;

/// Removes generated artifacts from a case directory after a run.
#[derive(Clone)]
pub struct WorkspaceCleaner {
    keep: Vec<String>,
}

impl WorkspaceCleaner {
    pub fn new(config: &SuiteConfig) -> Self {
        Self { keep: config.keep_list() }
    }

    /// Remove every direct entry of the case directory not on the allow-list.
    ///
    /// Best-effort: filesystem errors are logged and never fail the suite,
    /// and cleanup runs regardless of how the preceding run or comparison
    /// turned out.
    pub fn clean(&self, case_path: &Path) {
        let entries = match fs::read_dir(case_path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cleanup: failed to list {}: {}", case_path.display(), e);
                return;
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            if self.keep.iter().any(|k| k.as_str() == name) {
                continue;
            }

            let path = entry.path();
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };

            if let Err(e) = removed {
                warn!("Cleanup: failed to remove {}: {}", path.display(), e);
            }
        }
    }
}
