//! Dataset model and tolerance comparison
//!
//! A dataset is a named multi-dimensional numeric array read out of a
//! scientific container file. Dataset equality is defined here as element-wise
//! agreement under an absolute tolerance, never raw binary equality.

use crate::TestError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named multi-dimensional array of `f64` values.
///
/// Values are stored flat in the container's element order; `shape` holds the
/// per-dimension element counts. Integer datasets are widened to `f64` on
/// load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, shape: Vec<usize>, values: Vec<f64>) -> Self {
        Self { name: name.into(), shape, values }
    }

    /// Convenience constructor for one-dimensional data
    pub fn one_dim(name: impl Into<String>, values: Vec<f64>) -> Self {
        let shape = vec![values.len()];
        Self { name: name.into(), shape, values }
    }
}

/// Reads the named top-level datasets out of one container file.
///
/// This is the harness's boundary to the scientific file format: the differ
/// only ever sees raw array data, so the container format itself stays
/// pluggable (the production implementation is `Hdf5Reader`, feature `hdf5`).
pub trait DatasetReader: Send + Sync {
    fn read_datasets(&self, path: &Path) -> Result<Vec<Dataset>, TestError>;
}

/// Compare two same-named datasets under an absolute per-element tolerance.
///
/// Shapes must match exactly; no coercion is attempted. The boundary is
/// inclusive: a deviation of exactly `tolerance` is a match. NaN never
/// matches anything, including NaN. Returns `Err` with a diagnostic naming
/// the first offending element.
pub fn compare_datasets(
    expected: &Dataset,
    generated: &Dataset,
    tolerance: f64,
) -> Result<(), String> {
    if expected.shape != generated.shape {
        return Err(format!(
            "dataset {}: shape mismatch (expected {:?}, generated {:?})",
            expected.name, expected.shape, generated.shape
        ));
    }

    // Shape agreement should imply length agreement; a reader handing back an
    // inconsistent dataset is still caught here.
    if expected.values.len() != generated.values.len() {
        return Err(format!(
            "dataset {}: element count mismatch (expected {}, generated {})",
            expected.name,
            expected.values.len(),
            generated.values.len()
        ));
    }

    for (i, (e, g)) in expected.values.iter().zip(generated.values.iter()).enumerate() {
        let deviation = (e - g).abs();
        if !(deviation <= tolerance) {
            return Err(format!(
                "dataset {}: value mismatch at index {} (expected {}, generated {}, |delta| = {}, tolerance = {})",
                expected.name, i, e, g, deviation, tolerance
            ));
        }
    }

    Ok(())
}
