//! Native HDF5 dataset reader (cargo feature `hdf5`)
//!
//! FERS writes its receiver exports as flat top-level double datasets
//! (`chunk_000000_I`, `chunk_000000_Q`, ...). Non-dataset members such as
//! groups are skipped; excluding named metadata entries from comparison is
//! the differ's job, not the reader's.

use std::path::Path;

use crate::dataset::{Dataset, DatasetReader};
use crate::TestError;

/// Reads top-level datasets out of an HDF5 file as `f64` arrays.
pub struct Hdf5Reader;

impl DatasetReader for Hdf5Reader {
    fn read_datasets(&self, path: &Path) -> Result<Vec<Dataset>, TestError> {
        let file = hdf5::File::open(path)
            .map_err(|e| TestError::Container(format!("{}: {}", path.display(), e)))?;

        let names = file
            .member_names()
            .map_err(|e| TestError::Container(format!("{}: {}", path.display(), e)))?;

        let mut datasets = Vec::with_capacity(names.len());
        for name in names {
            let dataset = match file.dataset(&name) {
                Ok(dataset) => dataset,
                // Groups and other non-dataset members are not comparable data.
                Err(_) => continue,
            };

            let values = dataset.read_raw::<f64>().map_err(|e| {
                TestError::Container(format!("{}:{}: {}", path.display(), name, e))
            })?;

            datasets.push(Dataset::new(name, dataset.shape(), values));
        }

        Ok(datasets)
    }
}
