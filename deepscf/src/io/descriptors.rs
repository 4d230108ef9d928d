//! Pickle dump of descriptor tensors, one record per run, for assembling
//! training sets.

use color_eyre::eyre::{Result, WrapErr};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorRecord {
    pub symbols: Vec<String>,
    pub e_tot: f64,
    pub correction_energy: f64,
    /// Row per atom.
    pub descriptors: Vec<Vec<f64>>,
}

impl DescriptorRecord {
    pub fn new(symbols: Vec<String>, e_tot: f64, correction_energy: f64, values: &DMatrix<f64>) -> Self {
        let descriptors = values
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        Self {
            symbols,
            e_tot,
            correction_energy,
            descriptors,
        }
    }
}

pub fn write_descriptors(path: impl AsRef<Path>, record: &DescriptorRecord) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).wrap_err_with(|| format!("Unable to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_pickle::to_writer(&mut writer, record, serde_pickle::SerOptions::new())
        .wrap_err("Failed to pickle descriptors")?;
    Ok(())
}

pub fn read_descriptors(path: impl AsRef<Path>) -> Result<DescriptorRecord> {
    let path = path.as_ref();
    let file = File::open(path).wrap_err_with(|| format!("Unable to open {}", path.display()))?;
    let record = serde_pickle::from_reader(BufReader::new(file), serde_pickle::DeOptions::new())
        .wrap_err("Failed to unpickle descriptors")?;
    Ok(record)
}
