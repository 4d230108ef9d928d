//! Configuration management for DeepSCF runs
//!
//! YAML input with optional fields; `with_defaults` fills in whatever the
//! file leaves out.

mod args;

pub use args::Args;

use crate::aux_basis::AuxiliaryBasisSpec;
use crate::device::Device;
use crate::driver::ScfSettings;
use crate::error::{DeepScfError, Result};
use crate::partition::BlockLayout;
use basis::ShellSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub geometry: Vec<AtomConfig>,
    #[serde(default)]
    pub unit: Option<LengthUnit>,
    #[serde(default)]
    pub charge: Option<i32>,
    /// Basis name used for every element not listed in `basis_sets`.
    #[serde(default)]
    pub basis: Option<String>,
    #[serde(default)]
    pub basis_sets: HashMap<String, String>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub scf_params: ScfParams,
    /// Pickle file receiving the descriptors of the converged density.
    #[serde(default)]
    pub descriptors_output: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AtomConfig {
    pub element: String,
    pub coords: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Angstrom,
    Bohr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Zero,
    Linear,
    File,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub kind: Option<ModelKind>,
    /// JSON model artifact, required by `kind: file`.
    #[serde(default)]
    pub path: Option<String>,
    /// Slope of the `linear` model.
    #[serde(default)]
    pub scale: Option<f64>,
}

impl ModelConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.kind.is_none() {
            self.kind = Some(if self.path.is_some() { ModelKind::File } else { ModelKind::Zero });
        }
        if self.scale.is_none() {
            self.scale = Some(1e-3);
        }
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectionConfig {
    #[serde(default)]
    pub layout: Option<BlockLayout>,
    /// Replaces the default even-tempered s/p/d auxiliary shells.
    #[serde(default)]
    pub aux_basis: Option<Vec<ShellSpec>>,
}

impl ProjectionConfig {
    pub fn aux_basis(&self) -> Result<AuxiliaryBasisSpec> {
        match &self.aux_basis {
            Some(shells) => AuxiliaryBasisSpec::new(shells.clone()),
            None => Ok(AuxiliaryBasisSpec::default()),
        }
    }
}

/// SCF-specific parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScfParams {
    pub max_cycle: Option<usize>,
    pub diis_subspace_size: Option<usize>,
    pub convergence_threshold: Option<f64>,
    pub density_threshold: Option<f64>,
    pub incremental_fock: Option<bool>,
}

impl Default for ScfParams {
    fn default() -> Self {
        let settings = ScfSettings::default();
        ScfParams {
            max_cycle: Some(settings.max_cycle),
            diis_subspace_size: Some(settings.diis_subspace_size),
            convergence_threshold: Some(settings.convergence_threshold),
            density_threshold: Some(settings.density_threshold),
            incremental_fock: Some(true),
        }
    }
}

impl ScfParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.max_cycle.is_none() {
            self.max_cycle = defaults.max_cycle;
        }
        if self.diis_subspace_size.is_none() {
            self.diis_subspace_size = defaults.diis_subspace_size;
        }
        if self.convergence_threshold.is_none() {
            self.convergence_threshold = defaults.convergence_threshold;
        }
        if self.density_threshold.is_none() {
            self.density_threshold = defaults.density_threshold;
        }
        if self.incremental_fock.is_none() {
            self.incremental_fock = defaults.incremental_fock;
        }
        self
    }

    pub fn settings(&self) -> ScfSettings {
        let defaults = ScfSettings::default();
        ScfSettings {
            max_cycle: self.max_cycle.unwrap_or(defaults.max_cycle),
            diis_subspace_size: self.diis_subspace_size.unwrap_or(defaults.diis_subspace_size),
            convergence_threshold: self.convergence_threshold.unwrap_or(defaults.convergence_threshold),
            density_threshold: self.density_threshold.unwrap_or(defaults.density_threshold),
        }
    }
}

impl Config {
    pub fn with_defaults(mut self) -> Self {
        if self.unit.is_none() {
            self.unit = Some(LengthUnit::Angstrom);
        }
        if self.charge.is_none() {
            self.charge = Some(0);
        }
        if self.basis.is_none() {
            self.basis = Some("sto-3g".to_string());
        }
        if self.projection.layout.is_none() {
            self.projection.layout = Some(BlockLayout::default());
        }
        if self.device.is_none() {
            self.device = Some(Device::default().to_string());
        }
        self.model = self.model.with_defaults();
        self.scf_params = self.scf_params.with_defaults();
        self
    }

    /// Basis name for `symbol`, case-insensitive on the element key.
    pub fn basis_for(&self, symbol: &str) -> String {
        self.basis_sets
            .iter()
            .find(|(element, _)| element.eq_ignore_ascii_case(symbol))
            .map(|(_, name)| name.clone())
            .or_else(|| self.basis.clone())
            .unwrap_or_else(|| "sto-3g".to_string())
    }

    pub fn device(&self) -> Result<Device> {
        match &self.device {
            Some(device) => device.parse(),
            None => Ok(Device::default()),
        }
    }

    pub fn layout(&self) -> BlockLayout {
        self.projection.layout.unwrap_or_default()
    }

    /// Rejects settings that cannot describe a calculation.
    pub fn validate(&self) -> Result<()> {
        if self.geometry.is_empty() {
            return Err(DeepScfError::Config("geometry has no atoms".to_string()));
        }
        if self.model.kind == Some(ModelKind::File) && self.model.path.is_none() {
            return Err(DeepScfError::Config("model kind 'file' needs a path".to_string()));
        }
        self.device()?;
        self.projection.aux_basis()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER: &str = r#"
geometry:
  - element: O
    coords: [0.0, 0.0, 0.0]
  - element: H
    coords: [0.757, 0.586, 0.0]
  - element: H
    coords: [-0.757, 0.586, 0.0]

basis_sets:
  h: "6-31g"

model:
  kind: linear
  scale: 0.002

projection:
  layout: radial

device: "parallel:2"

scf_params:
  max_cycle: 40
  convergence_threshold: 1e-9
"#;

    #[test]
    fn test_yaml_parsing() {
        let config: Config = serde_yml::from_str::<Config>(WATER).unwrap().with_defaults();
        assert_eq!(config.geometry.len(), 3);
        assert_eq!(config.geometry[1].element, "H");
        assert_eq!(config.unit, Some(LengthUnit::Angstrom));
        assert_eq!(config.model.kind, Some(ModelKind::Linear));
        assert_eq!(config.model.scale, Some(0.002));
        assert_eq!(config.layout(), BlockLayout::Radial);
        assert_eq!(config.device().unwrap(), Device::Parallel { threads: 2 });
        assert_eq!(config.basis_for("H"), "6-31g");
        assert_eq!(config.basis_for("O"), "sto-3g");
        config.validate().unwrap();

        let settings = config.scf_params.settings();
        assert_eq!(settings.max_cycle, 40);
        assert_eq!(settings.convergence_threshold, 1e-9);
        assert_eq!(settings.diis_subspace_size, 8);
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_yml::from_str::<Config>("geometry:\n  - element: He\n    coords: [0.0, 0.0, 0.0]\n")
            .unwrap()
            .with_defaults();
        assert_eq!(config.charge, Some(0));
        assert_eq!(config.model.kind, Some(ModelKind::Zero));
        assert_eq!(config.layout(), BlockLayout::Shell);
        assert_eq!(config.device().unwrap(), Device::Cpu);
        assert_eq!(config.scf_params.incremental_fock, Some(true));
        assert_eq!(config.projection.aux_basis().unwrap(), AuxiliaryBasisSpec::default());
    }

    #[test]
    fn test_model_path_implies_file_kind() {
        let model = ModelConfig {
            kind: None,
            path: Some("model.json".to_string()),
            scale: None,
        }
        .with_defaults();
        assert_eq!(model.kind, Some(ModelKind::File));
    }

    #[test]
    fn test_validation_errors() {
        let mut config: Config = serde_yml::from_str::<Config>(WATER).unwrap().with_defaults();
        config.device = Some("gpu".to_string());
        assert!(config.validate().is_err());

        config.device = None;
        config.model.kind = Some(ModelKind::File);
        config.model.path = None;
        assert!(config.validate().is_err());

        config.model.kind = Some(ModelKind::Zero);
        config.projection.aux_basis = Some(vec![]);
        assert!(config.validate().is_err());
    }
}
