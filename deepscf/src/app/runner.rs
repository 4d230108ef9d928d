use crate::config::{Config, ModelKind};
use crate::driver::{ScfDriver, ScfOutcome, ScfSettings};
use crate::engine::{DeepScf, EngineOptions};
use crate::functional::{AtomicMlp, CorrectionFunctional, LinearFunctional, ZeroFunctional};
use crate::hf::HartreeFock;
use basis::Molecule;
use color_eyre::eyre::{eyre, Result, WrapErr};
use nalgebra::DMatrix;
use tracing::info;

/// Converged run, plus the descriptors of its density when the correction
/// was active.
pub struct RunSummary {
    pub outcome: ScfOutcome,
    pub baseline_energy: Option<f64>,
    pub descriptors: Option<DMatrix<f64>>,
}

pub fn build_functional(config: &Config) -> Result<Box<dyn CorrectionFunctional>> {
    let model = &config.model;
    match model.kind.unwrap_or_default() {
        ModelKind::Zero => {
            info!("Correction model: zero");
            Ok(Box::new(ZeroFunctional))
        }
        ModelKind::Linear => {
            let scale = model.scale.unwrap_or(1e-3);
            info!("Correction model: linear, scale {:e}", scale);
            Ok(Box::new(LinearFunctional { scale }))
        }
        ModelKind::File => {
            let path = model
                .path
                .as_ref()
                .ok_or_else(|| eyre!("model kind 'file' needs a path"))?;
            info!("Correction model: {}", path);
            let mlp = AtomicMlp::load(path).wrap_err_with(|| format!("Unable to load model {}", path))?;
            Ok(Box::new(mlp))
        }
    }
}

pub fn run_hartree_fock(mol: &Molecule, config: &Config, settings: ScfSettings) -> Result<RunSummary> {
    let hf = HartreeFock::new(mol).with_incremental(config.scf_params.incremental_fock.unwrap_or(true));
    info!("Starting Hartree-Fock SCF...");
    let outcome = ScfDriver::new(settings).run(&hf)?;
    Ok(RunSummary {
        outcome,
        baseline_energy: None,
        descriptors: None,
    })
}

pub fn run_deepscf(mol: &Molecule, config: &Config, settings: ScfSettings) -> Result<RunSummary> {
    let hf = HartreeFock::new(mol).with_incremental(config.scf_params.incremental_fock.unwrap_or(true));
    let options = EngineOptions {
        aux_basis: config.projection.aux_basis()?,
        layout: config.layout(),
        device: config.device()?,
    };
    info!(
        "Projection: {} auxiliary shells, {:?} blocks, device {}",
        options.aux_basis.shells.len(),
        options.layout,
        options.device
    );
    let engine = DeepScf::new(mol, hf, build_functional(config)?, &options)?;

    info!("Starting DeepSCF...");
    let outcome = ScfDriver::new(settings).run(&engine)?;
    let baseline_energy = engine.energy_tot0(&outcome.dm, None, outcome.veff.baseline.as_ref())?;
    let descriptors = engine.make_eig(&outcome.dm)?;
    Ok(RunSummary {
        outcome,
        baseline_energy: Some(baseline_energy),
        descriptors: Some(descriptors),
    })
}
