//! The effective-potential engine.
//!
//! `DeepScf` composes a baseline mean-field provider with a learned
//! correction: `V_eff = V0(D) + dE_c/dD`. The projection tensor and its block
//! split are built once in [`DeepScf::new`]; every other quantity is derived
//! from the density matrix of the call.

extern crate nalgebra as na;

use crate::aux_basis::AuxiliaryBasisSpec;
use crate::descriptor::{extract, validate_density};
use crate::device::{Device, Executor};
use crate::driver::EffectivePotentialModel;
use crate::error::{check_shape, DeepScfError, Result};
use crate::functional::CorrectionFunctional;
use crate::linalg::{real_matrix, trace_product};
use crate::partition::{BlockLayout, ShellBlocks};
use crate::projection::ProjectionTensor;
use crate::reconstruct::reconstruct;
use basis::Molecule;
use na::DMatrix;
use num_complex::Complex64;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

/// The mean-field side the engine is composed with.
pub trait BaselinePotentialProvider {
    fn nao(&self) -> usize;
    fn overlap(&self) -> &DMatrix<f64>;
    fn hcore(&self) -> &DMatrix<f64>;
    fn energy_nuc(&self) -> f64;
    fn nelectron(&self) -> i64;

    /// Two-electron potential of `dm`. When both the previous density and the
    /// previous baseline potential are given the provider may build
    /// incrementally from them.
    fn baseline_potential(
        &self,
        dm: &DMatrix<f64>,
        dm_last: Option<&DMatrix<f64>>,
        v_last: Option<&DMatrix<f64>>,
    ) -> Result<DMatrix<f64>>;
}

impl<P: BaselinePotentialProvider + ?Sized> BaselinePotentialProvider for &P {
    fn nao(&self) -> usize {
        (**self).nao()
    }

    fn overlap(&self) -> &DMatrix<f64> {
        (**self).overlap()
    }

    fn hcore(&self) -> &DMatrix<f64> {
        (**self).hcore()
    }

    fn energy_nuc(&self) -> f64 {
        (**self).energy_nuc()
    }

    fn nelectron(&self) -> i64 {
        (**self).nelectron()
    }

    fn baseline_potential(
        &self,
        dm: &DMatrix<f64>,
        dm_last: Option<&DMatrix<f64>>,
        v_last: Option<&DMatrix<f64>>,
    ) -> Result<DMatrix<f64>> {
        (**self).baseline_potential(dm, dm_last, v_last)
    }
}

/// `V0 + V_c`, tagged with the correction energy and the baseline part so
/// the energy evaluation never has to rebuild them.
#[derive(Debug, Clone)]
pub struct EffectivePotential {
    pub matrix: DMatrix<f64>,
    pub correction_energy: Option<f64>,
    pub baseline: Option<DMatrix<f64>>,
}

impl EffectivePotential {
    pub fn tagged(matrix: DMatrix<f64>, correction_energy: f64, baseline: DMatrix<f64>) -> Self {
        Self {
            matrix,
            correction_energy: Some(correction_energy),
            baseline: Some(baseline),
        }
    }

    /// A bare potential, as produced outside the engine.
    pub fn untagged(matrix: DMatrix<f64>) -> Self {
        Self {
            matrix,
            correction_energy: None,
            baseline: None,
        }
    }

    pub fn correction_energy(&self) -> Result<f64> {
        self.correction_energy.ok_or(DeepScfError::MissingTag)
    }

    pub fn baseline(&self) -> Result<&DMatrix<f64>> {
        self.baseline.as_ref().ok_or(DeepScfError::MissingTag)
    }

    fn tags(&self) -> Result<(f64, &DMatrix<f64>)> {
        Ok((self.correction_energy()?, self.baseline()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyComponents {
    /// `tr(H D)`
    pub one_electron: f64,
    /// `½ tr(V0 D)`
    pub coulomb: f64,
    pub correction: f64,
}

impl EnergyComponents {
    /// Electronic energy `e1 + e_coul + E_c`.
    pub fn total(&self) -> f64 {
        self.one_electron + self.coulomb + self.correction
    }

    /// Two-electron plus correction part, `e_coul + E_c`.
    pub fn two_electron(&self) -> f64 {
        self.coulomb + self.correction
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub aux_basis: AuxiliaryBasisSpec,
    pub layout: BlockLayout,
    pub device: Device,
}

pub struct DeepScf<P, F> {
    provider: P,
    functional: F,
    blocks: ShellBlocks,
    executor: Executor,
}

impl<P: BaselinePotentialProvider, F: CorrectionFunctional> DeepScf<P, F> {
    pub fn new(mol: &Molecule, provider: P, functional: F, options: &EngineOptions) -> Result<Self> {
        if provider.nao() != mol.nao() {
            return Err(DeepScfError::shape(
                "baseline provider basis",
                (mol.nao(), mol.nao()),
                (provider.nao(), provider.nao()),
            ));
        }

        let tensor = ProjectionTensor::build(mol, &options.aux_basis)?;
        let blocks = ShellBlocks::from_spec(&tensor, &options.aux_basis, options.layout)?;
        if let Some(width) = functional.input_width() {
            if width != blocks.width() {
                return Err(DeepScfError::Config(format!(
                    "functional expects {} descriptors per atom, the auxiliary basis yields {}",
                    width,
                    blocks.width()
                )));
            }
        }

        debug!(
            "engine ready: {} blocks, {} descriptors per atom, device {}",
            blocks.len(),
            blocks.width(),
            options.device
        );
        Ok(Self {
            provider,
            functional,
            blocks,
            executor: Executor::new(options.device)?,
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn functional(&self) -> &F {
        &self.functional
    }

    pub fn blocks(&self) -> &ShellBlocks {
        &self.blocks
    }

    pub fn device(&self) -> Device {
        self.executor.device()
    }

    /// Descriptor tensor `natm × width` of `dm`.
    pub fn make_eig(&self, dm: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        Ok(extract(&self.blocks, dm, &self.executor)?.values)
    }

    /// Correction energy and its exact derivative with respect to `dm`.
    pub fn correction(&self, dm: &DMatrix<f64>) -> Result<(f64, DMatrix<f64>)> {
        let descriptors = extract(&self.blocks, dm, &self.executor)?;
        let (ec, grad) = self.functional.evaluate_with_gradient(&descriptors.values)?;
        if !ec.is_finite() {
            return Err(DeepScfError::Numeric(format!("correction energy is {}", ec)));
        }
        let vc = reconstruct(&self.blocks, &descriptors, &grad, &self.executor)?;
        Ok((ec, vc))
    }

    /// [`Self::correction`] for a density held as complex numbers; a
    /// non-negligible imaginary part is an error.
    pub fn correction_complex(&self, dm: &DMatrix<Complex64>) -> Result<(f64, DMatrix<f64>)> {
        self.correction(&real_matrix(dm)?)
    }

    pub fn get_veff(
        &self,
        dm: &DMatrix<f64>,
        dm_last: Option<&DMatrix<f64>>,
        vhf_last: Option<&EffectivePotential>,
    ) -> Result<EffectivePotential> {
        validate_density(&self.blocks, dm)?;

        let tic = Instant::now();
        let v0_last = vhf_last.and_then(|v| v.baseline.as_ref());
        let v0 = self.provider.baseline_potential(dm, dm_last, v0_last)?;
        debug!("v0 built in {:.3?}", tic.elapsed());

        let tic = Instant::now();
        let (ec, vc) = self.correction(dm)?;
        debug!("vc built in {:.3?}", tic.elapsed());

        Ok(EffectivePotential::tagged(&v0 + vc, ec, v0))
    }

    /// Electronic energy decomposition. An untagged or absent `vhf` is
    /// rebuilt from `dm`.
    pub fn energy_elec(
        &self,
        dm: &DMatrix<f64>,
        h1e: Option<&DMatrix<f64>>,
        vhf: Option<&EffectivePotential>,
    ) -> Result<EnergyComponents> {
        let nao = self.blocks.nao();
        check_shape("density matrix", dm, nao, nao)?;
        let h1e = h1e.unwrap_or_else(|| self.provider.hcore());
        check_shape("core Hamiltonian", h1e, nao, nao)?;

        let rebuilt;
        let (ec, v0) = match vhf.map(EffectivePotential::tags) {
            Some(Ok(tags)) => tags,
            Some(Err(DeepScfError::MissingTag)) | None => {
                if vhf.is_some() {
                    warn!("effective potential has no correction-energy tag, recomputing it");
                }
                rebuilt = self.get_veff(dm, None, None)?;
                rebuilt.tags()?
            }
            Some(Err(e)) => return Err(e),
        };
        check_shape("baseline potential", v0, nao, nao)?;

        let energies = EnergyComponents {
            one_electron: trace_product(h1e, dm),
            coulomb: 0.5 * trace_product(v0, dm),
            correction: ec,
        };
        debug!(
            "E1 = {:.12}  Ecoul = {:.12}  Ec = {:.12}",
            energies.one_electron, energies.coulomb, energies.correction
        );
        Ok(energies)
    }

    pub fn energy_tot(
        &self,
        dm: &DMatrix<f64>,
        h1e: Option<&DMatrix<f64>>,
        vhf: Option<&EffectivePotential>,
    ) -> Result<f64> {
        Ok(self.energy_elec(dm, h1e, vhf)?.total() + self.provider.energy_nuc())
    }

    /// Plain mean-field electronic energy of `dm` and its two-electron part,
    /// ignoring the correction.
    pub fn energy_elec0(
        &self,
        dm: &DMatrix<f64>,
        h1e: Option<&DMatrix<f64>>,
        v0: Option<&DMatrix<f64>>,
    ) -> Result<(f64, f64)> {
        let nao = self.blocks.nao();
        check_shape("density matrix", dm, nao, nao)?;
        let h1e = h1e.unwrap_or_else(|| self.provider.hcore());
        let built;
        let v0 = match v0 {
            Some(v) => v,
            None => {
                built = self.provider.baseline_potential(dm, None, None)?;
                &built
            }
        };
        check_shape("baseline potential", v0, nao, nao)?;
        let e_coul = 0.5 * trace_product(v0, dm);
        Ok((trace_product(h1e, dm) + e_coul, e_coul))
    }

    pub fn energy_tot0(
        &self,
        dm: &DMatrix<f64>,
        h1e: Option<&DMatrix<f64>>,
        v0: Option<&DMatrix<f64>>,
    ) -> Result<f64> {
        Ok(self.energy_elec0(dm, h1e, v0)?.0 + self.provider.energy_nuc())
    }
}

impl<P: BaselinePotentialProvider, F: CorrectionFunctional> EffectivePotentialModel for DeepScf<P, F> {
    fn overlap(&self) -> &DMatrix<f64> {
        self.provider.overlap()
    }

    fn hcore(&self) -> &DMatrix<f64> {
        self.provider.hcore()
    }

    fn energy_nuc(&self) -> f64 {
        self.provider.energy_nuc()
    }

    fn nelectron(&self) -> i64 {
        self.provider.nelectron()
    }

    fn get_veff(
        &self,
        dm: &DMatrix<f64>,
        dm_last: Option<&DMatrix<f64>>,
        vhf_last: Option<&EffectivePotential>,
    ) -> Result<EffectivePotential> {
        DeepScf::get_veff(self, dm, dm_last, vhf_last)
    }

    fn energy_elec(&self, dm: &DMatrix<f64>, vhf: &EffectivePotential) -> Result<EnergyComponents> {
        DeepScf::energy_elec(self, dm, None, Some(vhf))
    }
}
