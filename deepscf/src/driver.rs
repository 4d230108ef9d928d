//! Restricted closed-shell SCF loop with DIIS acceleration.

extern crate nalgebra as na;

use crate::eigen::eigh;
use crate::engine::{EffectivePotential, EnergyComponents};
use crate::error::{DeepScfError, Result};
use na::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Overlap eigenvalues below this are dropped by the orthogonaliser.
const LINDEP_THRESHOLD: f64 = 1e-8;
/// Relative to the largest error norm.
const DIIS_SINGULAR_THRESHOLD: f64 = 1e-12;

/// What the SCF loop needs from a mean-field model.
pub trait EffectivePotentialModel {
    fn overlap(&self) -> &DMatrix<f64>;
    fn hcore(&self) -> &DMatrix<f64>;
    fn energy_nuc(&self) -> f64;
    fn nelectron(&self) -> i64;

    fn get_veff(
        &self,
        dm: &DMatrix<f64>,
        dm_last: Option<&DMatrix<f64>>,
        vhf_last: Option<&EffectivePotential>,
    ) -> Result<EffectivePotential>;

    fn energy_elec(&self, dm: &DMatrix<f64>, vhf: &EffectivePotential) -> Result<EnergyComponents>;
}

/// DIIS on the commutator error `FDS - SDF`.
///
/// The extrapolated Fock matrix `Σ c_i F_i` minimises `|Σ c_i e_i|²` under
/// `Σ c_i = 1`.
#[derive(Debug, Clone)]
pub struct Diis {
    errors: VecDeque<DMatrix<f64>>,
    focks: VecDeque<DMatrix<f64>>,
    capacity: usize,
}

impl Diis {
    pub fn new(capacity: usize) -> Self {
        Self {
            errors: VecDeque::with_capacity(capacity),
            focks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn error_matrix(fock: &DMatrix<f64>, dm: &DMatrix<f64>, overlap: &DMatrix<f64>) -> DMatrix<f64> {
        fock * dm * overlap - overlap * dm * fock
    }

    /// Stores `fock` and returns the norm of its error vector.
    pub fn push(&mut self, fock: DMatrix<f64>, dm: &DMatrix<f64>, overlap: &DMatrix<f64>) -> f64 {
        let error = Self::error_matrix(&fock, dm, overlap);
        let norm = error.norm();
        if self.errors.len() >= self.capacity {
            self.errors.pop_front();
            self.focks.pop_front();
        }
        self.errors.push_back(error);
        self.focks.push_back(fock);
        norm
    }

    /// `None` when the subspace is empty or the DIIS equations cannot be
    /// solved. Near-duplicate error vectors get the minimum-norm solution.
    pub fn extrapolate(&self) -> Option<DMatrix<f64>> {
        let n = self.errors.len();
        let latest = self.focks.back()?;

        let mut b = DMatrix::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in 0..=i {
                let bij = self.errors[i].dot(&self.errors[j]);
                b[(i, j)] = bij;
                b[(j, i)] = bij;
            }
        }
        let max_diag = (0..n).map(|i| b[(i, i)]).fold(0.0, f64::max);
        if max_diag == 0.0 {
            return Some(latest.clone());
        }
        b.view_mut((0, 0), (n, n)).scale_mut(1.0 / max_diag);
        for i in 0..n {
            b[(i, n)] = -1.0;
            b[(n, i)] = -1.0;
        }
        let mut rhs = DVector::zeros(n + 1);
        rhs[n] = -1.0;

        let coeffs = match b.svd(true, true).solve(&rhs, DIIS_SINGULAR_THRESHOLD) {
            Ok(c) => c,
            Err(e) => {
                debug!("DIIS extrapolation failed: {}", e);
                return None;
            }
        };

        let mut fock = DMatrix::zeros(self.focks[0].nrows(), self.focks[0].ncols());
        for (f, c) in self.focks.iter().zip(coeffs.iter()) {
            fock += f * *c;
        }
        Some(fock)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn reset(&mut self) {
        self.errors.clear();
        self.focks.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScfSettings {
    pub max_cycle: usize,
    /// Zero disables DIIS.
    pub diis_subspace_size: usize,
    /// On `|ΔE|`.
    pub convergence_threshold: f64,
    /// On the RMS change of the density matrix.
    pub density_threshold: f64,
}

impl Default for ScfSettings {
    fn default() -> Self {
        Self {
            max_cycle: 100,
            diis_subspace_size: 8,
            convergence_threshold: 1e-10,
            density_threshold: 1e-8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScfOutcome {
    pub converged: bool,
    pub cycles: usize,
    pub e_tot: f64,
    pub energies: EnergyComponents,
    pub mo_energy: DVector<f64>,
    pub mo_coeff: DMatrix<f64>,
    pub dm: DMatrix<f64>,
    pub veff: EffectivePotential,
}

#[derive(Debug, Clone, Default)]
pub struct ScfDriver {
    pub settings: ScfSettings,
}

/// Canonical orthogonalisation `X = U s^{-1/2}`, dropping near-null overlap
/// directions. `Xᵀ S X = I`.
pub fn orthogonalizer(overlap: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let eig = eigh(overlap)?;
    let keep: Vec<usize> = (0..eig.values.len())
        .filter(|&i| eig.values[i] > LINDEP_THRESHOLD)
        .collect();
    if keep.len() < eig.values.len() {
        warn!(
            "dropping {} linearly dependent basis combinations",
            eig.values.len() - keep.len()
        );
    }
    let mut x = eig.vectors.select_columns(&keep);
    for (mut column, &i) in x.column_iter_mut().zip(&keep) {
        column /= eig.values[i].sqrt();
    }
    Ok(x)
}

impl ScfDriver {
    pub fn new(settings: ScfSettings) -> Self {
        Self { settings }
    }

    /// Solves `F C = S C ε` and returns ascending orbital energies and AO
    /// coefficients.
    fn diagonalize(fock: &DMatrix<f64>, x: &DMatrix<f64>) -> Result<(DVector<f64>, DMatrix<f64>)> {
        let f_prime = x.transpose() * fock * x;
        let eig = eigh(&((&f_prime + f_prime.transpose()) * 0.5))?;
        Ok((eig.values, x * eig.vectors))
    }

    fn density(mo_coeff: &DMatrix<f64>, nocc: usize) -> DMatrix<f64> {
        let occ = mo_coeff.columns(0, nocc);
        &occ * occ.transpose() * 2.0
    }

    pub fn run<M: EffectivePotentialModel>(&self, model: &M) -> Result<ScfOutcome> {
        self.run_from(model, None)
    }

    /// Runs from `dm0`, or from the core-Hamiltonian guess.
    pub fn run_from<M: EffectivePotentialModel>(&self, model: &M, dm0: Option<DMatrix<f64>>) -> Result<ScfOutcome> {
        let nelec = model.nelectron();
        if nelec <= 0 || nelec % 2 != 0 {
            return Err(DeepScfError::Config(format!(
                "restricted closed-shell SCF needs a positive even electron count, found {}",
                nelec
            )));
        }
        let nocc = (nelec / 2) as usize;

        let s = model.overlap();
        let h = model.hcore();
        let x = orthogonalizer(s)?;
        if nocc > x.ncols() {
            return Err(DeepScfError::Config(format!(
                "{} occupied orbitals do not fit in {} molecular orbitals",
                nocc,
                x.ncols()
            )));
        }

        let mut dm = match dm0 {
            Some(dm) => dm,
            None => {
                let (_, c) = Self::diagonalize(h, &x)?;
                Self::density(&c, nocc)
            }
        };

        let mut diis = Diis::new(self.settings.diis_subspace_size);
        let mut dm_last: Option<DMatrix<f64>> = None;
        let mut veff_last: Option<EffectivePotential> = None;
        let mut e_last = 0.0;
        let nao = dm.nrows() as f64;

        for cycle in 1..=self.settings.max_cycle {
            let veff = model.get_veff(&dm, dm_last.as_ref(), veff_last.as_ref())?;
            let energies = model.energy_elec(&dm, &veff)?;
            let e_tot = energies.total() + model.energy_nuc();

            let fock = h + &veff.matrix;
            let fock = if self.settings.diis_subspace_size > 0 {
                let err = diis.push(fock.clone(), &dm, s);
                debug!("cycle {} |FDS - SDF| = {:.3e}", cycle, err);
                diis.extrapolate().unwrap_or(fock)
            } else {
                fock
            };

            let (mo_energy, mo_coeff) = Self::diagonalize(&fock, &x)?;
            let dm_new = Self::density(&mo_coeff, nocc);
            let delta_e = e_tot - e_last;
            let delta_d = (&dm_new - &dm).norm() / nao;
            info!(
                "Cycle {}: E = {:.12} au, dE = {:.3e}, |dD| = {:.3e}",
                cycle, e_tot, delta_e, delta_d
            );

            dm_last = Some(std::mem::replace(&mut dm, dm_new));
            veff_last = Some(veff);
            e_last = e_tot;

            if cycle > 1 && delta_e.abs() < self.settings.convergence_threshold && delta_d < self.settings.density_threshold {
                info!("SCF converged in {} cycles.", cycle);
                return self.finish(model, true, cycle, dm, dm_last, veff_last, mo_energy, mo_coeff);
            }
        }

        warn!("SCF not converged after {} cycles", self.settings.max_cycle);
        let (mo_energy, mo_coeff) = {
            let veff = model.get_veff(&dm, dm_last.as_ref(), veff_last.as_ref())?;
            Self::diagonalize(&(h + &veff.matrix), &x)?
        };
        self.finish(
            model,
            false,
            self.settings.max_cycle,
            dm,
            dm_last,
            veff_last,
            mo_energy,
            mo_coeff,
        )
    }

    /// Rebuilds the potential and energy of the final density.
    #[allow(clippy::too_many_arguments)]
    fn finish<M: EffectivePotentialModel>(
        &self,
        model: &M,
        converged: bool,
        cycles: usize,
        dm: DMatrix<f64>,
        dm_last: Option<DMatrix<f64>>,
        veff_last: Option<EffectivePotential>,
        mo_energy: DVector<f64>,
        mo_coeff: DMatrix<f64>,
    ) -> Result<ScfOutcome> {
        let veff = model.get_veff(&dm, dm_last.as_ref(), veff_last.as_ref())?;
        let energies = model.energy_elec(&dm, &veff)?;
        let e_tot = energies.total() + model.energy_nuc();
        Ok(ScfOutcome {
            converged,
            cycles,
            e_tot,
            energies,
            mo_energy,
            mo_coeff,
            dm,
            veff,
        })
    }
}
