extern crate nalgebra as na;

use crate::driver::EffectivePotentialModel;
use crate::engine::{BaselinePotentialProvider, EffectivePotential, EnergyComponents};
use crate::error::{check_shape, Result};
use crate::linalg::{check_finite, trace_product};
use basis::integrals::EriTensor;
use basis::Molecule;
use na::DMatrix;
use tracing::info;

/// Restricted Hartree-Fock: the baseline potential `G(D) = J(D) - ½ K(D)`.
#[derive(Debug, Clone)]
pub struct HartreeFock {
    overlap: DMatrix<f64>,
    hcore: DMatrix<f64>,
    eri: EriTensor,
    energy_nuc: f64,
    nelectron: i64,
    incremental: bool,
}

impl HartreeFock {
    pub fn new(mol: &Molecule) -> Self {
        info!("Building one- and two-electron integrals for {} basis functions", mol.nao());
        Self {
            overlap: mol.overlap(),
            hcore: mol.core_hamiltonian(),
            eri: EriTensor::build(mol.functions()),
            energy_nuc: mol.nuclear_repulsion(),
            nelectron: mol.nelectron(),
            incremental: true,
        }
    }

    /// Toggles `V = V_last + G(D - D_last)` builds.
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn two_electron(&self, dm: &DMatrix<f64>) -> DMatrix<f64> {
        self.eri.coulomb(dm) - self.eri.exchange(dm) * 0.5
    }

    pub fn eri(&self) -> &EriTensor {
        &self.eri
    }
}

impl BaselinePotentialProvider for HartreeFock {
    fn nao(&self) -> usize {
        self.overlap.nrows()
    }

    fn overlap(&self) -> &DMatrix<f64> {
        &self.overlap
    }

    fn hcore(&self) -> &DMatrix<f64> {
        &self.hcore
    }

    fn energy_nuc(&self) -> f64 {
        self.energy_nuc
    }

    fn nelectron(&self) -> i64 {
        self.nelectron
    }

    fn baseline_potential(
        &self,
        dm: &DMatrix<f64>,
        dm_last: Option<&DMatrix<f64>>,
        v_last: Option<&DMatrix<f64>>,
    ) -> Result<DMatrix<f64>> {
        let n = self.nao();
        check_shape("density matrix", dm, n, n)?;
        check_finite("density matrix", dm)?;

        match (self.incremental, dm_last, v_last) {
            (true, Some(dm_last), Some(v_last)) => {
                check_shape("previous density matrix", dm_last, n, n)?;
                check_shape("previous baseline potential", v_last, n, n)?;
                Ok(v_last + self.two_electron(&(dm - dm_last)))
            }
            _ => Ok(self.two_electron(dm)),
        }
    }
}

impl EffectivePotentialModel for HartreeFock {
    fn overlap(&self) -> &DMatrix<f64> {
        &self.overlap
    }

    fn hcore(&self) -> &DMatrix<f64> {
        &self.hcore
    }

    fn energy_nuc(&self) -> f64 {
        self.energy_nuc
    }

    fn nelectron(&self) -> i64 {
        self.nelectron
    }

    fn get_veff(
        &self,
        dm: &DMatrix<f64>,
        dm_last: Option<&DMatrix<f64>>,
        vhf_last: Option<&EffectivePotential>,
    ) -> Result<EffectivePotential> {
        let v_last = vhf_last.and_then(|v| v.baseline.as_ref());
        let v0 = self.baseline_potential(dm, dm_last, v_last)?;
        Ok(EffectivePotential::tagged(v0.clone(), 0.0, v0))
    }

    fn energy_elec(&self, dm: &DMatrix<f64>, vhf: &EffectivePotential) -> Result<EnergyComponents> {
        let v0 = vhf.baseline.as_ref().unwrap_or(&vhf.matrix);
        Ok(EnergyComponents {
            one_electron: trace_product(&self.hcore, dm),
            coulomb: 0.5 * trace_product(v0, dm),
            correction: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis::{Atom, BasisSet};
    use nalgebra::Vector3;
    use std::collections::HashMap;

    fn h2() -> Molecule {
        let mut sets = HashMap::new();
        sets.insert("H".to_string(), BasisSet::builtin("6-31g", "H").unwrap());
        let atoms = vec![
            Atom::new("H", Vector3::zeros()).unwrap(),
            Atom::new("H", Vector3::new(0.0, 0.0, 1.4)).unwrap(),
        ];
        Molecule::build(atoms, 0, &sets).unwrap()
    }

    #[test]
    fn test_incremental_build_matches_full_build() {
        let hf = HartreeFock::new(&h2());
        let n = BaselinePotentialProvider::nao(&hf);
        assert_eq!(n, 4);
        let d1 = DMatrix::from_fn(n, n, |i, j| 0.3 / (1.0 + (i + j) as f64));
        let d2 = DMatrix::from_fn(n, n, |i, j| 0.25 / (1.0 + (i as f64 - j as f64).abs()));

        let v1 = hf.baseline_potential(&d1, None, None).unwrap();
        let incremental = hf.baseline_potential(&d2, Some(&d1), Some(&v1)).unwrap();
        let full = hf.baseline_potential(&d2, None, None).unwrap();
        assert!((incremental - &full).amax() < 1e-12);

        let direct_only = hf.clone().with_incremental(false);
        let ignored = direct_only
            .baseline_potential(&d2, Some(&d1), Some(&DMatrix::zeros(n, n)))
            .unwrap();
        assert!((ignored - full).amax() < 1e-14);
    }

    #[test]
    fn test_potential_is_symmetric_and_shape_checked() {
        let hf = HartreeFock::new(&h2());
        let dm = DMatrix::from_fn(4, 4, |i, j| 0.1 * (1 + i + j) as f64);
        let v = hf.two_electron(&dm);
        assert!((&v - v.transpose()).amax() < 1e-12);

        let wrong = DMatrix::<f64>::zeros(3, 3);
        assert!(hf.baseline_potential(&wrong, None, None).is_err());
    }
}
