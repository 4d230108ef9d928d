#![allow(dead_code)]

use basis::{Atom, BasisSet, Molecule};
use deepscf::{CorrectionFunctional, Result};
use nalgebra::{DMatrix, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Builds a neutral molecule from `(symbol, bohr position)` pairs.
pub fn molecule(basis: &str, atoms: &[(&str, [f64; 3])]) -> Molecule {
    let mut sets = HashMap::new();
    let atoms: Vec<Atom> = atoms
        .iter()
        .map(|(symbol, pos)| {
            let atom = Atom::new(symbol, Vector3::from(*pos)).unwrap();
            sets.entry(atom.symbol.clone())
                .or_insert_with(|| BasisSet::builtin(basis, &atom.symbol).unwrap());
            atom
        })
        .collect();
    Molecule::build(atoms, 0, &sets).unwrap()
}

pub fn helium() -> Molecule {
    molecule("sto-3g", &[("He", [0.0, 0.0, 0.0])])
}

pub fn water() -> Molecule {
    molecule(
        "sto-3g",
        &[
            ("O", [0.0, 0.0, 0.0]),
            ("H", [0.0, 1.430, 1.107]),
            ("H", [0.0, -1.430, 1.107]),
        ],
    )
}

/// Non-collinear H3 with s functions only.
pub fn h3(positions: [[f64; 3]; 3]) -> Molecule {
    molecule(
        "sto-3g",
        &[("H", positions[0]), ("H", positions[1]), ("H", positions[2])],
    )
}

pub fn random_density(n: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = DMatrix::from_fn(n, n, |_, _| rng.gen_range(-0.5..0.5));
    (&a + a.transpose()) * 0.5
}

/// `Σ tanh(λ)`: the same scalar map on every descriptor, so its eigenvalue
/// gradient is exact even for degenerate blocks.
pub struct TanhSum;

impl CorrectionFunctional for TanhSum {
    fn evaluate_with_gradient(&self, descriptors: &DMatrix<f64>) -> Result<(f64, DMatrix<f64>)> {
        let energy = descriptors.iter().map(|x| x.tanh()).sum();
        let grad = descriptors.map(|x| 1.0 - x.tanh().powi(2));
        Ok((energy, grad))
    }
}
