extern crate nalgebra as na;

use crate::basis_set::{lookup_element, BasisSet};
use crate::error::BasisError;
use crate::integrals;
use crate::shell::BasisFunction;
use na::{DMatrix, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Conversion factor used for `unit: angstrom` geometries.
pub const BOHR_PER_ANGSTROM: f64 = 1.0 / 0.52917721092;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub symbol: String,
    /// Nuclear charge, the atomic number.
    pub charge: f64,
    /// Position in Bohr.
    pub position: Vector3<f64>,
}

impl Atom {
    pub fn new(symbol: &str, position: Vector3<f64>) -> Result<Self, BasisError> {
        let element = lookup_element(symbol)?;
        Ok(Self {
            symbol: element.get_symbol().to_string(),
            charge: element.get_atomic_number() as f64,
            position,
        })
    }
}

/// Atoms, their basis functions, and the one-electron integrals that only
/// depend on the geometry.
#[derive(Debug, Clone)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub charge: i32,
    functions: Vec<BasisFunction>,
    function_atom: Vec<usize>,
}

impl Molecule {
    /// Places the basis of every atom on its centre. `basis` is keyed by
    /// element symbol.
    pub fn build(atoms: Vec<Atom>, charge: i32, basis: &HashMap<String, BasisSet>) -> Result<Self, BasisError> {
        let mut functions = Vec::new();
        let mut function_atom = Vec::new();

        for (iatom, atom) in atoms.iter().enumerate() {
            let set = basis.get(&atom.symbol).ok_or_else(|| BasisError::MissingBasis {
                basis: basis
                    .values()
                    .next()
                    .map_or_else(|| "<empty>".to_string(), |b| b.name.clone()),
                element: atom.symbol.clone(),
            })?;
            for shell in &set.shells {
                let placed = shell.place(atom.position)?;
                function_atom.extend(std::iter::repeat(iatom).take(placed.len()));
                functions.extend(placed);
            }
        }

        Ok(Self {
            atoms,
            charge,
            functions,
            function_atom,
        })
    }

    pub fn nao(&self) -> usize {
        self.functions.len()
    }

    pub fn natm(&self) -> usize {
        self.atoms.len()
    }

    pub fn functions(&self) -> &[BasisFunction] {
        &self.functions
    }

    /// Atom index owning each basis function.
    pub fn function_atom(&self) -> &[usize] {
        &self.function_atom
    }

    pub fn coords(&self) -> Vec<Vector3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    pub fn point_charges(&self) -> Vec<(Vector3<f64>, f64)> {
        self.atoms.iter().map(|a| (a.position, a.charge)).collect()
    }

    pub fn nelectron(&self) -> i64 {
        self.atoms.iter().map(|a| a.charge.round() as i64).sum::<i64>() - self.charge as i64
    }

    pub fn nuclear_repulsion(&self) -> f64 {
        let mut energy = 0.0;
        for (i, a) in self.atoms.iter().enumerate() {
            for b in &self.atoms[..i] {
                energy += a.charge * b.charge / (a.position - b.position).norm();
            }
        }
        energy
    }

    pub fn overlap(&self) -> DMatrix<f64> {
        integrals::overlap_matrix(&self.functions)
    }

    /// Core Hamiltonian `T + V_nuc`.
    pub fn core_hamiltonian(&self) -> DMatrix<f64> {
        integrals::kinetic_matrix(&self.functions) + integrals::nuclear_matrix(&self.functions, &self.point_charges())
    }
}
