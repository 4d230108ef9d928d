extern crate nalgebra as na;

use crate::aux_basis::AuxiliaryBasisSpec;
use crate::error::{DeepScfError, Result};
use basis::integrals::cross_overlap_matrix;
use basis::Molecule;
use na::DMatrix;
use tracing::debug;

/// Overlap `⟨AO_r | aux_{a,q}⟩` between the molecular basis and the auxiliary
/// functions centred on atom `a`; logically `[nao × natm × width]`, stored
/// as one `nao × width` matrix per atom.
#[derive(Debug, Clone)]
pub struct ProjectionTensor {
    nao: usize,
    width: usize,
    per_atom: Vec<DMatrix<f64>>,
}

impl ProjectionTensor {
    pub fn build(mol: &Molecule, aux: &AuxiliaryBasisSpec) -> Result<Self> {
        aux.validate()?;

        // Ghost centres: the auxiliary shells on every nucleus, no charges.
        let mut aux_functions = Vec::new();
        for atom in &mol.atoms {
            for shell in &aux.shells {
                aux_functions.extend(shell.place(atom.position)?);
            }
        }
        debug!(
            "projecting {} AOs onto {} auxiliary functions",
            mol.nao(),
            aux_functions.len()
        );

        let overlap = cross_overlap_matrix(mol.functions(), &aux_functions);
        Self::from_overlap(&overlap, mol.natm(), aux.per_atom_width())
    }

    /// Splits a flat `nao × (natm * width)` overlap matrix atom by atom.
    pub fn from_overlap(overlap: &DMatrix<f64>, natm: usize, width: usize) -> Result<Self> {
        if overlap.ncols() != natm * width {
            return Err(DeepScfError::shape(
                "auxiliary overlap",
                (overlap.nrows(), natm * width),
                overlap.shape(),
            ));
        }
        let per_atom = (0..natm)
            .map(|a| overlap.columns(a * width, width).into_owned())
            .collect();
        Ok(Self {
            nao: overlap.nrows(),
            width,
            per_atom,
        })
    }

    pub fn nao(&self) -> usize {
        self.nao
    }

    pub fn natm(&self) -> usize {
        self.per_atom.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn atom(&self, a: usize) -> &DMatrix<f64> {
        &self.per_atom[a]
    }

    pub fn get(&self, r: usize, a: usize, q: usize) -> f64 {
        self.per_atom[a][(r, q)]
    }
}
