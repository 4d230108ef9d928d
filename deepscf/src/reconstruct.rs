extern crate nalgebra as na;

use crate::descriptor::Descriptors;
use crate::device::Executor;
use crate::error::{check_shape, Result};
use crate::linalg::{check_finite, symmetrize};
use crate::partition::ShellBlocks;
use na::{DMatrix, DVector};

/// Maps `dE/d(descriptor)` back to the AO basis:
/// `V = Σ_blocks Σ_a P_a U_a diag(dE/dλ_a) U_aᵀ P_aᵀ`.
pub fn reconstruct(
    blocks: &ShellBlocks,
    descriptors: &Descriptors,
    grad: &DMatrix<f64>,
    executor: &Executor,
) -> Result<DMatrix<f64>> {
    check_shape("descriptor gradient", grad, blocks.natm(), blocks.width())?;
    check_finite("descriptor gradient", grad)?;
    let nao = blocks.nao();

    let per_atom = executor.map_atoms(blocks.natm(), |a| {
        let mut v = DMatrix::zeros(nao, nao);
        for (block, eig) in blocks.iter().zip(&descriptors.eigen[a]) {
            let g = DVector::from_iterator(
                block.width,
                grad.row(a).columns(block.offset, block.width).iter().copied(),
            );
            let dm_grad = eig.backward(&g);
            let p = block.atom(a);
            v += p * dm_grad * p.transpose();
        }
        Ok(v)
    })?;

    let total = per_atom
        .into_iter()
        .fold(DMatrix::zeros(nao, nao), |acc, v| acc + v);
    Ok(symmetrize(&total))
}
