//! Projected density blocks and their eigenvalue descriptors.

extern crate nalgebra as na;

use crate::device::Executor;
use crate::eigen::{eigh, SymmetricEigen};
use crate::error::{check_shape, Result};
use crate::linalg::check_symmetric;
use crate::partition::{ShellBlock, ShellBlocks};
use na::DMatrix;

/// `M_a = P_aᵀ D P_a` for one block and atom.
pub fn project_density(block: &ShellBlock, atom: usize, dm: &DMatrix<f64>) -> DMatrix<f64> {
    let p = block.atom(atom);
    let m = p.transpose() * dm * p;
    // exact symmetry; the two triangles differ only by rounding
    (&m + m.transpose()) * 0.5
}

/// Descriptor tensor together with the eigenvectors the backward pass needs.
#[derive(Debug, Clone)]
pub struct Descriptors {
    /// `natm × width`, ascending eigenvalues per block, blocks concatenated.
    pub values: DMatrix<f64>,
    /// Indexed `[atom][block]`.
    pub eigen: Vec<Vec<SymmetricEigen>>,
}

pub fn validate_density(blocks: &ShellBlocks, dm: &DMatrix<f64>) -> Result<()> {
    check_shape("density matrix", dm, blocks.nao(), blocks.nao())?;
    check_symmetric("density matrix", dm)
}

pub fn extract(blocks: &ShellBlocks, dm: &DMatrix<f64>, executor: &Executor) -> Result<Descriptors> {
    validate_density(blocks, dm)?;

    let eigen = executor.map_atoms(blocks.natm(), |a| {
        blocks
            .iter()
            .map(|block| eigh(&project_density(block, a, dm)))
            .collect::<Result<Vec<_>>>()
    })?;

    let mut values = DMatrix::zeros(blocks.natm(), blocks.width());
    for (a, per_block) in eigen.iter().enumerate() {
        for (block, eig) in blocks.iter().zip(per_block) {
            for (k, &lambda) in eig.values.iter().enumerate() {
                values[(a, block.offset + k)] = lambda;
            }
        }
    }

    Ok(Descriptors { values, eigen })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::error::DeepScfError;
    use crate::projection::ProjectionTensor;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_blocks(rng: &mut StdRng) -> ShellBlocks {
        let flat = DMatrix::from_fn(5, 2 * 4, |_, _| rng.gen_range(-1.0..1.0));
        let tensor = ProjectionTensor::from_overlap(&flat, 2, 4).unwrap();
        ShellBlocks::partition(&tensor, &[(0, 1), (1, 3)]).unwrap()
    }

    #[test]
    fn test_descriptor_layout_matches_direct_eigenvalues() {
        let mut rng = StdRng::seed_from_u64(3);
        let blocks = random_blocks(&mut rng);
        let a = DMatrix::from_fn(5, 5, |_, _| rng.gen_range(-1.0..1.0));
        let dm = &a * a.transpose();

        let exec = Executor::new(Device::Cpu).unwrap();
        let desc = extract(&blocks, &dm, &exec).unwrap();
        assert_eq!(desc.values.shape(), (2, 4));

        let p_block = blocks.iter().nth(1).unwrap();
        let m = p_block.atom(1).transpose() * &dm * p_block.atom(1);
        let direct = m.symmetric_eigenvalues();
        let mut direct: Vec<f64> = direct.iter().copied().collect();
        direct.sort_by(|x, y| x.partial_cmp(y).unwrap());
        for (k, value) in direct.iter().enumerate() {
            assert!((desc.values[(1, 1 + k)] - value).abs() < 1e-12);
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut rng = StdRng::seed_from_u64(4);
        let blocks = random_blocks(&mut rng);
        let a = DMatrix::from_fn(5, 5, |_, _| rng.gen_range(-1.0..1.0));
        let dm = &a + a.transpose();

        let serial = extract(&blocks, &dm, &Executor::new(Device::Cpu).unwrap()).unwrap();
        let parallel = extract(&blocks, &dm, &Executor::new(Device::Parallel { threads: 2 }).unwrap()).unwrap();
        assert_eq!(serial.values, parallel.values);
    }

    #[test]
    fn test_rejects_bad_density() {
        let mut rng = StdRng::seed_from_u64(8);
        let blocks = random_blocks(&mut rng);
        let exec = Executor::new(Device::Cpu).unwrap();

        let wrong_size = DMatrix::<f64>::identity(4, 4);
        assert!(matches!(extract(&blocks, &wrong_size, &exec), Err(DeepScfError::Shape { .. })));

        let mut asymmetric = DMatrix::<f64>::identity(5, 5);
        asymmetric[(0, 3)] = 0.2;
        assert!(matches!(extract(&blocks, &asymmetric, &exec), Err(DeepScfError::Numeric(_))));
    }
}
