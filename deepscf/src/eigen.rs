//! Symmetric eigendecomposition with an explicit reverse-mode rule.
//!
//! Forward: `M = U diag(λ) Uᵀ` with `λ` ascending. Backward: for any energy
//! that depends on `M` only through its eigenvalues,
//! `dE/dM = U diag(dE/dλ) Uᵀ`. The rule holds wherever the eigenvalues are
//! distinct; for spectral functions (the same scalar map applied to every
//! eigenvalue) it also holds across degeneracies.

extern crate nalgebra as na;

use crate::error::{DeepScfError, Result};
use na::{DMatrix, DVector};
use std::cmp::Ordering;

const MAX_SWEEPS: usize = 1000;

#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    pub values: DVector<f64>,
    /// Eigenvectors as columns, in the order of `values`.
    pub vectors: DMatrix<f64>,
}

pub fn eigh(m: &DMatrix<f64>) -> Result<SymmetricEigen> {
    if !m.is_square() {
        return Err(DeepScfError::shape("eigendecomposition input", (m.nrows(), m.nrows()), m.shape()));
    }
    if m.iter().any(|x| !x.is_finite()) {
        return Err(DeepScfError::Numeric("eigendecomposition input is not finite".to_string()));
    }

    let eig = na::SymmetricEigen::try_new(m.clone(), f64::EPSILON, MAX_SWEEPS).ok_or_else(|| {
        DeepScfError::Numeric(format!(
            "symmetric eigendecomposition of a {0}x{0} block did not converge",
            m.nrows()
        ))
    })?;

    let mut indices: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    indices.sort_by(|&a, &b| {
        eig.eigenvalues[a]
            .partial_cmp(&eig.eigenvalues[b])
            .unwrap_or(Ordering::Equal)
    });
    let values = DVector::from_fn(indices.len(), |i, _| eig.eigenvalues[indices[i]]);
    let vectors = eig.eigenvectors.select_columns(&indices);

    if values.iter().any(|x| !x.is_finite()) {
        return Err(DeepScfError::Numeric("eigenvalues are not finite".to_string()));
    }
    Ok(SymmetricEigen { values, vectors })
}

/// `U diag(grad) Uᵀ`, the gradient with respect to the decomposed matrix.
pub fn eigenvalue_backward(vectors: &DMatrix<f64>, grad_values: &DVector<f64>) -> DMatrix<f64> {
    let mut scaled = vectors.clone();
    for (mut column, &g) in scaled.column_iter_mut().zip(grad_values.iter()) {
        column *= g;
    }
    scaled * vectors.transpose()
}

impl SymmetricEigen {
    pub fn backward(&self, grad_values: &DVector<f64>) -> DMatrix<f64> {
        eigenvalue_backward(&self.vectors, grad_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_symmetric(n: usize, rng: &mut StdRng) -> DMatrix<f64> {
        let a = DMatrix::from_fn(n, n, |_, _| rng.gen_range(-1.0..1.0));
        (&a + a.transpose()) * 0.5
    }

    #[test]
    fn test_eigh_sorted_and_reconstructs() {
        let mut rng = StdRng::seed_from_u64(11);
        let m = random_symmetric(6, &mut rng);
        let eig = eigh(&m).unwrap();
        for i in 1..6 {
            assert!(eig.values[i - 1] <= eig.values[i]);
        }
        let rebuilt = &eig.vectors * DMatrix::from_diagonal(&eig.values) * eig.vectors.transpose();
        assert!((rebuilt - &m).amax() < 1e-12);
    }

    #[test]
    fn test_eigh_rejects_bad_input() {
        let rect = DMatrix::<f64>::zeros(2, 3);
        assert!(matches!(eigh(&rect), Err(DeepScfError::Shape { .. })));
        let mut m = DMatrix::<f64>::identity(3, 3);
        m[(1, 1)] = f64::INFINITY;
        assert!(matches!(eigh(&m), Err(DeepScfError::Numeric(_))));
    }

    #[test]
    fn test_backward_matches_finite_differences() {
        // E(M) = Σ_k w_k λ_k with distinct weights on a nondegenerate matrix
        let mut rng = StdRng::seed_from_u64(5);
        let n = 5;
        let m = random_symmetric(n, &mut rng);
        let weights = DVector::from_fn(n, |i, _| 0.3 + i as f64 * 0.7 + (i * i) as f64 * 0.1);
        let energy = |mat: &DMatrix<f64>| eigh(mat).unwrap().values.dot(&weights);

        let grad = eigh(&m).unwrap().backward(&weights);
        assert!((&grad - grad.transpose()).amax() < 1e-14);

        let h = 1e-6;
        for i in 0..n {
            for j in 0..n {
                let mut step = DMatrix::zeros(n, n);
                step[(i, j)] += h;
                step[(j, i)] += h;
                let fd = (energy(&(&m + &step)) - energy(&(&m - &step))) / (4.0 * h);
                assert!(
                    (fd - grad[(i, j)]).abs() < 1e-7,
                    "element ({}, {}): fd = {}, analytic = {}",
                    i,
                    j,
                    fd,
                    grad[(i, j)]
                );
            }
        }
    }

    #[test]
    fn test_backward_of_trace_is_identity() {
        let mut rng = StdRng::seed_from_u64(9);
        let m = random_symmetric(4, &mut rng);
        let eig = eigh(&m).unwrap();
        let grad = eig.backward(&DVector::from_element(4, 1.0));
        assert!((grad - DMatrix::identity(4, 4)).amax() < 1e-12);
    }
}
