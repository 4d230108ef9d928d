//! Integrals over contracted basis functions and the matrices built from them.

extern crate nalgebra as na;

use crate::gto::Primitive;
use crate::shell::BasisFunction;
use itertools::iproduct;
use na::{DMatrix, Vector3};
use rayon::prelude::*;

pub fn overlap(a: &BasisFunction, b: &BasisFunction) -> f64 {
    iproduct!(&a.terms, &b.terms)
        .map(|((ca, pa), (cb, pb))| ca * cb * Primitive::Sab(pa, pb))
        .sum()
}

pub fn kinetic(a: &BasisFunction, b: &BasisFunction) -> f64 {
    iproduct!(&a.terms, &b.terms)
        .map(|((ca, pa), (cb, pb))| ca * cb * Primitive::Tab(pa, pb))
        .sum()
}

/// Attraction to a set of point charges `(position, Z)`.
pub fn nuclear(a: &BasisFunction, b: &BasisFunction, charges: &[(Vector3<f64>, f64)]) -> f64 {
    iproduct!(&a.terms, &b.terms)
        .map(|((ca, pa), (cb, pb))| {
            let v: f64 = charges
                .iter()
                .map(|&(center, z)| Primitive::Vab(pa, pb, center, z))
                .sum();
            ca * cb * v
        })
        .sum()
}

pub fn repulsion(a: &BasisFunction, b: &BasisFunction, c: &BasisFunction, d: &BasisFunction) -> f64 {
    let mut val = 0.0;
    for (ca, pa) in &a.terms {
        for (cb, pb) in &b.terms {
            let cab = ca * cb;
            for (cc, pc) in &c.terms {
                for (cd, pd) in &d.terms {
                    val += cab * cc * cd * Primitive::JKabcd(pa, pb, pc, pd);
                }
            }
        }
    }
    val
}

fn symmetric_matrix<F>(functions: &[BasisFunction], f: F) -> DMatrix<f64>
where
    F: Fn(&BasisFunction, &BasisFunction) -> f64 + Sync,
{
    let n = functions.len();
    let pairs: Vec<(usize, usize)> = (0..n).flat_map(|i| (0..=i).map(move |j| (i, j))).collect();
    let values: Vec<f64> = pairs
        .par_iter()
        .map(|&(i, j)| f(&functions[i], &functions[j]))
        .collect();

    let mut m = DMatrix::zeros(n, n);
    for (&(i, j), &v) in pairs.iter().zip(&values) {
        m[(i, j)] = v;
        m[(j, i)] = v;
    }
    m
}

pub fn overlap_matrix(functions: &[BasisFunction]) -> DMatrix<f64> {
    symmetric_matrix(functions, overlap)
}

pub fn kinetic_matrix(functions: &[BasisFunction]) -> DMatrix<f64> {
    symmetric_matrix(functions, kinetic)
}

pub fn nuclear_matrix(functions: &[BasisFunction], charges: &[(Vector3<f64>, f64)]) -> DMatrix<f64> {
    symmetric_matrix(functions, |a, b| nuclear(a, b, charges))
}

/// `<bra_i | ket_j>` between two different function sets.
pub fn cross_overlap_matrix(bra: &[BasisFunction], ket: &[BasisFunction]) -> DMatrix<f64> {
    let rows: Vec<Vec<f64>> = bra
        .par_iter()
        .map(|a| ket.iter().map(|b| overlap(a, b)).collect())
        .collect();
    DMatrix::from_fn(bra.len(), ket.len(), |i, j| rows[i][j])
}

/// Dense `(ij|kl)` tensor, filled from the 8-fold permutational symmetry.
#[derive(Debug, Clone)]
pub struct EriTensor {
    n: usize,
    data: Vec<f64>,
}

impl EriTensor {
    pub fn build(functions: &[BasisFunction]) -> Self {
        let n = functions.len();
        let pair_index = |i: usize, j: usize| i * (i + 1) / 2 + j;

        let pairs: Vec<(usize, usize)> = (0..n).flat_map(|i| (0..=i).map(move |j| (i, j))).collect();
        let quartets: Vec<(usize, usize, usize, usize)> = pairs
            .iter()
            .flat_map(|&(i, j)| {
                pairs
                    .iter()
                    .filter(move |&&(k, l)| pair_index(k, l) <= pair_index(i, j))
                    .map(move |&(k, l)| (i, j, k, l))
            })
            .collect();

        let values: Vec<f64> = quartets
            .par_iter()
            .map(|&(i, j, k, l)| repulsion(&functions[i], &functions[j], &functions[k], &functions[l]))
            .collect();

        let mut tensor = Self {
            n,
            data: vec![0.0; n * n * n * n],
        };
        for (&(i, j, k, l), &v) in quartets.iter().zip(&values) {
            for (a, b) in [(i, j), (j, i)] {
                for (c, d) in [(k, l), (l, k)] {
                    tensor.set(a, b, c, d, v);
                    tensor.set(c, d, a, b, v);
                }
            }
        }
        tensor
    }

    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    fn index(&self, i: usize, j: usize, k: usize, l: usize) -> usize {
        ((i * self.n + j) * self.n + k) * self.n + l
    }

    fn set(&mut self, i: usize, j: usize, k: usize, l: usize, value: f64) {
        let idx = self.index(i, j, k, l);
        self.data[idx] = value;
    }

    pub fn get(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        self.data[self.index(i, j, k, l)]
    }

    /// Coulomb matrix `J_ij = Σ_kl (ij|kl) D_kl`.
    pub fn coulomb(&self, dm: &DMatrix<f64>) -> DMatrix<f64> {
        let n = self.n;
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| iproduct!(0..n, 0..n).map(|(k, l)| self.get(i, j, k, l) * dm[(k, l)]).sum::<f64>())
                    .collect()
            })
            .collect();
        DMatrix::from_fn(n, n, |i, j| rows[i][j])
    }

    /// Exchange matrix `K_ij = Σ_kl (ik|jl) D_kl`.
    pub fn exchange(&self, dm: &DMatrix<f64>) -> DMatrix<f64> {
        let n = self.n;
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| iproduct!(0..n, 0..n).map(|(k, l)| self.get(i, k, j, l) * dm[(k, l)]).sum::<f64>())
                    .collect()
            })
            .collect();
        DMatrix::from_fn(n, n, |i, j| rows[i][j])
    }
}
