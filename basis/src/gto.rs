#![allow(non_snake_case)]
//! Cartesian Gaussian primitives and their McMurchie–Davidson integrals.
//!
//! A primitive is `x^i y^j z^k exp(-alpha |r - A|^2)` *without* normalisation;
//! normalisation and contraction happen one level up in [`crate::shell`].
//! Every integral is expanded in Hermite Gaussians: the 1-D expansion
//! coefficients `E^{ij}_t` come from [`HermiteExpansion`], the Coulomb kernels
//! `R_{tuv}` from [`HermiteCoulomb`].

extern crate nalgebra as na;

use crate::helper::boys_values;
use na::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, x| acc * x as f64)
}

/// Radial normalisation of `r^l exp(-alpha r^2)`, the convention basis-set
/// contraction coefficients are quoted in.
pub fn gto_norm(l: usize, alpha: f64) -> f64 {
    let numerator = 2f64.powi(2 * l as i32 + 3) * factorial(l + 1) * (2.0 * alpha).powf(l as f64 + 1.5);
    let denominator = factorial(2 * l + 2) * PI.sqrt();
    (numerator / denominator).sqrt()
}

/// Cartesian exponent triples of a shell, in `xx, xy, xz, yy, yz, zz` order.
pub fn cartesian_powers(l: usize) -> Vec<[usize; 3]> {
    let mut powers = Vec::with_capacity((l + 1) * (l + 2) / 2);
    for lx in (0..=l).rev() {
        for ly in (0..=(l - lx)).rev() {
            powers.push([lx, ly, l - lx - ly]);
        }
    }
    powers
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Primitive {
    pub alpha: f64,
    pub powers: [usize; 3],
    pub center: Vector3<f64>,
}

/// Table of Hermite expansion coefficients `E^{ij}_t` for one Cartesian axis.
///
/// `E^{00}_0 = exp(-mu Qx^2)` and
/// `E^{i+1,j}_t = E^{ij}_{t-1} / 2p + X_PA E^{ij}_t + (t+1) E^{ij}_{t+1}`,
/// with the analogous rule in `j` using `X_PB`.
#[derive(Debug, Clone)]
pub struct HermiteExpansion {
    jdim: usize,
    tdim: usize,
    coef: Vec<f64>,
}

impl HermiteExpansion {
    pub fn new(imax: usize, jmax: usize, Qx: f64, a: f64, b: f64) -> Self {
        let p = a + b;
        let mu = a * b / p;
        let x_pa = -b / p * Qx;
        let x_pb = a / p * Qx;
        let half_inv_p = 0.5 / p;

        let jdim = jmax + 1;
        let tdim = imax + jmax + 1;
        let mut table = Self {
            jdim,
            tdim,
            coef: vec![0.0; (imax + 1) * jdim * tdim],
        };
        table.set(0, 0, 0, (-mu * Qx * Qx).exp());

        for i in 0..imax {
            for t in 0..=(i + 1) {
                let value = half_inv_p * table.lower(i, 0, t)
                    + x_pa * table.get(i, 0, t)
                    + (t + 1) as f64 * table.get(i, 0, t + 1);
                table.set(i + 1, 0, t, value);
            }
        }
        for i in 0..=imax {
            for j in 0..jmax {
                for t in 0..=(i + j + 1) {
                    let value = half_inv_p * table.lower(i, j, t)
                        + x_pb * table.get(i, j, t)
                        + (t + 1) as f64 * table.get(i, j, t + 1);
                    table.set(i, j + 1, t, value);
                }
            }
        }
        table
    }

    #[inline]
    fn index(&self, i: usize, j: usize, t: usize) -> usize {
        (i * self.jdim + j) * self.tdim + t
    }

    fn set(&mut self, i: usize, j: usize, t: usize, value: f64) {
        let idx = self.index(i, j, t);
        self.coef[idx] = value;
    }

    // E^{ij}_{t-1}, zero for t = 0
    fn lower(&self, i: usize, j: usize, t: usize) -> f64 {
        if t == 0 {
            0.0
        } else {
            self.get(i, j, t - 1)
        }
    }

    pub fn get(&self, i: usize, j: usize, t: usize) -> f64 {
        if t > i + j || t >= self.tdim {
            0.0
        } else {
            self.coef[self.index(i, j, t)]
        }
    }
}

/// Hermite Coulomb integrals `R^0_{tuv}(p, PC)` for `t + u + v <= lmax`.
#[derive(Debug, Clone)]
pub struct HermiteCoulomb {
    dim: usize,
    values: Vec<f64>,
}

impl HermiteCoulomb {
    pub fn new(lmax: usize, p: f64, PC: Vector3<f64>) -> Self {
        let dim = lmax + 1;
        let boys = boys_values(lmax, p * PC.norm_squared());
        // r[n][t][u][v], filled by increasing t + u + v
        let idx = |n: usize, t: usize, u: usize, v: usize| ((n * dim + t) * dim + u) * dim + v;
        let mut r = vec![0.0; dim * dim * dim * dim];

        let mut factor = 1.0;
        for n in 0..=lmax {
            r[idx(n, 0, 0, 0)] = factor * boys[n];
            factor *= -2.0 * p;
        }

        for order in 1..=lmax {
            for n in 0..=(lmax - order) {
                for t in 0..=order {
                    for u in 0..=(order - t) {
                        let v = order - t - u;
                        let value = if t > 0 {
                            let mut acc = PC.x * r[idx(n + 1, t - 1, u, v)];
                            if t > 1 {
                                acc += (t - 1) as f64 * r[idx(n + 1, t - 2, u, v)];
                            }
                            acc
                        } else if u > 0 {
                            let mut acc = PC.y * r[idx(n + 1, t, u - 1, v)];
                            if u > 1 {
                                acc += (u - 1) as f64 * r[idx(n + 1, t, u - 2, v)];
                            }
                            acc
                        } else {
                            let mut acc = PC.z * r[idx(n + 1, t, u, v - 1)];
                            if v > 1 {
                                acc += (v - 1) as f64 * r[idx(n + 1, t, u, v - 2)];
                            }
                            acc
                        };
                        r[idx(n, t, u, v)] = value;
                    }
                }
            }
        }

        // n = 0 occupies the leading dim^3 entries
        r.truncate(dim * dim * dim);
        Self { dim, values: r }
    }

    pub fn get(&self, t: usize, u: usize, v: usize) -> f64 {
        self.values[(t * self.dim + u) * self.dim + v]
    }
}

impl Primitive {
    pub fn new(alpha: f64, powers: [usize; 3], center: Vector3<f64>) -> Self {
        Self {
            alpha,
            powers,
            center,
        }
    }

    pub fn l(&self) -> usize {
        self.powers.iter().sum()
    }

    fn product_center(a: &Primitive, b: &Primitive) -> Vector3<f64> {
        (a.center * a.alpha + b.center * b.alpha) / (a.alpha + b.alpha)
    }

    fn expansions(a: &Primitive, b: &Primitive, extra_j: usize) -> [HermiteExpansion; 3] {
        let q = a.center - b.center;
        [0, 1, 2].map(|d| HermiteExpansion::new(a.powers[d], b.powers[d] + extra_j, q[d], a.alpha, b.alpha))
    }

    pub fn Sab(a: &Primitive, b: &Primitive) -> f64 {
        let p = a.alpha + b.alpha;
        let e = Self::expansions(a, b, 0);
        (0..3)
            .map(|d| e[d].get(a.powers[d], b.powers[d], 0))
            .product::<f64>()
            * (PI / p).powf(1.5)
    }

    /// Kinetic energy `-1/2 <a|∇²|b>`.
    pub fn Tab(a: &Primitive, b: &Primitive) -> f64 {
        let p = a.alpha + b.alpha;
        let e = Self::expansions(a, b, 2);
        let s1d = |d: usize, j: usize| e[d].get(a.powers[d], j, 0) * (PI / p).sqrt();

        let mut overlaps = [0.0; 3];
        let mut laplacians = [0.0; 3];
        for d in 0..3 {
            let j = b.powers[d];
            overlaps[d] = s1d(d, j);
            let mut lap = -2.0 * b.alpha * (2 * j + 1) as f64 * s1d(d, j)
                + 4.0 * b.alpha * b.alpha * s1d(d, j + 2);
            if j >= 2 {
                lap += (j * (j - 1)) as f64 * s1d(d, j - 2);
            }
            laplacians[d] = lap;
        }

        -0.5 * (laplacians[0] * overlaps[1] * overlaps[2]
            + overlaps[0] * laplacians[1] * overlaps[2]
            + overlaps[0] * overlaps[1] * laplacians[2])
    }

    /// Attraction to a point charge `Z` at `C` (negative for Z > 0).
    pub fn Vab(a: &Primitive, b: &Primitive, C: Vector3<f64>, Z: f64) -> f64 {
        let p = a.alpha + b.alpha;
        let e = Self::expansions(a, b, 0);
        let P = Self::product_center(a, b);
        let lx = a.powers[0] + b.powers[0];
        let ly = a.powers[1] + b.powers[1];
        let lz = a.powers[2] + b.powers[2];
        let r = HermiteCoulomb::new(lx + ly + lz, p, P - C);

        let mut val = 0.0;
        for t in 0..=lx {
            let ex = e[0].get(a.powers[0], b.powers[0], t);
            for u in 0..=ly {
                let ey = e[1].get(a.powers[1], b.powers[1], u);
                for v in 0..=lz {
                    let ez = e[2].get(a.powers[2], b.powers[2], v);
                    val += ex * ey * ez * r.get(t, u, v);
                }
            }
        }
        -Z * 2.0 * PI / p * val
    }

    /// Electron repulsion integral `(ab|cd)` in chemists' notation.
    pub fn JKabcd(a: &Primitive, b: &Primitive, c: &Primitive, d: &Primitive) -> f64 {
        let p = a.alpha + b.alpha;
        let q = c.alpha + d.alpha;
        let alpha = p * q / (p + q);
        let P = Self::product_center(a, b);
        let Q = Self::product_center(c, d);
        let e_ab = Self::expansions(a, b, 0);
        let e_cd = Self::expansions(c, d, 0);

        let l_ab = [0, 1, 2].map(|k| a.powers[k] + b.powers[k]);
        let l_cd = [0, 1, 2].map(|k| c.powers[k] + d.powers[k]);
        let lmax = l_ab.iter().sum::<usize>() + l_cd.iter().sum::<usize>();
        let r = HermiteCoulomb::new(lmax, alpha, P - Q);

        let mut val = 0.0;
        for t in 0..=l_ab[0] {
            let ex = e_ab[0].get(a.powers[0], b.powers[0], t);
            for u in 0..=l_ab[1] {
                let ey = e_ab[1].get(a.powers[1], b.powers[1], u);
                for v in 0..=l_ab[2] {
                    let ez = e_ab[2].get(a.powers[2], b.powers[2], v);
                    let e1 = ex * ey * ez;
                    if e1 == 0.0 {
                        continue;
                    }
                    for tau in 0..=l_cd[0] {
                        let fx = e_cd[0].get(c.powers[0], d.powers[0], tau);
                        for nu in 0..=l_cd[1] {
                            let fy = e_cd[1].get(c.powers[1], d.powers[1], nu);
                            for phi in 0..=l_cd[2] {
                                let fz = e_cd[2].get(c.powers[2], d.powers[2], phi);
                                let sign = if (tau + nu + phi) % 2 == 0 { 1.0 } else { -1.0 };
                                val += e1 * sign * fx * fy * fz * r.get(t + tau, u + nu, v + phi);
                            }
                        }
                    }
                }
            }
        }

        val * 2.0 * PI.powf(2.5) / (p * q * (p + q).sqrt())
    }
}
