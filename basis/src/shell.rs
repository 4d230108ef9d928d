/* Contracted spherical Gaussian shells.

   A ShellSpec is the centre-free description found in basis-set files
   (angular momentum, exponents, contraction matrix); placing it on a centre
   yields normalised real-spherical BasisFunctions, ordered contraction-major
   then m, the same layout pyscf uses for spherical AOs.
*/

extern crate nalgebra as na;

use crate::error::BasisError;
use crate::gto::{gto_norm, Primitive};
use crate::integrals;
use na::Vector3;
use serde::{Deserialize, Serialize};

/// Highest angular momentum with a spherical transform below.
pub const MAX_L: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellSpec {
    pub l: usize,
    pub exponents: Vec<f64>,
    /// One row per primitive, one column per contracted function.
    pub coefficients: Vec<Vec<f64>>,
}

/// A normalised contracted real-spherical Gaussian, stored as a linear
/// combination of Cartesian primitives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisFunction {
    pub l: usize,
    pub center: Vector3<f64>,
    pub terms: Vec<(f64, Primitive)>,
}

// Real solid harmonics (unnormalised) as Cartesian polynomials.
// p: x, y, z; d: xy, yz, 2z^2 - x^2 - y^2, xz, x^2 - y^2
fn solid_harmonics(l: usize) -> Vec<Vec<(f64, [usize; 3])>> {
    match l {
        0 => vec![vec![(1.0, [0, 0, 0])]],
        1 => vec![
            vec![(1.0, [1, 0, 0])],
            vec![(1.0, [0, 1, 0])],
            vec![(1.0, [0, 0, 1])],
        ],
        _ => vec![
            vec![(1.0, [1, 1, 0])],
            vec![(1.0, [0, 1, 1])],
            vec![(2.0, [0, 0, 2]), (-1.0, [2, 0, 0]), (-1.0, [0, 2, 0])],
            vec![(1.0, [1, 0, 1])],
            vec![(1.0, [2, 0, 0]), (-1.0, [0, 2, 0])],
        ],
    }
}

impl ShellSpec {
    pub fn new(l: usize, exponents: Vec<f64>, coefficients: Vec<Vec<f64>>) -> Result<Self, BasisError> {
        let spec = Self {
            l,
            exponents,
            coefficients,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), BasisError> {
        if self.l > MAX_L {
            return Err(BasisError::UnsupportedAngularMomentum(self.l));
        }
        if self.exponents.is_empty() {
            return Err(BasisError::InvalidShell("shell has no primitives".to_string()));
        }
        if self.coefficients.len() != self.exponents.len() {
            return Err(BasisError::InvalidShell(format!(
                "{} exponents but {} coefficient rows",
                self.exponents.len(),
                self.coefficients.len()
            )));
        }
        if let Some(&alpha) = self.exponents.iter().find(|a| !(**a > 0.0 && a.is_finite())) {
            return Err(BasisError::InvalidShell(format!("exponent {} is not positive", alpha)));
        }
        let nctr = self.coefficients[0].len();
        if nctr == 0 {
            return Err(BasisError::InvalidShell("shell has no contracted functions".to_string()));
        }
        if self.coefficients.iter().any(|row| row.len() != nctr) {
            return Err(BasisError::InvalidShell(
                "contraction rows have different lengths".to_string(),
            ));
        }
        Ok(())
    }

    pub fn num_contracted(&self) -> usize {
        self.coefficients.first().map_or(0, |row| row.len())
    }

    /// Number of spherical functions, `(2l + 1) * nctr`.
    pub fn num_functions(&self) -> usize {
        (2 * self.l + 1) * self.num_contracted()
    }

    /// Builds the normalised spherical functions of this shell on `center`.
    pub fn place(&self, center: Vector3<f64>) -> Result<Vec<BasisFunction>, BasisError> {
        self.validate()?;
        let harmonics = solid_harmonics(self.l);
        let mut functions = Vec::with_capacity(self.num_functions());

        for ctr in 0..self.num_contracted() {
            for component in &harmonics {
                let mut terms = Vec::new();
                for (row, &alpha) in self.coefficients.iter().zip(&self.exponents) {
                    let c = row[ctr];
                    if c == 0.0 {
                        continue;
                    }
                    let weight = c * gto_norm(self.l, alpha);
                    for &(w, powers) in component {
                        terms.push((weight * w, Primitive::new(alpha, powers, center)));
                    }
                }

                let mut function = BasisFunction {
                    l: self.l,
                    center,
                    terms,
                };
                let norm2 = integrals::overlap(&function, &function);
                if !(norm2 > 0.0 && norm2.is_finite()) {
                    return Err(BasisError::InvalidShell(format!(
                        "contracted function {} of l = {} shell has zero norm",
                        ctr, self.l
                    )));
                }
                let scale = 1.0 / norm2.sqrt();
                function.terms.iter_mut().for_each(|(c, _)| *c *= scale);
                functions.push(function);
            }
        }

        Ok(functions)
    }
}
