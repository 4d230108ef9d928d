//! Auxiliary basis placed on every atom for density projection.
//!
//! The default carries s, p and d shells over twelve even-tempered exponents
//! `1.5^k`, `k ∈ {17, 13, 10, 7, 5, 3, 2, 1, 0, -1, -2, -3}`. Contracted
//! function `j` is primitive `j` minus primitive `j - 1`, which gives smooth,
//! well-conditioned radial channels.

use crate::error::{DeepScfError, Result};
use basis::shell::MAX_L;
use basis::ShellSpec;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ZETA_POWERS: [i32; 12] = [17, 13, 10, 7, 5, 3, 2, 1, 0, -1, -2, -3];
pub const DEFAULT_ZETA_BASE: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryBasisSpec {
    pub shells: Vec<ShellSpec>,
}

pub fn default_exponents() -> Vec<f64> {
    DEFAULT_ZETA_POWERS.iter().map(|&k| DEFAULT_ZETA_BASE.powi(k)).collect()
}

/// `I - superdiag(1)`, stored one row per primitive.
pub fn difference_contraction(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        1.0
                    } else if j == i + 1 {
                        -1.0
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

impl Default for AuxiliaryBasisSpec {
    fn default() -> Self {
        let exponents = default_exponents();
        let coefficients = difference_contraction(exponents.len());
        let shells = (0..=2)
            .map(|l| ShellSpec {
                l,
                exponents: exponents.clone(),
                coefficients: coefficients.clone(),
            })
            .collect();
        Self { shells }
    }
}

impl AuxiliaryBasisSpec {
    pub fn new(shells: Vec<ShellSpec>) -> Result<Self> {
        let spec = Self { shells };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.shells.is_empty() {
            return Err(DeepScfError::Config("auxiliary basis has no shells".to_string()));
        }
        for (i, shell) in self.shells.iter().enumerate() {
            if shell.l > MAX_L {
                return Err(DeepScfError::Config(format!(
                    "auxiliary shell {} has l = {}, at most {} is supported",
                    i, shell.l, MAX_L
                )));
            }
            shell
                .validate()
                .map_err(|e| DeepScfError::Config(format!("auxiliary shell {}: {}", i, e)))?;
        }
        Ok(())
    }

    /// Functions carried by one atom, `Σ (2l + 1) * nctr`.
    pub fn per_atom_width(&self) -> usize {
        self.shells.iter().map(ShellSpec::num_functions).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_widths() {
        let spec = AuxiliaryBasisSpec::default();
        assert!(spec.validate().is_ok());
        let widths: Vec<usize> = spec.shells.iter().map(ShellSpec::num_functions).collect();
        assert_eq!(widths, vec![12, 36, 60]);
        assert_eq!(spec.per_atom_width(), 108);
        assert!((spec.shells[0].exponents[0] - 1.5f64.powi(17)).abs() < 1e-6);
        assert!((spec.shells[2].exponents[11] - 1.5f64.powi(-3)).abs() < 1e-15);
    }

    #[test]
    fn test_difference_contraction() {
        let c = difference_contraction(3);
        assert_eq!(c, vec![vec![1.0, -1.0, 0.0], vec![0.0, 1.0, -1.0], vec![0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_malformed_specs_are_config_errors() {
        assert!(matches!(AuxiliaryBasisSpec::new(vec![]), Err(DeepScfError::Config(_))));

        let ragged = ShellSpec {
            l: 0,
            exponents: vec![1.0, 0.5],
            coefficients: vec![vec![1.0, 0.0], vec![1.0]],
        };
        assert!(matches!(AuxiliaryBasisSpec::new(vec![ragged]), Err(DeepScfError::Config(_))));

        let mismatched = ShellSpec {
            l: 1,
            exponents: vec![1.0, 0.5],
            coefficients: vec![vec![1.0]],
        };
        assert!(matches!(AuxiliaryBasisSpec::new(vec![mismatched]), Err(DeepScfError::Config(_))));

        let f_shell = ShellSpec {
            l: 3,
            exponents: vec![1.0],
            coefficients: vec![vec![1.0]],
        };
        assert!(matches!(AuxiliaryBasisSpec::new(vec![f_shell]), Err(DeepScfError::Config(_))));
    }
}
