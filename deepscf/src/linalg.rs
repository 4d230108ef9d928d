extern crate nalgebra as na;

use crate::error::{DeepScfError, Result};
use na::DMatrix;
use num_complex::Complex64;

/// Imaginary parts above this fraction of the largest element are rejected.
pub const IMAGINARY_TOLERANCE: f64 = 1e-10;
/// Largest accepted `|m_ij - m_ji|` relative to the largest element.
pub const SYMMETRY_TOLERANCE: f64 = 1e-8;

/// Converts a complex matrix to a real one, refusing to drop a
/// non-negligible imaginary part.
pub fn real_matrix(m: &DMatrix<Complex64>) -> Result<DMatrix<f64>> {
    let scale = m.iter().map(|z| z.norm()).fold(0.0, f64::max);
    let worst = m.iter().map(|z| z.im.abs()).fold(0.0, f64::max);
    if !scale.is_finite() {
        return Err(DeepScfError::Numeric("matrix contains non-finite values".to_string()));
    }
    if worst > IMAGINARY_TOLERANCE * scale {
        return Err(DeepScfError::Numeric(format!(
            "imaginary part {:.3e} is not negligible (largest element {:.3e})",
            worst, scale
        )));
    }
    Ok(m.map(|z| z.re))
}

pub fn check_finite(what: &str, m: &DMatrix<f64>) -> Result<()> {
    if m.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(DeepScfError::Numeric(format!("{} contains non-finite values", what)))
    }
}

pub fn check_symmetric(what: &str, m: &DMatrix<f64>) -> Result<()> {
    check_finite(what, m)?;
    let scale = m.amax();
    let n = m.nrows();
    let mut worst = 0.0f64;
    for i in 0..n {
        for j in 0..i {
            worst = worst.max((m[(i, j)] - m[(j, i)]).abs());
        }
    }
    if worst > SYMMETRY_TOLERANCE * scale {
        return Err(DeepScfError::Numeric(format!(
            "{} is not symmetric (max deviation {:.3e})",
            what, worst
        )));
    }
    Ok(())
}

pub fn symmetrize(m: &DMatrix<f64>) -> DMatrix<f64> {
    (m + m.transpose()) * 0.5
}

/// `tr(A B)`.
pub fn trace_product(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    a.dot(&b.transpose())
}
