// Boys function F_n(t) = ∫_0^1 u^(2n) exp(-t u^2) du, the radial kernel of every
// Coulomb-type Gaussian integral.
use libm::erf;
use std::f64::consts::PI;

/// Above this argument the erf closed form with upward recursion is used.
const ASYMPTOTIC_THRESHOLD: f64 = 30.0;
const SERIES_TOLERANCE: f64 = 1e-17;
const SERIES_MAX_TERMS: usize = 400;

/// Boys function of a single order.
pub fn boys_function(n: usize, t: f64) -> f64 {
    boys_values(n, t)[n]
}

/// Returns `[F_0(t), F_1(t), ..., F_nmax(t)]`.
///
/// For small `t` the highest order is summed from its power series and the
/// lower orders follow from the (stable) downward recursion
/// `F_{n-1} = (2t F_n + e^{-t}) / (2n - 1)`. For large `t` the closed form of
/// `F_0` seeds the upward recursion `F_{n+1} = ((2n + 1) F_n - e^{-t}) / 2t`.
pub fn boys_values(nmax: usize, t: f64) -> Vec<f64> {
    let t = t.max(0.0);
    let mut values = vec![0.0; nmax + 1];
    let exp_t = (-t).exp();

    if t < 1e-15 {
        for (n, value) in values.iter_mut().enumerate() {
            *value = 1.0 / (2 * n + 1) as f64;
        }
        return values;
    }

    if t > ASYMPTOTIC_THRESHOLD {
        let sqrt_t = t.sqrt();
        values[0] = 0.5 * (PI / t).sqrt() * erf(sqrt_t);
        for n in 0..nmax {
            values[n + 1] = ((2 * n + 1) as f64 * values[n] - exp_t) / (2.0 * t);
        }
        return values;
    }

    values[nmax] = boys_series(nmax, t, exp_t);
    for n in (1..=nmax).rev() {
        values[n - 1] = (2.0 * t * values[n] + exp_t) / (2 * n - 1) as f64;
    }
    values
}

// F_n(t) = e^{-t} Σ_k (2t)^k / ((2n+1)(2n+3)...(2n+2k+1))
fn boys_series(n: usize, t: f64, exp_t: f64) -> f64 {
    let mut term = 1.0 / (2 * n + 1) as f64;
    let mut sum = term;
    for k in 1..SERIES_MAX_TERMS {
        term *= 2.0 * t / (2 * n + 2 * k + 1) as f64;
        sum += term;
        if term < SERIES_TOLERANCE * sum {
            break;
        }
    }
    sum * exp_t
}
