use basis::BasisError;
use nalgebra::DMatrix;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeepScfError {
    /// Malformed auxiliary basis, inconsistent block layout or a bad model.
    #[error("configuration error: {0}")]
    Config(String),
    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    Shape {
        what: String,
        expected: String,
        found: String,
    },
    #[error("numerical error: {0}")]
    Numeric(String),
    /// An effective potential without the correction-energy tag reached the
    /// energy evaluation. Callers recover by recomputing the potential.
    #[error("effective potential carries no correction-energy tag")]
    MissingTag,
    #[error(transparent)]
    Basis(#[from] BasisError),
}

pub type Result<T> = std::result::Result<T, DeepScfError>;

impl DeepScfError {
    pub fn shape(what: impl Into<String>, expected: (usize, usize), found: (usize, usize)) -> Self {
        DeepScfError::Shape {
            what: what.into(),
            expected: format!("{} x {}", expected.0, expected.1),
            found: format!("{} x {}", found.0, found.1),
        }
    }
}

pub(crate) fn check_shape(what: &str, m: &DMatrix<f64>, rows: usize, cols: usize) -> Result<()> {
    if m.shape() != (rows, cols) {
        return Err(DeepScfError::shape(what, (rows, cols), m.shape()));
    }
    Ok(())
}
