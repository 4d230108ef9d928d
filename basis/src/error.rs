use thiserror::Error;

/// Failures of the basis-set and integral layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BasisError {
    #[error("unknown element symbol '{0}'")]
    UnknownElement(String),
    #[error("no '{basis}' basis available for {element}")]
    MissingBasis { basis: String, element: String },
    #[error("angular momentum l = {0} is not supported (max {max})", max = crate::shell::MAX_L)]
    UnsupportedAngularMomentum(usize),
    #[error("malformed shell: {0}")]
    InvalidShell(String),
    #[error("basis parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}
