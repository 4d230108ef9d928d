pub mod basis_set;
pub mod error;
pub mod gto;
pub mod helper;
pub mod integrals;
pub mod molecule;
pub mod shell;

#[cfg(test)]
mod gto_test;

pub use basis_set::BasisSet;
pub use error::BasisError;
pub use molecule::{Atom, Molecule};
pub use shell::{BasisFunction, ShellSpec};
