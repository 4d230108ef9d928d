//! Input/Output for DeepSCF runs
//!
//! Logging setup, basis set loading and the descriptor dump.

mod basis_loader;
mod descriptors;
mod output;

pub use basis_loader::{fetch_basis, load_basis_sets};
pub use descriptors::{read_descriptors, write_descriptors, DescriptorRecord};
pub use output::setup_output;
