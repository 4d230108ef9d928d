//! Learned-correction effective potentials for self-consistent field runs.
//!
//! A [`engine::DeepScf`] engine projects the density matrix onto atom-centred
//! auxiliary shells, turns the projected blocks into rotation-invariant
//! eigenvalue descriptors, evaluates a [`functional::CorrectionFunctional`]
//! on them and maps the energy gradient back to an AO-basis potential that
//! is added to the mean-field one.

pub mod app;
pub mod aux_basis;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod driver;
pub mod eigen;
pub mod engine;
pub mod error;
pub mod functional;
pub mod hf;
pub mod io;
pub mod linalg;
pub mod partition;
pub mod projection;
pub mod reconstruct;

pub use aux_basis::AuxiliaryBasisSpec;
pub use device::Device;
pub use driver::{EffectivePotentialModel, ScfDriver, ScfOutcome, ScfSettings};
pub use engine::{BaselinePotentialProvider, DeepScf, EffectivePotential, EnergyComponents, EngineOptions};
pub use error::{DeepScfError, Result};
pub use functional::{AtomicMlp, CorrectionFunctional, LinearFunctional, ZeroFunctional};
pub use hf::HartreeFock;
pub use partition::BlockLayout;
