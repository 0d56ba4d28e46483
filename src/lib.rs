//! Monte Carlo point clouds of hydrogen orbitals
//!
//! Rejection-samples |psi_nlm|^2 and splits the accepted points by the sign of
//! the real wavefunction, ready for a point renderer.

pub mod config;
pub mod error;
pub mod logging;
pub mod physics;
pub mod sampler;
pub mod special;
pub mod store;

pub use config::{AngularProposal, AppConfig, OrbitalParams, SamplerConfig, ViewSettings};
pub use error::{OrbitalError, Result};
pub use physics::{DensityModel, QuantumState, SphericalPoint};
pub use sampler::{sample, OrbitalSampler, SampleRequest, SampleResult};
pub use store::{CloudSnapshot, CloudStore};
