//! Offline/online reduced-order modeling for parametrized SISO systems.
//!
//! This crate approximates the transfer function H(s) = C (sI - A)^{-1} B of
//! a large dense linear time-invariant system and constructs the
//! interpolatory projection bases consumed by rational-interpolation
//! model-reduction procedures (iterative rational Krylov schemes and
//! relatives).
//!
//! Built on the [`faer`] linear algebra framework, the pipeline consists of:
//!
//! - an **offline phase** that samples the parameter domain with a seeded
//!   random source, solves the full-order system at each sample (dense LU,
//!   parallelized over samples), extracts the dominant snapshot directions by
//!   singular value decomposition with a configurable truncation policy, and
//!   Galerkin-projects the system onto the resulting orthonormal basis;
//! - an **online phase** that evaluates the reduced transfer function at
//!   arbitrary parameters through k x k solves, orders of magnitude cheaper
//!   than the full-order factorizations;
//! - an **interpolation-support stage** that evaluates the reduced models at
//!   a set of interpolation points, reconstructs the solutions to full space,
//!   applies diagonal interpolation weights to form candidate projection
//!   matrices V and W, and orthonormalizes or biorthonormalizes them.
//!
//! All dense storage uses the complex scalar [`faer::c64`]; real systems are
//! promoted once at construction. Conditioning hazards (a shifted operator
//! near an eigenvalue, a truncation rank beyond the available data) surface
//! as explicit errors rather than silently degraded results. In particular,
//! the inversion enforcing
//! `W^H V = I` is exact by default and amplifies system perturbations by the
//! condition number of the pairing; see
//! [`algorithms::orthogonalization`] for the details and the explicit
//! opt-in alternative.
//!
//! ## Example
//!
//! Build a reduced model of a stable 16-dimensional system, evaluate its
//! output online, and assemble biorthonormalized projection bases:
//!
//! ```rust
//! use faer::{Mat, c64};
//! use rom_core::{
//!     BiorthogonalizeOptions, RomConfig, SamplingDomain, System, Truncation, build_projection_matrices,
//!     build_rom, evaluate_output, orthogonalize,
//! };
//!
//! # fn main() -> Result<(), rom_core::RomError> {
//! let n = 16;
//! let a = Mat::from_fn(n, n, |i, j| {
//!     if i == j { -((i + 1) as f64) } else { 0.1 / (1.0 + (i + j) as f64) }
//! });
//! let b = Mat::from_fn(n, 1, |i, _| 1.0 / (1.0 + i as f64));
//! let c = Mat::from_fn(1, n, |_, j| (j + 1) as f64);
//! let system = System::from_real(a, b, c)?;
//!
//! // Offline: 32 snapshots on a real interval, basis kept near full rank.
//! let domain = SamplingDomain::real(0.1, 10.0)?;
//! let config = RomConfig::new(32, Truncation::RelativeTol(1e-12), 42);
//! let handle = build_rom(&system, &domain, &config)?;
//!
//! // Online: evaluate the reduced transfer function.
//! let y = evaluate_output(&handle, c64::new(1.4, 2.0))?;
//! assert!(y.norm() > 0.0);
//!
//! // Interpolation support: weighted projection bases at three points.
//! let points = [c64::new(1.0, 1.0), c64::new(2.0, -1.0), c64::new(3.0, 0.5)];
//! let weights = [c64::new(1.0, 0.0); 3];
//! let (v, w) = build_projection_matrices(&handle, &points, &weights, &weights)?;
//! let (v, w) = orthogonalize(v.as_ref(), w.as_ref(), true, &BiorthogonalizeOptions::default())?;
//! assert_eq!(v.ncols(), 3);
//! assert_eq!(w.ncols(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Scope
//!
//! The crate assumes single-input single-output systems; multi-input
//! multi-output decomposition, plotting, benchmark generators and any I/O or
//! CLI surface are host-application concerns.

// Declare the modules that form the crate's API structure.
pub mod algorithms;
pub mod error;
pub mod solvers;
pub mod system;

// Re-export the main API for convenient access.
pub use algorithms::full_order::{FullOrderSolver, ShiftedFactorization};
pub use algorithms::galerkin::{ReducedSystem, reduce, reduce_with_rcond_floor};
pub use algorithms::orthogonalization::{
    BiorthogonalizeOptions, OrthogonalizeOptions, PairingInverse,
};
pub use algorithms::pod::{ReducedBasis, Truncation};
pub use algorithms::sampling::{SamplingDomain, SamplingFailurePolicy, SnapshotSet};
pub use error::RomError;
pub use solvers::{
    RomConfig, RomHandle, build_projection_matrices, build_rom, evaluate_output, orthogonalize,
};
pub use system::System;
