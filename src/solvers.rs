//! This module provides a high-level, user-friendly API for the offline and
//! online phases of the reduction pipeline.
//!
//! The offline phase ([`build_rom`]) runs the full chain from snapshot
//! sampling through POD basis extraction and Galerkin projection, and returns
//! an opaque [`RomHandle`]. The online phase ([`evaluate_output`]) evaluates the
//! reduced transfer function at arbitrary parameters at k x k cost. The
//! interpolation-support API ([`build_projection_matrices`],
//! [`orthogonalize`]) produces and normalizes the projection bases consumed
//! by downstream interpolatory reduction.
//!
//! Callers needing finer control (custom snapshot sets, per-stage options)
//! can use the building blocks in [`crate::algorithms`] directly.

use crate::algorithms::full_order::FullOrderSolver;
use crate::algorithms::galerkin::{ReducedSystem, reduce_with_rcond_floor};
use crate::algorithms::orthogonalization::{
    BiorthogonalizeOptions, biorthonormalize, orthonormalize,
};
use crate::algorithms::pod::{self, Truncation};
use crate::algorithms::projection;
use crate::algorithms::sampling::{
    SamplingDomain, SamplingFailurePolicy, sample_adjoint_with_policy, sample_primal_with_policy,
};
use crate::algorithms::DEFAULT_RCOND_FLOOR;
use crate::error::{RomError, RomErrorKind};
use crate::system::System;
use faer::{Mat, MatRef, c64};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Configuration of the offline phase.
#[derive(Clone, Copy, Debug)]
pub struct RomConfig {
    /// Number of snapshots drawn per side (primal, and adjoint if enabled).
    pub snapshot_count: usize,
    /// Truncation policy for the POD basis extraction.
    pub truncation: Truncation,
    /// Seed for the sampling generator. A fixed seed makes the whole offline
    /// phase deterministic.
    pub seed: u64,
    /// Whether to also sample and project the adjoint model. Required for
    /// [`build_projection_matrices`]; skip it when only online output
    /// evaluation is needed.
    pub with_adjoint: bool,
    /// Reciprocal condition floor for every shifted solve, full and reduced.
    pub rcond_floor: f64,
    /// How singular draws inside a snapshot batch are handled.
    pub failure_policy: SamplingFailurePolicy,
}

impl RomConfig {
    /// Creates a configuration with the adjoint model enabled, the default
    /// reciprocal condition floor, and batch sampling that aborts on the
    /// first singular draw.
    pub fn new(snapshot_count: usize, truncation: Truncation, seed: u64) -> Self {
        Self {
            snapshot_count,
            truncation,
            seed,
            with_adjoint: true,
            rcond_floor: DEFAULT_RCOND_FLOOR,
            failure_policy: SamplingFailurePolicy::Abort,
        }
    }
}

/// The result of the offline phase: the primal reduced model, and the adjoint
/// reduced model when it was requested.
///
/// The handle is immutable and cheap to share; repeated online evaluations
/// reuse the same projected operators.
#[derive(Clone, Debug)]
pub struct RomHandle {
    primal: ReducedSystem,
    adjoint: Option<ReducedSystem>,
}

impl RomHandle {
    /// The primal reduced model.
    pub fn primal(&self) -> &ReducedSystem {
        &self.primal
    }

    /// The adjoint reduced model, if it was built.
    pub fn adjoint(&self) -> Option<&ReducedSystem> {
        self.adjoint.as_ref()
    }

    /// The order of the primal reduced model.
    pub fn order(&self) -> usize {
        self.primal.order()
    }
}

/// Runs the offline phase: samples snapshots over `domain`, extracts a POD
/// basis, and Galerkin-projects the system (and, if configured, its dual)
/// onto it.
///
/// # Errors
///
/// Propagates singular-system errors from individual snapshot solves, rank
/// errors from the truncation policy, and invalid-input errors from the
/// configuration.
pub fn build_rom(
    system: &System,
    domain: &SamplingDomain,
    config: &RomConfig,
) -> Result<RomHandle, RomError> {
    let solver = FullOrderSolver::with_rcond_floor(system, config.rcond_floor);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let primal_snapshots = sample_primal_with_policy(
        &solver,
        domain,
        config.snapshot_count,
        &mut rng,
        config.failure_policy,
    )?;
    let primal_basis = pod::extract(&primal_snapshots, config.truncation)?;
    log::debug!(
        "offline phase: primal basis of order {} from {} snapshots",
        primal_basis.order(),
        config.snapshot_count
    );
    let primal = reduce_with_rcond_floor(system, primal_basis, config.rcond_floor)?;

    let adjoint = if config.with_adjoint {
        // The adjoint batch continues the same generator, so one seed fixes
        // the entire offline phase.
        let adjoint_snapshots = sample_adjoint_with_policy(
            &solver,
            domain,
            config.snapshot_count,
            &mut rng,
            config.failure_policy,
        )?;
        let adjoint_basis = pod::extract(&adjoint_snapshots, config.truncation)?;
        let dual = system.adjoint();
        Some(reduce_with_rcond_floor(&dual, adjoint_basis, config.rcond_floor)?)
    } else {
        None
    };

    Ok(RomHandle { primal, adjoint })
}

/// Evaluates the reduced transfer function `H_r(s)` online.
pub fn evaluate_output(handle: &RomHandle, s: c64) -> Result<c64, RomError> {
    handle.primal.output(s)
}

/// Builds the weighted candidate projection matrices (V, W) at the given
/// interpolation points.
///
/// Requires a handle built with the adjoint model enabled.
pub fn build_projection_matrices(
    handle: &RomHandle,
    points: &[c64],
    weights_b: &[c64],
    weights_c: &[c64],
) -> Result<(Mat<c64>, Mat<c64>), RomError> {
    let adjoint = handle.adjoint.as_ref().ok_or_else(|| {
        RomError::from(RomErrorKind::InvalidInput(
            "the handle was built without the adjoint model; enable `with_adjoint` in RomConfig"
                .to_string(),
        ))
    })?;
    projection::build(&handle.primal, adjoint, points, weights_b, weights_c)
}

/// Orthonormalizes a candidate pair (V, W).
///
/// With `biorthogonal = false` the two matrices are orthonormalized
/// independently; with `biorthogonal = true` the pair is additionally
/// normalized so that `W^H V = I`, with the conditioning caveats documented
/// in [`crate::algorithms::orthogonalization`].
pub fn orthogonalize(
    v: MatRef<'_, c64>,
    w: MatRef<'_, c64>,
    biorthogonal: bool,
    options: &BiorthogonalizeOptions,
) -> Result<(Mat<c64>, Mat<c64>), RomError> {
    if biorthogonal {
        biorthonormalize(v, w, options)
    } else {
        Ok((
            orthonormalize(v, &options.orthogonalize)?,
            orthonormalize(w, &options.orthogonalize)?,
        ))
    }
}
