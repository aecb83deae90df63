//! Parameter sampling and snapshot accumulation.
//!
//! The offline phase explores the parameter domain by drawing shifts
//! independently and uniformly from a caller-supplied domain, solving the
//! full-order system at each shift, and collecting the solutions as the
//! columns of a snapshot matrix. Randomness always comes from an explicitly
//! passed, seeded generator; the crate never touches a process-global source,
//! so a fixed seed reproduces the snapshot set bit for bit.
//!
//! The per-parameter solves are mutually independent, so they are distributed
//! across a [`rayon`] worker pool. Parameters are drawn sequentially first
//! (keeping the draw order deterministic), then solved in parallel with each
//! result written to its pre-assigned column.
//!
//! The caller chooses how a singular solve inside a batch is handled through
//! a [`SamplingFailurePolicy`]: abort the whole batch with the offending
//! shift in the error (the default), or log and drop the bad draws, keeping
//! the rest of the batch.

use crate::algorithms::full_order::FullOrderSolver;
use crate::error::{RomError, RomErrorKind};
use faer::{Mat, c64};
use rand::Rng;
use rayon::prelude::*;

/// The region of the complex plane that parameters are drawn from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SamplingDomain {
    /// A real interval `[min, max)`; drawn parameters have zero imaginary
    /// part.
    RealInterval { min: f64, max: f64 },
    /// An axis-aligned rectangle in the complex plane.
    ComplexRectangle {
        re_min: f64,
        re_max: f64,
        im_min: f64,
        im_max: f64,
    },
}

impl SamplingDomain {
    /// Creates a real interval domain from two bounds.
    pub fn real(min: f64, max: f64) -> Result<Self, RomError> {
        if !(min < max) || !min.is_finite() || !max.is_finite() {
            return Err(RomErrorKind::InvalidInput(format!(
                "the sampling interval must satisfy min < max with finite bounds, got [{min}, {max})"
            ))
            .into());
        }
        Ok(Self::RealInterval { min, max })
    }

    /// Creates a complex rectangle domain from four bounds.
    pub fn complex(
        re_min: f64,
        re_max: f64,
        im_min: f64,
        im_max: f64,
    ) -> Result<Self, RomError> {
        let finite =
            re_min.is_finite() && re_max.is_finite() && im_min.is_finite() && im_max.is_finite();
        if !(re_min < re_max) || !(im_min < im_max) || !finite {
            return Err(RomErrorKind::InvalidInput(format!(
                "the sampling rectangle must satisfy re_min < re_max and im_min < im_max with \
                 finite bounds, got [{re_min}, {re_max}) x [{im_min}, {im_max})i"
            ))
            .into());
        }
        Ok(Self::ComplexRectangle {
            re_min,
            re_max,
            im_min,
            im_max,
        })
    }

    /// Draws one parameter uniformly from the domain.
    pub fn draw(&self, rng: &mut impl Rng) -> c64 {
        match *self {
            Self::RealInterval { min, max } => c64::new(rng.random_range(min..max), 0.0),
            Self::ComplexRectangle {
                re_min,
                re_max,
                im_min,
                im_max,
            } => c64::new(
                rng.random_range(re_min..re_max),
                rng.random_range(im_min..im_max),
            ),
        }
    }
}

/// An ordered collection of (parameter, full-order solution) pairs.
///
/// Solutions are stored as the columns of an n x count matrix, in draw order.
#[derive(Clone, Debug)]
pub struct SnapshotSet {
    parameters: Vec<c64>,
    solutions: Mat<c64>,
}

impl SnapshotSet {
    /// Assembles a snapshot set from externally computed solutions.
    ///
    /// The j-th column of `solutions` must be the full-order solution at
    /// `parameters[j]`.
    pub fn from_parts(parameters: Vec<c64>, solutions: Mat<c64>) -> Result<Self, RomError> {
        if parameters.len() != solutions.ncols() {
            return Err(RomErrorKind::ShapeMismatch {
                entity: "snapshot parameters".to_string(),
                expected: solutions.ncols(),
                actual: parameters.len(),
            }
            .into());
        }
        Ok(Self {
            parameters,
            solutions,
        })
    }

    /// The number of snapshots.
    pub fn count(&self) -> usize {
        self.parameters.len()
    }

    /// The full-order state dimension n.
    pub fn state_dim(&self) -> usize {
        self.solutions.nrows()
    }

    /// The parameters, in draw order.
    pub fn parameters(&self) -> &[c64] {
        &self.parameters
    }

    /// The n x count snapshot matrix whose j-th column is the solution at the
    /// j-th parameter.
    pub fn solutions(&self) -> &Mat<c64> {
        &self.solutions
    }
}

/// How a singular solve inside a snapshot batch is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingFailurePolicy {
    /// Abort the whole batch on the first singular draw, carrying the
    /// offending shift in the error.
    Abort,
    /// Log and drop singular draws, keeping the successful ones. The batch
    /// fails only when every draw is singular.
    Skip,
}

/// Which side of the model a snapshot batch is generated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    /// Solve `(sI - A) x = B`.
    Primal,
    /// Solve `(conj(s) I - A^H) y = C^H`.
    Adjoint,
}

/// Draws `count` parameters from `domain` and solves the primal system
/// `(sI - A) x = B` at each of them, aborting on the first singular draw.
///
/// # Errors
///
/// Propagates the first singular-system error encountered in the batch, and
/// rejects `count == 0`.
pub fn sample_primal(
    solver: &FullOrderSolver<'_>,
    domain: &SamplingDomain,
    count: usize,
    rng: &mut impl Rng,
) -> Result<SnapshotSet, RomError> {
    sample(solver, domain, count, rng, Side::Primal, SamplingFailurePolicy::Abort)
}

/// Draws `count` parameters from `domain` and solves the adjoint system
/// `(conj(s) I - A^H) y = C^H` at each of them, aborting on the first
/// singular draw.
pub fn sample_adjoint(
    solver: &FullOrderSolver<'_>,
    domain: &SamplingDomain,
    count: usize,
    rng: &mut impl Rng,
) -> Result<SnapshotSet, RomError> {
    sample(solver, domain, count, rng, Side::Adjoint, SamplingFailurePolicy::Abort)
}

/// Like [`sample_primal`], with an explicit singular-draw policy.
///
/// Under [`SamplingFailurePolicy::Skip`] the returned set may hold fewer than
/// `count` snapshots; an invalid-input error is returned if every draw was
/// singular.
pub fn sample_primal_with_policy(
    solver: &FullOrderSolver<'_>,
    domain: &SamplingDomain,
    count: usize,
    rng: &mut impl Rng,
    policy: SamplingFailurePolicy,
) -> Result<SnapshotSet, RomError> {
    sample(solver, domain, count, rng, Side::Primal, policy)
}

/// Like [`sample_adjoint`], with an explicit singular-draw policy.
pub fn sample_adjoint_with_policy(
    solver: &FullOrderSolver<'_>,
    domain: &SamplingDomain,
    count: usize,
    rng: &mut impl Rng,
    policy: SamplingFailurePolicy,
) -> Result<SnapshotSet, RomError> {
    sample(solver, domain, count, rng, Side::Adjoint, policy)
}

fn sample(
    solver: &FullOrderSolver<'_>,
    domain: &SamplingDomain,
    count: usize,
    rng: &mut impl Rng,
    side: Side,
    policy: SamplingFailurePolicy,
) -> Result<SnapshotSet, RomError> {
    if count == 0 {
        return Err(
            RomErrorKind::InvalidInput("the snapshot count must be positive".to_string()).into(),
        );
    }
    let system = solver.system();
    let n = system.order();

    // Draw sequentially so the parameter sequence depends only on the seed,
    // not on the worker schedule.
    let parameters: Vec<c64> = (0..count).map(|_| domain.draw(rng)).collect();

    let rhs = match side {
        Side::Primal => system.b().clone(),
        Side::Adjoint => system.c_adjoint(),
    };

    // The solves are independent; collect preserves the draw order, so each
    // kept result lands next to its parameter below.
    let results: Vec<Result<Mat<c64>, RomError>> = parameters
        .par_iter()
        .map(|&s| match side {
            Side::Primal => solver.solve_primal(s, rhs.as_ref()),
            Side::Adjoint => solver.solve_adjoint(s, rhs.as_ref()),
        })
        .collect();

    let mut kept_parameters = Vec::with_capacity(count);
    let mut kept_columns = Vec::with_capacity(count);
    for (&s, result) in parameters.iter().zip(results) {
        match result {
            Ok(column) => {
                kept_parameters.push(s);
                kept_columns.push(column);
            }
            Err(err) => match (policy, err.kind()) {
                (SamplingFailurePolicy::Skip, RomErrorKind::SingularSystem { rcond, .. }) => {
                    log::warn!(
                        "dropping singular draw at s = {s} (rcond = {rcond:.3e}) from the \
                         {side:?} snapshot batch"
                    );
                }
                _ => return Err(err),
            },
        }
    }
    if kept_parameters.is_empty() {
        return Err(RomErrorKind::InvalidInput(format!(
            "every one of the {count} drawn parameters produced a singular system"
        ))
        .into());
    }

    let mut solutions = Mat::<c64>::zeros(n, kept_columns.len());
    for (j, column) in kept_columns.iter().enumerate() {
        solutions.col_mut(j).copy_from(column.col(0));
    }

    log::debug!(
        "collected {} of {count} {side:?} snapshots of dimension {n} from {domain:?}",
        kept_parameters.len()
    );

    Ok(SnapshotSet {
        parameters: kept_parameters,
        solutions,
    })
}
