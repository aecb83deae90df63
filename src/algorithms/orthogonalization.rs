//! Column orthonormalization and biorthogonal normalization.
//!
//! Two operations used to turn the candidate projection matrices from
//! [`crate::algorithms::projection`] into bases suitable for Petrov-Galerkin
//! interpolatory reduction:
//!
//! - [`orthonormalize`]: modified Gram-Schmidt over the columns, with a
//!   reorthogonalization pass whenever the norm drop of a candidate column
//!   signals cancellation (the classic "twice is enough" safeguard). A column
//!   whose norm collapses to numerical zero means the input was not of full
//!   column rank and the call fails.
//! - [`biorthonormalize`]: orthonormalizes V and W independently, then
//!   enforces the pairing W^H V = I_r by inverting M = W^H V and replacing
//!   V with V M^{-1}.
//!
//! # Conditioning of the pairing inversion
//!
//! The inversion of W^H V amplifies any perturbation present in the
//! underlying system by a factor tied to the condition number of W^H V, and
//! the preceding orthonormalization does nothing to control that condition
//! number. This is a known property of the biorthogonal normalization, not a
//! defect of this implementation: the inversion is performed exactly, and a
//! pairing whose reciprocal condition number falls below the configured
//! threshold is rejected with an error instead of being regularized behind
//! the caller's back. A truncated-SVD pseudo-inverse is available, but only
//! as an explicit opt-in ([`PairingInverse::TruncatedSvd`]); the default is
//! the exact inverse.

use crate::algorithms::reciprocal_condition;
use crate::error::{RomError, RomErrorKind};
use faer::prelude::*;
use faer::{Mat, MatRef, c64};

/// Tunables for the modified Gram-Schmidt sweep.
#[derive(Clone, Copy, Debug)]
pub struct OrthogonalizeOptions {
    /// Tolerance for the final orthogonality check: the max-norm of
    /// `Q^H Q - I` above which a convergence warning is logged.
    pub check_tol: f64,
    /// A projection pass is repeated while the column norm drops below this
    /// fraction of its value before the pass.
    pub reiteration_threshold: f64,
    /// Cap on projection passes per column. Exceeding it logs a convergence
    /// warning (informational, not an error).
    pub max_reorth: usize,
    /// A column whose norm falls below `zero_tol` times its initial norm is
    /// treated as numerically zero, i.e. a rank failure.
    pub zero_tol: f64,
}

impl Default for OrthogonalizeOptions {
    fn default() -> Self {
        Self {
            check_tol: 1e-10,
            reiteration_threshold: 0.5,
            max_reorth: 4,
            zero_tol: 1e-12,
        }
    }
}

/// How the pairing matrix M = W^H V is inverted during biorthogonal
/// normalization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PairingInverse {
    /// Exact inverse via LU. Perturbations are amplified by cond(M); this is
    /// the reference behavior.
    Exact,
    /// Truncated-SVD pseudo-inverse discarding singular values below
    /// `rtol * sigma_max`. Explicit opt-in; trades exact interpolation for
    /// damped amplification.
    TruncatedSvd { rtol: f64 },
}

/// Tunables for [`biorthonormalize`].
#[derive(Clone, Copy, Debug)]
pub struct BiorthogonalizeOptions {
    /// Options for the two independent orthonormalization sweeps.
    pub orthogonalize: OrthogonalizeOptions,
    /// The pairing is rejected when rcond(W^H V) falls below this threshold.
    pub rcond_threshold: f64,
    /// Inversion variant for the pairing matrix.
    pub pairing_inverse: PairingInverse,
}

impl Default for BiorthogonalizeOptions {
    fn default() -> Self {
        Self {
            orthogonalize: OrthogonalizeOptions::default(),
            rcond_threshold: 1e-13,
            pairing_inverse: PairingInverse::Exact,
        }
    }
}

fn column_norm(m: &Mat<c64>, j: usize) -> f64 {
    let mut sum = 0.0;
    for i in 0..m.nrows() {
        sum += m[(i, j)].norm_sqr();
    }
    sum.sqrt()
}

/// Inner product `<q_p, q_j>` of two columns, conjugating the first.
fn column_dot(m: &Mat<c64>, p: usize, j: usize) -> c64 {
    let mut sum = c64::new(0.0, 0.0);
    for i in 0..m.nrows() {
        sum += m[(i, p)].conj() * m[(i, j)];
    }
    sum
}

/// Orthonormalizes the columns of a matrix with modified Gram-Schmidt.
///
/// The column count is preserved; the span of the leading columns is
/// unchanged. Applying the function to an already-orthonormal matrix returns
/// it essentially unchanged.
///
/// # Errors
///
/// Fails with a rank error if the matrix has more columns than rows or if a
/// column becomes numerically zero during the sweep (loss of column rank).
pub fn orthonormalize(
    matrix: MatRef<'_, c64>,
    options: &OrthogonalizeOptions,
) -> Result<Mat<c64>, RomError> {
    let n = matrix.nrows();
    let k = matrix.ncols();
    if k == 0 {
        return Err(RomErrorKind::InvalidInput(
            "cannot orthonormalize a matrix with zero columns".to_string(),
        )
        .into());
    }
    if k > n {
        return Err(RomErrorKind::RankExceeded {
            requested: k,
            available: n,
        }
        .into());
    }

    let mut q = matrix.to_owned();
    for j in 0..k {
        let initial_norm = column_norm(&q, j);
        if initial_norm <= 0.0 {
            return Err(RomErrorKind::RankExceeded {
                requested: j + 1,
                available: j,
            }
            .into());
        }

        let mut passes = 0;
        loop {
            let norm_before = column_norm(&q, j);
            for p in 0..j {
                let h = column_dot(&q, p, j);
                for i in 0..n {
                    let correction = h * q[(i, p)];
                    q[(i, j)] -= correction;
                }
            }
            let norm_after = column_norm(&q, j);

            if norm_after <= options.zero_tol * initial_norm {
                return Err(RomErrorKind::RankExceeded {
                    requested: j + 1,
                    available: j,
                }
                .into());
            }

            passes += 1;
            // A mild norm drop means the column was already essentially
            // orthogonal to its predecessors; a severe drop means the
            // projection cancelled most of the column and the subtraction
            // itself lost accuracy, so the pass is repeated.
            if norm_after > options.reiteration_threshold * norm_before {
                break;
            }
            if passes >= options.max_reorth {
                log::warn!(
                    "Gram-Schmidt reorthogonalization of column {j} did not stabilize after \
                     {passes} passes; orthogonality may be degraded"
                );
                break;
            }
        }

        let norm = column_norm(&q, j);
        let scale = 1.0 / norm;
        for i in 0..n {
            let scaled = q[(i, j)] * scale;
            q[(i, j)] = scaled;
        }
    }

    // Final orthogonality check. Failing it is informational: the caller
    // still gets the best basis the sweep could produce.
    let defect = orthogonality_defect(q.as_ref());
    if defect > options.check_tol {
        log::warn!(
            "orthonormalized basis has orthogonality defect {defect:.3e}, above the check \
             tolerance {:.3e}",
            options.check_tol
        );
    }

    Ok(q)
}

/// Max-norm of `Q^H Q - I`.
fn orthogonality_defect(q: MatRef<'_, c64>) -> f64 {
    let gram = q.adjoint() * q;
    let k = q.ncols();
    let mut defect: f64 = 0.0;
    for i in 0..k {
        for j in 0..k {
            let expected = if i == j { 1.0 } else { 0.0 };
            defect = defect.max((gram[(i, j)] - c64::new(expected, 0.0)).norm());
        }
    }
    defect
}

/// Biorthogonally normalizes a pair of matrices so that `W^H V = I_r`.
///
/// V and W are first orthonormalized independently, then V is replaced by
/// `V (W^H V)^{-1}`. The result interpolates exactly up to the conditioning
/// of the inversion; see the module documentation for the associated
/// sensitivity.
///
/// # Errors
///
/// Fails with a shape error if V and W have different shapes, propagates
/// rank failures from the orthonormalization sweeps, and fails with an
/// ill-conditioned-pairing error when rcond(W^H V) is below the configured
/// threshold.
pub fn biorthonormalize(
    v: MatRef<'_, c64>,
    w: MatRef<'_, c64>,
    options: &BiorthogonalizeOptions,
) -> Result<(Mat<c64>, Mat<c64>), RomError> {
    if v.nrows() != w.nrows() || v.ncols() != w.ncols() {
        return Err(RomErrorKind::ShapeMismatch {
            entity: "W (must match V)".to_string(),
            expected: v.ncols(),
            actual: w.ncols(),
        }
        .into());
    }

    let v = orthonormalize(v, &options.orthogonalize)?;
    let w = orthonormalize(w, &options.orthogonalize)?;

    let pairing = w.as_ref().adjoint() * &v;
    let rcond = reciprocal_condition(pairing.as_ref())?;
    if rcond < options.rcond_threshold {
        return Err(RomErrorKind::IllConditionedPairing {
            rcond,
            threshold: options.rcond_threshold,
        }
        .into());
    }

    let r = pairing.nrows();
    let pairing_inv = match options.pairing_inverse {
        PairingInverse::Exact => {
            // Exact inverse: amplifies perturbations by cond(M), by
            // construction. Not regularized; see the module documentation.
            let identity = Mat::<c64>::identity(r, r);
            pairing.as_ref().partial_piv_lu().solve(&identity)
        }
        PairingInverse::TruncatedSvd { rtol } => pseudo_inverse(pairing.as_ref(), rtol)?,
    };

    let v = &v * &pairing_inv;
    Ok((v, w))
}

/// Truncated-SVD pseudo-inverse `M^+ = V Sigma^+ U^H`, discarding singular
/// values below `rtol * sigma_max`.
fn pseudo_inverse(m: MatRef<'_, c64>, rtol: f64) -> Result<Mat<c64>, RomError> {
    let svd = m
        .svd()
        .map_err(|e| RomError::from(RomErrorKind::SvdFailure(e)))?;
    let r = m.nrows();
    let sigma_max = svd.S()[0].re;
    let sigma_inv = Mat::from_fn(r, r, |i, j| {
        if i == j {
            let sigma = svd.S()[i].re;
            if sigma >= rtol * sigma_max && sigma > 0.0 {
                c64::new(1.0 / sigma, 0.0)
            } else {
                c64::new(0.0, 0.0)
            }
        } else {
            c64::new(0.0, 0.0)
        }
    });
    Ok(svd.V() * &sigma_inv * svd.U().adjoint())
}
