//! Numerical building blocks of the offline/online reduction pipeline.
//!
//! The submodules follow the data flow of the offline phase:
//!
//! 1.  [`full_order`]: dense direct solves of the shifted full-order operator.
//! 2.  [`sampling`]: parameter sampling and snapshot accumulation.
//! 3.  [`pod`]: proper orthogonal decomposition of the snapshot matrix.
//! 4.  [`galerkin`]: projection onto the reduced basis and the reduced solver.
//! 5.  [`projection`]: assembly of interpolatory projection matrices V and W.
//! 6.  [`orthogonalization`]: Gram-Schmidt and biorthogonal normalization.
//!
//! For normal usage, prefer the high-level entry points in [`crate::solvers`];
//! these modules are exposed for callers that need fine-grained control over
//! individual pipeline stages.

pub mod full_order;
pub mod galerkin;
pub mod orthogonalization;
pub mod pod;
pub mod projection;
pub mod sampling;

use crate::error::{RomError, RomErrorKind};
use faer::{MatRef, c64};

/// Default floor for the reciprocal condition number of a shifted operator.
///
/// A solve is rejected as singular when rcond falls below this value. The
/// default sits slightly above machine epsilon so that operators which are
/// singular to working precision are reported rather than "solved".
pub const DEFAULT_RCOND_FLOOR: f64 = 4.0 * f64::EPSILON;

/// Computes the reciprocal condition number sigma_min / sigma_max of a dense
/// matrix from its singular values.
///
/// This is an exact 2-norm condition estimate rather than a triangular-factor
/// heuristic. The matrices it is applied to are either already the subject of
/// an O(n^3) factorization (shifted full-order operators) or small (reduced
/// operators and r x r pairing matrices), so the extra decomposition does not
/// change the asymptotic cost of any pipeline stage.
pub(crate) fn reciprocal_condition(m: MatRef<'_, c64>) -> Result<f64, RomError> {
    let k = m.nrows().min(m.ncols());
    if k == 0 {
        return Ok(0.0);
    }
    let svd = m
        .svd()
        .map_err(|e| RomError::from(RomErrorKind::SvdFailure(e)))?;
    let s = svd.S();
    // Singular values are returned in descending order; they are real numbers
    // stored in the complex element type.
    let s_max = s[0].re;
    let s_min = s[k - 1].re;
    if s_max == 0.0 {
        return Ok(0.0);
    }
    Ok(s_min / s_max)
}
