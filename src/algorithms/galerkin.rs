//! Galerkin projection onto a reduced basis and the reduced online solver.
//!
//! Given a full-order system (A, B, C) and an orthonormal basis V of
//! dimension n x k, the Galerkin reduced-order model is
//!
//! ```text
//!     A_r = V^H A V   (k x k)
//!     B_r = V^H B     (k x 1)
//!     C_r = C V       (1 x k)
//! ```
//!
//! and its transfer function H_r(s) = C_r (sI_k - A_r)^{-1} B_r approximates
//! the full-order transfer function. The construction is a deterministic
//! single pass of dense products; the basis is retained so reduced solutions
//! can be reconstructed back to the full space, `x ~ V z`.
//!
//! The online solve is a direct k x k solve, orders of magnitude cheaper than
//! the full-order O(n^3) factorization, but it carries the same singularity
//! check: sI_k - A_r can be singular at unlucky parameters even for a
//! well-chosen basis, and such a solve is rejected rather than assumed away.
//!
//! The adjoint reduced model is obtained by reducing the dual system
//! (A^H, C^H, B^H) with the W-side basis through this same code path; see
//! [`crate::system::System::adjoint`].

use crate::algorithms::pod::ReducedBasis;
use crate::algorithms::{DEFAULT_RCOND_FLOOR, reciprocal_condition};
use crate::error::{RomError, RomErrorKind};
use crate::system::System;
use faer::prelude::*;
use faer::{Mat, MatRef, c64};

/// A k-dimensional Galerkin reduced-order model together with the basis that
/// produced it.
///
/// Immutable after construction; may be shared freely across threads for
/// repeated online evaluation.
#[derive(Clone, Debug)]
pub struct ReducedSystem {
    a_r: Mat<c64>,
    b_r: Mat<c64>,
    c_r: Mat<c64>,
    basis: ReducedBasis,
    rcond_floor: f64,
}

/// Projects a system onto a reduced basis with the default reciprocal
/// condition floor for the online solves.
pub fn reduce(system: &System, basis: ReducedBasis) -> Result<ReducedSystem, RomError> {
    reduce_with_rcond_floor(system, basis, DEFAULT_RCOND_FLOOR)
}

/// Projects a system onto a reduced basis.
///
/// # Errors
///
/// Returns a shape error if the basis row dimension differs from the system
/// order.
pub fn reduce_with_rcond_floor(
    system: &System,
    basis: ReducedBasis,
    rcond_floor: f64,
) -> Result<ReducedSystem, RomError> {
    if basis.state_dim() != system.order() {
        return Err(RomErrorKind::ShapeMismatch {
            entity: "reduced basis (rows)".to_string(),
            expected: system.order(),
            actual: basis.state_dim(),
        }
        .into());
    }

    let v = basis.matrix();
    let av = system.a() * v;
    let a_r = v.as_ref().adjoint() * &av;
    let b_r = v.as_ref().adjoint() * system.b();
    let c_r = system.c() * v;

    Ok(ReducedSystem {
        a_r,
        b_r,
        c_r,
        basis,
        rcond_floor,
    })
}

impl ReducedSystem {
    /// The reduced order k.
    pub fn order(&self) -> usize {
        self.a_r.nrows()
    }

    /// The projected state matrix A_r = V^H A V.
    pub fn a_r(&self) -> &Mat<c64> {
        &self.a_r
    }

    /// The projected input map B_r = V^H B.
    pub fn b_r(&self) -> &Mat<c64> {
        &self.b_r
    }

    /// The projected output map C_r = C V.
    pub fn c_r(&self) -> &Mat<c64> {
        &self.c_r
    }

    /// The basis this model was projected with.
    pub fn basis(&self) -> &ReducedBasis {
        &self.basis
    }

    /// Solves the reduced system `(sI_k - A_r) z = B_r`.
    ///
    /// # Errors
    ///
    /// Fails with a singular-system error when the reduced shifted operator is
    /// numerically singular at `s`.
    pub fn solve(&self, s: c64) -> Result<Mat<c64>, RomError> {
        let k = self.order();
        let shifted = Mat::from_fn(k, k, |i, j| {
            if i == j {
                s - self.a_r[(i, j)]
            } else {
                -self.a_r[(i, j)]
            }
        });
        let rcond = reciprocal_condition(shifted.as_ref())?;
        if rcond < self.rcond_floor {
            return Err(RomErrorKind::SingularSystem {
                shift: s,
                rcond,
                floor: self.rcond_floor,
            }
            .into());
        }
        Ok(shifted.as_ref().partial_piv_lu().solve(&self.b_r))
    }

    /// Evaluates the reduced transfer function `H_r(s) = C_r (sI_k - A_r)^{-1} B_r`.
    pub fn output(&self, s: c64) -> Result<c64, RomError> {
        let z = self.solve(s)?;
        let y = &self.c_r * &z;
        Ok(y[(0, 0)])
    }

    /// Reconstructs a reduced vector (or a matrix of reduced columns) to the
    /// full space, `V z`.
    ///
    /// # Errors
    ///
    /// Returns a shape error if `z` does not have k rows.
    pub fn reconstruct(&self, z: MatRef<'_, c64>) -> Result<Mat<c64>, RomError> {
        if z.nrows() != self.order() {
            return Err(RomErrorKind::ShapeMismatch {
                entity: "reduced vector".to_string(),
                expected: self.order(),
                actual: z.nrows(),
            }
            .into());
        }
        Ok(self.basis.matrix() * z)
    }
}
