//! Dense direct solves of the shifted full-order operator.
//!
//! The full-order model enters every offline computation through linear
//! systems of the form
//!
//! ```text
//!     (sI - A) x = rhs            (primal)
//!     (conj(s) I - A^H) y = rhs   (adjoint)
//! ```
//!
//! Both are solved with a dense partial-pivot LU factorization, an O(n^3)
//! operation. The factorization of a shift can be retained and reused for
//! additional right-hand sides at O(n^2) each, see
//! [`FullOrderSolver::factorize_primal`].
//!
//! Every factorization carries an exact reciprocal condition number computed
//! from the singular values of the shifted operator. A solve at a parameter
//! where rcond falls below the configured floor fails with a singular-system
//! error instead of returning a meaningless vector; shifts close to an
//! eigenvalue of A are the typical trigger.

use crate::algorithms::{DEFAULT_RCOND_FLOOR, reciprocal_condition};
use crate::error::{RomError, RomErrorKind};
use crate::system::System;
use faer::linalg::solvers::PartialPivLu;
use faer::prelude::*;
use faer::{Mat, MatRef, c64};

/// A retained LU factorization of a shifted operator, reusable across
/// multiple right-hand sides at the same parameter.
pub struct ShiftedFactorization {
    lu: PartialPivLu<c64>,
    rcond: f64,
    shift: c64,
    dim: usize,
}

impl ShiftedFactorization {
    /// Solves the factorized system for one or more right-hand side columns.
    ///
    /// # Errors
    ///
    /// Returns a shape error if `rhs` does not have the operator's dimension.
    pub fn solve(&self, rhs: MatRef<'_, c64>) -> Result<Mat<c64>, RomError> {
        if rhs.nrows() != self.dim {
            return Err(RomErrorKind::ShapeMismatch {
                entity: "right-hand side".to_string(),
                expected: self.dim,
                actual: rhs.nrows(),
            }
            .into());
        }
        Ok(self.lu.solve(rhs))
    }

    /// The reciprocal condition number of the factorized operator.
    pub fn rcond(&self) -> f64 {
        self.rcond
    }

    /// The parameter at which the operator was assembled.
    pub fn shift(&self) -> c64 {
        self.shift
    }
}

/// Dense direct solver for the primal and adjoint shifted operators of a
/// [`System`].
///
/// The solver borrows the system and holds no other state; solves are pure
/// functions of (s, rhs) and the solver may be shared across threads.
pub struct FullOrderSolver<'a> {
    system: &'a System,
    rcond_floor: f64,
}

impl<'a> FullOrderSolver<'a> {
    /// Creates a solver with the default reciprocal condition floor,
    /// [`DEFAULT_RCOND_FLOOR`].
    pub fn new(system: &'a System) -> Self {
        Self::with_rcond_floor(system, DEFAULT_RCOND_FLOOR)
    }

    /// Creates a solver that rejects shifted operators whose reciprocal
    /// condition number falls below `rcond_floor`.
    pub fn with_rcond_floor(system: &'a System, rcond_floor: f64) -> Self {
        Self {
            system,
            rcond_floor,
        }
    }

    /// The system this solver operates on.
    pub fn system(&self) -> &System {
        self.system
    }

    /// Factorizes the primal operator `sI - A` at the given parameter.
    pub fn factorize_primal(&self, s: c64) -> Result<ShiftedFactorization, RomError> {
        self.factorize(self.system.shifted(s), s)
    }

    /// Factorizes the adjoint operator `conj(s) I - A^H` at the given
    /// parameter.
    pub fn factorize_adjoint(&self, s: c64) -> Result<ShiftedFactorization, RomError> {
        self.factorize(self.system.shifted_adjoint(s), s)
    }

    /// Solves `(sI - A) x = rhs`.
    pub fn solve_primal(&self, s: c64, rhs: MatRef<'_, c64>) -> Result<Mat<c64>, RomError> {
        self.factorize_primal(s)?.solve(rhs)
    }

    /// Solves `(conj(s) I - A^H) y = rhs`.
    pub fn solve_adjoint(&self, s: c64, rhs: MatRef<'_, c64>) -> Result<Mat<c64>, RomError> {
        self.factorize_adjoint(s)?.solve(rhs)
    }

    fn factorize(&self, shifted: Mat<c64>, s: c64) -> Result<ShiftedFactorization, RomError> {
        let rcond = reciprocal_condition(shifted.as_ref())?;
        if rcond < self.rcond_floor {
            return Err(RomErrorKind::SingularSystem {
                shift: s,
                rcond,
                floor: self.rcond_floor,
            }
            .into());
        }
        let dim = shifted.nrows();
        Ok(ShiftedFactorization {
            lu: shifted.as_ref().partial_piv_lu(),
            rcond,
            shift: s,
            dim,
        })
    }
}
