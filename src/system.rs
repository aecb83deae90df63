//! This module defines the core abstraction for parametrized SISO systems.
//!
//! The entire reduction pipeline operates on one immutable data structure: a
//! linear time-invariant single-input single-output system described by the
//! triple (A, B, C) with transfer function
//!
//! ```text
//!     H(s) = C (sI - A)^{-1} B
//! ```
//!
//! where A is the n x n state matrix, B the n x 1 input map and C the 1 x n
//! output map. Two design decisions are baked into this type:
//!
//! 1.  **A single element type.** All storage is [`faer::c64`]. Real systems
//!     are promoted once, at construction, via [`System::from_real`]. The
//!     algorithms downstream therefore never branch on the element type.
//! 2.  **Explicit affine maps.** The two parametrized operators the pipeline
//!     needs are spelled out as closed forms rather than composed generically:
//!     the primal map `sI - A` ([`System::shifted`]) and the adjoint map
//!     `conj(s) I - A^H` ([`System::shifted_adjoint`]). The conjugate
//!     transpose is a single explicit operation on the dense storage.
//!
//! Once constructed, a `System` is read-only and may be shared freely across
//! threads; the parallel sampling and projection stages rely on this.

use crate::error::{RomError, RomErrorKind};
use faer::{Mat, c64};

/// An immutable, dense, single-input single-output parametrized linear system.
///
/// Shapes are validated once at construction; every later stage of the
/// pipeline may assume they are mutually consistent.
#[derive(Clone, Debug)]
pub struct System {
    /// State matrix A, n x n.
    a: Mat<c64>,
    /// Input map B, n x 1.
    b: Mat<c64>,
    /// Output map C, 1 x n.
    c: Mat<c64>,
}

impl System {
    /// Creates a system from complex dense matrices.
    ///
    /// # Errors
    ///
    /// Returns a shape error if A is not square, if its dimension is zero, or
    /// if B and C are not a conforming column and row vector respectively.
    pub fn new(a: Mat<c64>, b: Mat<c64>, c: Mat<c64>) -> Result<Self, RomError> {
        let n = a.nrows();
        if n == 0 {
            return Err(RomErrorKind::InvalidInput(
                "the state matrix A must have dimension n > 0".to_string(),
            )
            .into());
        }
        if a.ncols() != n {
            return Err(RomErrorKind::ShapeMismatch {
                entity: "state matrix A (columns)".to_string(),
                expected: n,
                actual: a.ncols(),
            }
            .into());
        }
        if b.nrows() != n {
            return Err(RomErrorKind::ShapeMismatch {
                entity: "input map B (rows)".to_string(),
                expected: n,
                actual: b.nrows(),
            }
            .into());
        }
        if b.ncols() != 1 {
            return Err(RomErrorKind::ShapeMismatch {
                entity: "input map B (columns)".to_string(),
                expected: 1,
                actual: b.ncols(),
            }
            .into());
        }
        if c.nrows() != 1 {
            return Err(RomErrorKind::ShapeMismatch {
                entity: "output map C (rows)".to_string(),
                expected: 1,
                actual: c.nrows(),
            }
            .into());
        }
        if c.ncols() != n {
            return Err(RomErrorKind::ShapeMismatch {
                entity: "output map C (columns)".to_string(),
                expected: n,
                actual: c.ncols(),
            }
            .into());
        }
        Ok(Self { a, b, c })
    }

    /// Creates a system from real dense matrices, promoting every element to
    /// a complex number with zero imaginary part.
    pub fn from_real(a: Mat<f64>, b: Mat<f64>, c: Mat<f64>) -> Result<Self, RomError> {
        let promote = |m: &Mat<f64>| Mat::from_fn(m.nrows(), m.ncols(), |i, j| c64::new(m[(i, j)], 0.0));
        Self::new(promote(&a), promote(&b), promote(&c))
    }

    /// The state dimension n of the full-order model.
    pub fn order(&self) -> usize {
        self.a.nrows()
    }

    /// The state matrix A.
    pub fn a(&self) -> &Mat<c64> {
        &self.a
    }

    /// The input map B (n x 1).
    pub fn b(&self) -> &Mat<c64> {
        &self.b
    }

    /// The output map C (1 x n).
    pub fn c(&self) -> &Mat<c64> {
        &self.c
    }

    /// The conjugate transpose of the output map, C^H (n x 1).
    ///
    /// This is the right-hand side of the adjoint solves that generate the
    /// W-side snapshots and projection columns.
    pub fn c_adjoint(&self) -> Mat<c64> {
        self.c.as_ref().adjoint().to_owned()
    }

    /// Assembles the primal shifted operator `sI - A`.
    pub fn shifted(&self, s: c64) -> Mat<c64> {
        let n = self.order();
        Mat::from_fn(n, n, |i, j| {
            if i == j {
                s - self.a[(i, j)]
            } else {
                -self.a[(i, j)]
            }
        })
    }

    /// Assembles the adjoint shifted operator `conj(s) I - A^H`.
    ///
    /// This is the conjugate transpose of [`System::shifted`] at the same
    /// parameter, spelled out as its own closed form.
    pub fn shifted_adjoint(&self, s: c64) -> Mat<c64> {
        let n = self.order();
        Mat::from_fn(n, n, |i, j| {
            if i == j {
                s.conj() - self.a[(j, i)].conj()
            } else {
                -self.a[(j, i)].conj()
            }
        })
    }

    /// Returns the dual system (A^H, C^H, B^H).
    ///
    /// Galerkin reduction of the dual system with the W-side basis yields the
    /// adjoint reduced model used to build the W projection matrix, with the
    /// same code path as the primal reduction.
    pub fn adjoint(&self) -> Self {
        Self {
            a: self.a.as_ref().adjoint().to_owned(),
            b: self.c.as_ref().adjoint().to_owned(),
            c: self.b.as_ref().adjoint().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RomErrorKind;

    fn small_system() -> System {
        let a = Mat::from_fn(3, 3, |i, j| c64::new((i * 3 + j) as f64, 1.0));
        let b = Mat::from_fn(3, 1, |i, _| c64::new(i as f64 + 1.0, 0.0));
        let c = Mat::from_fn(1, 3, |_, j| c64::new(0.0, j as f64 - 1.0));
        System::new(a, b, c).unwrap()
    }

    #[test]
    fn test_construction_validates_shapes() {
        let a = Mat::<c64>::zeros(3, 3);
        let b = Mat::<c64>::zeros(2, 1); // wrong length
        let c = Mat::<c64>::zeros(1, 3);
        let err = System::new(a, b, c).unwrap_err();
        assert!(matches!(
            err.kind(),
            RomErrorKind::ShapeMismatch { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn test_construction_reports_the_offending_dimension() {
        // B with the right row count but two columns.
        let err = System::new(
            Mat::<c64>::zeros(3, 3),
            Mat::<c64>::zeros(3, 2),
            Mat::<c64>::zeros(1, 3),
        )
        .unwrap_err();
        assert!(matches!(
            err.kind(),
            RomErrorKind::ShapeMismatch { expected: 1, actual: 2, .. }
        ));

        // C with the right column count but two rows.
        let err = System::new(
            Mat::<c64>::zeros(3, 3),
            Mat::<c64>::zeros(3, 1),
            Mat::<c64>::zeros(2, 3),
        )
        .unwrap_err();
        assert!(matches!(
            err.kind(),
            RomErrorKind::ShapeMismatch { expected: 1, actual: 2, .. }
        ));
    }

    #[test]
    fn test_construction_rejects_empty_system() {
        let err =
            System::new(Mat::zeros(0, 0), Mat::zeros(0, 1), Mat::zeros(1, 0)).unwrap_err();
        assert!(matches!(err.kind(), RomErrorKind::InvalidInput(_)));
    }

    #[test]
    fn test_from_real_promotes_elements() {
        let a = Mat::from_fn(2, 2, |i, j| (i + j) as f64);
        let b = Mat::from_fn(2, 1, |i, _| i as f64);
        let c = Mat::from_fn(1, 2, |_, j| j as f64);
        let sys = System::from_real(a, b, c).unwrap();
        assert_eq!(sys.a()[(1, 0)], c64::new(1.0, 0.0));
        assert_eq!(sys.a()[(1, 1)], c64::new(2.0, 0.0));
        assert_eq!(sys.b()[(1, 0)], c64::new(1.0, 0.0));
    }

    #[test]
    fn test_shifted_operator_entries() {
        let sys = small_system();
        let s = c64::new(1.4, 2.0);
        let m = sys.shifted(s);
        // Diagonal: s - a_ii; off-diagonal: -a_ij.
        assert_eq!(m[(0, 0)], s - sys.a()[(0, 0)]);
        assert_eq!(m[(1, 2)], -sys.a()[(1, 2)]);
    }

    #[test]
    fn test_shifted_adjoint_is_conjugate_transpose_of_shifted() {
        let sys = small_system();
        let s = c64::new(-0.5, 3.0);
        let primal = sys.shifted(s);
        let adjoint = sys.shifted_adjoint(s);
        for i in 0..3 {
            for j in 0..3 {
                let diff = adjoint[(i, j)] - primal[(j, i)].conj();
                assert!(diff.norm() < 1e-15);
            }
        }
    }

    #[test]
    fn test_adjoint_system_swaps_and_conjugates_maps() {
        let sys = small_system();
        let dual = sys.adjoint();
        assert_eq!(dual.order(), 3);
        // Dual input map is C^H, dual output map is B^H.
        assert_eq!(dual.b()[(2, 0)], sys.c()[(0, 2)].conj());
        assert_eq!(dual.c()[(0, 1)], sys.b()[(1, 0)].conj());
        assert_eq!(dual.a()[(0, 2)], sys.a()[(2, 0)].conj());
    }
}
