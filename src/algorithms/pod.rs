//! Proper orthogonal decomposition of a snapshot collection.
//!
//! The dominant directions of a snapshot matrix are its leading left singular
//! vectors. This module computes a full singular value decomposition of the
//! n x count snapshot matrix,
//!
//! ```text
//!     S = U Sigma V^H,
//! ```
//!
//! applies one of four truncation policies to the singular spectrum, and
//! returns the first k columns of U as the reduced basis. A one-sided SVD of
//! the snapshot matrix itself is used, never an eigendecomposition of the
//! Gram matrix S^H S, which would square the condition number of the problem.
//!
//! The returned basis columns are orthonormal by construction (they are
//! columns of a unitary factor); this invariant is what the Galerkin
//! projection downstream relies on.

use crate::algorithms::sampling::SnapshotSet;
use crate::error::{RomError, RomErrorKind};
use faer::{Mat, c64};

/// Policy selecting how many left singular vectors form the reduced basis.
///
/// Exactly one criterion applies; all thresholds refer to the singular values
/// `sigma_1 >= sigma_2 >= ...` of the snapshot matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Truncation {
    /// Keep exactly `k` directions.
    Rank(usize),
    /// Drop singular values below an absolute threshold.
    AbsoluteTol(f64),
    /// Drop singular values below `tol * sigma_1`.
    RelativeTol(f64),
    /// Keep the smallest k such that the cumulative squared singular values
    /// reach the given fraction (in `(0, 1]`) of the total.
    EnergyFraction(f64),
}

/// An n x k matrix with orthonormal columns spanning the dominant snapshot
/// directions.
#[derive(Clone, Debug)]
pub struct ReducedBasis {
    basis: Mat<c64>,
}

impl ReducedBasis {
    /// Wraps a caller-supplied matrix as a reduced basis, verifying that its
    /// columns are orthonormal to the given tolerance (measured as the
    /// max-norm of `Q^H Q - I`).
    pub fn from_orthonormal(basis: Mat<c64>, tol: f64) -> Result<Self, RomError> {
        let k = basis.ncols();
        if k == 0 || basis.nrows() < k {
            return Err(RomErrorKind::RankExceeded {
                requested: k.max(1),
                available: basis.nrows().min(k),
            }
            .into());
        }
        let gram = basis.as_ref().adjoint() * &basis;
        for i in 0..k {
            for j in 0..k {
                let expected = if i == j {
                    c64::new(1.0, 0.0)
                } else {
                    c64::new(0.0, 0.0)
                };
                if (gram[(i, j)] - expected).norm() > tol {
                    return Err(RomErrorKind::InvalidInput(format!(
                        "basis columns are not orthonormal: |(Q^H Q - I)[({i}, {j})]| > {tol:e}"
                    ))
                    .into());
                }
            }
        }
        Ok(Self { basis })
    }

    /// The reduced order k (number of basis columns).
    pub fn order(&self) -> usize {
        self.basis.ncols()
    }

    /// The full-order state dimension n (number of basis rows).
    pub fn state_dim(&self) -> usize {
        self.basis.nrows()
    }

    /// The n x k basis matrix.
    pub fn matrix(&self) -> &Mat<c64> {
        &self.basis
    }
}

/// Extracts a reduced basis from a snapshot set.
///
/// # Errors
///
/// Fails with a rank error when a fixed requested rank exceeds
/// `min(n, count)`, or when a tolerance policy discards every direction.
/// Tolerances and energy fractions outside their valid ranges are rejected as
/// invalid input.
pub fn extract(snapshots: &SnapshotSet, truncation: Truncation) -> Result<ReducedBasis, RomError> {
    let matrix = snapshots.solutions();
    let max_rank = matrix.nrows().min(matrix.ncols());

    let svd = matrix
        .as_ref()
        .svd()
        .map_err(|e| RomError::from(RomErrorKind::SvdFailure(e)))?;

    // Singular values, descending, as real numbers.
    let sigma: Vec<f64> = (0..max_rank).map(|i| svd.S()[i].re).collect();

    let k = match truncation {
        Truncation::Rank(k) => {
            if k == 0 {
                return Err(RomErrorKind::InvalidInput(
                    "the requested rank must be positive".to_string(),
                )
                .into());
            }
            if k > max_rank {
                return Err(RomErrorKind::RankExceeded {
                    requested: k,
                    available: max_rank,
                }
                .into());
            }
            k
        }
        Truncation::AbsoluteTol(tol) => {
            if !(tol >= 0.0) {
                return Err(RomErrorKind::InvalidInput(format!(
                    "the absolute truncation tolerance must be non-negative, got {tol}"
                ))
                .into());
            }
            sigma.iter().take_while(|&&s| s >= tol).count()
        }
        Truncation::RelativeTol(tol) => {
            if !(tol >= 0.0) {
                return Err(RomErrorKind::InvalidInput(format!(
                    "the relative truncation tolerance must be non-negative, got {tol}"
                ))
                .into());
            }
            let cutoff = tol * sigma.first().copied().unwrap_or(0.0);
            sigma.iter().take_while(|&&s| s >= cutoff).count()
        }
        Truncation::EnergyFraction(fraction) => {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(RomErrorKind::InvalidInput(format!(
                    "the energy fraction must lie in (0, 1], got {fraction}"
                ))
                .into());
            }
            let total: f64 = sigma.iter().map(|s| s * s).sum();
            if total == 0.0 {
                0
            } else {
                let target = fraction * total;
                let mut cumulative = 0.0;
                let mut k = max_rank;
                for (i, s) in sigma.iter().enumerate() {
                    cumulative += s * s;
                    if cumulative >= target {
                        k = i + 1;
                        break;
                    }
                }
                k
            }
        }
    };

    if k == 0 {
        return Err(RomErrorKind::RankExceeded {
            requested: 1,
            available: 0,
        }
        .into());
    }

    log::debug!(
        "POD truncation {truncation:?}: kept {k} of {max_rank} directions (sigma_1 = {:.3e}, sigma_k = {:.3e})",
        sigma.first().copied().unwrap_or(0.0),
        sigma.get(k - 1).copied().unwrap_or(0.0),
    );

    let basis = svd.U().get(.., 0..k).to_owned();
    Ok(ReducedBasis { basis })
}
