//! This module defines the custom error types for the library.
//!
//! All failure modes of the offline/online reduction pipeline are centralized
//! into a single enum: [`RomErrorKind`], wrapped by the public [`RomError`].
//!
//! Using the [`thiserror`] crate allows us to create idiomatic error types with
//! minimal boilerplate. Note that [`faer::linalg::svd::SvdError`] does not
//! implement the standard [`std::error::Error`] trait, so we wrap it manually
//! to provide a compatible error type.
//!
//! Conditioning failures are deliberately loud: downstream interpolatory
//! reduction is only correct if the caller knows exactly when a shifted
//! operator or a biorthogonal pairing has lost numerical rank, so the core
//! performs no silent recovery, retry, or approximation substitution. The one
//! non-fatal condition (a Gram-Schmidt reorthogonalization pass exhausting its
//! iteration cap) is reported through `log::warn!` rather than this enum.

use faer::c64;
use thiserror::Error;

/// Represents all possible errors that can occur during model reduction.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct RomError(#[from] pub(crate) RomErrorKind);

/// Private enum containing the distinct kinds of errors.
/// This separation allows for a clean `Display` implementation via
/// [`thiserror`] while handling non-standard error types manually.
#[derive(Error, Debug)]
pub(crate) enum RomErrorKind {
    /// Dimension mismatch among the system matrices A, B, C, or between
    /// auxiliary arrays (interpolation points and weight vectors).
    #[error("Shape mismatch for {entity}: expected dimension {expected} but got {actual}.")]
    ShapeMismatch {
        entity: String,
        expected: usize,
        actual: usize,
    },

    /// The shifted operator sI - A (or its reduced counterpart) is numerically
    /// singular at the requested parameter: its reciprocal condition number
    /// fell below the configured floor.
    #[error(
        "Singular system at s = {shift}: reciprocal condition number {rcond:.3e} is below the floor {floor:.3e}."
    )]
    SingularSystem { shift: c64, rcond: f64, floor: f64 },

    /// The requested truncation rank exceeds the achievable rank given the
    /// snapshot data, or a column became numerically zero during
    /// orthonormalization.
    #[error(
        "Rank exceeded: requested rank {requested} but only {available} directions are available."
    )]
    RankExceeded { requested: usize, available: usize },

    /// The biorthogonal normalization matrix W^H V is near-singular, so the
    /// inversion that enforces W^H V = I would amplify perturbations beyond
    /// the configured threshold.
    #[error(
        "Ill-conditioned biorthogonal pairing: reciprocal condition number of W^H V is {rcond:.3e}, below the threshold {threshold:.3e}."
    )]
    IllConditionedPairing { rcond: f64, threshold: f64 },

    /// Indicates that an invalid input parameter was provided to a function.
    #[error("Invalid input parameter: {0}")]
    InvalidInput(String),

    /// Wraps an error originating from [`faer`]'s singular value decomposition.
    #[error("A numerical error occurred during a singular value decomposition: {0:?}")]
    SvdFailure(faer::linalg::svd::SvdError),
}

impl RomError {
    /// Returns a reference to the inner error kind, for callers (and tests)
    /// that branch on the failure mode.
    pub(crate) fn kind(&self) -> &RomErrorKind {
        &self.0
    }
}
