use thiserror::Error;

/// Result alias used by the batched operations.
pub type Result<T, E = ShapeError> = std::result::Result<T, E>;

/// Shape errors raised by the batched transforms.
///
/// Numerical degeneracy (singular Jacobians, `|chi| > 1`, ...) is never
/// reported here; it shows up as NaN or infinity in the output instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The Jacobian array does not end in a `(2, 2)` matrix.
    #[error("jacobian must have shape (..., 2, 2), got {shape:?}")]
    JacobianShape { shape: Vec<usize> },

    /// Two batch shapes cannot be broadcast together.
    #[error("shapes {left:?} and {right:?} cannot be broadcast together")]
    Incompatible { left: Vec<usize>, right: Vec<usize> },
}
