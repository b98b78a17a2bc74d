use num_complex::Complex;
use num_traits::Float;
use tracing::debug;

use crate::error::{Result, ShapeError};

/// Compute `x * y / max(|x|², |y|²)`.
///
/// This equals `y / conj(x)` when `|x| >= |y|` and `x / conj(y)` otherwise,
/// so the denominator is never the smaller of the two magnitudes. The
/// result is NaN only when both `x` and `y` vanish.
pub fn shear_ratio<T: Float>(x: Complex<T>, y: Complex<T>) -> Complex<T> {
    x * y / x.norm_sqr().max(y.norm_sqr())
}

/// Broadcast two shapes against each other.
///
/// Shapes are aligned on their trailing dimensions, missing leading
/// dimensions count as 1 and dimensions of size 1 stretch to match.
///
/// # Examples
///
/// ```
/// use cosmicshear::broadcast_shapes;
///
/// assert_eq!(broadcast_shapes(&[4, 1], &[3]).unwrap(), vec![4, 3]);
/// assert_eq!(broadcast_shapes(&[], &[5]).unwrap(), vec![5]);
/// assert!(broadcast_shapes(&[2], &[3]).is_err());
/// ```
pub fn broadcast_shapes(left: &[usize], right: &[usize]) -> Result<Vec<usize>> {
    let ndim = left.len().max(right.len());
    let mut out = vec![1; ndim];

    for i in 0..ndim {
        let l = dim_from_end(left, i);
        let r = dim_from_end(right, i);

        out[ndim - 1 - i] = if l == r || r == 1 {
            l
        } else if l == 1 {
            r
        } else {
            debug!(?left, ?right, "batch shapes do not broadcast");
            return Err(ShapeError::Incompatible {
                left: left.to_vec(),
                right: right.to_vec(),
            });
        };
    }

    Ok(out)
}

/// Split off the trailing `(2, 2)` of a Jacobian shape, returning the batch part.
pub(crate) fn jacobian_batch_shape(shape: &[usize]) -> Result<&[usize]> {
    match shape {
        [batch @ .., 2, 2] => Ok(batch),
        _ => {
            debug!(?shape, "rejected jacobian shape");
            Err(ShapeError::JacobianShape {
                shape: shape.to_vec(),
            })
        }
    }
}

fn dim_from_end(shape: &[usize], i: usize) -> usize {
    shape.len().checked_sub(i + 1).map_or(1, |idx| shape[idx])
}
