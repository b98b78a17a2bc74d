//! Transformations of ellipticity between coordinate systems.
//!
//! This module maps epsilon-ellipticities through the local linear map of a
//! coordinate transformation, described by its Jacobian matrix:
//!
//! - [`transform`] takes an ellipticity from the source frame to the target frame.
//! - [`inverse_transform`] goes the other way, without inverting the Jacobian.
//!
//! # Key Types
//!
//! - [`Jacobian`] - A single 2x2 Jacobian with scalar transform kernels
//! - [`Ellipticity`] - The ellipticity argument: zero, a scalar or a batch
//!
//! # Method
//!
//! Transforming the chi-ellipticity through `J` means transforming the
//! second-moment matrix
//!
//! ```text
//! J [[1 + chi1, chi2], [chi2, 1 - chi1]] Jᵀ
//!   = 1 / (1 + |eps|²) [J (1 + A)] [J (1 + A)]ᵀ,   A = [[eps1, eps2], [eps2, -eps1]]
//! ```
//!
//! so the transformed ellipticity only depends on the matrix `J' = J + J A`.
//! Writing `J'` in terms of the complex numbers
//!
//! ```text
//! x = (J'00 + J'11) + i (J'10 - J'01)
//! y = (J'00 - J'11) + i (J'10 + J'01)
//! ```
//!
//! the epsilon-ellipticity of `J' J'ᵀ` is `y / conj(x)` or equivalently
//! `x / conj(y)`. Both are evaluated as `x y / max(|x|², |y|²)`, which never
//! divides by the smaller magnitude and needs no branch on zero.
//!
//! For the inverse, `J⁻¹ (1 + A)` has the same ellipticity as its adjugate
//! `adj(1 + A) adj(J) = (1 - A) J` up to a positive factor, which is why
//! [`inverse_transform`] multiplies on the left with a negated `A` and
//! swaps the roles of the diagonal entries.
//!
//! # Broadcasting
//!
//! The batched functions take a Jacobian array of shape `(..., 2, 2)` and an
//! ellipticity that is absent, a scalar, or an array. The leading batch
//! dimensions of the Jacobians are broadcast against the ellipticity shape
//! with the usual array rules:
//!
//! ```rust
//! use cosmicshear::{Ellipticity, transform};
//! use ndarray::{Array3, array};
//! use num_complex::Complex64;
//!
//! // Ten Jacobians, one ellipticity
//! let jac = Array3::from_shape_fn((10, 2, 2), |(n, i, j)| {
//!     if i == j { 1.0 + 0.1 * n as f64 } else { 0.05 }
//! });
//! let out = transform(&jac, Complex64::new(0.1, 0.0)).unwrap();
//! assert_eq!(out.shape(), &[10]);
//!
//! // One Jacobian, a batch of ellipticities
//! let jac = array![[2.0, 0.0], [0.0, 1.0]];
//! let eps = array![Complex64::new(0.0, 0.0), Complex64::new(0.2, 0.1)];
//! let out = transform(&jac, &eps).unwrap();
//! assert_eq!(out.shape(), &[2]);
//!
//! // No ellipticity at all: the shear induced by the Jacobian alone
//! let out = transform(&jac, Ellipticity::Zero).unwrap();
//! assert!((out[[]].re - 1.0 / 3.0).abs() < 1e-15);
//! ```

use ndarray::{
    Array, ArrayBase, ArrayD, ArrayView, ArrayViewD, Axis, CowArray, Data, Dimension, IxDyn, Zip,
};
use num_complex::Complex;
use num_traits::Float;
use tracing::trace;

use crate::error::{Result, ShapeError};
use crate::field::Scalar;
use crate::util::{broadcast_shapes, jacobian_batch_shape, shear_ratio};

/// A 2x2 Jacobian matrix of a local coordinate transformation.
///
/// Stored row-major, so `Jacobian::new([[a, b], [c, d]])` maps `(u, v)` to
/// `(a u + b v, c u + d v)`. The matrix may be singular; the kernels then
/// return NaN or infinite values rather than failing.
///
/// # Examples
///
/// ```
/// use cosmicshear::Jacobian;
/// use num_complex::Complex64;
///
/// // Stretch the first axis by a factor of two
/// let jac = Jacobian::<f64>::new([[2.0, 0.0], [0.0, 1.0]]);
///
/// // A round source becomes elliptical
/// let eps = jac.transform(None);
/// assert!((eps.re - 1.0 / 3.0).abs() < 1e-15);
///
/// // ... and going back undoes it
/// let back = jac.inverse_transform(Some(eps));
/// assert!(back.norm() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jacobian<T = f64>([[T; 2]; 2]);

impl<T> Jacobian<T> {
    /// Creates a Jacobian from its rows.
    pub const fn new(rows: [[T; 2]; 2]) -> Self {
        Self(rows)
    }

    /// Returns the rows of the matrix.
    pub fn into_inner(self) -> [[T; 2]; 2] {
        self.0
    }
}

impl<T: Copy> Jacobian<T> {
    /// Returns the entry at `row`, `col`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is greater than 1.
    pub const fn get(&self, row: usize, col: usize) -> T {
        self.0[row][col]
    }
}

impl<T> From<[[T; 2]; 2]> for Jacobian<T> {
    fn from(rows: [[T; 2]; 2]) -> Self {
        Self(rows)
    }
}

impl<T: Float> Jacobian<T> {
    /// The identity map, which leaves every ellipticity unchanged.
    pub fn identity() -> Self {
        let (zero, one) = (T::zero(), T::one());
        Self([[one, zero], [zero, one]])
    }

    /// Transform the epsilon-ellipticity `eps` through this Jacobian.
    ///
    /// `None` stands for a round source and gives the ellipticity induced
    /// by the anisotropy of the Jacobian alone.
    pub fn transform(&self, eps: Option<Complex<T>>) -> Complex<T> {
        let [[a, b], [c, d]] = match eps {
            Some(eps) => self.sheared_right(eps).0,
            None => self.0,
        };

        let x = Complex::new(a + d, c - b);
        let y = Complex::new(a - d, c + b);

        shear_ratio(x, y)
    }

    /// Transform `eps` through the inverse of this Jacobian.
    ///
    /// Equivalent to `transform` on the inverse matrix, but the inverse is
    /// never formed, so nothing is divided by the determinant.
    pub fn inverse_transform(&self, eps: Option<Complex<T>>) -> Complex<T> {
        let [[a, b], [c, d]] = match eps {
            Some(eps) => self.sheared_left(eps).0,
            None => self.0,
        };

        let x = Complex::new(d + a, -(c - b));
        let y = Complex::new(d - a, -(c + b));

        shear_ratio(x, y)
    }

    /// `J + J A` with `A = [[e1, e2], [e2, -e1]]`.
    fn sheared_right(&self, eps: Complex<T>) -> Self {
        let [[a, b], [c, d]] = self.0;
        let (e1, e2) = (eps.re, eps.im);

        Self([
            [a + (a * e1 + b * e2), b + (a * e2 - b * e1)],
            [c + (c * e1 + d * e2), d + (c * e2 - d * e1)],
        ])
    }

    /// `J + A J` with `A = [[-e1, -e2], [-e2, e1]]`.
    fn sheared_left(&self, eps: Complex<T>) -> Self {
        let [[a, b], [c, d]] = self.0;
        let (e1, e2) = (eps.re, eps.im);

        Self([
            [a + (-e1 * a - e2 * c), b + (-e1 * b - e2 * d)],
            [c + (-e2 * a + e1 * c), d + (-e2 * b + e1 * d)],
        ])
    }
}

/// The ellipticity argument of [`transform`] and [`inverse_transform`].
///
/// Usually built implicitly through one of the `From` conversions: pass a
/// [`Complex`] value, an `Option<Complex<T>>`, or an array (owned, view or
/// reference) of complex values. [`Ellipticity::Zero`] is the omitted
/// argument.
#[derive(Debug, Clone, Default)]
pub enum Ellipticity<'a, T> {
    /// No ellipticity given; the Jacobian is used as is.
    #[default]
    Zero,
    /// A single ellipticity, broadcast over all Jacobians.
    Scalar(Complex<T>),
    /// A batch of ellipticities, broadcast against the Jacobian batch.
    Batch(CowArray<'a, Complex<T>, IxDyn>),
}

impl<T: Float> Ellipticity<'_, T> {
    /// A purely real ellipticity, i.e. `value + 0i`.
    pub fn real(value: T) -> Self {
        Self::Scalar(Complex::new(value, T::zero()))
    }
}

impl<T> Ellipticity<'_, T> {
    /// The batch shape of the argument; empty unless it is a [`Ellipticity::Batch`].
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Batch(batch) => batch.shape(),
            Self::Zero | Self::Scalar(_) => &[],
        }
    }
}

impl<T> From<Complex<T>> for Ellipticity<'_, T> {
    fn from(eps: Complex<T>) -> Self {
        Self::Scalar(eps)
    }
}

impl<T> From<Option<Complex<T>>> for Ellipticity<'_, T> {
    fn from(eps: Option<Complex<T>>) -> Self {
        eps.map_or(Self::Zero, Self::Scalar)
    }
}

impl<'a, T, S, D> From<&'a ArrayBase<S, D>> for Ellipticity<'a, T>
where
    S: Data<Elem = Complex<T>>,
    D: Dimension,
{
    fn from(eps: &'a ArrayBase<S, D>) -> Self {
        Self::Batch(CowArray::from(eps.view().into_dyn()))
    }
}

impl<'a, T, D: Dimension> From<ArrayView<'a, Complex<T>, D>> for Ellipticity<'a, T> {
    fn from(eps: ArrayView<'a, Complex<T>, D>) -> Self {
        Self::Batch(CowArray::from(eps.into_dyn()))
    }
}

impl<T, D: Dimension> From<Array<Complex<T>, D>> for Ellipticity<'_, T> {
    fn from(eps: Array<Complex<T>, D>) -> Self {
        Self::Batch(CowArray::from(eps.into_dyn()))
    }
}

/// Transform epsilon-ellipticity between coordinate systems.
///
/// Uses the Jacobian matrix `jac` of shape `(2, 2)` or a stack of them with
/// shape `(..., 2, 2)`, and transforms `eps` if given, or zero ellipticity
/// otherwise. The result has the broadcast shape of the Jacobian batch
/// dimensions and the ellipticity.
///
/// # Errors
///
/// Returns [`ShapeError::JacobianShape`] if `jac` does not end in `(2, 2)`
/// and [`ShapeError::Incompatible`] if the batch shapes do not broadcast.
///
/// # Examples
///
/// ```
/// use cosmicshear::transform;
/// use ndarray::array;
/// use num_complex::Complex64;
///
/// let identity = array![[1.0, 0.0], [0.0, 1.0]];
/// let eps = Complex64::new(0.3, -0.2);
///
/// let out = transform(&identity, eps).unwrap();
/// assert!((out[[]] - eps).norm() < 1e-15);
/// ```
pub fn transform<'e, T, S, D>(
    jac: &ArrayBase<S, D>,
    eps: impl Into<Ellipticity<'e, T>>,
) -> Result<ArrayD<Complex<T>>>
where
    T: Scalar + 'e,
    S: Data<Elem = T>,
    D: Dimension,
{
    evaluate(jac.view().into_dyn(), eps.into(), Jacobian::transform)
}

/// Inverse-transform epsilon-ellipticity between coordinate systems.
///
/// Equivalent to [`transform`] with the inverse of every Jacobian, but does
/// not compute the inverse explicitly. Shapes and broadcasting follow
/// [`transform`].
///
/// # Errors
///
/// Same as [`transform`].
///
/// # Examples
///
/// ```
/// use cosmicshear::{inverse_transform, transform};
/// use ndarray::array;
/// use num_complex::Complex64;
///
/// let jac = array![[1.2, 0.3], [-0.1, 0.9]];
/// let eps = Complex64::new(0.25, 0.1);
///
/// let there = transform(&jac, eps).unwrap();
/// let back = inverse_transform(&jac, there).unwrap();
/// assert!((back[[]] - eps).norm() < 1e-12);
/// ```
pub fn inverse_transform<'e, T, S, D>(
    jac: &ArrayBase<S, D>,
    eps: impl Into<Ellipticity<'e, T>>,
) -> Result<ArrayD<Complex<T>>>
where
    T: Scalar + 'e,
    S: Data<Elem = T>,
    D: Dimension,
{
    evaluate(jac.view().into_dyn(), eps.into(), Jacobian::inverse_transform)
}

type Kernel<T> = fn(&Jacobian<T>, Option<Complex<T>>) -> Complex<T>;

macro_rules! collect {
    ($zip:expr, $f:expr) => {{
        #[cfg(feature = "rayon")]
        let out = $zip.par_map_collect($f);
        #[cfg(not(feature = "rayon"))]
        let out = $zip.map_collect($f);
        out
    }};
}

fn evaluate<T: Scalar>(
    jac: ArrayViewD<'_, T>,
    eps: Ellipticity<'_, T>,
    kernel: Kernel<T>,
) -> Result<ArrayD<Complex<T>>> {
    let batch = jacobian_batch_shape(jac.shape())?;
    let out_shape = broadcast_shapes(batch, eps.shape())?;
    trace!(?batch, eps = ?eps.shape(), out = ?out_shape, "transforming ellipticity");

    // One view per matrix entry, each with the batch shape of `jac`
    let row = Axis(jac.ndim() - 2);
    let entry = |r: usize, c: usize| jac.clone().index_axis_move(row, r).index_axis_move(row, c);
    let (j00, j01, j10, j11) = (entry(0, 0), entry(0, 1), entry(1, 0), entry(1, 1));

    let target = IxDyn(&out_shape);
    let j00 = stretch(&j00, &target)?;
    let j01 = stretch(&j01, &target)?;
    let j10 = stretch(&j10, &target)?;
    let j11 = stretch(&j11, &target)?;

    let entries = Zip::from(&j00).and(&j01).and(&j10).and(&j11);
    let matrix = |a: T, b: T, c: T, d: T| Jacobian::new([[a, b], [c, d]]);

    let out = match eps {
        Ellipticity::Zero => {
            collect!(entries, |&a, &b, &c, &d| kernel(&matrix(a, b, c, d), None))
        }
        Ellipticity::Scalar(e) => {
            collect!(entries, |&a, &b, &c, &d| kernel(&matrix(a, b, c, d), Some(e)))
        }
        Ellipticity::Batch(batch) => {
            let eps = stretch(&batch, &target)?;
            collect!(entries.and(&eps), |&a, &b, &c, &d, &e| {
                kernel(&matrix(a, b, c, d), Some(e))
            })
        }
    };

    Ok(out)
}

fn stretch<'a, A, S>(array: &'a ArrayBase<S, IxDyn>, target: &IxDyn) -> Result<ArrayViewD<'a, A>>
where
    S: Data<Elem = A>,
{
    array
        .broadcast(target.clone())
        .ok_or_else(|| ShapeError::Incompatible {
            left: array.shape().to_vec(),
            right: target.slice().to_vec(),
        })
}
