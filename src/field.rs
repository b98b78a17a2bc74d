//! Scalar and batched complex values behind one elementwise interface.
//!
//! The conversions in [`crate::conversion`] are written once against
//! [`ComplexField`] and work unchanged on a single [`Complex`] value, an
//! owned [`Array`], an [`ArrayView`](ndarray::ArrayView) or a reference to
//! any of them. Batched inputs keep their shape and dimensionality type.

use ndarray::{Array, ArrayBase, Data, Dimension, Zip};
use num_complex::Complex;
use num_traits::Float;

/// Real component type usable for ellipticities and Jacobians.
///
/// Blanket-implemented for every [`Float`] that can be shared across
/// threads, which covers `f32`, `f64` and the usual decimal types.
pub trait Scalar: Float + Send + Sync {}

impl<T: Float + Send + Sync> Scalar for T {}

/// A single complex value or a batch of them.
pub trait ComplexField {
    /// Real component type.
    type Real: Scalar;

    /// Result of mapping every element; same shape as the input.
    type Output;

    /// Apply `f` to every complex element.
    fn map_complex<F>(self, f: F) -> Self::Output
    where
        F: Fn(Complex<Self::Real>) -> Complex<Self::Real> + Send + Sync;
}

impl<T: Scalar> ComplexField for Complex<T> {
    type Real = T;
    type Output = Complex<T>;

    fn map_complex<F>(self, f: F) -> Self::Output
    where
        F: Fn(Complex<T>) -> Complex<T> + Send + Sync,
    {
        f(self)
    }
}

impl<T, S, D> ComplexField for &ArrayBase<S, D>
where
    T: Scalar,
    S: Data<Elem = Complex<T>>,
    D: Dimension,
{
    type Real = T;
    type Output = Array<Complex<T>, D>;

    fn map_complex<F>(self, f: F) -> Self::Output
    where
        F: Fn(Complex<T>) -> Complex<T> + Send + Sync,
    {
        let zip = Zip::from(self);

        #[cfg(feature = "rayon")]
        let out = zip.par_map_collect(|&z| f(z));
        #[cfg(not(feature = "rayon"))]
        let out = zip.map_collect(|&z| f(z));

        out
    }
}

impl<T, S, D> ComplexField for ArrayBase<S, D>
where
    T: Scalar,
    S: Data<Elem = Complex<T>>,
    D: Dimension,
{
    type Real = T;
    type Output = Array<Complex<T>, D>;

    fn map_complex<F>(self, f: F) -> Self::Output
    where
        F: Fn(Complex<T>) -> Complex<T> + Send + Sync,
    {
        (&self).map_complex(f)
    }
}
