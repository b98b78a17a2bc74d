//! Conversions between the epsilon and chi forms of ellipticity.
//!
//! For an ellipse with semi-axes `a >= b` and position angle `theta`:
//!
//! - epsilon-ellipticity: `(a - b) / (a + b) * exp(2i theta)`
//! - chi-ellipticity: `(a² - b²) / (a² + b²) * exp(2i theta)`
//!
//! Both functions accept a single [`Complex`] value or any batch
//! implementing [`ComplexField`], and map elementwise.

use num_complex::Complex;
use num_traits::Float;

use crate::field::ComplexField;

/// Transform epsilon-ellipticity to chi-ellipticity.
///
/// Computes `chi = 2 eps / (1 + |eps|²)`. The denominator is at least one,
/// so this is defined for every finite input, including `|eps| >= 1`.
///
/// # Examples
///
/// ```
/// use cosmicshear::chi_from_epsilon;
/// use num_complex::Complex64;
///
/// let chi = chi_from_epsilon(Complex64::new(0.5, 0.0));
/// assert!((chi.re - 0.8).abs() < 1e-15);
/// assert_eq!(chi.im, 0.0);
/// ```
///
/// Batches keep their shape:
///
/// ```
/// use cosmicshear::chi_from_epsilon;
/// use ndarray::array;
/// use num_complex::Complex64;
///
/// let eps = array![[Complex64::new(0.0, 0.5)], [Complex64::new(-0.5, 0.0)]];
/// let chi = chi_from_epsilon(&eps);
/// assert_eq!(chi.shape(), &[2, 1]);
/// assert!((chi[[0, 0]].im - 0.8).abs() < 1e-15);
/// ```
pub fn chi_from_epsilon<E: ComplexField>(eps: E) -> E::Output {
    eps.map_complex(chi_of::<E::Real>)
}

/// Transform chi-ellipticity to epsilon-ellipticity.
///
/// Computes `eps = chi / (1 + sqrt(1 - |chi|²))`. For `|chi| > 1` the
/// square root has a negative argument and the element becomes NaN;
/// nothing panics and the other elements of a batch are unaffected.
///
/// # Examples
///
/// ```
/// use cosmicshear::epsilon_from_chi;
/// use num_complex::Complex64;
///
/// let eps = epsilon_from_chi(Complex64::new(0.8, 0.0));
/// assert!((eps.re - 0.5).abs() < 1e-15);
///
/// let bad = epsilon_from_chi(Complex64::new(1.01, 0.0));
/// assert!(bad.re.is_nan());
/// ```
pub fn epsilon_from_chi<E: ComplexField>(chi: E) -> E::Output {
    chi.map_complex(epsilon_of::<E::Real>)
}

fn chi_of<T: Float>(eps: Complex<T>) -> Complex<T> {
    let two = T::one() + T::one();
    eps * two / (T::one() + eps.norm_sqr())
}

fn epsilon_of<T: Float>(chi: Complex<T>) -> Complex<T> {
    // Float::sqrt is NaN for negative input
    chi / (T::one() + (T::one() - chi.norm_sqr()).sqrt())
}
