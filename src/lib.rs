//! Cosmic shear ellipticity library
//!
//! `cosmicshear` provides the ellipticity algebra used in weak gravitational
//! lensing: converting between the two common parameterizations of an
//! elliptical shape, and carrying an ellipticity from one coordinate system
//! to another under a local linear map.
//!
//! # Core Concepts
//!
//! ## Ellipticity
//!
//! An ellipticity is a spin-2 complex number whose real and imaginary parts
//! are its two components. For semi-axes `a >= b` and position angle `theta`:
//!
//! - epsilon-ellipticity: `(a - b) / (a + b) * exp(2i theta)`
//! - chi-ellipticity: `(a² - b²) / (a² + b²) * exp(2i theta)`
//!
//! Physical values lie inside the unit disk. Nothing here assumes that:
//! out-of-range and degenerate inputs produce NaN or infinite values, never a
//! panic.
//!
//! ## Jacobians
//!
//! A coordinate transformation acts on small shapes through its 2x2
//! Jacobian matrix. [`transform`] maps an ellipticity through a Jacobian and
//! [`inverse_transform`] through its inverse, without ever forming the inverse.
//!
//! ## Scalars and batches
//!
//! Every operation works on a single value or an n-dimensional
//! [`ndarray`] batch:
//!
//! - [`chi_from_epsilon`] and [`epsilon_from_chi`] accept anything
//!   implementing [`ComplexField`] and keep the input shape.
//! - [`transform`] and [`inverse_transform`] take Jacobians of shape
//!   `(..., 2, 2)` and an [`Ellipticity`], and broadcast the batch shapes.
//! - [`Jacobian`] evaluates a single matrix without any array machinery.
//!
//! All of it is generic over the real type, so `f32`, `f64` and other
//! [`Float`] types work alike.
//!
//! # Examples
//!
//! ## Converting between forms
//!
//! ```rust
//! use cosmicshear::{chi_from_epsilon, epsilon_from_chi};
//! use num_complex::Complex64;
//!
//! let eps = Complex64::new(0.5, 0.0);
//! let chi = chi_from_epsilon(eps);
//! assert!((chi.re - 0.8).abs() < 1e-15);
//!
//! let back = epsilon_from_chi(chi);
//! assert!((back - eps).norm() < 1e-15);
//! ```
//!
//! ## Transforming a batch
//!
//! ```rust
//! use cosmicshear::{inverse_transform, transform};
//! use ndarray::Array3;
//! use num_complex::Complex64;
//!
//! // A stack of shears of increasing strength
//! let jac = Array3::from_shape_fn((5, 2, 2), |(n, i, j)| {
//!     let g = 0.05 * n as f64;
//!     match (i, j) {
//!         (0, 0) => 1.0 + g,
//!         (1, 1) => 1.0 - g,
//!         _ => 0.0,
//!     }
//! });
//!
//! let eps = Complex64::new(0.0, 0.2);
//! let sheared = transform(&jac, eps).unwrap();
//! assert_eq!(sheared.shape(), &[5]);
//!
//! // Undo the transformation element by element
//! let restored = inverse_transform(&jac, &sheared).unwrap();
//! for value in restored.iter() {
//!     assert!((value - eps).norm() < 1e-12);
//! }
//! ```
//!
//! ## Shape errors
//!
//! ```rust
//! use cosmicshear::{Ellipticity, ShapeError, transform};
//! use ndarray::Array2;
//!
//! let not_a_jacobian = Array2::<f64>::zeros((3, 3));
//! let err = transform(&not_a_jacobian, Ellipticity::Zero).unwrap_err();
//! assert!(matches!(err, ShapeError::JacobianShape { .. }));
//! ```
//!
//! # Features
//!
//! - `rayon`: evaluate batched operations in parallel. Results are identical
//!   to the serial evaluation.

pub mod conversion;
pub mod error;
pub mod field;
pub mod transform;
pub mod util;

pub use conversion::{chi_from_epsilon, epsilon_from_chi};
pub use error::{Result, ShapeError};
pub use field::{ComplexField, Scalar};
pub use num_complex::Complex;
pub use num_traits::Float;
pub use transform::{Ellipticity, Jacobian, inverse_transform, transform};
pub use util::broadcast_shapes;
