//! Batched transforms checked against the second-moment definition of shear.

use approx::assert_abs_diff_eq;
use cosmicshear::{
    Ellipticity, ShapeError, chi_from_epsilon, epsilon_from_chi, inverse_transform, transform,
};
use ndarray::{Array, Array1, Array2, Array3, ArrayView2, Axis, array};
use num_complex::Complex64;

const SIZE: usize = 200;

/// Deterministic, well-conditioned Jacobians with both orientations.
fn jacobians() -> Array3<f64> {
    let mut jac = Array3::zeros((SIZE, 2, 2));
    for (n, mut m) in jac.axis_iter_mut(Axis(0)).enumerate() {
        let t = n as f64;
        let (theta, phi) = (0.37 * t, -1.3 * t);
        let s1 = 0.5 + (0.11 * t).sin().abs() * 1.5;
        let s2 = (0.5 + (0.07 * t).cos().abs() * 1.5) * if n % 3 == 0 { -1.0 } else { 1.0 };

        let rot = |a: f64| array![[a.cos(), -a.sin()], [a.sin(), a.cos()]];
        let scale = array![[s1, 0.0], [0.0, s2]];
        m.assign(&rot(theta).dot(&scale).dot(&rot(phi)));
    }
    jac
}

fn ellipticities() -> Array1<Complex64> {
    (0..SIZE)
        .map(|n| Complex64::from_polar((n as f64 / SIZE as f64) * 0.95, 2.1 * n as f64))
        .collect()
}

/// Transform through the second-moment matrix: Q' = J Q Jᵀ.
fn reference(jac: ArrayView2<f64>, eps: Complex64) -> Complex64 {
    let chi = chi_from_epsilon(eps);
    let q = array![[1.0 + chi.re, chi.im], [chi.im, 1.0 - chi.re]];
    let q = jac.dot(&q).dot(&jac.t());

    let chi = Complex64::new(q[[0, 0]] - q[[1, 1]], 2.0 * q[[0, 1]]) / (q[[0, 0]] + q[[1, 1]]);
    epsilon_from_chi(chi)
}

fn inverse(jac: ArrayView2<f64>) -> Array2<f64> {
    let det = jac[[0, 0]] * jac[[1, 1]] - jac[[0, 1]] * jac[[1, 0]];
    array![[jac[[1, 1]], -jac[[0, 1]]], [-jac[[1, 0]], jac[[0, 0]]]] / det
}

fn assert_close(actual: Complex64, expected: Complex64) {
    assert_abs_diff_eq!(actual.re, expected.re, epsilon = 1e-10);
    assert_abs_diff_eq!(actual.im, expected.im, epsilon = 1e-10);
}

#[test]
fn test_transform_zero() {
    let jac = jacobians();
    let out = transform(&jac, Ellipticity::Zero).unwrap();

    let zero = Complex64::new(0.0, 0.0);
    for (m, value) in jac.outer_iter().zip(out.iter()) {
        assert_close(*value, reference(m, zero));
    }
}

#[test]
fn test_transform() {
    let jac = jacobians();
    let eps = ellipticities();
    let out = transform(&jac, &eps).unwrap();

    for ((m, e), value) in jac.outer_iter().zip(eps.iter()).zip(out.iter()) {
        assert_close(*value, reference(m, *e));
    }
}

#[test]
fn test_transform_scalar() {
    let jac = jacobians();
    let out = transform(&jac, Ellipticity::real(0.1)).unwrap();

    let eps = Complex64::new(0.1, 0.0);
    for (m, value) in jac.outer_iter().zip(out.iter()) {
        assert_close(*value, reference(m, eps));
    }
}

#[test]
fn test_inverse_transform_zero() {
    let jac = jacobians();
    let out = inverse_transform(&jac, Ellipticity::Zero).unwrap();

    let zero = Complex64::new(0.0, 0.0);
    for (m, value) in jac.outer_iter().zip(out.iter()) {
        assert_close(*value, reference(inverse(m).view(), zero));
    }
}

#[test]
fn test_inverse_transform() {
    let jac = jacobians();
    let eps = ellipticities();
    let out = inverse_transform(&jac, eps.view()).unwrap();

    for ((m, e), value) in jac.outer_iter().zip(eps.iter()).zip(out.iter()) {
        assert_close(*value, reference(inverse(m).view(), *e));
    }
}

#[test]
fn test_transform_roundtrip_zero() {
    let jac = jacobians();
    let there = transform(&jac, Ellipticity::Zero).unwrap();
    let back = inverse_transform(&jac, there).unwrap();

    for value in back.iter() {
        assert!(value.norm() < 1e-6);
    }
}

#[test]
fn test_transform_roundtrip() {
    let jac = jacobians();
    let eps = ellipticities();
    let there = transform(&jac, &eps).unwrap();
    let back = inverse_transform(&jac, &there).unwrap();

    for (b, e) in back.iter().zip(eps.iter()) {
        assert_close(*b, *e);
    }
}

#[test]
fn test_conversions_keep_shape() {
    let eps = ellipticities().into_shape_with_order((20, 10)).unwrap();

    let chi = chi_from_epsilon(&eps);
    assert_eq!(chi.shape(), &[20, 10]);

    let back = epsilon_from_chi(chi);
    for (b, e) in back.iter().zip(eps.iter()) {
        assert_close(*b, *e);
    }
}

#[test]
fn test_nested_batches_broadcast() {
    // (SIZE, 1) Jacobians against (3,) ellipticities
    let jac = jacobians().insert_axis(Axis(1));
    let eps = array![
        Complex64::new(0.0, 0.0),
        Complex64::new(0.3, -0.1),
        Complex64::new(-0.2, 0.4)
    ];

    let out = transform(&jac, &eps).unwrap();
    assert_eq!(out.shape(), &[SIZE, 3]);

    let flat = jacobians();
    for (n, m) in flat.outer_iter().enumerate() {
        for (k, e) in eps.iter().enumerate() {
            assert_close(out[[n, k]], reference(m, *e));
        }
    }
}

#[test]
fn test_ellipticity_grid_single_jacobian() {
    let jac = array![[1.2, 0.1], [-0.3, 0.8]];
    let eps = Array::from_shape_fn((4, 5), |(i, j)| {
        Complex64::new(0.15 * i as f64 - 0.2, 0.1 * j as f64 - 0.2)
    });

    let out = inverse_transform(&jac, &eps).unwrap();
    assert_eq!(out.shape(), &[4, 5]);

    let inv = inverse(jac.view());
    for ((i, j), e) in eps.indexed_iter() {
        assert_close(out[[i, j]], reference(inv.view(), *e));
    }
}

#[test]
fn test_mismatched_batches() {
    let jac = jacobians();
    let eps = Array1::from_elem(SIZE + 1, Complex64::new(0.1, 0.1));

    let err = transform(&jac, &eps).unwrap_err();
    assert_eq!(
        err,
        ShapeError::Incompatible {
            left: vec![SIZE],
            right: vec![SIZE + 1],
        }
    );
    assert!(inverse_transform(&jac, &eps).is_err());
}

#[test]
fn test_error_messages() {
    let err = transform(&Array2::<f64>::zeros((2, 3)), Ellipticity::Zero).unwrap_err();
    assert_eq!(err.to_string(), "jacobian must have shape (..., 2, 2), got [2, 3]");
}
