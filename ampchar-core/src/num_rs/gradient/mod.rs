use crate::{Error, Result};
use ndarray::{Array1, ArrayView1};

/// Numerical derivative of `f` with respect to the sample coordinates `x`.
///
/// Matches `numpy.gradient(f, x)` with the default `edge_order=1`: interior
/// points use second-order accurate central differences that account for
/// uneven spacing, the two end points use one-sided first differences.
///
/// # Parameters
/// * `f` : (N,) [[array_like]]([ndarray::Array1])
///   Sampled values, `N >= 2`.
/// * `x` : (N,) [[array_like]]([ndarray::Array1])
///   Sample coordinates.
///
/// Repeated coordinates produce infinite or `NaN` slopes, as in numpy.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use ampchar_core::num_rs::gradient;
///
/// let x = array![0., 1., 3., 4.];
/// let f = x.mapv(|v| v * v);
/// let g = gradient((&f).into(), (&x).into()).unwrap();
/// assert_eq!(g, array![1., 2., 6., 7.]);
/// ```
pub fn gradient(f: ArrayView1<f64>, x: ArrayView1<f64>) -> Result<Array1<f64>> {
    let n = f.len();
    if x.len() != n {
        return Err(Error::LengthMismatch {
            arg: "x",
            expected: n,
            got: x.len(),
        });
    }
    if n < 2 {
        return Err(Error::TooFewSamples {
            arg: "f",
            needed: 2,
            got: n,
        });
    }

    let mut out = Array1::zeros(n);
    out[0] = (f[1] - f[0]) / (x[1] - x[0]);
    out[n - 1] = (f[n - 1] - f[n - 2]) / (x[n - 1] - x[n - 2]);
    for i in 1..n - 1 {
        let hs = x[i] - x[i - 1];
        let hd = x[i + 1] - x[i];
        out[i] = (hs * hs * f[i + 1] + (hd * hd - hs * hs) * f[i] - hd * hd * f[i - 1])
            / (hs * hd * (hd + hs));
    }
    Ok(out)
}

#[cfg(test)]
mod numeric_gradient {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn uniform_spacing_is_central_difference() {
        let x = array![0., 0.5, 1.0, 1.5];
        let f = array![1., 2., 4., 7.];
        let g = gradient((&f).into(), (&x).into()).unwrap();
        let expected = [2., 3., 5., 6.];
        for (a, b) in g.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn uneven_spacing_is_exact_for_quadratics() {
        let x = array![0., 0.1, 0.4, 0.45, 1.0];
        let f = x.mapv(|v| 3.0 * v * v - v);
        let g = gradient((&f).into(), (&x).into()).unwrap();
        for i in 1..x.len() - 1 {
            assert_relative_eq!(g[i], 6.0 * x[i] - 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn two_samples_use_one_sided_difference() {
        let x = array![1., 3.];
        let f = array![2., 6.];
        let g = gradient((&f).into(), (&x).into()).unwrap();
        assert_eq!(g, array![2., 2.]);
    }

    #[test]
    fn rejects_short_and_mismatched_input() {
        let x = array![0.];
        let f = array![1.];
        assert!(matches!(
            gradient((&f).into(), (&x).into()),
            Err(Error::TooFewSamples { needed: 2, got: 1, .. })
        ));

        let x = array![0., 1., 2.];
        let f = array![1., 2.];
        assert!(matches!(
            gradient((&f).into(), (&x).into()),
            Err(Error::LengthMismatch { .. })
        ));
    }
}
