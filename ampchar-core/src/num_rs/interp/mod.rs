use crate::{Error, Result};
use ndarray::{Array1, ArrayView1};

/// One-dimensional piecewise-linear interpolation with numpy's `interp` semantics.
///
/// Returns the values of the function sampled at `(xp, fp)` evaluated at each
/// point of `x`.
///
/// # Parameters
/// * `x` : (M,) [[array_like]]([ndarray::Array1])
///   Coordinates at which to evaluate.
/// * `xp` : (N,) [[array_like]]([ndarray::Array1])
///   Sample coordinates, non-decreasing.
/// * `fp` : (N,) [[array_like]]([ndarray::Array1])
///   Sample values.
///
/// Points left of `xp[0]` take `fp[0]`, points at or right of `xp[N-1]` take
/// `fp[N-1]`. A `NaN` coordinate yields `NaN`.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use ampchar_core::num_rs::interp;
///
/// let xp = array![0., 1., 2.];
/// let fp = array![0., 10., 0.];
/// let x = array![-1., 0.5, 1.5, 3.];
///
/// let y = interp((&x).into(), (&xp).into(), (&fp).into()).unwrap();
/// assert_eq!(y, array![0., 5., 5., 0.]);
/// ```
pub fn interp(x: ArrayView1<f64>, xp: ArrayView1<f64>, fp: ArrayView1<f64>) -> Result<Array1<f64>> {
    if xp.len() != fp.len() {
        return Err(Error::LengthMismatch {
            arg: "fp",
            expected: xp.len(),
            got: fp.len(),
        });
    }
    if xp.is_empty() {
        return Err(Error::TooFewSamples {
            arg: "xp",
            needed: 1,
            got: 0,
        });
    }
    Ok(x.mapv(|xi| interp_one(xi, &xp, &fp)))
}

fn interp_one(x: f64, xp: &ArrayView1<f64>, fp: &ArrayView1<f64>) -> f64 {
    let n = xp.len();
    if x.is_nan() {
        return f64::NAN;
    }
    if x < xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    // Largest j with xp[j] <= x; x < xp[n - 1] guarantees j < n - 1.
    let (mut lo, mut hi) = (0usize, n - 1);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if xp[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let slope = (fp[lo + 1] - fp[lo]) / (xp[lo + 1] - xp[lo]);
    slope * (x - xp[lo]) + fp[lo]
}

/// Interpolate on a single segment `(x0, y0) -> (x1, y1)`, clamping like [`interp`].
///
/// A degenerate segment (`x0 == x1`) evaluated at `x1` returns `y1`.
///
/// ```
/// use ampchar_core::num_rs::interp_segment;
///
/// assert_eq!(interp_segment(0.25, (0., 0.), (1., 4.)), 1.0);
/// assert_eq!(interp_segment(2.0, (2., 1.), (2., 3.)), 3.0);
/// ```
pub fn interp_segment(x: f64, (x0, y0): (f64, f64), (x1, y1): (f64, f64)) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x < x0 {
        y0
    } else if x >= x1 {
        y1
    } else {
        (y1 - y0) / (x1 - x0) * (x - x0) + y0
    }
}
