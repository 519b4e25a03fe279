use ndarray::Array1;

/// Evenly spaced samples over the closed interval `[start, stop]`.
///
/// Like `numpy.linspace`, the last sample is exactly `stop` and a single
/// sample yields `[start]`.
///
/// ```
/// use ndarray::array;
/// use ampchar_core::num_rs::linspace;
///
/// assert_eq!(linspace(0., 1., 5), array![0., 0.25, 0.5, 0.75, 1.]);
/// assert_eq!(linspace(2., 3., 1), array![2.]);
/// ```
pub fn linspace(start: f64, stop: f64, n: usize) -> Array1<f64> {
    match n {
        0 => Array1::zeros(0),
        1 => Array1::from_elem(1, start),
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out = Array1::from_shape_fn(n, |i| start + i as f64 * step);
            out[n - 1] = stop;
            out
        }
    }
}

/// Smallest power of two that is `>= n` (`1` for `n <= 1`).
///
/// ```
/// use ampchar_core::num_rs::next_pow2;
///
/// assert_eq!(next_pow2(1000), 1024);
/// assert_eq!(next_pow2(1024), 1024);
/// assert_eq!(next_pow2(0), 1);
/// ```
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}
