//! Tapering windows applied before spectral analysis.

use core::f64::consts::PI;

/// Symmetric Hann window of length `n`, `w[i] = 0.5 - 0.5 cos(2 pi i / (n - 1))`.
///
/// Matches `numpy.hanning`: a single-sample window is `[1.0]`, the end points
/// of longer windows are zero.
///
/// ```
/// use ampchar::signal::windows::hann;
///
/// let w = hann(5);
/// assert_eq!(w.len(), 5);
/// assert!((w[2] - 1.0).abs() < 1e-15);
/// assert_eq!(w[0], 0.0);
/// ```
pub fn hann(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let nm1 = (n - 1) as f64;
            (0..n)
                .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / nm1).cos())
                .collect()
        }
    }
}

/// Apply `window` to `x` in place. Both must have the same length.
pub fn apply_window(x: &mut [f64], window: &[f64]) {
    debug_assert_eq!(x.len(), window.len());
    x.iter_mut().zip(window).for_each(|(xi, wi)| *xi *= wi);
}

/// Sum of the window coefficients, the amplitude gain seen by a bin-centred tone.
pub fn coherent_gain(window: &[f64]) -> f64 {
    window.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hann_is_symmetric_with_zero_ends() {
        let w = hann(64);
        assert_eq!(w[0], 0.0);
        assert_abs_diff_eq!(w[63], 0.0, epsilon = 1e-15);
        for i in 0..32 {
            assert_abs_diff_eq!(w[i], w[63 - i], epsilon = 1e-15);
        }
        assert!(w.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn degenerate_lengths() {
        assert!(hann(0).is_empty());
        assert_eq!(hann(1), vec![1.0]);
        assert_eq!(hann(2).len(), 2);
        assert_abs_diff_eq!(coherent_gain(&hann(2)), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn gain_is_half_of_n_minus_one() {
        for n in [3usize, 16, 1000, 1025] {
            assert_abs_diff_eq!(coherent_gain(&hann(n)), (n - 1) as f64 / 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn apply_multiplies_elementwise() {
        let mut x = vec![2.0; 5];
        apply_window(&mut x, &hann(5));
        assert_abs_diff_eq!(x[1], 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(x[2], 2.0, epsilon = 1e-15);
    }
}
