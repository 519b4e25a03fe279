//! Extrema and peak-to-peak amplitude of a trace inside an x-window.

use crate::kernel::{read_paired, ConfigError, KernelLifecycle, MeasureError, Read1D};
use crate::signal::traits::WindowStats1D;
use num_traits::Float;

/// Closed interval `[lo, hi]` over the independent variable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XWindow<F> {
    /// Lower bound.
    pub lo: F,
    /// Upper bound.
    pub hi: F,
}

impl<F> XWindow<F>
where
    F: Float,
{
    /// Window with bounds in either order.
    pub fn new(lo: F, hi: F) -> Self {
        Self { lo, hi }
    }

    /// Swap the bounds if needed so that `lo <= hi`.
    pub fn normalized(self) -> Self {
        if self.lo > self.hi {
            Self {
                lo: self.hi,
                hi: self.lo,
            }
        } else {
            self
        }
    }

    /// Whether `x` lies inside the window, both ends inclusive.
    pub fn contains(&self, x: F) -> bool {
        self.lo <= x && x <= self.hi
    }

    /// Indices of the samples of `x` inside the window, in order.
    pub fn select<'a>(&'a self, x: &'a [F]) -> impl Iterator<Item = usize> + 'a {
        x.iter()
            .enumerate()
            .filter(move |(_, xi)| self.contains(**xi))
            .map(|(i, _)| i)
    }
}

impl<F> From<(F, F)> for XWindow<F> {
    fn from((lo, hi): (F, F)) -> Self {
        Self { lo, hi }
    }
}

/// Extrema found inside a window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowStats<F> {
    /// `v_max - v_min`.
    pub peak_to_peak: F,
    /// x-location of the maximum.
    pub t_max: F,
    /// Maximum value.
    pub v_max: F,
    /// x-location of the minimum.
    pub t_min: F,
    /// Minimum value.
    pub v_min: F,
}

impl<F: Copy> WindowStats<F> {
    /// `(vpp, t_max, v_max, t_min, v_min)`.
    pub fn as_tuple(&self) -> (F, F, F, F, F) {
        (
            self.peak_to_peak,
            self.t_max,
            self.v_max,
            self.t_min,
            self.v_min,
        )
    }
}

/// Constructor config for [`WindowStatsKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowStatsConfig<F> {
    /// Window to measure in; bounds may be given in either order.
    pub window: XWindow<F>,
}

/// Trait-first window statistics kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStatsKernel<F> {
    window: XWindow<F>,
}

impl<F: Float> WindowStatsKernel<F> {
    /// The normalized window this kernel measures in.
    pub fn window(&self) -> XWindow<F> {
        self.window
    }
}

impl<F> KernelLifecycle for WindowStatsKernel<F>
where
    F: Float,
{
    type Config = WindowStatsConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            window: config.window.normalized(),
        })
    }
}

impl<F> WindowStats1D<F> for WindowStatsKernel<F>
where
    F: Float,
{
    fn run<X, Y>(&self, x: &X, y: &Y) -> Result<WindowStats<F>, MeasureError>
    where
        X: Read1D<F> + ?Sized,
        Y: Read1D<F> + ?Sized,
    {
        let (x, y) = read_paired(x, y, "y")?;
        window_stats_impl(x, y, self.window)
    }
}

// NaN samples win the extremum search like numpy's argmax/argmin.
fn beats<F: Float>(candidate: F, current: F, better: impl Fn(F, F) -> bool) -> bool {
    (candidate.is_nan() && !current.is_nan()) || better(candidate, current)
}

fn window_stats_impl<F: Float>(
    x: &[F],
    y: &[F],
    window: XWindow<F>,
) -> Result<WindowStats<F>, MeasureError> {
    let mut extrema: Option<(usize, usize)> = None;
    for i in window.select(x) {
        extrema = Some(match extrema {
            None => (i, i),
            Some((imax, imin)) => (
                if beats(y[i], y[imax], |a, b| a > b) { i } else { imax },
                if beats(y[i], y[imin], |a, b| a < b) { i } else { imin },
            ),
        });
    }

    let (imax, imin) = extrema.ok_or_else(|| MeasureError::EmptySelection {
        lo: window.lo.to_f64().unwrap_or(f64::NAN),
        hi: window.hi.to_f64().unwrap_or(f64::NAN),
    })?;
    log::trace!("window stats: max at index {imax}, min at index {imin}");

    Ok(WindowStats {
        peak_to_peak: y[imax] - y[imin],
        t_max: x[imax],
        v_max: y[imax],
        t_min: x[imin],
        v_min: y[imin],
    })
}

/// Peak-to-peak amplitude and extrema locations inside `window`.
///
/// The window bounds may be given in either order. Ties resolve to the
/// lowest-index sample.
///
/// ```
/// use ampchar::signal::window_stats::compute_window_stats;
///
/// let t = [0.0, 1.0, 2.0, 3.0, 4.0];
/// let v = [0.0, 1.0, 0.0, -1.0, 0.5];
/// let stats = compute_window_stats(&t, &v, (0.0, 4.0)).unwrap();
/// assert_eq!(stats.as_tuple(), (2.0, 1.0, 1.0, 3.0, -1.0));
/// ```
pub fn compute_window_stats<F: Float>(
    x: &[F],
    y: &[F],
    window: (F, F),
) -> Result<WindowStats<F>, MeasureError> {
    let kernel = WindowStatsKernel::try_new(WindowStatsConfig {
        window: window.into(),
    })?;
    kernel.run(x, y)
}
