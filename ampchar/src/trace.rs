//! Owned `(x, y)` waveform with length validation.

use crate::kernel::MeasureError;
use crate::signal::spectral::{compute_spectrum, Spectrum};
use crate::signal::transient::{compute_transient_metrics, TransientMetrics};
use crate::signal::window_stats::{compute_window_stats, WindowStats, XWindow};

/// A sampled waveform: `y[i]` measured at `x[i]`, `x` non-decreasing.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trace {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Trace {
    /// Pair `x` and `y`, rejecting different lengths.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, MeasureError> {
        if x.len() != y.len() {
            return Err(MeasureError::LengthMismatch {
                arg: "y",
                expected: x.len(),
                got: y.len(),
            });
        }
        Ok(Self { x, y })
    }

    /// Independent variable (time or frequency).
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Dependent variable.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the trace holds no samples.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Split back into `(x, y)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.x, self.y)
    }

    /// The samples whose `x` lies inside `window` (bounds in either order).
    pub fn select(&self, window: (f64, f64)) -> Trace {
        let window = XWindow::from(window).normalized();
        let (x, y) = window.select(&self.x).map(|i| (self.x[i], self.y[i])).unzip();
        Trace { x, y }
    }

    /// See [`compute_window_stats`].
    pub fn window_stats(&self, window: (f64, f64)) -> Result<WindowStats<f64>, MeasureError> {
        compute_window_stats(&self.x, &self.y, window)
    }

    /// See [`compute_transient_metrics`].
    pub fn transient_metrics(&self) -> Result<TransientMetrics, MeasureError> {
        compute_transient_metrics(&self.x, &self.y)
    }

    /// See [`compute_spectrum`].
    pub fn spectrum(&self, band: (f64, f64)) -> Result<Spectrum, MeasureError> {
        compute_spectrum(&self.x, &self.y, band)
    }
}
