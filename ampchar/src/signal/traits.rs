//! Trait interfaces for the measurement capabilities.
//!
//! Each engine kernel implements one of these traits; inputs are borrowed
//! through [`Read1D`] so slices, `Vec`s and `ndarray` arrays are all accepted.

use crate::kernel::{MeasureError, Read1D, Write1D};
use crate::signal::spectral::Spectrum;
use crate::signal::transient::TransientMetrics;
use crate::signal::window_stats::WindowStats;

/// Windowed extrema capability.
pub trait WindowStats1D<T> {
    /// Compute extrema and peak-to-peak over the samples inside the kernel's window.
    fn run<X, Y>(&self, x: &X, y: &Y) -> Result<WindowStats<T>, MeasureError>
    where
        X: Read1D<T> + ?Sized,
        Y: Read1D<T> + ?Sized;
}

/// Step-response characterization capability.
pub trait TransientCharacterize1D {
    /// Compute slew rates and settling time of a rising step response.
    fn run<X, Y>(&self, time: &X, voltage: &Y) -> Result<TransientMetrics, MeasureError>
    where
        X: Read1D<f64> + ?Sized,
        Y: Read1D<f64> + ?Sized;
}

/// Uniform-grid resampling capability for irregularly sampled traces.
pub trait Resample1D {
    /// Resample into caller-provided time and value buffers.
    fn run_into<X, Y, OT, OV>(
        &self,
        time: &X,
        values: &Y,
        out_time: &mut OT,
        out_values: &mut OV,
    ) -> Result<(), MeasureError>
    where
        X: Read1D<f64> + ?Sized,
        Y: Read1D<f64> + ?Sized,
        OT: Write1D<f64> + ?Sized,
        OV: Write1D<f64> + ?Sized;

    /// Resample and allocate the `(time, values)` output.
    fn run_alloc<X, Y>(&self, time: &X, values: &Y) -> Result<(Vec<f64>, Vec<f64>), MeasureError>
    where
        X: Read1D<f64> + ?Sized,
        Y: Read1D<f64> + ?Sized;
}

/// Band-limited magnitude spectrum capability.
pub trait SpectrumAnalyze1D {
    /// Compute the spectrum into caller-provided frequency and magnitude buffers.
    ///
    /// Both buffers must have exactly the number of in-band bins.
    fn run_into<X, Y, OF, OM>(
        &self,
        time: &X,
        voltage: &Y,
        freqs: &mut OF,
        magnitude_db: &mut OM,
    ) -> Result<(), MeasureError>
    where
        X: Read1D<f64> + ?Sized,
        Y: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OM: Write1D<f64> + ?Sized;

    /// Compute the spectrum and allocate output.
    fn run_alloc<X, Y>(&self, time: &X, voltage: &Y) -> Result<Spectrum, MeasureError>
    where
        X: Read1D<f64> + ?Sized,
        Y: Read1D<f64> + ?Sized;
}
