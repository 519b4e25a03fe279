//! Linear resampling of irregularly sampled traces onto a uniform time grid.
//!
//! Simulator output uses adaptive time steps; spectral analysis needs a fixed
//! sample interval. The grid spans `[time[0], time[n - 1]]` and values are
//! linearly interpolated onto it.

use crate::kernel::{read_paired, write_exact, ConfigError, KernelLifecycle, MeasureError, Read1D, Write1D};
use crate::signal::traits::Resample1D;
use ampchar_core::num_rs::{interp, linspace};
use ndarray::{Array1, ArrayView1};

/// Constructor config for [`ResampleKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResampleConfig {
    /// Output sample count; `None` keeps the input count.
    pub target_len: Option<usize>,
}

/// Trait-first uniform-grid resampling kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleKernel {
    target_len: Option<usize>,
}

impl ResampleKernel {
    /// Number of output samples for an input of `input_len` samples.
    pub fn output_len(&self, input_len: usize) -> usize {
        self.target_len.unwrap_or(input_len)
    }
}

impl KernelLifecycle for ResampleKernel {
    type Config = ResampleConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.target_len == Some(0) {
            return Err(ConfigError::InvalidArgument {
                arg: "target_len",
                reason: "target length must be > 0",
            });
        }
        Ok(Self {
            target_len: config.target_len,
        })
    }
}

impl Resample1D for ResampleKernel {
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
        OV: Write1D<f64> + ?Sized,
    {
        let (time, values) = read_paired(time, values, "values")?;
        let expected = self.output_len(time.len());
        let out_time = write_exact(out_time, "out_time", expected)?;
        let out_values = write_exact(out_values, "out_values", expected)?;
        let (grid, resampled) = resample_impl(time, values, expected)?;
        for (dst, src) in out_time.iter_mut().zip(grid.iter()) {
            *dst = *src;
        }
        for (dst, src) in out_values.iter_mut().zip(resampled.iter()) {
            *dst = *src;
        }
        Ok(())
    }

    fn run_alloc<X, Y>(&self, time: &X, values: &Y) -> Result<(Vec<f64>, Vec<f64>), MeasureError>
    where
        X: Read1D<f64> + ?Sized,
        Y: Read1D<f64> + ?Sized,
    {
        let (time, values) = read_paired(time, values, "values")?;
        let (grid, resampled) = resample_impl(time, values, self.output_len(time.len()))?;
        Ok((grid.to_vec(), resampled.to_vec()))
    }
}

pub(crate) fn resample_impl(
    time: &[f64],
    values: &[f64],
    n: usize,
) -> Result<(Array1<f64>, Array1<f64>), MeasureError> {
    let (Some(&t0), Some(&t_end)) = (time.first(), time.last()) else {
        return Err(MeasureError::InsufficientSamples {
            arg: "time",
            needed: 1,
            got: 0,
        });
    };
    let grid = linspace(t0, t_end, n);
    let resampled = interp(grid.view(), ArrayView1::from(time), ArrayView1::from(values))?;
    Ok((grid, resampled))
}

/// Resample `(time, values)` onto a uniform grid with the same sample count.
///
/// ```
/// use ampchar::signal::resample::resample_uniform;
///
/// let (t, v) = resample_uniform(&[0.0, 0.5, 2.0], &[0.0, 1.0, 4.0]).unwrap();
/// assert_eq!(t, vec![0.0, 1.0, 2.0]);
/// assert_eq!(v, vec![0.0, 2.0, 4.0]);
/// ```
pub fn resample_uniform(time: &[f64], values: &[f64]) -> Result<(Vec<f64>, Vec<f64>), MeasureError> {
    let kernel = ResampleKernel::try_new(ResampleConfig::default())?;
    kernel.run_alloc(time, values)
}
