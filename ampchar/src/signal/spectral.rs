//! Band-limited magnitude spectrum of a transient trace.
//!
//! Pipeline: uniform resample, mean removal, symmetric Hann window, zero-pad
//! to the next power of two, one-sided real FFT, RMS scaling, dB conversion,
//! DC removal and band masking.

use crate::kernel::{read_paired, write_exact, ConfigError, KernelLifecycle, MeasureError, Read1D, Write1D};
use crate::signal::resample::resample_impl;
use crate::signal::traits::SpectrumAnalyze1D;
use crate::signal::window_stats::XWindow;
use crate::signal::windows::{apply_window, coherent_gain, hann};
use ampchar_core::num_rs::next_pow2;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Default analysis band in Hz, both ends inclusive.
pub const DEFAULT_BAND: (f64, f64) = (1.0e3, 200.0e6);

/// Added to every magnitude before taking the logarithm.
///
/// Machine epsilon as in numpy's `finfo(float).eps`, not the smallest positive
/// normal; silent bins therefore sit near -313 dB.
const MAGNITUDE_FLOOR: f64 = f64::EPSILON;

/// Amplitude normalization applied to FFT magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpectrumScaling {
    /// `(2 / N) / sqrt(2)` with `N` the unpadded sample count. A bin-centred
    /// 1 Vrms tone reads about -6 dB because of the Hann window gain.
    #[default]
    SampleCount,
    /// `(2 / sum(w)) / sqrt(2)`, correcting for the window gain so a bin-centred
    /// 1 Vrms tone reads 0 dB.
    CoherentGain,
}

/// Constructor config for [`SpectrumKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectrumConfig {
    /// Inclusive `(lo, hi)` frequency band in Hz.
    pub band: (f64, f64),
    /// Magnitude normalization.
    pub scaling: SpectrumScaling,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            band: DEFAULT_BAND,
            scaling: SpectrumScaling::default(),
        }
    }
}

/// One-sided magnitude spectrum restricted to a frequency band.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spectrum {
    /// Bin frequencies in Hz, ascending.
    pub frequencies: Vec<f64>,
    /// Magnitude of each bin in dB relative to 1 V RMS.
    pub magnitude_db: Vec<f64>,
}

impl Spectrum {
    /// Number of bins.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the spectrum has no bins.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// `(frequency, magnitude_db)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitude_db.iter().copied())
    }

    /// The strongest bin as `(frequency, magnitude_db)`, ignoring `NaN`.
    ///
    /// Ties resolve to the lowest frequency.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.iter()
            .filter(|(_, m)| !m.is_nan())
            .fold(None, |best: Option<(f64, f64)>, bin| match best {
                Some(b) if b.1 >= bin.1 => Some(b),
                _ => Some(bin),
            })
    }
}

/// Trait-first spectral analysis kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumKernel {
    band: (f64, f64),
    scaling: SpectrumScaling,
}

impl SpectrumKernel {
    /// The configured analysis band.
    pub fn band(&self) -> (f64, f64) {
        self.band
    }

    fn in_band(&self, f: f64) -> bool {
        f.is_finite() && self.band.0 <= f && f <= self.band.1
    }
}

impl KernelLifecycle for SpectrumKernel {
    type Config = SpectrumConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        // An inverted band is valid here and simply selects no bins.
        let (lo, hi) = config.band;
        if lo.is_nan() || hi.is_nan() {
            return Err(ConfigError::InvalidArgument {
                arg: "band",
                reason: "band edges must not be NaN",
            });
        }
        Ok(Self {
            band: config.band,
            scaling: config.scaling,
        })
    }
}

impl SpectrumAnalyze1D for SpectrumKernel {
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
        OM: Write1D<f64> + ?Sized,
    {
        let spectrum = self.run_alloc(time, voltage)?;
        let f_out = write_exact(freqs, "freqs", spectrum.len())?;
        f_out.copy_from_slice(&spectrum.frequencies);
        let m_out = write_exact(magnitude_db, "magnitude_db", spectrum.len())?;
        m_out.copy_from_slice(&spectrum.magnitude_db);
        Ok(())
    }

    fn run_alloc<X, Y>(&self, time: &X, voltage: &Y) -> Result<Spectrum, MeasureError>
    where
        X: Read1D<f64> + ?Sized,
        Y: Read1D<f64> + ?Sized,
    {
        let (time, voltage) = read_paired(time, voltage, "voltage")?;
        if time.len() < 2 {
            return Err(MeasureError::InsufficientSamples {
                arg: "time",
                needed: 2,
                got: time.len(),
            });
        }
        self.spectrum_impl(time, voltage)
    }
}

impl SpectrumKernel {
    fn spectrum_impl(&self, time: &[f64], voltage: &[f64]) -> Result<Spectrum, MeasureError> {
        let n = time.len();
        let (grid, uniform) = resample_impl(time, voltage, n)?;
        let dt = (grid[n - 1] - grid[0]) / (n - 1) as f64;

        let mean = uniform.sum() / n as f64;
        let mut samples: Vec<f64> = uniform.iter().map(|v| v - mean).collect();
        let window = hann(n);
        apply_window(&mut samples, &window);

        let nfft = next_pow2(n);
        let spectrum = rfft_real(&samples, nfft);

        let norm = match self.scaling {
            SpectrumScaling::SampleCount => n as f64,
            // A two-sample Hann window is all zeros.
            SpectrumScaling::CoherentGain => match coherent_gain(&window) {
                g if g > 0.0 => g,
                _ => n as f64,
            },
        };
        let scale = (2.0 / norm) / core::f64::consts::SQRT_2;
        let bin_width = 1.0 / (nfft as f64 * dt);

        let mut out = Spectrum::default();
        for (k, bin) in spectrum.iter().enumerate().skip(1) {
            let f = k as f64 * bin_width;
            if self.in_band(f) {
                out.frequencies.push(f);
                out.magnitude_db
                    .push(20.0 * (bin.norm() * scale + MAGNITUDE_FLOOR).log10());
            }
        }
        log::debug!(
            "spectrum: n={n}, nfft={nfft}, dt={dt:e} s, {} of {} bins in band [{:e}, {:e}] Hz",
            out.len(),
            spectrum.len() - 1,
            self.band.0,
            self.band.1
        );

        if out.is_empty() {
            return Err(MeasureError::OutOfBand {
                lo: self.band.0,
                hi: self.band.1,
            });
        }
        Ok(out)
    }
}

/// One-sided FFT of `x` zero-padded to `nfft`; returns bins `0..=nfft / 2`.
fn rfft_real(x: &[f64], nfft: usize) -> Vec<Complex<f64>> {
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nfft);
    let mut buf = vec![Complex::new(0.0, 0.0); nfft];
    for (dst, src) in buf.iter_mut().zip(x.iter().copied()) {
        *dst = Complex::new(src, 0.0);
    }
    fft.process(&mut buf);
    buf.truncate(nfft / 2 + 1);
    buf
}

/// Magnitude spectrum of `(time, voltage)` restricted to the inclusive `band`.
///
/// The trace may be irregularly sampled; it is resampled onto a uniform grid
/// with the same number of samples first.
///
/// Magnitudes use [`SpectrumScaling::SampleCount`], so a bin-centred 1 V RMS
/// tone peaks near -6 dB. Build a [`SpectrumKernel`] with
/// [`SpectrumScaling::CoherentGain`] to read the same tone near 0 dB.
///
/// An inverted `band` selects nothing and fails with
/// [`MeasureError::OutOfBand`].
///
/// ```
/// use ampchar::signal::spectral::{compute_spectrum, DEFAULT_BAND};
///
/// let t: Vec<f64> = (0..1024).map(|i| i as f64 * 1e-8).collect();
/// let v: Vec<f64> = t
///     .iter()
///     .map(|&ti| (2.0 * std::f64::consts::PI * 4.00390625e6 * ti).sin())
///     .collect();
/// let spectrum = compute_spectrum(&t, &v, DEFAULT_BAND).unwrap();
/// let (f_peak, _) = spectrum.peak().unwrap();
/// assert!((f_peak - 4.00390625e6).abs() < 1.0);
/// ```
pub fn compute_spectrum(
    time: &[f64],
    voltage: &[f64],
    band: (f64, f64),
) -> Result<Spectrum, MeasureError> {
    let kernel = SpectrumKernel::try_new(SpectrumConfig {
        band,
        ..SpectrumConfig::default()
    })?;
    kernel.run_alloc(time, voltage)
}

/// Spectrum of the part of the trace whose time lies inside `window`.
///
/// Bounds may be given in either order. A window holding no samples is an
/// [`MeasureError::EmptySelection`].
pub fn spectrum_in_window(
    time: &[f64],
    voltage: &[f64],
    window: (f64, f64),
    config: SpectrumConfig,
) -> Result<Spectrum, MeasureError> {
    let (time, voltage) = read_paired(time, voltage, "voltage")?;
    let window = XWindow::from(window).normalized();
    let (t, v): (Vec<f64>, Vec<f64>) = window.select(time).map(|i| (time[i], voltage[i])).unzip();
    if t.is_empty() {
        return Err(MeasureError::EmptySelection {
            lo: window.lo,
            hi: window.hi,
        });
    }
    SpectrumKernel::try_new(config)?.run_alloc(&t, &v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use core::f64::consts::{PI, SQRT_2};

    const N: usize = 1024;
    const DT: f64 = 1e-8;
    // Bin 41 of a 1024-point FFT at 100 MS/s.
    const TONE_HZ: f64 = 41.0 / (N as f64 * DT);

    fn rms_tone(n: usize, dt: f64, freq: f64, offset: f64) -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        let v = t
            .iter()
            .map(|&ti| offset + SQRT_2 * (2.0 * PI * freq * ti).sin())
            .collect();
        (t, v)
    }

    #[test]
    fn tone_peak_frequency_and_level() {
        let (t, v) = rms_tone(N, DT, TONE_HZ, 0.0);
        let spectrum = compute_spectrum(&t, &v, DEFAULT_BAND).expect("spectrum");
        let (f_peak, db_peak) = spectrum.peak().expect("peak");
        assert_relative_eq!(f_peak, TONE_HZ, max_relative = 1e-9);
        // The Hann window halves the amplitude of a bin-centred tone.
        assert_abs_diff_eq!(db_peak, 20.0 * 0.5f64.log10(), epsilon = 0.1);
    }

    #[test]
    fn coherent_gain_scaling_reads_zero_db() {
        let (t, v) = rms_tone(N, DT, TONE_HZ, 0.0);
        let kernel = SpectrumKernel::try_new(SpectrumConfig {
            scaling: SpectrumScaling::CoherentGain,
            ..SpectrumConfig::default()
        })
        .expect("kernel");
        let (_, db_peak) = kernel.run_alloc(&t, &v).expect("spectrum").peak().expect("peak");
        assert_abs_diff_eq!(db_peak, 0.0, epsilon = 0.1);
    }

    #[test]
    fn bins_are_ascending_in_band_and_exclude_dc() {
        let (t, v) = rms_tone(N, DT, TONE_HZ, 0.0);
        let spectrum = compute_spectrum(&t, &v, DEFAULT_BAND).expect("spectrum");
        assert_eq!(spectrum.len(), N / 2);
        assert_eq!(spectrum.magnitude_db.len(), spectrum.frequencies.len());
        assert!(spectrum.frequencies[0] > 0.0);
        assert!(spectrum.frequencies.windows(2).all(|w| w[1] > w[0]));
        assert!(spectrum
            .frequencies
            .iter()
            .all(|&f| (DEFAULT_BAND.0..=DEFAULT_BAND.1).contains(&f)));
        assert_relative_eq!(spectrum.frequencies[0], 1.0 / (N as f64 * DT), max_relative = 1e-9);
    }

    #[test]
    fn band_edges_are_inclusive() {
        let (t, v) = rms_tone(N, DT, TONE_HZ, 0.0);
        let full = compute_spectrum(&t, &v, DEFAULT_BAND).expect("spectrum");
        let f3 = full.frequencies[3];
        let single = compute_spectrum(&t, &v, (f3, f3)).expect("one bin");
        assert_eq!(single.frequencies, vec![f3]);
        assert_eq!(single.magnitude_db[0], full.magnitude_db[3]);
    }

    #[test]
    fn dc_offset_is_removed() {
        let (t, _) = rms_tone(256, DT, TONE_HZ, 0.0);
        let v = vec![3.3; t.len()];
        let spectrum = compute_spectrum(&t, &v, DEFAULT_BAND).expect("spectrum");
        assert!(spectrum.magnitude_db.iter().all(|&m| m < -250.0));
    }

    #[test]
    fn silent_trace_sits_at_epsilon_floor() {
        let (t, _) = rms_tone(256, DT, TONE_HZ, 0.0);
        let v = vec![0.0; t.len()];
        let spectrum = compute_spectrum(&t, &v, DEFAULT_BAND).expect("spectrum");
        let floor = 20.0 * f64::EPSILON.log10();
        assert!(spectrum.magnitude_db.iter().all(|&m| m == floor));
        assert_abs_diff_eq!(floor, -313.07, epsilon = 0.01);
    }

    #[test]
    fn irregular_sampling_is_resampled() {
        let (mut t, _) = rms_tone(N, DT, TONE_HZ, 0.0);
        for (i, ti) in t.iter_mut().enumerate().skip(1).take(N - 2) {
            *ti += if i % 2 == 0 { 0.2 * DT } else { -0.2 * DT };
        }
        let v: Vec<f64> = t
            .iter()
            .map(|&ti| SQRT_2 * (2.0 * PI * TONE_HZ * ti).sin())
            .collect();
        let (f_peak, _) = compute_spectrum(&t, &v, DEFAULT_BAND)
            .expect("spectrum")
            .peak()
            .expect("peak");
        assert_relative_eq!(f_peak, TONE_HZ, max_relative = 1e-9);
    }

    #[test]
    fn non_power_of_two_length_is_zero_padded() {
        let (t, v) = rms_tone(1000, DT, 5.0e6, 0.0);
        let spectrum = compute_spectrum(&t, &v, (0.0, f64::INFINITY)).expect("spectrum");
        assert_eq!(spectrum.len(), 512);
        let (f_peak, _) = spectrum.peak().expect("peak");
        let bin_width = spectrum.frequencies[0];
        assert!((f_peak - 5.0e6).abs() <= bin_width);
    }

    #[test]
    fn band_above_nyquist_is_out_of_band() {
        let (t, v) = rms_tone(N, DT, TONE_HZ, 0.0);
        let err = compute_spectrum(&t, &v, (1.0e9, 2.0e9)).expect_err("out of band");
        assert_eq!(err, MeasureError::OutOfBand { lo: 1.0e9, hi: 2.0e9 });
    }

    #[test]
    fn inverted_band_is_out_of_band() {
        let (t, v) = rms_tone(N, DT, TONE_HZ, 0.0);
        let err = compute_spectrum(&t, &v, (200.0e6, 1.0e3)).expect_err("inverted band");
        assert_eq!(err, MeasureError::OutOfBand { lo: 200.0e6, hi: 1.0e3 });
    }

    #[test]
    fn negative_lower_edge_masks_normally() {
        let (t, v) = rms_tone(N, DT, TONE_HZ, 0.0);
        let from_zero = compute_spectrum(&t, &v, (0.0, 200.0e6)).expect("from zero");
        let from_negative = compute_spectrum(&t, &v, (-1.0, 200.0e6)).expect("from negative");
        assert_eq!(from_negative, from_zero);
    }

    #[test]
    fn nan_band_edge_is_rejected() {
        let err = SpectrumKernel::try_new(SpectrumConfig {
            band: (f64::NAN, 1.0e6),
            ..SpectrumConfig::default()
        })
        .expect_err("nan edge");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "band", .. }));
    }

    #[test]
    fn too_few_samples() {
        let err = compute_spectrum(&[0.0], &[1.0], DEFAULT_BAND).expect_err("one sample");
        assert_eq!(
            err,
            MeasureError::InsufficientSamples {
                arg: "time",
                needed: 2,
                got: 1
            }
        );
    }

    #[test]
    fn run_into_matches_run_alloc() {
        let (t, v) = rms_tone(N, DT, TONE_HZ, 0.0);
        let kernel = SpectrumKernel::try_new(SpectrumConfig::default()).expect("kernel");
        let expected = kernel.run_alloc(&t, &v).expect("alloc");

        let mut freqs = vec![0.0; expected.len()];
        let mut mags = vec![0.0; expected.len()];
        kernel.run_into(&t, &v, &mut freqs, &mut mags).expect("into");
        assert_eq!(freqs, expected.frequencies);
        assert_eq!(mags, expected.magnitude_db);

        let mut short = vec![0.0; 3];
        let err = kernel
            .run_into(&t, &v, &mut short, &mut mags)
            .expect_err("short buffer");
        assert!(matches!(err, MeasureError::LengthMismatch { arg: "freqs", .. }));
    }

    #[test]
    fn windowed_spectrum_uses_selected_samples_only() {
        let (t, v) = rms_tone(2 * N, DT, TONE_HZ, 0.0);
        let lo = t[N];
        let hi = t[2 * N - 1];
        let zoomed = spectrum_in_window(&t, &v, (hi, lo), SpectrumConfig::default()).expect("zoomed");
        let direct = compute_spectrum(&t[N..], &v[N..], DEFAULT_BAND).expect("direct");
        assert_eq!(zoomed, direct);

        let err = spectrum_in_window(&t, &v, (1.0, 2.0), SpectrumConfig::default())
            .expect_err("outside");
        assert_eq!(err, MeasureError::EmptySelection { lo: 1.0, hi: 2.0 });
    }

    #[test]
    fn peak_skips_nan_and_prefers_lowest_frequency() {
        let spectrum = Spectrum {
            frequencies: vec![1.0, 2.0, 3.0, 4.0],
            magnitude_db: vec![f64::NAN, -3.0, -1.0, -1.0],
        };
        assert_eq!(spectrum.peak(), Some((3.0, -1.0)));
        assert_eq!(Spectrum::default().peak(), None);
    }
}
