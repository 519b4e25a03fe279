//! Text summary of a measurement session.

use crate::format::format_eng;
use crate::signal::spectral::Spectrum;
use crate::signal::transient::TransientMetrics;
use crate::signal::window_stats::WindowStats;

/// Measurements collected for one simulation run.
///
/// Each part is optional; [`MeasurementReport::lines`] only renders what was
/// measured.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementReport {
    /// Extrema of the visible window.
    pub window: Option<WindowStats<f64>>,
    /// Slew rates and settling time.
    pub transient: Option<TransientMetrics>,
    /// Strongest in-band spectral bin as `(frequency_hz, magnitude_db)`.
    pub spectrum_peak: Option<(f64, f64)>,
}

impl MeasurementReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach window statistics.
    pub fn with_window(mut self, stats: WindowStats<f64>) -> Self {
        self.window = Some(stats);
        self
    }

    /// Attach transient metrics.
    pub fn with_transient(mut self, metrics: TransientMetrics) -> Self {
        self.transient = Some(metrics);
        self
    }

    /// Attach the peak of `spectrum`, if it has one.
    pub fn with_spectrum(mut self, spectrum: &Spectrum) -> Self {
        self.spectrum_peak = spectrum.peak();
        self
    }

    /// One line per measured quantity, ready for the report page.
    ///
    /// ```
    /// use ampchar::report::MeasurementReport;
    /// use ampchar::signal::window_stats::compute_window_stats;
    ///
    /// let stats = compute_window_stats(&[0.0, 1.0], &[-1.0, 1.0], (0.0, 1.0)).unwrap();
    /// let lines = MeasurementReport::new().with_window(stats).lines();
    /// assert_eq!(lines[0], "Vpp: 2.000 V");
    /// ```
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(w) = &self.window {
            lines.push(format!("Vpp: {:.3} V", w.peak_to_peak));
            lines.push(format!(
                "Vmax: {:.3} V at {}",
                w.v_max,
                format_eng(w.t_max, "s", 3)
            ));
            lines.push(format!(
                "Vmin: {:.3} V at {}",
                w.v_min,
                format_eng(w.t_min, "s", 3)
            ));
        }
        if let Some(m) = &self.transient {
            lines.push(format!("Slew rate (90-10%): {}", slew(m.slew_rate_90_10)));
            lines.push(format!("Slew rate (80-20%): {}", slew(m.slew_rate_80_20)));
            lines.push(format!("Settling time: {}", format_eng(m.settling_time, "s", 3)));
        }
        if let Some((f, db)) = self.spectrum_peak {
            lines.push(format!(
                "Spectrum peak: {db:.2} dB at {}",
                format_eng(f, "Hz", 3)
            ));
        }
        lines
    }
}

// Slew rates are quoted in V/µs.
fn slew(rate: f64) -> String {
    if rate.is_nan() {
        "N/A".to_string()
    } else {
        format!("{:.3} V/µs", rate * 1e-6)
    }
}
