//! Waveform post-processing for op-amp characterization.
//!
//! Three measurement engines operate on simulated `(time, voltage)` traces:
//!
//! * windowed extrema and peak-to-peak amplitude ([`signal::window_stats`]),
//! * 90–10 % and 80–20 % slew rates plus settling time of a rising step
//!   ([`signal::transient`]),
//! * a Hann-windowed, band-limited magnitude spectrum ([`signal::spectral`]).
//!
//! Engines are stateless kernels configured through
//! [`kernel::KernelLifecycle::try_new`]; the `compute_*` functions run them with
//! default settings.
//!
//! ```
//! use ampchar::{compute_transient_metrics, compute_window_stats};
//!
//! let t: Vec<f64> = (0..=200).map(|i| i as f64 * 1e-9).collect();
//! let v: Vec<f64> = t.iter().map(|&ti| (ti / 50e-9).min(1.0)).collect();
//!
//! let stats = compute_window_stats(&t, &v, (0.0, 200e-9)).unwrap();
//! assert_eq!(stats.peak_to_peak, 1.0);
//!
//! let metrics = compute_transient_metrics(&t, &v).unwrap();
//! assert!(metrics.settling_time.is_finite());
//! ```

pub mod format;
pub mod kernel;
#[cfg(feature = "plot")]
pub mod plot;
pub mod report;
pub mod signal;
pub mod sim;
pub mod trace;

pub use kernel::{ConfigError, KernelLifecycle, MeasureError};
pub use signal::spectral::{compute_spectrum, spectrum_in_window, Spectrum, DEFAULT_BAND};
pub use signal::transient::{compute_transient_metrics, TransientMetrics};
pub use signal::window_stats::{compute_window_stats, WindowStats};
pub use trace::Trace;
