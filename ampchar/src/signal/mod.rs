//! Waveform measurement engines.
//!
//! * [`window_stats`]: extrema and peak-to-peak inside an x-window.
//! * [`transient`]: slew rates and settling time of a rising step.
//! * [`spectral`]: band-limited magnitude spectrum.
//!
//! Each engine is a kernel built with [`crate::kernel::KernelLifecycle::try_new`]
//! and driven through the capability traits in [`traits`], with a free function
//! wrapping the default configuration.

pub mod resample;
pub mod spectral;
pub mod traits;
pub mod transient;
pub mod window_stats;
pub mod windows;
