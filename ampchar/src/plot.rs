//! Debug plotting through a non-interactive matplotlib subprocess.

use crate::format::format_frequency_tick;
use crate::signal::spectral::Spectrum;
use crate::trace::Trace;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors raised by plot utilities.
#[derive(Debug)]
pub enum PlotError {
    /// Underlying process or filesystem I/O failure.
    Io(std::io::Error),
    /// Python subprocess stdin was unavailable.
    StdinUnavailable,
    /// Python subprocess exited unsuccessfully.
    PythonExitFailure(ExitStatus),
}

impl core::fmt::Display for PlotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlotError::Io(err) => write!(f, "plot I/O failure: {err}"),
            PlotError::StdinUnavailable => {
                write!(f, "failed to open stdin for python plotting process")
            }
            PlotError::PythonExitFailure(status) => {
                write!(f, "python plotting script failed with status: {status}")
            }
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::Io(err) => Some(err),
            PlotError::StdinUnavailable | PlotError::PythonExitFailure(_) => None,
        }
    }
}

impl From<std::io::Error> for PlotError {
    fn from(value: std::io::Error) -> Self {
        PlotError::Io(value)
    }
}

/// Plot a time-domain trace to a PNG.
///
/// Without `output_path` the image lands in `target/plots/` under a timestamped name.
pub fn python_plot_trace<P: AsRef<Path>>(
    trace: &Trace,
    title: &str,
    output_path: Option<P>,
) -> Result<PathBuf, PlotError> {
    let output_path = resolve_output(output_path, "trace")?;
    let script = format!(
        r#"
import matplotlib
matplotlib.use("Agg")
import matplotlib.pyplot as plt

t = {:?}
v = {:?}
fig, ax = plt.subplots(figsize=(8, 5))
ax.plot(t, v)
ax.set_title({:?})
ax.set_xlabel("Time (s)")
ax.set_ylabel("Voltage (V)")
ax.grid(True)
fig.tight_layout()
fig.savefig(r"{}", dpi=150)
plt.close(fig)
"#,
        trace.x(),
        trace.y(),
        title,
        path_literal(&output_path)
    );
    run_python(&script)?;
    Ok(output_path)
}

/// Plot a magnitude spectrum on a logarithmic frequency axis with k/M tick labels.
pub fn python_plot_spectrum<P: AsRef<Path>>(
    spectrum: &Spectrum,
    output_path: Option<P>,
) -> Result<PathBuf, PlotError> {
    let output_path = resolve_output(output_path, "spectrum")?;
    let (ticks, labels) = decade_ticks(&spectrum.frequencies);
    let script = format!(
        r#"
import matplotlib
matplotlib.use("Agg")
import matplotlib.pyplot as plt

f = {:?}
m = {:?}
fig, ax = plt.subplots(figsize=(8, 5))
ax.plot(f, m)
ax.set_xscale("log")
ax.set_xticks({:?})
ax.set_xticklabels({:?})
ax.set_title("FFT Magnitude")
ax.set_xlabel("Frequency (Hz)")
ax.set_ylabel("Magnitude (dB)")
ax.grid(True, which="both")
fig.tight_layout()
fig.savefig(r"{}", dpi=150)
plt.close(fig)
"#,
        spectrum.frequencies,
        spectrum.magnitude_db,
        ticks,
        labels,
        path_literal(&output_path)
    );
    run_python(&script)?;
    Ok(output_path)
}

/// Powers of ten covering `frequencies`, with their axis labels.
fn decade_ticks(frequencies: &[f64]) -> (Vec<f64>, Vec<String>) {
    let positive = || frequencies.iter().copied().filter(|f| *f > 0.0 && f.is_finite());
    let lo = positive().fold(f64::INFINITY, f64::min);
    let hi = positive().fold(0.0, f64::max);
    if !(lo <= hi) {
        return (Vec::new(), Vec::new());
    }
    let ticks: Vec<f64> = (lo.log10().floor() as i32..=hi.log10().ceil() as i32)
        .map(|e| 10f64.powi(e))
        .collect();
    let labels = ticks.iter().map(|&t| format_frequency_tick(t)).collect();
    (ticks, labels)
}

fn resolve_output<P: AsRef<Path>>(output_path: Option<P>, stem: &str) -> Result<PathBuf, PlotError> {
    let output_path = match output_path {
        Some(path) => path.as_ref().to_path_buf(),
        None => {
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis();
            PathBuf::from(format!("target/plots/{stem}_{ts}.png"))
        }
    };
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(output_path)
}

fn path_literal(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

fn run_python(script: &str) -> Result<(), PlotError> {
    let mut python = std::process::Command::new("python")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::null()) // noisy
        .stderr(std::process::Stdio::null()) // noisy
        .spawn()?;

    if let Some(mut stdin) = python.stdin.take() {
        stdin.write_all(script.as_bytes())?;
    } else {
        return Err(PlotError::StdinUnavailable);
    }

    let status = python.wait()?;
    if !status.success() {
        return Err(PlotError::PythonExitFailure(status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decade_ticks_cover_band() {
        let (ticks, labels) = decade_ticks(&[2.0e3, 5.0e4, 1.5e8]);
        assert_eq!(ticks.len(), 7);
        assert_eq!(labels.first().map(String::as_str), Some("1k"));
        assert_eq!(labels.last().map(String::as_str), Some("1000M"));
        assert!(decade_ticks(&[]).0.is_empty());
    }
}
