//! Slew-rate and settling-time characterization of a rising step response.
//!
//! Thresholds are placed at 10, 20, 80 and 90 % of the recorded swing. The
//! 10 % and 20 % crossings are located in one forward pass; the 90 % and 80 %
//! searches then resume from the sample pair where their lower partner was
//! found. Only rising edges count as crossings.
//!
//! Settling is a heuristic: the first sample at or after the 90 % crossing
//! from which the slope magnitude stays below a fraction of its peak for a run
//! of consecutive samples. Its accuracy depends on the sample density across
//! the settling transient.

use crate::kernel::{read_paired, ConfigError, KernelLifecycle, MeasureError, Read1D};
use crate::signal::traits::TransientCharacterize1D;
use ampchar_core::num_rs::{gradient, interp_segment};
use ndarray::ArrayView1;

/// Default fraction of the peak slope below which a trace counts as settled.
pub const DEFAULT_SETTLE_FRACTION: f64 = 0.01;

/// Default number of consecutive quiet samples required to count as settled.
pub const DEFAULT_SETTLE_RUN: usize = 5;

/// A located rising-edge threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Interpolated time of the crossing.
    pub time: f64,
    /// Index `i` of the sample pair `(i, i + 1)` that brackets the threshold.
    pub index: usize,
}

/// Find the first rising crossing of `threshold` at or after sample pair `start`.
///
/// A pair `(i, i + 1)` crosses when `voltage[i] <= threshold <= voltage[i + 1]`;
/// the crossing time is interpolated linearly between the two samples.
///
/// ```
/// use ampchar::signal::transient::find_rising_crossing;
///
/// let t = [0.0, 1.0, 2.0, 3.0];
/// let v = [0.0, 2.0, 0.0, 2.0];
/// assert_eq!(find_rising_crossing(&t, &v, 1.0, 0).unwrap().time, 0.5);
/// assert_eq!(find_rising_crossing(&t, &v, 1.0, 1).unwrap().time, 2.5);
/// assert!(find_rising_crossing(&t, &v, 3.0, 0).is_none());
/// ```
pub fn find_rising_crossing(
    time: &[f64],
    voltage: &[f64],
    threshold: f64,
    start: usize,
) -> Option<Crossing> {
    let n = time.len().min(voltage.len());
    if start + 1 >= n {
        return None;
    }
    (start..n - 1).find_map(|i| crossing_at(time, voltage, i, threshold))
}

/// Crossing of `threshold` on the rising sample pair `(i, i + 1)`, if it brackets it.
fn crossing_at(time: &[f64], voltage: &[f64], i: usize, threshold: f64) -> Option<Crossing> {
    (voltage[i] <= threshold && threshold <= voltage[i + 1]).then(|| Crossing {
        time: interp_segment(
            threshold,
            (voltage[i], time[i]),
            (voltage[i + 1], time[i + 1]),
        ),
        index: i,
    })
}

/// Threshold crossing times located on the rising edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeCrossings {
    /// 10 % crossing.
    pub t10: Option<f64>,
    /// 20 % crossing.
    pub t20: Option<f64>,
    /// 80 % crossing, searched from the 20 % crossing onwards.
    pub t80: Option<f64>,
    /// 90 % crossing, searched from the 10 % crossing onwards.
    pub t90: Option<f64>,
}

/// Result of a transient characterization. Unavailable metrics are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransientMetrics {
    /// `(v90 - v10) / (t90 - t10)` in V/s.
    pub slew_rate_90_10: f64,
    /// `(v80 - v20) / (t80 - t20)` in V/s.
    pub slew_rate_80_20: f64,
    /// Time from the 90 % crossing until the trace settles, in seconds.
    pub settling_time: f64,
    /// The crossings the rates were derived from.
    pub crossings: EdgeCrossings,
}

impl TransientMetrics {
    /// `(sr_90_10, sr_80_20, settling_time)`.
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (
            self.slew_rate_90_10,
            self.slew_rate_80_20,
            self.settling_time,
        )
    }
}

/// Threshold voltages derived from the swing of a trace.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SwingLevels {
    v10: f64,
    v20: f64,
    v80: f64,
    v90: f64,
}

impl SwingLevels {
    fn of(voltage: &[f64]) -> Self {
        // NaN anywhere poisons the levels, so no crossing can match.
        let (v_low, v_high) = voltage
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                if v.is_nan() || lo.is_nan() {
                    (f64::NAN, f64::NAN)
                } else {
                    (lo.min(v), hi.max(v))
                }
            });
        let swing = v_high - v_low;
        Self {
            v10: v_low + 0.10 * swing,
            v20: v_low + 0.20 * swing,
            v80: v_low + 0.80 * swing,
            v90: v_low + 0.90 * swing,
        }
    }
}

/// Constructor config for [`TransientKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransientConfig {
    /// Fraction of the peak slope magnitude below which a sample is quiet.
    pub settle_fraction: f64,
    /// Consecutive quiet samples required, clipped at the end of the trace.
    pub settle_run: usize,
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            settle_fraction: DEFAULT_SETTLE_FRACTION,
            settle_run: DEFAULT_SETTLE_RUN,
        }
    }
}

/// Trait-first transient characterization kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransientKernel {
    settle_fraction: f64,
    settle_run: usize,
}

impl KernelLifecycle for TransientKernel {
    type Config = TransientConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if !config.settle_fraction.is_finite()
            || config.settle_fraction <= 0.0
            || config.settle_fraction > 1.0
        {
            return Err(ConfigError::InvalidArgument {
                arg: "settle_fraction",
                reason: "settle fraction must be finite and in (0, 1]",
            });
        }
        if config.settle_run == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "settle_run",
                reason: "settle run must cover at least one sample",
            });
        }
        Ok(Self {
            settle_fraction: config.settle_fraction,
            settle_run: config.settle_run,
        })
    }
}

impl TransientCharacterize1D for TransientKernel {
    fn run<X, Y>(&self, time: &X, voltage: &Y) -> Result<TransientMetrics, MeasureError>
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
        let metrics = self.characterize(time, voltage)?;
        log::debug!(
            "transient over {} samples: sr90/10={:e} V/s, sr80/20={:e} V/s, settling={:e} s",
            time.len(),
            metrics.slew_rate_90_10,
            metrics.slew_rate_80_20,
            metrics.settling_time
        );
        Ok(metrics)
    }
}

impl TransientKernel {
    fn characterize(&self, time: &[f64], voltage: &[f64]) -> Result<TransientMetrics, MeasureError> {
        let levels = SwingLevels::of(voltage);

        let (c10, c20) = first_crossings(time, voltage, levels.v10, levels.v20);
        let c90 = c10.and_then(|c| find_rising_crossing(time, voltage, levels.v90, c.index));
        let c80 = c20.and_then(|c| find_rising_crossing(time, voltage, levels.v80, c.index));
        log::trace!(
            "crossing pairs: 10%={:?} 20%={:?} 80%={:?} 90%={:?}",
            c10.map(|c| c.index),
            c20.map(|c| c.index),
            c80.map(|c| c.index),
            c90.map(|c| c.index)
        );

        let crossings = EdgeCrossings {
            t10: c10.map(|c| c.time),
            t20: c20.map(|c| c.time),
            t80: c80.map(|c| c.time),
            t90: c90.map(|c| c.time),
        };

        Ok(TransientMetrics {
            slew_rate_90_10: slew_rate(levels.v10, levels.v90, crossings.t10, crossings.t90),
            slew_rate_80_20: slew_rate(levels.v20, levels.v80, crossings.t20, crossings.t80),
            settling_time: match crossings.t90 {
                Some(t90) => self.settling_time(time, voltage, t90)?,
                None => f64::NAN,
            },
            crossings,
        })
    }

    fn settling_time(&self, time: &[f64], voltage: &[f64], t90: f64) -> Result<f64, MeasureError> {
        let slope = gradient(ArrayView1::from(voltage), ArrayView1::from(time))?;
        let magnitude: Vec<f64> = slope.iter().map(|g| g.abs()).collect();
        let max_slope = magnitude.iter().fold(0.0f64, |acc, &g| {
            if g.is_nan() || acc.is_nan() {
                f64::NAN
            } else {
                acc.max(g)
            }
        });
        if !(max_slope > 0.0) {
            return Ok(f64::NAN);
        }

        let quiet = self.settle_fraction * max_slope;
        let n = time.len();
        let Some(start) = time.iter().position(|&t| t >= t90) else {
            return Ok(f64::NAN);
        };
        let settled = (start..n).find(|&k| {
            let end = (k + self.settle_run).min(n);
            magnitude[k..end].iter().all(|&g| g < quiet)
        });
        Ok(settled.map_or(f64::NAN, |k| time[k] - t90))
    }
}

/// First rising crossings of two thresholds, found in a single forward pass.
fn first_crossings(
    time: &[f64],
    voltage: &[f64],
    first: f64,
    second: f64,
) -> (Option<Crossing>, Option<Crossing>) {
    let (mut a, mut b) = (None, None);
    for i in 0..time.len() - 1 {
        if a.is_none() {
            a = crossing_at(time, voltage, i, first);
        }
        if b.is_none() {
            b = crossing_at(time, voltage, i, second);
        }
        if a.is_some() && b.is_some() {
            break;
        }
    }
    (a, b)
}

fn slew_rate(v_lo: f64, v_hi: f64, t_lo: Option<f64>, t_hi: Option<f64>) -> f64 {
    match (t_lo, t_hi) {
        (Some(t_lo), Some(t_hi)) if t_hi > t_lo => (v_hi - v_lo) / (t_hi - t_lo),
        _ => f64::NAN,
    }
}

/// Slew rates (90–10 %, 80–20 %) and settling time of a rising step response.
///
/// Metrics that cannot be located are `NaN`; fewer than two samples is an error.
///
/// ```
/// use ampchar::signal::transient::compute_transient_metrics;
///
/// let t: Vec<f64> = (0..=100).map(|i| i as f64 * 1e-9).collect();
/// let v: Vec<f64> = t.iter().map(|&ti| (ti / 50e-9).min(1.0)).collect();
/// let m = compute_transient_metrics(&t, &v).unwrap();
/// assert!((m.slew_rate_90_10 - 2e7).abs() < 1.0);
/// ```
pub fn compute_transient_metrics(
    time: &[f64],
    voltage: &[f64],
) -> Result<TransientMetrics, MeasureError> {
    let kernel = TransientKernel::try_new(TransientConfig::default())?;
    kernel.run(time, voltage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn ramp_then_flat() -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..=200).map(|i| i as f64).collect();
        let v = t.iter().map(|&ti| (ti / 50.0).min(1.0)).collect();
        (t, v)
    }

    #[test]
    fn ramp_rates_and_settling() {
        let (t, v) = ramp_then_flat();
        let m = compute_transient_metrics(&t, &v).expect("metrics");

        assert_relative_eq!(m.slew_rate_90_10, 0.02, epsilon = 1e-12);
        assert_relative_eq!(m.slew_rate_80_20, 0.02, epsilon = 1e-12);
        assert_relative_eq!(m.crossings.t10.expect("t10"), 5.0, epsilon = 1e-9);
        assert_relative_eq!(m.crossings.t90.expect("t90"), 45.0, epsilon = 1e-9);
        // Slope at t=50 is half the ramp slope; t=51 is the first quiet run.
        assert_relative_eq!(m.settling_time, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn quiet_run_is_clipped_at_trace_end() {
        // Only two quiet samples remain after the ramp, fewer than the default run.
        let t: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let v: Vec<f64> = t.iter().map(|&ti| (ti / 8.0).min(1.0)).collect();
        let m = compute_transient_metrics(&t, &v).expect("metrics");
        assert_relative_eq!(m.crossings.t90.expect("t90"), 7.2, epsilon = 1e-12);
        assert_relative_eq!(m.settling_time, 1.8, epsilon = 1e-12);
    }

    #[test]
    fn exponential_step_matches_closed_form() {
        let tau = 1e-9;
        let dt = tau / 2000.0;
        let t: Vec<f64> = (0..40_000).map(|i| i as f64 * dt).collect();
        let v: Vec<f64> = t.iter().map(|&ti| 1.0 - (-ti / tau).exp()).collect();
        let m = compute_transient_metrics(&t, &v).expect("metrics");

        let v_high = v[v.len() - 1];
        let expected_9010 = 0.8 * v_high / (tau * 9f64.ln());
        let expected_8020 = 0.6 * v_high / (tau * 4f64.ln());
        assert_relative_eq!(m.slew_rate_90_10, expected_9010, max_relative = 1e-3);
        assert_relative_eq!(m.slew_rate_80_20, expected_8020, max_relative = 1e-3);
        // Quiet once |dv/dt| < 1 % of 1/tau, i.e. at t = tau * ln(100).
        let t90 = m.crossings.t90.expect("t90");
        assert_relative_eq!(m.settling_time + t90, tau * 100f64.ln(), max_relative = 1e-3);
    }

    #[test]
    fn flat_trace_has_no_metrics() {
        let t = [0.0, 1.0, 2.0, 3.0];
        let v = [0.25; 4];
        let m = compute_transient_metrics(&t, &v).expect("metrics");
        assert!(m.slew_rate_90_10.is_nan());
        assert!(m.slew_rate_80_20.is_nan());
        assert!(m.settling_time.is_nan());
    }

    #[test]
    fn falling_edge_is_not_matched() {
        let t: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let v: Vec<f64> = t.iter().map(|&ti| 1.0 - ti / 19.0).collect();
        let m = compute_transient_metrics(&t, &v).expect("metrics");
        assert_eq!(m.crossings, EdgeCrossings::default());
        assert!(m.slew_rate_90_10.is_nan());
        assert!(m.settling_time.is_nan());
    }

    #[test]
    fn upper_crossing_missing_after_lower_one() {
        // Starts at the maximum, then rises only to half swing.
        let t = [0.0, 1.0, 2.0];
        let v = [1.0, 0.0, 0.5];
        let m = compute_transient_metrics(&t, &v).expect("metrics");
        assert_relative_eq!(m.crossings.t10.expect("t10"), 1.2, epsilon = 1e-12);
        assert_relative_eq!(m.crossings.t20.expect("t20"), 1.4, epsilon = 1e-12);
        assert_eq!(m.crossings.t90, None);
        assert_eq!(m.crossings.t80, None);
        assert!(m.slew_rate_90_10.is_nan());
        assert!(m.slew_rate_80_20.is_nan());
        assert!(m.settling_time.is_nan());
    }

    #[test]
    fn upper_search_resumes_from_lower_crossing() {
        // The leading pulse rises through 90 % before any rising 10 % crossing.
        let t = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let v = [0.5, 0.95, 0.0, 0.05, 1.0, 1.0];
        let m = compute_transient_metrics(&t, &v).expect("metrics");
        let c10 = m.crossings.t10.expect("t10");
        let c90 = m.crossings.t90.expect("t90");
        assert!(c10 > 3.0 && c10 < 4.0);
        assert!(c90 > c10 && c90 < 4.0);
    }

    #[test]
    fn oscillating_tail_never_settles() {
        let mut v: Vec<f64> = (0..=10).map(|i| i as f64 * 0.1).collect();
        for i in 11..=100usize {
            let phase = (i - 10) % 8;
            v.push(if phase <= 4 {
                1.0 - 0.1 * phase as f64
            } else {
                0.6 + 0.1 * (phase - 4) as f64
            });
        }
        let t: Vec<f64> = (0..v.len()).map(|i| i as f64).collect();
        let m = compute_transient_metrics(&t, &v).expect("metrics");
        assert!(m.slew_rate_90_10.is_finite());
        assert!(m.settling_time.is_nan());
    }

    #[test]
    fn looser_settle_fraction_settles_earlier() {
        let tau = 1.0;
        let t: Vec<f64> = (0..2000).map(|i| i as f64 * 0.01).collect();
        let v: Vec<f64> = t.iter().map(|&ti| 1.0 - (-ti / tau).exp()).collect();

        let strict = TransientKernel::try_new(TransientConfig::default()).expect("kernel");
        let loose = TransientKernel::try_new(TransientConfig {
            settle_fraction: 0.1,
            ..TransientConfig::default()
        })
        .expect("kernel");

        let s = strict.run(&t, &v).expect("strict").settling_time;
        let l = loose.run(&t, &v).expect("loose").settling_time;
        assert!(l < s);
    }

    #[test]
    fn rejects_short_and_mismatched_traces() {
        assert_eq!(
            compute_transient_metrics(&[0.0], &[1.0]).expect_err("one sample"),
            MeasureError::InsufficientSamples {
                arg: "time",
                needed: 2,
                got: 1
            }
        );
        assert!(matches!(
            compute_transient_metrics(&[0.0, 1.0], &[1.0]),
            Err(MeasureError::LengthMismatch { arg: "voltage", .. })
        ));
    }

    #[test]
    fn kernel_config_is_validated() {
        assert!(TransientKernel::try_new(TransientConfig {
            settle_fraction: f64::NAN,
            settle_run: 5,
        })
        .is_err());
        assert!(TransientKernel::try_new(TransientConfig {
            settle_fraction: 1.5,
            settle_run: 5,
        })
        .is_err());
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let (t, v) = ramp_then_flat();
        let a = compute_transient_metrics(&t, &v).expect("first");
        let b = compute_transient_metrics(&t, &v).expect("second");
        let bits = |m: TransientMetrics| {
            let (x, y, z) = m.as_tuple();
            (x.to_bits(), y.to_bits(), z.to_bits())
        };
        assert_eq!(bits(a), bits(b));
    }

    #[test]
    fn monotonic_rise_has_positive_slew() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let n = rng.random_range(2..200);
            let (mut t_acc, mut v_acc) = (0.0, rng.random_range(-1.0..1.0));
            let mut t = Vec::with_capacity(n);
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                t.push(t_acc);
                v.push(v_acc);
                t_acc += rng.random_range(0.1..1.0);
                v_acc += rng.random_range(0.01..1.0);
            }
            let m = compute_transient_metrics(&t, &v).expect("metrics");
            let t10 = m.crossings.t10.expect("t10");
            let t90 = m.crossings.t90.expect("t90");
            assert!(t90 > t10);
            assert!(m.slew_rate_90_10.is_finite() && m.slew_rate_90_10 > 0.0);
            assert!(m.slew_rate_80_20.is_finite() && m.slew_rate_80_20 > 0.0);
        }
    }
}
