//! Boundary to the circuit simulator.
//!
//! Measurement code never runs a simulator itself. A [`Simulator`]
//! implementation renders the bench with [`CircuitParams::netlist`], runs it,
//! and hands back the named traces of the raw output as a [`TraceSet`].

mod netlist;
mod value;

pub use netlist::*;
pub use value::*;

use crate::kernel::MeasureError;
use crate::trace::Trace;
use core::fmt;

/// Name of the output node trace of the bench.
pub const OUTPUT_TRACE: &str = "V(vout)";

/// Errors raised at the simulator boundary.
#[derive(Debug)]
pub enum SimulationError {
    /// The simulator process could not be started.
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The simulator finished without producing a raw output file.
    NoRawOutput,
    /// A requested trace is not present in the output.
    MissingTrace {
        /// Requested trace name.
        name: String,
        /// Names that are available.
        available: Vec<String>,
    },
    /// Traces in one output have different lengths.
    RaggedTraces {
        /// Offending trace name.
        name: String,
        /// Length of the first trace.
        expected: usize,
        /// Length of the offending trace.
        got: usize,
    },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Launch { program, source } => {
                write!(f, "failed to launch simulator {program:?}: {source}")
            }
            SimulationError::NoRawOutput => {
                write!(f, "simulator did not generate a raw output file")
            }
            SimulationError::MissingTrace { name, available } => {
                write!(f, "trace {name:?} not found; available: {available:?}")
            }
            SimulationError::RaggedTraces {
                name,
                expected,
                got,
            } => write!(
                f,
                "trace {name:?} has {got} samples, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Launch { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Named, equal-length traces read from a simulator's raw output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceSet {
    names: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl TraceSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trace, replacing any trace with the same (case-insensitive) name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), SimulationError> {
        let name = name.into();
        let slot = self.position(&name);
        // Replacing the only trace may change the length.
        let sole = self.data.len() == 1 && slot.is_some();
        if let Some(expected) = self.data.first().map(Vec::len) {
            if values.len() != expected && !sole {
                return Err(SimulationError::RaggedTraces {
                    name,
                    expected,
                    got: values.len(),
                });
            }
        }
        match slot {
            Some(i) => self.data[i] = values,
            None => {
                self.names.push(name);
                self.data.push(values);
            }
        }
        Ok(())
    }

    /// Trace names in insertion order, as the simulator spelled them.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Look up a trace ignoring ASCII case, so `"V(vout)"` finds `"V(Vout)"`.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.data[i].as_slice())
    }

    /// Like [`TraceSet::get`], with a descriptive error when absent.
    pub fn require(&self, name: &str) -> Result<&[f64], SimulationError> {
        self.get(name).ok_or_else(|| SimulationError::MissingTrace {
            name: name.to_string(),
            available: self.names.clone(),
        })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Result data of one analysis run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimulationOutput {
    /// Output voltage versus time.
    Transient {
        /// Time in seconds.
        time: Vec<f64>,
        /// Voltage in volts.
        voltage: Vec<f64>,
    },
    /// Gain versus frequency, passed through to the report as-is.
    Ac {
        /// Frequency in Hz.
        frequency: Vec<f64>,
        /// Magnitude in dB.
        magnitude_db: Vec<f64>,
    },
}

impl SimulationOutput {
    /// Pick the axis and `trace` out of `traces` for the kind of `analysis`.
    pub fn from_traces(
        traces: &TraceSet,
        analysis: &Analysis,
        trace: &str,
    ) -> Result<Self, SimulationError> {
        let values = traces.require(trace)?.to_vec();
        Ok(match analysis {
            Analysis::Transient { .. } => SimulationOutput::Transient {
                time: traces.require("time")?.to_vec(),
                voltage: values,
            },
            Analysis::Ac { .. } => SimulationOutput::Ac {
                frequency: traces.require("frequency")?.to_vec(),
                magnitude_db: values,
            },
        })
    }

    /// The output as an `(x, y)` trace.
    pub fn into_trace(self) -> Result<Trace, MeasureError> {
        let (x, y) = match self {
            SimulationOutput::Transient { time, voltage } => (time, voltage),
            SimulationOutput::Ac {
                frequency,
                magnitude_db,
            } => (frequency, magnitude_db),
        };
        Trace::new(x, y)
    }
}

/// A circuit simulator that can run the bench.
pub trait Simulator {
    /// Run `analysis` on the bench built from `params` and return its traces.
    fn run(&self, params: &CircuitParams, analysis: &Analysis) -> Result<TraceSet, SimulationError>;

    /// Run and extract the output node trace.
    fn run_output(
        &self,
        params: &CircuitParams,
        analysis: &Analysis,
    ) -> Result<SimulationOutput, SimulationError> {
        let traces = self.run(params, analysis)?;
        log::debug!("simulation returned traces {:?}", traces.names());
        SimulationOutput::from_traces(&traces, analysis, OUTPUT_TRACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::transient::compute_transient_metrics;

    struct FirstOrderStep {
        tau: f64,
    }

    impl Simulator for FirstOrderStep {
        fn run(&self, _params: &CircuitParams, analysis: &Analysis) -> Result<TraceSet, SimulationError> {
            let Analysis::Transient { stop } = analysis else {
                return Err(SimulationError::NoRawOutput);
            };
            let n = 2001;
            let time: Vec<f64> = (0..n).map(|i| stop.value() * i as f64 / (n - 1) as f64).collect();
            let vout = time.iter().map(|t| 1.0 - (-t / self.tau).exp()).collect();
            let mut traces = TraceSet::new();
            traces.insert("time", time)?;
            traces.insert("V(Vout)", vout)?;
            Ok(traces)
        }
    }

    #[test]
    fn lookup_ignores_case() {
        let mut traces = TraceSet::new();
        traces.insert("V(Vout)", vec![1.0, 2.0]).expect("insert");
        assert_eq!(traces.get("v(vout)"), Some(&[1.0, 2.0][..]));
        assert_eq!(traces.get(OUTPUT_TRACE), Some(&[1.0, 2.0][..]));
        assert!(traces.get("V(n001)").is_none());
    }

    #[test]
    fn missing_trace_lists_available_names() {
        let mut traces = TraceSet::new();
        traces.insert("time", vec![0.0]).expect("insert");
        let err = traces.require("V(vout)").expect_err("missing");
        assert_eq!(
            err.to_string(),
            "trace \"V(vout)\" not found; available: [\"time\"]"
        );
    }

    #[test]
    fn ragged_traces_are_rejected() {
        let mut traces = TraceSet::new();
        traces.insert("time", vec![0.0, 1.0]).expect("insert");
        assert!(matches!(
            traces.insert("V(vout)", vec![0.0]),
            Err(SimulationError::RaggedTraces { expected: 2, got: 1, .. })
        ));
        traces.insert("TIME", vec![5.0]).expect("sole trace may be replaced");
        assert_eq!(traces.names(), &["time".to_string()]);
    }

    #[test]
    fn simulator_output_feeds_transient_engine() {
        let sim = FirstOrderStep { tau: 100e-9 };
        let output = sim
            .run_output(&CircuitParams::default(), &Analysis::default_transient())
            .expect("simulation");
        let trace = output.into_trace().expect("paired trace");
        assert_eq!(trace.len(), 2001);
        let metrics = compute_transient_metrics(trace.x(), trace.y()).expect("metrics");
        assert!(metrics.slew_rate_90_10 > 0.0);
        assert!(metrics.settling_time.is_finite());
    }

    #[test]
    fn ac_output_needs_frequency_axis() {
        let mut traces = TraceSet::new();
        traces.insert("V(vout)", vec![0.0, -3.0]).expect("insert");
        let err = SimulationOutput::from_traces(&traces, &Analysis::default_ac(), OUTPUT_TRACE)
            .expect_err("no frequency trace");
        assert!(matches!(err, SimulationError::MissingTrace { ref name, .. } if name == "frequency"));
    }
}
