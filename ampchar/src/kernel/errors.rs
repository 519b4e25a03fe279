use core::fmt;

/// Validation errors raised at kernel construction or adapter binding time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration argument value is invalid.
    InvalidArgument {
        /// Name of the argument.
        arg: &'static str,
        /// Human readable reason.
        reason: &'static str,
    },
    /// A contiguous 1D slice view could not be obtained.
    NonContiguous {
        /// Name of the argument that is non-contiguous.
        arg: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidArgument { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            ConfigError::NonContiguous { arg } => {
                write!(f, "Argument `{arg}` is not contiguous in memory.")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Hard failures of a measurement run.
///
/// A metric that merely cannot be located (a threshold never crossed, a trace
/// that never settles) is not an error: it is reported as `NaN` inside the
/// result instead.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureError {
    /// No sample fell inside the requested x-window.
    EmptySelection {
        /// Lower window bound after normalization.
        lo: f64,
        /// Upper window bound after normalization.
        hi: f64,
    },
    /// An input carried fewer samples than the engine needs.
    InsufficientSamples {
        /// Name of the argument.
        arg: &'static str,
        /// Minimum number of samples.
        needed: usize,
        /// Number of samples received.
        got: usize,
    },
    /// No spectral bin remained after band-limiting.
    OutOfBand {
        /// Lower band edge in Hz.
        lo: f64,
        /// Upper band edge in Hz.
        hi: f64,
    },
    /// Paired inputs or a caller-provided output had the wrong length.
    LengthMismatch {
        /// Name of the argument.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
    /// Adapter binding/configuration failure.
    Config(ConfigError),
}

impl From<ConfigError> for MeasureError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ampchar_core::Error> for MeasureError {
    fn from(value: ampchar_core::Error) -> Self {
        match value {
            ampchar_core::Error::TooFewSamples { arg, needed, got } => {
                Self::InsufficientSamples { arg, needed, got }
            }
            ampchar_core::Error::LengthMismatch { arg, expected, got } => {
                Self::LengthMismatch { arg, expected, got }
            }
        }
    }
}

impl fmt::Display for MeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureError::EmptySelection { lo, hi } => {
                write!(f, "No points in range [{lo}, {hi}].")
            }
            MeasureError::InsufficientSamples { arg, needed, got } => write!(
                f,
                "`{arg}` needs at least {needed} samples, got {got}."
            ),
            MeasureError::OutOfBand { lo, hi } => {
                write!(f, "No spectral data in band [{lo} Hz, {hi} Hz].")
            }
            MeasureError::LengthMismatch { arg, expected, got } => {
                write!(f, "Length mismatch on `{arg}`. Expected {expected}, got {got}.")
            }
            MeasureError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for MeasureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeasureError::Config(err) => Some(err),
            _ => None,
        }
    }
}
