//! numpy-like numeric primitives shared by the `ampchar` waveform engines.
//!
//! Everything here works on [`ndarray`] views and mirrors the numpy function of
//! the same name closely enough that results can be compared bit-for-bit in
//! the contract runner.

use core::fmt;

/// numpy-like primitives.
pub mod num_rs;

/// Errors raised by the numeric primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An input carried fewer samples than the operation needs.
    TooFewSamples {
        /// Name of the offending argument.
        arg: &'static str,
        /// Minimum number of samples.
        needed: usize,
        /// Number of samples received.
        got: usize,
    },
    /// Two paired inputs were of different lengths.
    LengthMismatch {
        /// Name of the argument that disagrees with its partner.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooFewSamples { arg, needed, got } => write!(
                f,
                "`{arg}` needs at least {needed} samples, got {got}."
            ),
            Error::LengthMismatch { arg, expected, got } => {
                write!(f, "Length mismatch on `{arg}`. Expected {expected}, got {got}.")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result alias for the numeric primitives.
pub type Result<T> = core::result::Result<T, Error>;
