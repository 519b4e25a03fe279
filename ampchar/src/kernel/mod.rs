//! Shared trait-first kernel substrate.
//!
//! Every measurement engine is a kernel: a plain config struct validated once
//! by [`KernelLifecycle::try_new`], then run against 1D inputs borrowed through
//! the [`Read1D`] adapter.

mod errors;
mod io;
mod lifecycle;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;
