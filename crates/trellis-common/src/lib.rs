//! Common utilities for the Trellis HTML cleaner.
//!
//! This crate provides shared infrastructure used by the cleaning pipeline:
//! - **Diagnostics** - recoverable markup problems, reported with a severity
//!   and a certainty flag, mirrored into `tracing`
//! - **Cancellation** - a cooperative abort signal polled by every long loop

pub mod cancel;
pub mod diagnostic;

pub use cancel::{CancelToken, Canceled};
pub use diagnostic::{Diagnostic, ErrorKind, Severity};
