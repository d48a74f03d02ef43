//! Channel layer for interactive terminal reads.
//!
//! This module handles drain-until-idle reads over a PTY shell,
//! including ANSI and NUL stripping.

mod buffer;
pub(crate) mod pty;

pub use buffer::OutputBuffer;
pub use pty::{DrainConfig, DrainEnd, PtyChannel, ShellIo, drain};
