//! Modulate: a debounce combinator with result caching.
//!
//! Wraps a target function so that bursts of calls collapse into a single
//! invocation, optionally on the leading edge, bounded by a maximum wait,
//! with results cached per distinct argument list and explicit cancellation.

pub mod config;
pub mod modulate;

pub use modulate::{InvalidArgument, ModulateError, Modulator, Options, Outcome};
