//! Debounce-cache combinator.
//!
//! This module provides:
//! - The combinator itself ([`Modulator`])
//! - Creation options and their validation ([`Options`])
//! - Cache key derivation ([`cache_key`])
//! - Error handling ([`InvalidArgument`], [`ModulateError`])
//!
//! # States
//!
//! A modulator is either **Idle** (no timer armed; the next call may invoke
//! on the leading edge) or **Windowed** (a cooldown or trailing timer is
//! armed; calls replace the trailing arguments and share one outcome).
//!
//! # Cache Policy
//!
//! Cache hits bypass debouncing entirely: they resolve at once, do not
//! touch the pending timer or the recorded arguments, and do not refresh
//! the entry's eviction order.

mod cache;
mod error;
mod modulator;
mod options;


pub use cache::cache_key;
pub use error::{CANCELLED_MESSAGE, InvalidArgument, ModulateError};
pub use modulator::{Modulator, Outcome};
pub use options::Options;
