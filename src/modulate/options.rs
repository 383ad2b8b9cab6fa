//! Combinator options and their validation.

use std::time::Duration;

use serde_json::{Map, Value};

use super::InvalidArgument;

/// Options fixed when a [`Modulator`](super::Modulator) is created.
///
/// # Defaults
///
/// - `immediate`: false (trailing-edge invocation)
/// - `max_cache_size`: 100 entries
/// - `max_wait`: none
/// - `context`: none (the call-site receiver is used)
///
/// # Example
///
/// ```
/// use modulate::Options;
/// use std::time::Duration;
///
/// let options = Options::new(Duration::from_millis(200))
///     .with_immediate(true)
///     .with_max_cache_size(16)
///     .with_max_wait(Duration::from_secs(1));
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options<R = ()> {
    wait: Duration,
    immediate: bool,
    max_cache_size: usize,
    max_wait: Option<Duration>,
    context: Option<R>,
}

impl Options {
    /// Default maximum number of cached results.
    pub const DEFAULT_MAX_CACHE_SIZE: usize = 100;

    /// Creates options with the given debounce wait and default values.
    #[must_use]
    pub const fn new(wait: Duration) -> Self {
        Self::for_receiver(wait)
    }

    /// Builds options from a loosely typed document.
    ///
    /// Recognised keys are `wait`, `immediate`, `max_cache_size` and
    /// `max_wait` (millisecond values; `maxCacheSize` and `maxWait` are
    /// accepted as aliases). Missing or `null` optional keys take their
    /// defaults; `wait` is required.
    ///
    /// Fields are checked in declaration order and the first failure is
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns the [`InvalidArgument`] matching the first malformed field, or
    /// [`InvalidArgument::MaxWaitBelowWait`] if `max_wait < wait`.
    pub fn from_document(document: &Map<String, Value>) -> Result<Self, InvalidArgument> {
        let wait = document
            .get("wait")
            .and_then(Value::as_f64)
            .and_then(millis)
            .ok_or(InvalidArgument::Wait)?;

        let immediate = match document.get("immediate") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(InvalidArgument::Immediate),
        };

        let max_cache_size = match lookup(document, "max_cache_size", "maxCacheSize") {
            None | Some(Value::Null) => Self::DEFAULT_MAX_CACHE_SIZE,
            Some(value) => value
                .as_f64()
                .and_then(entry_count)
                .ok_or(InvalidArgument::MaxCacheSize)?,
        };

        let max_wait = match lookup(document, "max_wait", "maxWait") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_f64()
                    .and_then(millis)
                    .ok_or(InvalidArgument::MaxWait)?,
            ),
        };

        let options = Self {
            wait,
            immediate,
            max_cache_size,
            max_wait,
            context: None,
        };
        options.validate()?;
        Ok(options)
    }
}

impl<R> Options<R> {
    /// Creates options for targets taking a receiver of type `R`, with no
    /// context bound and default values otherwise.
    ///
    /// Each call then supplies its own receiver through
    /// [`call_on`](super::Modulator::call_on).
    #[must_use]
    pub const fn for_receiver(wait: Duration) -> Self {
        Self {
            wait,
            immediate: false,
            max_cache_size: Options::DEFAULT_MAX_CACHE_SIZE,
            max_wait: None,
            context: None,
        }
    }

    /// Sets leading-edge (`true`) or trailing-edge (`false`) invocation.
    #[must_use]
    pub const fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Sets the maximum number of cached results. Zero disables caching.
    #[must_use]
    pub const fn with_max_cache_size(mut self, max_cache_size: usize) -> Self {
        self.max_cache_size = max_cache_size;
        self
    }

    /// Sets the ceiling on how long a burst may defer invocation.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Binds a receiver passed to every invocation, overriding the
    /// call-site receiver.
    #[must_use]
    pub fn with_context<R2>(self, context: R2) -> Options<R2> {
        Options {
            wait: self.wait,
            immediate: self.immediate,
            max_cache_size: self.max_cache_size,
            max_wait: self.max_wait,
            context: Some(context),
        }
    }

    /// Checks the cross-field invariant `max_wait >= wait`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument::MaxWaitBelowWait`] if the ceiling is
    /// shorter than the debounce wait.
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        match self.max_wait {
            Some(max_wait) if max_wait < self.wait => Err(InvalidArgument::MaxWaitBelowWait),
            _ => Ok(()),
        }
    }

    /// Returns the debounce wait.
    #[must_use]
    pub const fn wait(&self) -> Duration {
        self.wait
    }

    /// Returns true for leading-edge invocation.
    #[must_use]
    pub const fn immediate(&self) -> bool {
        self.immediate
    }

    /// Returns the maximum number of cached results.
    #[must_use]
    pub const fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    /// Returns the maxWait ceiling, if any.
    #[must_use]
    pub const fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }

    /// Returns the bound receiver, if any.
    #[must_use]
    pub const fn context(&self) -> Option<&R> {
        self.context.as_ref()
    }

    /// Returns true if results are cached.
    #[must_use]
    pub const fn caches(&self) -> bool {
        self.max_cache_size > 0
    }
}

fn lookup<'a>(document: &'a Map<String, Value>, key: &str, alias: &str) -> Option<&'a Value> {
    document.get(key).or_else(|| document.get(alias))
}

/// Converts a non-negative, finite millisecond count, rounded to the nanosecond.
///
/// Counts too large for `u64` nanoseconds go through seconds instead, and
/// saturate at [`Duration::MAX`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn millis(ms: f64) -> Option<Duration> {
    if !ms.is_finite() || ms < 0.0 {
        return None;
    }
    let nanos = (ms * 1_000_000.0).round();
    if nanos < u64::MAX as f64 {
        return Some(Duration::from_nanos(nanos as u64));
    }
    Some(Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX))
}

/// Truncates a non-negative, finite count toward zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn entry_count(count: f64) -> Option<usize> {
    (count.is_finite() && count >= 0.0).then(|| count.trunc() as usize)
}
