//! Error types for the debounce combinator.

use std::sync::Arc;

use thiserror::Error;

/// Message carried by [`ModulateError::Cancelled`].
pub const CANCELLED_MESSAGE: &str = "Debounced function call was cancelled.";

/// Error raised when combinator options are malformed.
///
/// Returned synchronously at construction time, before any timer is armed.
/// Never retried: the caller must fix the options. A non-callable target
/// cannot be expressed, so there is no variant for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    /// `wait` is missing, not a number, not finite, or negative.
    #[error("wait must be a non-negative number")]
    Wait,

    /// `immediate` is not a boolean.
    #[error("immediate must be a boolean")]
    Immediate,

    /// `max_cache_size` is not a finite non-negative number.
    #[error("maxCacheSize must be a non-negative number")]
    MaxCacheSize,

    /// `max_wait` is present but not a finite non-negative number.
    #[error("maxWait must be null or a non-negative number")]
    MaxWait,

    /// `max_wait` is shorter than `wait`.
    #[error("maxWait must be ≥ wait")]
    MaxWaitBelowWait,
}

/// Error delivered to callers through the shared outcome of a window.
///
/// Every caller of a window observes the same error, so the target's error
/// is shared behind an [`Arc`].
#[derive(Debug, Error)]
pub enum ModulateError<E> {
    /// The window was cancelled before its timer fired.
    #[error("{}", CANCELLED_MESSAGE)]
    Cancelled,

    /// The wrapped target failed during invocation.
    #[error("target failed: {0}")]
    Target(#[source] Arc<E>),

    /// The wrapped target panicked, either when called or while its future
    /// was polled. Carries the panic message when it is a string.
    #[error("target panicked: {0}")]
    Panicked(Arc<str>),
}

impl<E> Clone for ModulateError<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Cancelled => Self::Cancelled,
            Self::Target(error) => Self::Target(Arc::clone(error)),
            Self::Panicked(message) => Self::Panicked(Arc::clone(message)),
        }
    }
}

impl<E> ModulateError<E> {
    /// Returns true if this error came from [`cancel`](super::Modulator::cancel).
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if the target panicked.
    #[must_use]
    pub const fn is_panicked(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }

    /// Returns the target's error, if the target failed.
    #[must_use]
    pub fn target_error(&self) -> Option<&E> {
        match self {
            Self::Target(error) => Some(error),
            Self::Cancelled | Self::Panicked(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error, PartialEq, Eq)]
    #[error("lookup failed: {0}")]
    struct LookupError(&'static str);

    mod invalid_argument {
        use super::*;

        #[test]
        fn messages_match_validation_table() {
            assert_eq!(
                InvalidArgument::Wait.to_string(),
                "wait must be a non-negative number"
            );
            assert_eq!(
                InvalidArgument::Immediate.to_string(),
                "immediate must be a boolean"
            );
            assert_eq!(
                InvalidArgument::MaxCacheSize.to_string(),
                "maxCacheSize must be a non-negative number"
            );
            assert_eq!(
                InvalidArgument::MaxWait.to_string(),
                "maxWait must be null or a non-negative number"
            );
            assert_eq!(
                InvalidArgument::MaxWaitBelowWait.to_string(),
                "maxWait must be ≥ wait"
            );
        }
    }

    mod modulate_error {
        use super::*;

        #[test]
        fn cancelled_displays_message() {
            let error: ModulateError<LookupError> = ModulateError::Cancelled;
            assert_eq!(error.to_string(), "Debounced function call was cancelled.");
            assert!(error.is_cancelled());
            assert!(error.target_error().is_none());
        }

        #[test]
        fn target_preserves_source_chain() {
            let error = ModulateError::Target(Arc::new(LookupError("timeout")));

            assert!(error.to_string().contains("target failed"));
            let source = error.source();
            assert!(source.is_some());
            assert!(source.unwrap().to_string().contains("timeout"));
        }

        #[test]
        fn panicked_is_distinct_from_cancelled() {
            let error: ModulateError<LookupError> = ModulateError::Panicked("boom".into());

            assert_eq!(error.to_string(), "target panicked: boom");
            assert!(error.is_panicked());
            assert!(!error.is_cancelled());
            assert!(error.target_error().is_none());
        }

        #[test]
        fn clone_shares_target_error() {
            let error = ModulateError::Target(Arc::new(LookupError("boom")));
            let cloned = error.clone();

            match (&error, &cloned) {
                (ModulateError::Target(a), ModulateError::Target(b)) => {
                    assert!(Arc::ptr_eq(a, b));
                }
                _ => panic!("expected target errors"),
            }
            assert_eq!(cloned.target_error(), Some(&LookupError("boom")));
        }
    }
}
