use std::sync::Arc;

/// The single error type for all bpm-assert operations.
///
/// Every fallible API returns `bpm_assert::Result<T>` (alias for
/// `Result<T, bpm_assert::Error>`). Caller misuse, unmet expectations and
/// engine failures all map into variants of this enum so a test only needs
/// `?` to surface them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The assertion was called with missing or malformed arguments.
    /// Raised before the engine is queried.
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// The engine state contradicts the expectation.
    #[error("{0}")]
    AssertionFailed(String),

    #[error("No process definition deployed with key '{0}'")]
    UnknownProcessDefinition(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Cannot correlate message '{message}': {matches} matching subscriptions")]
    MismatchingCorrelation { message: String, matches: usize },

    #[error("External error: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    pub(crate) fn illegal_argument(message: impl Into<String>) -> Self {
        Error::IllegalArgument(message.into())
    }

    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        Error::IllegalState(message.into())
    }

    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Error::AssertionFailed(message.into())
    }

    /// Returns true for errors raised because the observed engine state did not
    /// match the expectation, as opposed to misuse or engine failures.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(self, Error::AssertionFailed(_))
    }

    /// Returns true for caller-misuse errors.
    pub fn is_illegal_argument(&self) -> bool {
        matches!(self, Error::IllegalArgument(_))
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::IllegalArgument(a), Self::IllegalArgument(b)) => a == b,
            (Self::IllegalState(a), Self::IllegalState(b)) => a == b,
            (Self::AssertionFailed(a), Self::AssertionFailed(b)) => a == b,
            (Self::UnknownProcessDefinition(a), Self::UnknownProcessDefinition(b)) => a == b,
            (
                Self::NotFound { kind: k1, id: i1 },
                Self::NotFound { kind: k2, id: i2 },
            ) => k1 == k2 && i1 == i2,
            (
                Self::MismatchingCorrelation {
                    message: m1,
                    matches: n1,
                },
                Self::MismatchingCorrelation {
                    message: m2,
                    matches: n2,
                },
            ) => m1 == m2 && n1 == n2,
            (Self::External(a), Self::External(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Error {}
