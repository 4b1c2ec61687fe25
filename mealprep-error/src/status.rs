//! Error status - how an error should be handled with respect to retries

use std::fmt;

/// The retry status of an error.
///
/// Inspired by OpenDAL: the status is orthogonal to the kind. A
/// `NetworkFailed` error starts out `Temporary`; after the caller has
/// exhausted its retries it can mark the same error `Persistent` so that
/// upper layers stop retrying without losing the original classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorStatus {
    /// Retrying will not help; the request itself is at fault
    #[default]
    Permanent,

    /// The failure is transient; a retry may succeed
    Temporary,

    /// Was temporary, but retries were exhausted without success
    Persistent,
}

impl ErrorStatus {
    /// Whether a retry is worth attempting
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorStatus::Temporary)
    }

    /// Transition a temporary status to persistent after failed retries.
    ///
    /// Permanent and persistent statuses are unchanged.
    pub fn persist(self) -> Self {
        match self {
            ErrorStatus::Temporary => ErrorStatus::Persistent,
            other => other,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorStatus::Permanent => "permanent",
            ErrorStatus::Temporary => "temporary",
            ErrorStatus::Persistent => "persistent",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(ErrorStatus::Permanent.to_string(), "permanent");
        assert_eq!(ErrorStatus::Temporary.to_string(), "temporary");
        assert_eq!(ErrorStatus::Persistent.to_string(), "persistent");
    }

    #[test]
    fn test_persist_transitions() {
        assert_eq!(ErrorStatus::Temporary.persist(), ErrorStatus::Persistent);
        assert_eq!(ErrorStatus::Permanent.persist(), ErrorStatus::Permanent);
        assert_eq!(ErrorStatus::Persistent.persist(), ErrorStatus::Persistent);
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorStatus::Temporary.is_retryable());
        assert!(!ErrorStatus::Permanent.is_retryable());
        assert!(!ErrorStatus::Persistent.is_retryable());
    }
}
