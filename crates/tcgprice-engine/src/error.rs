//! Resolution outcomes that are not a priced record.

use thiserror::Error;

/// Why a resolution did not produce a (successful) price record.
///
/// Variants carry only strings so one outcome can be handed to every caller
/// that shared a coalesced resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Required identity fields were missing; nothing was fetched
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The marketplace search returned no results at all
    #[error("no matching product found for {0}")]
    NoCandidatesFound(String),

    /// The product page yielded no usable prices, or fetching kept failing
    #[error("price fetch failed: {reason}")]
    DetailFetchFailed {
        /// Last failure seen
        reason: String,
        /// Whether the last failure was a timeout
        timed_out: bool,
    },

    /// Writing the record to the cache failed
    #[error("failed to persist price record: {0}")]
    PersistFailed(String),

    /// The caller cancelled the resolution
    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    /// HTTP-equivalent status for this outcome.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidQuery(_) => 400,
            Self::NoCandidatesFound(_) => 404,
            Self::DetailFetchFailed {
                timed_out: true, ..
            } => 504,
            Self::DetailFetchFailed { .. } | Self::PersistFailed(_) => 500,
            Self::Cancelled => 499,
        }
    }
}

/// Result type alias using `ResolveError`.
pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ResolveError::InvalidQuery("x".into()).status_code(), 400);
        assert_eq!(ResolveError::NoCandidatesFound("x".into()).status_code(), 404);
        assert_eq!(
            ResolveError::DetailFetchFailed {
                reason: "no prices".into(),
                timed_out: false
            }
            .status_code(),
            500
        );
        assert_eq!(
            ResolveError::DetailFetchFailed {
                reason: "30s".into(),
                timed_out: true
            }
            .status_code(),
            504
        );
        assert_eq!(ResolveError::Cancelled.status_code(), 499);
    }

    #[test]
    fn test_error_display() {
        let err = ResolveError::NoCandidatesFound("BLTR-EN051".to_string());
        assert_eq!(err.to_string(), "no matching product found for BLTR-EN051");
    }
}
