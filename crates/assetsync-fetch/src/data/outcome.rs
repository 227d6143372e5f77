use std::fmt;

/// Result of one conditional fetch.
///
/// Every call to [`ConditionalFetcher::fetch`](crate::ConditionalFetcher::fetch)
/// ends in exactly one of these. Only `Failed` is an error; the finer cause is
/// logged, not returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOutcome {
    /// New content was downloaded and placed.
    Updated,
    /// The server confirmed the local copy is current.
    NotModified,
    /// The local copy is younger than the max age; no request was made.
    MaxAgeNotReached,
    /// Network, status, size or storage failure.
    Failed,
}

impl UpdateOutcome {
    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }

    /// `NotModified` and `MaxAgeNotReached` both mean nothing had to change.
    pub fn is_current(self) -> bool {
        matches!(self, Self::NotModified | Self::MaxAgeNotReached)
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Updated => write!(f, "updated"),
            UpdateOutcome::NotModified => write!(f, "not modified"),
            UpdateOutcome::MaxAgeNotReached => write!(f, "max age not reached"),
            UpdateOutcome::Failed => write!(f, "failed"),
        }
    }
}
