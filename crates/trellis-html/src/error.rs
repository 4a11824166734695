//! Error type for cleaning operations.

use thiserror::Error;
use trellis_common::Canceled;

/// Hard failures. Malformed markup never produces one of these; it is
/// repaired and reported as a diagnostic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanError {
    /// The cancellation token was raised before the tree was finished.
    #[error("cleaning was canceled")]
    Canceled,

    /// The tag rules kept synthesizing the same parent without making
    /// progress, for example two tags that each require the other.
    #[error("tag rules keep synthesizing <{tag}> without making progress")]
    RuleCycle {
        /// The tag that was synthesized twice.
        tag: String,
    },

    /// A prune or allow list entry is not a tag name.
    #[error("invalid tag list entry {entry:?}")]
    InvalidTagList {
        /// The offending entry, trimmed.
        entry: String,
    },
}

impl From<Canceled> for CleanError {
    fn from(_: Canceled) -> Self {
        Self::Canceled
    }
}
