//! Markup diagnostics.
//!
//! Nothing about malformed HTML stops the cleaner. Every irregularity it
//! repairs is described by a [`Diagnostic`], handed to the caller's listener,
//! and mirrored into `tracing` so it shows up in whatever subscriber the
//! embedding application installed.

use strum_macros::Display;

/// How serious a reported irregularity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Severity {
    /// The input violated the content model and the tree had to be repaired.
    Error,
    /// The input was legal but undesirable and was rewritten or dropped.
    Ugly,
    /// A configured condition removed a node from the finished tree.
    Modification,
}

/// What kind of repair was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// A tag unknown to the rule provider was dropped.
    UnknownTagOmitted,
    /// A deprecated tag was dropped.
    DeprecatedTagOmitted,
    /// A tag was dropped because a mutually exclusive tag is still open.
    NotAllowedTag,
    /// A second occurrence of a unique tag was dropped.
    UniqueTagDuplicated,
    /// A tag was dropped because none of its fatal ancestors is open.
    FatalTagMissing,
    /// A missing parent was synthesized in front of a tag.
    RequiredParentMissing,
    /// Content was moved out of an element that may not contain it.
    UnpermittedChild,
    /// A wrapper element was synthesized so content could stay in place.
    PreferredChildInserted,
    /// A tag was still open when its enclosing snippet or the stream ended.
    UnclosedTag,
    /// An end tag without a matching open tag was discarded.
    StrayEndTag,
    /// An element was removed by a prune or allow condition.
    NodePruned,
}

/// A single recoverable irregularity found while cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The repair that was made.
    pub kind: ErrorKind,
    /// How serious the irregularity is.
    pub severity: Severity,
    /// Whether the cleaner is sure the input was wrong, or only suspects it.
    pub certain: bool,
    /// Name of the tag the repair concerns.
    pub tag: String,
    /// Index into the token sequence, when the repair happened during tree
    /// construction.
    pub position: Option<usize>,
}

impl Diagnostic {
    /// Create a diagnostic for a repair made at a token position.
    #[must_use]
    pub fn at(kind: ErrorKind, severity: Severity, certain: bool, tag: &str, position: usize) -> Self {
        Self {
            kind,
            severity,
            certain,
            tag: tag.to_string(),
            position: Some(position),
        }
    }

    /// Create a diagnostic that is not tied to a token position.
    #[must_use]
    pub fn detached(kind: ErrorKind, severity: Severity, tag: &str) -> Self {
        Self {
            kind,
            severity,
            certain: true,
            tag: tag.to_string(),
            position: None,
        }
    }

    /// Emit this diagnostic as a `tracing` event.
    ///
    /// Errors log at `warn`, rewrites of ugly markup at `debug` and
    /// condition-driven modifications at `trace`.
    pub fn emit(&self) {
        match self.severity {
            Severity::Error => tracing::warn!(
                kind = %self.kind,
                tag = %self.tag,
                certain = self.certain,
                position = ?self.position,
                "repaired malformed markup"
            ),
            Severity::Ugly => tracing::debug!(
                kind = %self.kind,
                tag = %self.tag,
                certain = self.certain,
                position = ?self.position,
                "rewrote ugly markup"
            ),
            Severity::Modification => tracing::trace!(
                kind = %self.kind,
                tag = %self.tag,
                "applied tag condition"
            ),
        }
    }
}
