//! The cleaner: token sequence in, well-formed document tree out.
//!
//! [`HtmlCleaner`] owns the configuration and a shared tag rule provider and
//! is immutable once built, so one instance can serve any number of
//! sequential or concurrent calls. Each call gets its own cleaning context,
//! open-tag stack, child-break tracker and namespace tracker.

mod builder;
mod child_breaks;
mod context;
mod document;
mod namespace;
mod open_tags;
mod snippet;

pub use namespace::{MATHML_NAMESPACE, SVG_NAMESPACE, XHTML_NAMESPACE};

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use trellis_common::{CancelToken, Diagnostic};
use trellis_dom::{DomTree, NodeId};

use crate::condition::TagCondition;
use crate::config::CleanerProperties;
use crate::error::CleanError;
use crate::serialize::HtmlSerializer;
use crate::tag_rules::{Html5TagProvider, TagRuleProvider};
use crate::token::{Doctype, Token};
use builder::TreeBuilder;
use context::CleaningContext;

/// One slot of the working list the builder rewrites in place.
///
/// Slots are never removed. A consumed token leaves `Vacant` behind, a
/// closed subtree leaves its root `Node`, and a closed subtree that had
/// content relocated in front of it leaves a `Group`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Vacant,
    Token(Token),
    Node(NodeId),
    Group(Vec<Item>),
}

/// Observer for diagnostics raised while cleaning.
pub trait CleanListener {
    /// Called once per diagnostic, in the order they are raised.
    fn on_diagnostic(&mut self, diagnostic: &Diagnostic);
}

/// A listener that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl CleanListener for NoopListener {
    fn on_diagnostic(&mut self, _diagnostic: &Diagnostic) {}
}

impl CleanListener for Vec<Diagnostic> {
    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// The result of a successful clean.
#[derive(Debug, Clone)]
pub struct CleanedDocument {
    /// The tree. It owns every node, including pruned ones, which are
    /// detached and flagged.
    pub tree: DomTree,
    /// The `html` element, or the parentless document node when the
    /// envelope is omitted.
    pub root: NodeId,
    /// The `head` element, unless the envelope is omitted.
    pub head: Option<NodeId>,
    /// The `body` element, unless the envelope is omitted.
    pub body: Option<NodeId>,
    /// The doctype passed alongside the tokens.
    pub doctype: Option<Doctype>,
    /// Every repair made, in order.
    pub diagnostics: Vec<Diagnostic>,
    /// Names of all accepted tags, in the order first seen.
    pub all_tags: IndexSet<String>,
}

impl CleanedDocument {
    /// Whether a tag with this name was accepted anywhere in the input.
    #[must_use]
    pub fn saw_tag(&self, name: &str) -> bool {
        self.all_tags.contains(name)
    }

    /// Top-level content nodes: the body's children, or the root's when the
    /// envelope is omitted.
    #[must_use]
    pub fn content(&self) -> &[NodeId] {
        self.tree.children(self.body.unwrap_or(self.root))
    }
}

/// Tolerant tree builder for HTML token streams.
#[derive(Clone)]
pub struct HtmlCleaner {
    properties: CleanerProperties,
    provider: Arc<dyn TagRuleProvider>,
    prune_set: Vec<TagCondition>,
    allow_set: Vec<TagCondition>,
}

impl fmt::Debug for HtmlCleaner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlCleaner")
            .field("properties", &self.properties)
            .field("prune_set", &self.prune_set)
            .field("allow_set", &self.allow_set)
            .finish_non_exhaustive()
    }
}

impl HtmlCleaner {
    /// Create a cleaner using the built-in HTML5 rules.
    ///
    /// # Errors
    ///
    /// Returns [`CleanError::InvalidTagList`] if the prune or allow list
    /// cannot be parsed.
    pub fn new(properties: CleanerProperties) -> Result<Self, CleanError> {
        Self::with_provider(properties, Html5TagProvider::shared())
    }

    /// Create a cleaner with a custom tag rule provider.
    ///
    /// # Errors
    ///
    /// Returns [`CleanError::InvalidTagList`] if the prune or allow list
    /// cannot be parsed.
    pub fn with_provider(
        properties: CleanerProperties,
        provider: Arc<dyn TagRuleProvider>,
    ) -> Result<Self, CleanError> {
        let prune_set = properties.prune_set()?;
        let allow_set = properties.allow_set()?;
        Ok(Self {
            properties,
            provider,
            prune_set,
            allow_set,
        })
    }

    /// The configuration this cleaner was built with.
    #[must_use]
    pub const fn properties(&self) -> &CleanerProperties {
        &self.properties
    }

    /// The tag rules in use.
    #[must_use]
    pub fn provider(&self) -> &dyn TagRuleProvider {
        &*self.provider
    }

    /// A serializer using this cleaner's rules and attribute-name settings.
    #[must_use]
    pub fn serializer(&self) -> HtmlSerializer<'_> {
        HtmlSerializer::new(&*self.provider, &self.properties)
    }

    /// Clean a token sequence.
    ///
    /// # Errors
    ///
    /// Fails only on [`CleanError::RuleCycle`]; malformed markup is repaired
    /// and reported through the document's diagnostics.
    pub fn clean(&self, tokens: Vec<Token>) -> Result<CleanedDocument, CleanError> {
        self.clean_with(tokens, None, &CancelToken::new(), &mut NoopListener)
    }

    /// Clean a token sequence with a doctype, a cancellation token and a
    /// diagnostic listener.
    ///
    /// # Errors
    ///
    /// Returns [`CleanError::Canceled`] as soon as `cancel` is raised; no
    /// partial tree is returned. Returns [`CleanError::RuleCycle`] when the
    /// tag rules keep synthesizing the same parent.
    pub fn clean_with(
        &self,
        tokens: Vec<Token>,
        doctype: Option<Doctype>,
        cancel: &CancelToken,
        listener: &mut dyn CleanListener,
    ) -> Result<CleanedDocument, CleanError> {
        let _span = tracing::debug_span!("clean", tokens = tokens.len()).entered();
        cancel.check()?;

        let mut items: Vec<Item> = tokens.into_iter().map(Item::Token).collect();
        let ctx = CleaningContext::new(&self.prune_set, &self.allow_set);
        let mut builder = TreeBuilder::new(&*self.provider, &self.properties, cancel, listener, ctx);
        builder.make_tree(&mut items)?;
        builder.close_all(&mut items)?;
        let document = builder.finish(items, doctype)?;

        tracing::debug!(
            nodes = document.tree.len(),
            diagnostics = document.diagnostics.len(),
            "clean finished"
        );
        Ok(document)
    }
}
