//! Per-invocation cleaning state.

use std::mem;

use indexmap::IndexSet;
use trellis_common::Diagnostic;
use trellis_dom::{DomTree, ElementData, NodeId, NodeType};

use super::child_breaks::ChildBreakTracker;
use super::namespace::NamespaceTracker;
use super::open_tags::OpenTagStack;
use crate::condition::TagCondition;

/// Open-tag and child-break bookkeeping for one level of processing.
///
/// Relocated fragments are cleaned with a fresh state of their own.
#[derive(Debug, Default)]
pub(crate) struct NestingState<'r> {
    pub(crate) open_tags: OpenTagStack<'r>,
    pub(crate) child_breaks: ChildBreakTracker<'r>,
}

/// Everything one `clean` call mutates. Never shared between calls.
#[derive(Debug)]
pub(crate) struct CleaningContext<'r> {
    pub(crate) tree: DomTree,
    pub(crate) html: NodeId,
    pub(crate) head: NodeId,
    pub(crate) body: NodeId,
    pub(crate) head_opened: bool,
    pub(crate) body_opened: bool,
    pub(crate) all_tags: IndexSet<String>,
    pub(crate) head_candidates: Vec<NodeId>,
    pub(crate) prune_set: &'r [TagCondition],
    pub(crate) allow_set: &'r [TagCondition],
    pub(crate) namespaces: NamespaceTracker,
    pub(crate) nesting: NestingState<'r>,
    saved_nesting: Vec<NestingState<'r>>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

fn synthetic_element(tree: &mut DomTree, name: &str) -> NodeId {
    let mut data = ElementData::new(name);
    data.auto_generated = true;
    data.mark_formed();
    tree.alloc(NodeType::Element(data))
}

impl<'r> CleaningContext<'r> {
    pub(crate) fn new(prune_set: &'r [TagCondition], allow_set: &'r [TagCondition]) -> Self {
        let mut tree = DomTree::new();
        let html = synthetic_element(&mut tree, "html");
        let head = synthetic_element(&mut tree, "head");
        let body = synthetic_element(&mut tree, "body");
        tree.append_child(html, head);
        tree.append_child(html, body);
        Self {
            tree,
            html,
            head,
            body,
            head_opened: false,
            body_opened: false,
            all_tags: IndexSet::new(),
            head_candidates: Vec::new(),
            prune_set,
            allow_set,
            namespaces: NamespaceTracker::default(),
            nesting: NestingState::default(),
            saved_nesting: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn push_nesting(&mut self) {
        let outer = mem::take(&mut self.nesting);
        self.saved_nesting.push(outer);
    }

    pub(crate) fn pop_nesting(&mut self) {
        if let Some(outer) = self.saved_nesting.pop() {
            self.nesting = outer;
        }
    }

    pub(crate) const fn nesting_depth(&self) -> usize {
        self.saved_nesting.len()
    }

    /// The synthetic `html`, `head` or `body` node.
    pub(crate) fn is_synthetic(&self, id: NodeId) -> bool {
        id == self.html || id == self.head || id == self.body
    }

    pub(crate) fn synthetic_for(&self, name: &str) -> Option<NodeId> {
        match name {
            "html" => Some(self.html),
            "head" => Some(self.head),
            "body" => Some(self.body),
            _ => None,
        }
    }

    pub(crate) fn add_head_candidate(&mut self, id: NodeId) {
        if !self.head_candidates.contains(&id) {
            self.head_candidates.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_has_envelope() {
        let ctx = CleaningContext::new(&[], &[]);
        assert_eq!(ctx.tree.children(ctx.html), &[ctx.head, ctx.body]);
        assert!(ctx.is_synthetic(ctx.body));
        assert_eq!(ctx.synthetic_for("head"), Some(ctx.head));
        assert_eq!(ctx.synthetic_for("div"), None);
        assert!(ctx.tree.as_element(ctx.html).is_some_and(|e| e.formed));
    }

    #[test]
    fn test_nesting_states_are_independent() {
        let mut ctx = CleaningContext::new(&[], &[]);
        ctx.nesting.open_tags.push("table", None, 0);

        ctx.push_nesting();
        assert!(ctx.nesting.open_tags.is_empty());
        assert_eq!(ctx.nesting_depth(), 1);
        ctx.nesting.open_tags.push("div", None, 0);

        ctx.pop_nesting();
        assert_eq!(ctx.nesting_depth(), 0);
        assert_eq!(ctx.nesting.open_tags.last().map(|tp| tp.name.as_str()), Some("table"));
    }

    #[test]
    fn test_head_candidates_are_deduplicated() {
        let mut ctx = CleaningContext::new(&[], &[]);
        let id = NodeId(7);
        ctx.add_head_candidate(id);
        ctx.add_head_candidate(id);
        assert_eq!(ctx.head_candidates, vec![id]);
    }
}
