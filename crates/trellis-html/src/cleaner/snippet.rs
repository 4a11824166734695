//! Turning runs of flat items into nested subtrees.

use std::mem;

use trellis_common::{Diagnostic, ErrorKind, Severity};
use trellis_dom::{ElementData, NodeId, NodeType};

use super::Item;
use super::builder::TreeBuilder;
use super::open_tags::ClosedTag;
use crate::error::CleanError;
use crate::token::{StartTag, Token};

impl TreeBuilder<'_, '_> {
    /// Close every open tag whose start token lies in `from..stop`.
    ///
    /// Start tokens in the span are still open and therefore nested in list
    /// order: each becomes a child of the previous one, and every other item
    /// is appended to the innermost element formed so far. The first start
    /// token's slot receives the finished subtree. `stop` of `None` runs to
    /// the end of the list.
    ///
    /// Returns the formed tags, outermost first.
    pub(crate) fn close_snippet(
        &mut self,
        items: &mut [Item],
        from: usize,
        stop: Option<usize>,
    ) -> Result<Vec<ClosedTag>, CleanError> {
        let end = stop.map_or(items.len(), |stop| stop.min(items.len()));
        let mut closed = Vec::new();
        let mut current: Option<NodeId> = None;

        for position in from..end {
            self.cancel.check()?;
            match mem::replace(&mut items[position], Item::Vacant) {
                Item::Token(Token::StartTag(mut tag)) => {
                    let moved = self.clean_relocated(mem::take(&mut tag.relocated))?;
                    let name = tag.name.clone();
                    let namespace_pushed = tag.namespace_pushed;
                    let node = self.form_node(tag);
                    let _ = self.ctx.nesting.open_tags.pop_named(&name);
                    if namespace_pushed {
                        let _ = self.ctx.namespaces.pop();
                    }

                    if let Some(parent) = current {
                        for id in moved {
                            self.ctx.tree.append_child(parent, id);
                        }
                        self.ctx.tree.append_child(parent, node);
                    } else if moved.is_empty() {
                        items[position] = Item::Node(node);
                    } else {
                        let mut group: Vec<Item> = moved.into_iter().map(Item::Node).collect();
                        group.push(Item::Node(node));
                        items[position] = Item::Group(group);
                    }

                    closed.push(ClosedTag {
                        position,
                        name,
                        node,
                    });
                    current = Some(node);
                }
                other => {
                    if let Some(parent) = current {
                        for id in self.materialize(other)? {
                            self.ctx.tree.append_child(parent, id);
                        }
                    } else {
                        items[position] = other;
                    }
                }
            }
        }
        Ok(closed)
    }

    /// Report and close every tag still open, then drop remaining breaks.
    pub(crate) fn close_all(&mut self, items: &mut [Item]) -> Result<(), CleanError> {
        let unclosed: Vec<(String, usize)> = self
            .ctx
            .nesting
            .open_tags
            .iter()
            .map(|tp| (tp.name.clone(), tp.position))
            .collect();
        for (name, position) in &unclosed {
            self.report(Diagnostic::at(
                ErrorKind::UnclosedTag,
                Severity::Ugly,
                true,
                name,
                *position,
            ));
        }
        if let Some(&(_, first)) = unclosed.first() {
            let _ = self.close_snippet(items, first, None)?;
        }
        let discarded = self.ctx.nesting.child_breaks.discard_all();
        if discarded > 0 {
            tracing::trace!(discarded, "dropped child breaks at end of stream");
        }
        debug_assert!(self.ctx.nesting.open_tags.is_empty());
        Ok(())
    }

    /// Clean content that was moved in front of a start tag, with its own
    /// open-tag and child-break bookkeeping, and return the resulting nodes.
    fn clean_relocated(&mut self, mut relocated: Vec<Item>) -> Result<Vec<NodeId>, CleanError> {
        if relocated.is_empty() {
            return Ok(Vec::new());
        }
        self.ctx.push_nesting();
        tracing::trace!(
            items = relocated.len(),
            depth = self.ctx.nesting_depth(),
            "cleaning relocated items"
        );
        let outcome = self
            .make_tree(&mut relocated)
            .and_then(|()| self.close_all(&mut relocated));
        self.ctx.pop_nesting();
        outcome?;

        let mut nodes = Vec::new();
        for item in relocated {
            nodes.extend(self.materialize(item)?);
        }
        Ok(nodes)
    }

    /// Tree nodes for an item that has been fully processed.
    pub(crate) fn materialize(&mut self, item: Item) -> Result<Vec<NodeId>, CleanError> {
        let nodes = match item {
            Item::Vacant | Item::Token(Token::EndTag { .. }) => Vec::new(),
            Item::Node(id) => vec![id],
            Item::Group(group) => {
                let mut nodes = Vec::new();
                for inner in group {
                    nodes.extend(self.materialize(inner)?);
                }
                nodes
            }
            Item::Token(Token::Text { content }) => {
                if content.is_empty() {
                    Vec::new()
                } else {
                    vec![self.ctx.tree.alloc(NodeType::Text(content))]
                }
            }
            Item::Token(Token::Comment { content }) => {
                vec![self.ctx.tree.alloc(NodeType::Comment(content))]
            }
            Item::Token(Token::CData { content }) => {
                vec![self.ctx.tree.alloc(NodeType::CData(content))]
            }
            Item::Token(Token::StartTag(mut tag)) => {
                let mut nodes = self.clean_relocated(mem::take(&mut tag.relocated))?;
                nodes.push(self.form_node(tag));
                nodes
            }
        };
        Ok(nodes)
    }

    /// Convert a start token into an element. The only place elements are
    /// formed.
    pub(crate) fn form_node(&mut self, tag: StartTag) -> NodeId {
        let mut data = ElementData::new(&tag.name);
        for attr in &tag.attributes {
            data.set_attribute_if_absent(&attr.name, &attr.value);
        }
        data.auto_generated = tag.auto_generated;
        data.foreign_markup = tag.foreign_markup;
        data.namespace = tag.namespace;
        data.mark_formed();
        let id = self.ctx.tree.alloc(NodeType::Element(data));
        if tag.head_candidate {
            self.ctx.add_head_candidate(id);
        }
        id
    }
}
