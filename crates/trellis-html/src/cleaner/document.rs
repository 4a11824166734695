//! Document assembly: body and head placement, root selection, pruning.

use std::collections::HashSet;

use trellis_common::{Diagnostic, ErrorKind, Severity};
use trellis_dom::NodeId;

use super::builder::TreeBuilder;
use super::{CleanedDocument, Item};
use crate::condition::TagCondition;
use crate::error::CleanError;
use crate::token::Doctype;

impl TreeBuilder<'_, '_> {
    /// Assemble the finished document from the processed item list.
    pub(crate) fn finish(
        mut self,
        items: Vec<Item>,
        doctype: Option<Doctype>,
    ) -> Result<CleanedDocument, CleanError> {
        debug_assert_eq!(self.ctx.namespaces.depth(), 0);
        let body = self.ctx.body;
        for item in items {
            self.cancel.check()?;
            for id in self.materialize(item)? {
                self.ctx.tree.append_child(body, id);
            }
        }

        self.promote_head_candidates()?;
        let (root, head, body) = self.select_root()?;
        self.prune(root)?;

        Ok(CleanedDocument {
            tree: self.ctx.tree,
            root,
            head,
            body,
            doctype,
            diagnostics: self.ctx.diagnostics,
            all_tags: self.ctx.all_tags,
        })
    }

    /// Move head candidates under `<head>`, skipping any whose ancestor is a
    /// candidate too so that nothing is moved twice.
    fn promote_head_candidates(&mut self) -> Result<(), CleanError> {
        let candidates: HashSet<NodeId> = self.ctx.head_candidates.iter().copied().collect();
        let head = self.ctx.head;
        for index in 0..self.ctx.head_candidates.len() {
            self.cancel.check()?;
            let id = self.ctx.head_candidates[index];
            let nested = self
                .ctx
                .tree
                .ancestors(id)
                .any(|ancestor| candidates.contains(&ancestor));
            if !nested && self.ctx.tree.parent(id) != Some(head) {
                self.ctx.tree.append_child(head, id);
            }
        }
        Ok(())
    }

    /// Root of the result, plus head and body when the envelope is kept.
    fn select_root(&mut self) -> Result<(NodeId, Option<NodeId>, Option<NodeId>), CleanError> {
        let document = self.ctx.tree.root();
        if self.props.omit_html_envelope {
            self.cancel.check()?;
            self.ctx.tree.move_children(self.ctx.body, document);
            Ok((document, None, None))
        } else {
            self.ctx.tree.append_child(document, self.ctx.html);
            Ok((self.ctx.html, Some(self.ctx.head), Some(self.ctx.body)))
        }
    }

    /// Remove elements matched by the prune set, or matched by none of a
    /// non-empty allow set, until a full pass removes nothing.
    fn prune(&mut self, root: NodeId) -> Result<(), CleanError> {
        if self.ctx.prune_set.is_empty() && self.ctx.allow_set.is_empty() {
            return Ok(());
        }
        loop {
            self.cancel.check()?;
            let order: Vec<NodeId> = self.ctx.tree.descendants(root).collect();
            let mut removed = 0_usize;
            for &id in order.iter().rev() {
                if self.ctx.is_synthetic(id) || !self.should_prune(id) {
                    continue;
                }
                self.ctx.tree.detach(id);
                let name = match self.ctx.tree.as_element_mut(id) {
                    Some(data) => {
                        data.pruned = true;
                        data.tag_name.clone()
                    }
                    None => continue,
                };
                self.report(Diagnostic::detached(
                    ErrorKind::NodePruned,
                    Severity::Modification,
                    &name,
                ));
                removed += 1;
            }
            if removed == 0 {
                return Ok(());
            }
            tracing::trace!(removed, "prune pass");
        }
    }

    fn should_prune(&self, id: NodeId) -> bool {
        let Some(data) = self.ctx.tree.as_element(id) else {
            return false;
        };
        if data.pruned {
            return false;
        }
        let matches =
            |condition: &TagCondition| condition.matches(&self.ctx.tree, id, self.provider);
        self.ctx.prune_set.iter().any(matches)
            || (!self.ctx.allow_set.is_empty() && !self.ctx.allow_set.iter().any(matches))
    }
}
