//! Tags force-closed because a child could not nest inside them.
//!
//! Each break pairs the closed tag with the tag whose arrival closed it. When
//! the breaking tag is closed in turn, the break is popped and the closed tag
//! may be reopened after it.

use super::open_tags::{ClosedTag, TagPos};

#[derive(Debug, Default)]
pub(crate) struct ChildBreakTracker<'r> {
    closed_by_child_break: Vec<ClosedTag>,
    breaking_tags: Vec<TagPos<'r>>,
}

impl<'r> ChildBreakTracker<'r> {
    pub(crate) fn record_break(&mut self, closed: ClosedTag, breaking: TagPos<'r>) {
        self.closed_by_child_break.push(closed);
        self.breaking_tags.push(breaking);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.breaking_tags.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.closed_by_child_break.len(), self.breaking_tags.len());
        self.breaking_tags.len()
    }

    pub(crate) fn last_breaking_tag_name(&self) -> Option<&str> {
        self.breaking_tags.last().map(|tp| tp.name.as_str())
    }

    pub(crate) fn last_breaking_tag_position(&self) -> Option<usize> {
        self.breaking_tags.last().map(|tp| tp.position)
    }

    pub(crate) fn pop(&mut self) -> Option<(ClosedTag, TagPos<'r>)> {
        let closed = self.closed_by_child_break.pop()?;
        let breaking = self.breaking_tags.pop()?;
        Some((closed, breaking))
    }

    /// Drop every remaining break, returning how many there were.
    pub(crate) fn discard_all(&mut self) -> usize {
        let mut count = 0;
        while self.pop().is_some() {
            count += 1;
        }
        count
    }

    /// Keep positions valid after an item was inserted at `at`.
    pub(crate) fn shift_from(&mut self, at: usize) {
        for tp in &mut self.breaking_tags {
            if tp.position >= at {
                tp.position += 1;
            }
        }
        for closed in &mut self.closed_by_child_break {
            if closed.position >= at {
                closed.position += 1;
            }
        }
    }
}
