//! Tags that were accepted but not closed yet.

use std::collections::HashSet;

use trellis_dom::NodeId;

use crate::tag_rules::TagInfo;

/// An open tag: where its start token sits in the item list and which rules
/// apply to it.
#[derive(Debug, Clone)]
pub(crate) struct TagPos<'r> {
    pub(crate) position: usize,
    pub(crate) name: String,
    pub(crate) info: Option<&'r TagInfo>,
}

/// A tag that a snippet close turned into a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClosedTag {
    pub(crate) position: usize,
    pub(crate) name: String,
    pub(crate) node: NodeId,
}

/// Open tags, outermost first.
///
/// Positions are strictly increasing from bottom to top.
#[derive(Debug, Default)]
pub(crate) struct OpenTagStack<'r> {
    tags: Vec<TagPos<'r>>,
}

impl<'r> OpenTagStack<'r> {
    pub(crate) fn push(&mut self, name: &str, info: Option<&'r TagInfo>, position: usize) {
        debug_assert!(
            self.tags.last().is_none_or(|last| last.position < position),
            "open tag <{name}> accepted out of order"
        );
        self.tags.push(TagPos {
            position,
            name: name.to_string(),
            info,
        });
    }

    /// Remove the most recent entry named `name`.
    pub(crate) fn pop_named(&mut self, name: &str) -> Option<TagPos<'r>> {
        let index = self.tags.iter().rposition(|tp| tp.name == name)?;
        Some(self.tags.remove(index))
    }

    pub(crate) fn last(&self) -> Option<&TagPos<'r>> {
        self.tags.last()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = &TagPos<'r>> {
        self.tags.iter()
    }

    /// Nearest open tag named `name`.
    ///
    /// The search gives up when it crosses one of the target's fatal tags, so
    /// an end tag never reaches past a scope boundary such as `<table>`.
    pub(crate) fn find_open(&self, name: &str, info: Option<&TagInfo>) -> Option<&TagPos<'r>> {
        for tp in self.tags.iter().rev() {
            if tp.name == name {
                return Some(tp);
            }
            if info.is_some_and(|info| info.is_fatal_tag(&tp.name)) {
                return None;
            }
        }
        None
    }

    pub(crate) fn is_any_open(&self, names: &HashSet<String>) -> bool {
        self.tags.iter().any(|tp| names.contains(&tp.name))
    }

    /// Open tag whose start token receives content that the last open tag
    /// rejected.
    ///
    /// Walks inward-out and returns the tag just inside the nearest one that
    /// accepts anything, so the content lands in front of the restrictive
    /// subtree. Without such an ancestor the outermost open tag is used.
    pub(crate) fn find_relocation_target(&self) -> Option<&TagPos<'r>> {
        let mut previous: Option<&TagPos<'r>> = None;
        for tp in self.tags.iter().rev() {
            let accepts_anything = tp.info.is_none_or(TagInfo::allows_anything);
            if accepts_anything && previous.is_some() {
                return previous;
            }
            previous = Some(tp);
        }
        self.tags.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag_rules::{BelongsTo, ContentType};

    fn restrictive(name: &str) -> TagInfo {
        TagInfo::new(name, ContentType::All, BelongsTo::Body)
            .define_allowed_children_tags("tr")
            .define_fatal_tags("table")
    }

    #[test]
    fn test_find_open_stops_at_fatal_tag() {
        let table = TagInfo::new("table", ContentType::All, BelongsTo::Body)
            .define_allowed_children_tags("tbody");
        let td = TagInfo::new("td", ContentType::All, BelongsTo::Body).define_fatal_tags("table");
        let mut stack = OpenTagStack::default();
        stack.push("td", Some(&td), 0);
        stack.push("table", Some(&table), 3);

        assert!(stack.find_open("td", Some(&td)).is_none());
        assert_eq!(stack.find_open("td", None).map(|tp| tp.position), Some(0));
        assert_eq!(stack.find_open("table", None).map(|tp| tp.position), Some(3));
    }

    #[test]
    fn test_pop_named_takes_most_recent() {
        let mut stack = OpenTagStack::default();
        stack.push("div", None, 0);
        stack.push("span", None, 1);
        stack.push("div", None, 2);

        assert_eq!(stack.pop_named("div").map(|tp| tp.position), Some(2));
        assert_eq!(stack.last().map(|tp| tp.name.as_str()), Some("span"));
        assert!(stack.pop_named("p").is_none());
    }

    #[test]
    fn test_relocation_target_is_inside_accepting_ancestor() {
        let tbody = restrictive("tbody");
        let tr = restrictive("tr");
        let table = restrictive("table");
        let mut stack = OpenTagStack::default();
        stack.push("div", None, 0);
        stack.push("table", Some(&table), 1);
        stack.push("tbody", Some(&tbody), 2);
        stack.push("tr", Some(&tr), 3);

        assert_eq!(stack.find_relocation_target().map(|tp| tp.position), Some(1));
    }

    #[test]
    fn test_relocation_target_falls_back_to_outermost() {
        let table = restrictive("table");
        let tbody = restrictive("tbody");
        let mut stack = OpenTagStack::default();
        stack.push("table", Some(&table), 0);
        stack.push("tbody", Some(&tbody), 1);

        assert_eq!(stack.find_relocation_target().map(|tp| tp.position), Some(0));
        assert!(OpenTagStack::default().find_relocation_target().is_none());
    }

    #[test]
    fn test_is_any_open() {
        let mut stack = OpenTagStack::default();
        stack.push("form", None, 0);
        let forbidden: HashSet<String> = ["form".to_string()].into_iter().collect();
        assert!(stack.is_any_open(&forbidden));
        assert!(!OpenTagStack::default().is_any_open(&forbidden));
    }
}
