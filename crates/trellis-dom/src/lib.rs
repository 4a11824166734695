//! Document tree for the Trellis HTML cleaner.
//!
//! This crate provides an arena-based tree that the cleaner builds and
//! serializers walk.
//!
//! # Design
//!
//! Every node lives in one vector and is addressed by a [`NodeId`]. A parent
//! owns its children through the `children` list; the `parent` field is a
//! plain back-reference used for upward queries only. Moving a node always
//! detaches it from its old parent first, so a node is reachable from at most
//! one parent and the parent/child relation never forms a cycle.

use indexmap::IndexMap;

/// Ordered map of attribute names to values for an element.
///
/// Insertion order is document order. When a tag repeats an attribute the
/// first occurrence wins (see [`ElementData::set_attribute_if_absent`]).
pub type AttributesMap = IndexMap<String, String>;

/// A type-safe index into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The parentless root node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// A node slot in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// What this node is.
    pub node_type: NodeType,

    /// Back-reference to the owning parent, if attached.
    pub parent: Option<NodeId>,

    /// Owned children in document order.
    pub children: Vec<NodeId>,
}

/// The kind of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// The synthetic parentless root. It has no name and is the wrapper that
    /// holds either the `html` element or, when the envelope is omitted, the
    /// body content directly.
    Document,
    /// An element.
    Element(ElementData),
    /// Character data.
    Text(String),
    /// A comment, without the `<!--`/`-->` delimiters.
    Comment(String),
    /// A CDATA section, without the `<![CDATA[`/`]]>` delimiters.
    CData(String),
}

/// Element-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ElementData {
    /// The tag name as it appeared in the token stream (possibly prefixed,
    /// e.g. `svg:rect`).
    pub tag_name: String,
    /// Attributes in document order.
    pub attrs: AttributesMap,
    /// Namespace URI for foreign markup; `None` for plain HTML elements.
    pub namespace: Option<String>,
    /// Set once, when the start token was converted into this node.
    pub formed: bool,
    /// The element was synthesized by the cleaner rather than written in the
    /// input (required parents, copies, reopened ancestors).
    pub auto_generated: bool,
    /// The element was removed from the tree by a prune or allow condition.
    pub pruned: bool,
    /// The element belongs to non-HTML markup such as SVG or `MathML`.
    pub foreign_markup: bool,
}

impl ElementData {
    /// Create element data with no attributes and all flags cleared.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            attrs: AttributesMap::new(),
            namespace: None,
            formed: false,
            auto_generated: false,
            pruned: false,
            foreign_markup: false,
        }
    }

    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").map(String::as_str)
    }

    /// Add an attribute unless one with the same name is already present.
    pub fn set_attribute_if_absent(&mut self, name: &str, value: &str) {
        if !self.attrs.contains_key(name) {
            let _ = self.attrs.insert(name.to_string(), value.to_string());
        }
    }

    /// Remove an attribute, keeping the order of the remaining ones.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attrs.shift_remove(name)
    }

    /// Mark the element as formed.
    ///
    /// Formation happens exactly once per element; forming twice is a bug in
    /// the caller.
    pub fn mark_formed(&mut self) {
        debug_assert!(!self.formed, "element <{}> formed twice", self.tag_name);
        self.formed = true;
    }
}

/// Arena-based document tree.
///
/// Index 0 always holds the [`NodeType::Document`] root.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new tree with just the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                node_type: NodeType::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Get the root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Number of allocated nodes, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty (it never is; the root always exists).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new, detached node and return its ID.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// A child that is already attached elsewhere is detached first, so a
    /// node never has two owners.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert_ne!(parent, child, "node appended to itself");
        debug_assert!(
            !self.is_descendant_of(parent, child),
            "appending an ancestor would create a cycle"
        );
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Remove `id` from its parent's children. The node stays in the arena
    /// and keeps its own subtree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let moved = std::mem::take(&mut self.nodes[from.0].children);
        for &child in &moved {
            self.nodes[child.0].parent = Some(to);
        }
        self.nodes[to.0].children.extend(moved);
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over `id` and all of its descendants in document order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> DescendantIterator<'_> {
        DescendantIterator {
            tree: self,
            stack: vec![id],
        }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Tag name of an element node.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag_name.as_str())
    }

    /// Concatenated text of all text and CDATA descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            match self.get(node).map(|n| &n.node_type) {
                Some(NodeType::Text(s) | NodeType::CData(s)) => out.push_str(s),
                _ => {}
            }
        }
        out
    }

    /// First element named `tag` in document order at or below `from`.
    #[must_use]
    pub fn find_element(&self, from: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(from)
            .find(|&id| self.tag_name(id) == Some(tag))
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
