//! Tag conditions for pruning and allow lists.

use serde::{Deserialize, Serialize};
use trellis_dom::{DomTree, NodeId, NodeType};

use crate::error::CleanError;
use crate::tag_rules::{TagInfo, TagRuleProvider};

/// A predicate over an element in the finished tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagCondition {
    /// The element has this tag name (ASCII case-insensitive).
    Name(String),
    /// The element carries this attribute.
    AttributeExists(String),
    /// The element carries this attribute with this value.
    AttributeValue {
        /// Attribute name (ASCII case-insensitive).
        attribute: String,
        /// Expected value.
        value: String,
        /// Compare values exactly instead of ASCII case-insensitively.
        case_sensitive: bool,
    },
    /// The element was synthesized by the cleaner.
    AutoGenerated,
    /// The element may have content but holds nothing except whitespace and
    /// comments, and has no `id`.
    EmptyContent,
}

impl TagCondition {
    /// Parse a comma-separated list of tag names into [`TagCondition::Name`]s.
    ///
    /// Empty entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CleanError::InvalidTagList`] for an entry that is not a tag
    /// name.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, CleanError> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let valid = entry
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
                if valid && entry.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    Ok(Self::Name(entry.to_ascii_lowercase()))
                } else {
                    Err(CleanError::InvalidTagList {
                        entry: entry.to_string(),
                    })
                }
            })
            .collect()
    }

    /// Whether the node `id` satisfies this condition. Non-elements never do.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, id: NodeId, provider: &dyn TagRuleProvider) -> bool {
        let Some(data) = tree.as_element(id) else {
            return false;
        };
        match self {
            Self::Name(name) => data.tag_name.eq_ignore_ascii_case(name),
            Self::AttributeExists(attribute) => {
                data.attrs.keys().any(|k| k.eq_ignore_ascii_case(attribute))
            }
            Self::AttributeValue {
                attribute,
                value,
                case_sensitive,
            } => data.attrs.iter().any(|(k, v)| {
                k.eq_ignore_ascii_case(attribute)
                    && if *case_sensitive {
                        v == value
                    } else {
                        v.eq_ignore_ascii_case(value)
                    }
            }),
            Self::AutoGenerated => data.auto_generated,
            Self::EmptyContent => {
                let allows_body = data.foreign_markup
                    || provider
                        .tag_info(&data.tag_name)
                        .is_none_or(TagInfo::allows_body);
                allows_body
                    && data.id().is_none()
                    && tree.children(id).iter().all(|&child| {
                        match tree.get(child).map(|n| &n.node_type) {
                            Some(NodeType::Text(text)) => text.trim().is_empty(),
                            Some(NodeType::Comment(_)) => true,
                            _ => false,
                        }
                    })
            }
        }
    }
}
