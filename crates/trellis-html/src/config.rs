//! Cleaner configuration.

use serde::{Deserialize, Serialize};

use crate::condition::TagCondition;
use crate::error::CleanError;

/// Options consumed by the cleaner and its serializer.
///
/// Deserializing fills missing fields from [`Default`], so a configuration
/// file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CleanerProperties {
    /// Drop tags the rule provider does not know.
    pub omit_unknown_tags: bool,
    /// Drop tags the rule provider marks deprecated.
    pub omit_deprecated_tags: bool,
    /// Return only the body content under a parentless root instead of the
    /// `html`/`head`/`body` envelope.
    pub omit_html_envelope: bool,
    /// Track `xmlns` declarations and treat SVG, `MathML` and prefixed tags as
    /// foreign markup.
    pub namespaces_aware: bool,
    /// Drop comments.
    pub omit_comments: bool,
    /// Comma-separated tag names whose elements are removed from the result.
    pub prune_tags: String,
    /// Comma-separated tag names; when non-empty, every other element is
    /// removed from the result.
    pub allow_tags: String,
    /// Conditions added to the prune set on top of `prune_tags`.
    pub prune_conditions: Vec<TagCondition>,
    /// Conditions added to the allow set on top of `allow_tags`.
    pub allow_conditions: Vec<TagCondition>,
    /// Prefix the serializer puts in front of attribute names that are not
    /// valid XML names.
    pub invalid_xml_attribute_name_prefix: String,
    /// Serialize attribute names as written even when they are not valid
    /// XML names.
    pub allow_invalid_attribute_names: bool,
}

impl Default for CleanerProperties {
    fn default() -> Self {
        Self {
            omit_unknown_tags: false,
            omit_deprecated_tags: false,
            omit_html_envelope: false,
            namespaces_aware: true,
            omit_comments: false,
            prune_tags: String::new(),
            allow_tags: String::new(),
            prune_conditions: Vec::new(),
            allow_conditions: Vec::new(),
            invalid_xml_attribute_name_prefix: "empty".to_string(),
            allow_invalid_attribute_names: false,
        }
    }
}

impl CleanerProperties {
    /// The full prune set: parsed `prune_tags` followed by
    /// `prune_conditions`.
    ///
    /// # Errors
    ///
    /// Returns [`CleanError::InvalidTagList`] if `prune_tags` is malformed.
    pub fn prune_set(&self) -> Result<Vec<TagCondition>, CleanError> {
        let mut set = TagCondition::parse_list(&self.prune_tags)?;
        set.extend(self.prune_conditions.iter().cloned());
        Ok(set)
    }

    /// The full allow set: parsed `allow_tags` followed by
    /// `allow_conditions`.
    ///
    /// # Errors
    ///
    /// Returns [`CleanError::InvalidTagList`] if `allow_tags` is malformed.
    pub fn allow_set(&self) -> Result<Vec<TagCondition>, CleanError> {
        let mut set = TagCondition::parse_list(&self.allow_tags)?;
        set.extend(self.allow_conditions.iter().cloned());
        Ok(set)
    }
}
