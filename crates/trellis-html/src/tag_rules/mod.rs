//! Tag semantics.
//!
//! The cleaner never hard-codes what a tag means. Every decision about
//! nesting, closing and placement is delegated to a [`TagRuleProvider`]
//! which answers with a [`TagInfo`] per tag name. [`Html5TagProvider`] is the
//! built-in table.

mod html5;

pub use html5::Html5TagProvider;

use std::collections::HashSet;

use strum_macros::{Display, EnumString};

use crate::token::Token;

/// What an element may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ContentType {
    /// Any content, subject to the child and forbidden lists.
    All,
    /// Character data only (`title`, `textarea`, `script`).
    Text,
    /// Nothing; the element never has body content (`br`, `img`).
    None,
}

/// Which document section an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum BelongsTo {
    /// Only valid in `<head>`; always promoted there.
    Head,
    /// Valid in either; promoted to `<head>` when it appears while the head
    /// is open and the body is not.
    HeadAndBody,
    /// Body content.
    Body,
}

/// Read-only source of tag rules.
///
/// Implementations are built once and shared by every cleaning run, so they
/// must not change after construction.
pub trait TagRuleProvider: Send + Sync {
    /// Rules for a tag, or `None` if the tag is unknown.
    fn tag_info(&self, name: &str) -> Option<&TagInfo>;
}

/// Rules for a single tag.
///
/// Built with the chained `define_*` methods; tag lists are comma separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    name: String,
    content: ContentType,
    belongs_to: BelongsTo,
    deprecated: bool,
    unique: bool,
    fatal_tags: Vec<String>,
    required_parent_tags: Vec<String>,
    higher_level_tags: HashSet<String>,
    child_tags: HashSet<String>,
    permitted_tags: HashSet<String>,
    must_close_tags: HashSet<String>,
    copy_tags: HashSet<String>,
    continue_after_tags: HashSet<String>,
    preferred_child_tag: Option<String>,
    assumed_namespace: Option<String>,
}

fn split_tags(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
}

impl TagInfo {
    /// Create rules for a tag with the given content model and section.
    #[must_use]
    pub fn new(name: &str, content: ContentType, belongs_to: BelongsTo) -> Self {
        Self {
            name: name.to_string(),
            content,
            belongs_to,
            deprecated: false,
            unique: false,
            fatal_tags: Vec::new(),
            required_parent_tags: Vec::new(),
            higher_level_tags: HashSet::new(),
            child_tags: HashSet::new(),
            permitted_tags: HashSet::new(),
            must_close_tags: HashSet::new(),
            copy_tags: HashSet::new(),
            continue_after_tags: HashSet::new(),
            preferred_child_tag: None,
            assumed_namespace: None,
        }
    }

    /// Mark the tag as deprecated.
    #[must_use]
    pub const fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Mark the tag as allowed at most once per document.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// The tag is dropped unless one of these is open, and an end tag of this
    /// name never searches past one of them.
    #[must_use]
    pub fn define_fatal_tags(mut self, list: &str) -> Self {
        self.fatal_tags.extend(split_tags(list));
        self
    }

    /// One of these must enclose the tag; the first is synthesized when none
    /// is open. Required parents are also higher-level tags.
    #[must_use]
    pub fn define_required_enclosing_tags(mut self, list: &str) -> Self {
        for tag in split_tags(list) {
            let _ = self.higher_level_tags.insert(tag.clone());
            self.required_parent_tags.push(tag);
        }
        self
    }

    /// Tags that sit above the required parent; one opened after the parent
    /// hides it and forces a fresh parent to be synthesized.
    #[must_use]
    pub fn define_higher_level_tags(mut self, list: &str) -> Self {
        self.higher_level_tags.extend(split_tags(list));
        self
    }

    /// The only tags allowed as direct children.
    #[must_use]
    pub fn define_allowed_children_tags(mut self, list: &str) -> Self {
        self.child_tags.extend(split_tags(list));
        self
    }

    /// Tags that may not be opened while this one is open, and that this one
    /// may not contain.
    #[must_use]
    pub fn define_forbidden_tags(mut self, list: &str) -> Self {
        self.permitted_tags.extend(split_tags(list));
        self
    }

    /// When this tag opens right after one of these, that one is closed first.
    #[must_use]
    pub fn define_close_before_tags(mut self, list: &str) -> Self {
        self.must_close_tags.extend(split_tags(list));
        self
    }

    /// Like [`define_close_before_tags`](Self::define_close_before_tags), and
    /// the closed tags are reopened inside this one.
    #[must_use]
    pub fn define_close_before_copy_inside_tags(mut self, list: &str) -> Self {
        for tag in split_tags(list) {
            let _ = self.must_close_tags.insert(tag.clone());
            let _ = self.copy_tags.insert(tag);
        }
        self
    }

    /// When this tag's end closes one of these implicitly, it is reopened
    /// right after the end tag.
    #[must_use]
    pub fn define_close_inside_copy_after_tags(mut self, list: &str) -> Self {
        self.continue_after_tags.extend(split_tags(list));
        self
    }

    /// Wrapper synthesized when content this tag cannot hold arrives.
    #[must_use]
    pub fn define_preferred_child_tag(mut self, tag: &str) -> Self {
        self.preferred_child_tag = Some(tag.to_string());
        self
    }

    /// Namespace that applies inside this tag when it carries no `xmlns`.
    #[must_use]
    pub fn define_assumed_namespace(mut self, uri: &str) -> Self {
        self.assumed_namespace = Some(uri.to_string());
        self
    }

    /// Tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content model.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content
    }

    /// Document section.
    #[must_use]
    pub const fn belongs_to(&self) -> BelongsTo {
        self.belongs_to
    }

    /// Whether the element can have any body content at all.
    #[must_use]
    pub fn allows_body(&self) -> bool {
        self.content != ContentType::None
    }

    /// Whether the element accepts arbitrary content.
    #[must_use]
    pub fn allows_anything(&self) -> bool {
        self.content == ContentType::All && self.child_tags.is_empty()
    }

    /// Whether a tag with this name is explicitly listed as a child.
    #[must_use]
    pub fn allows_tag(&self, name: &str) -> bool {
        self.child_tags.contains(name)
    }

    /// Whether `token` may appear directly inside this element.
    #[must_use]
    pub fn allows_item(&self, token: &Token) -> bool {
        if self.content != ContentType::None && token.tag_name() == Some("script") {
            return true;
        }
        match self.content {
            ContentType::All => {
                if !self.child_tags.is_empty() {
                    return match token {
                        Token::StartTag(tag) => self.child_tags.contains(&tag.name),
                        Token::Comment { .. } => true,
                        other => other.is_blank_text(),
                    };
                }
                match token.tag_name() {
                    Some(name) => !self.permitted_tags.contains(name),
                    None => true,
                }
            }
            ContentType::Text => !token.is_tag(),
            ContentType::None => false,
        }
    }

    /// Deprecated tag.
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Unique tag.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether any tags are forbidden while this one is open.
    #[must_use]
    pub fn has_permitted_tags(&self) -> bool {
        !self.permitted_tags.is_empty()
    }

    /// Tags forbidden while this one is open.
    #[must_use]
    pub const fn permitted_tags(&self) -> &HashSet<String> {
        &self.permitted_tags
    }

    /// Fatal tags.
    #[must_use]
    pub fn fatal_tags(&self) -> &[String] {
        &self.fatal_tags
    }

    /// Whether `name` bounds the search for this tag's opener.
    #[must_use]
    pub fn is_fatal_tag(&self, name: &str) -> bool {
        self.fatal_tags.iter().any(|t| t == name)
    }

    /// Required parent tags, in preference order.
    #[must_use]
    pub fn required_parent_tags(&self) -> &[String] {
        &self.required_parent_tags
    }

    /// Whether `name` is a higher-level tag for this one.
    #[must_use]
    pub fn is_higher_level(&self, name: &str) -> bool {
        self.higher_level_tags.contains(name)
    }

    /// Whether opening this tag must first close `last`, the current last
    /// open tag.
    #[must_use]
    pub fn is_must_close_tag(&self, last: &Self) -> bool {
        self.must_close_tags.contains(&last.name) || last.content == ContentType::Text
    }

    /// Whether any tags are copied inside this one after a forced closure.
    #[must_use]
    pub fn has_copy_tags(&self) -> bool {
        !self.copy_tags.is_empty()
    }

    /// Whether `name` is copied inside this tag after being force-closed.
    #[must_use]
    pub fn is_copy(&self, name: &str) -> bool {
        self.copy_tags.contains(name)
    }

    /// Whether `name`, closed implicitly by this tag's end, continues after it.
    #[must_use]
    pub fn is_continue_after(&self, name: &str) -> bool {
        self.continue_after_tags.contains(name)
    }

    /// Preferred wrapper child.
    #[must_use]
    pub fn preferred_child_tag(&self) -> Option<&str> {
        self.preferred_child_tag.as_deref()
    }

    /// Head-only tag.
    #[must_use]
    pub fn is_head_tag(&self) -> bool {
        self.belongs_to == BelongsTo::Head
    }

    /// Tag valid in both head and body.
    #[must_use]
    pub fn is_head_and_body_tag(&self) -> bool {
        self.belongs_to == BelongsTo::HeadAndBody
    }

    /// Namespace assumed inside this tag.
    #[must_use]
    pub fn assumed_namespace(&self) -> Option<&str> {
        self.assumed_namespace.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::StartTag;

    fn list_rules() -> TagInfo {
        TagInfo::new("ul", ContentType::All, BelongsTo::Body)
            .define_allowed_children_tags("li, script")
            .define_preferred_child_tag("li")
    }

    #[test]
    fn test_child_list_restricts_tags() {
        let ul = list_rules();
        assert!(ul.allows_item(&Token::start("li")));
        assert!(!ul.allows_item(&Token::start("p")));
        assert!(!ul.allows_anything());
    }

    #[test]
    fn test_child_list_admits_blank_text_and_comments() {
        let ul = list_rules();
        assert!(ul.allows_item(&Token::text("\n  ")));
        assert!(ul.allows_item(&Token::comment("note")));
        assert!(!ul.allows_item(&Token::text("loose words")));
    }

    #[test]
    fn test_script_allowed_anywhere_with_body() {
        let ul = list_rules();
        let br = TagInfo::new("br", ContentType::None, BelongsTo::Body);
        assert!(ul.allows_item(&Token::start("script")));
        assert!(!br.allows_item(&Token::start("script")));
    }

    #[test]
    fn test_forbidden_tags() {
        let form = TagInfo::new("form", ContentType::All, BelongsTo::Body)
            .define_forbidden_tags("form");
        assert!(form.has_permitted_tags());
        assert!(!form.allows_item(&Token::from(StartTag::new("form"))));
        assert!(form.allows_item(&Token::start("input")));
        assert!(form.allows_anything());
    }

    #[test]
    fn test_text_content_closes_on_any_tag() {
        let title = TagInfo::new("title", ContentType::Text, BelongsTo::Head);
        let b = TagInfo::new("b", ContentType::All, BelongsTo::Body);
        assert!(b.is_must_close_tag(&title));
        assert!(title.allows_item(&Token::text("x")));
        assert!(!title.allows_item(&Token::start("b")));
    }

    #[test]
    fn test_required_parents_are_higher_level() {
        let td = TagInfo::new("td", ContentType::All, BelongsTo::Body)
            .define_required_enclosing_tags("tr")
            .define_fatal_tags("table");
        assert_eq!(td.required_parent_tags(), &["tr".to_string()]);
        assert!(td.is_higher_level("tr"));
        assert!(td.is_fatal_tag("table"));
        assert!(!td.is_fatal_tag("div"));
    }

    #[test]
    fn test_content_type_parses_from_str() {
        assert_eq!("text".parse::<ContentType>().ok(), Some(ContentType::Text));
        assert_eq!("head-and-body".parse::<BelongsTo>().ok(), Some(BelongsTo::HeadAndBody));
    }
}
