//! Tag-open, tag-close and content handling.
//!
//! The builder walks the item list with a cursor. Every handler either
//! consumes the item under the cursor (`Advance`) or rearranges the list in
//! front of it and asks for the same slot to be looked at again (`Retry`,
//! `Inserted`). Items are only ever inserted at or after the cursor, so open
//! tag positions stay valid; child-break positions are shifted explicitly.

use std::mem;

use trellis_common::{CancelToken, Diagnostic, ErrorKind, Severity};
use trellis_dom::NodeId;

use super::context::CleaningContext;
use super::open_tags::{ClosedTag, TagPos};
use super::{CleanListener, Item};
use crate::config::CleanerProperties;
use crate::error::CleanError;
use crate::tag_rules::{TagInfo, TagRuleProvider};
use crate::token::{Attribute, StartTag, Token};

/// How many identical auto-generated copies may sit next to each other.
pub(crate) const COPY_LIMIT: usize = 3;

/// How many required parents deep placement is checked.
const PARENT_CHAIN_LIMIT: usize = 8;

const SYNTHETIC_TAGS: [&str; 3] = ["html", "head", "body"];

/// What the cursor does after a handler ran.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// The item was consumed; move on.
    Advance,
    /// The list or the open tags changed; handle the same slot again.
    Retry,
    /// A tag with this name was synthesized at the cursor.
    Inserted(String),
}

pub(crate) struct TreeBuilder<'r, 'l> {
    pub(crate) provider: &'r dyn TagRuleProvider,
    pub(crate) props: &'r CleanerProperties,
    pub(crate) cancel: &'r CancelToken,
    listener: &'l mut dyn CleanListener,
    pub(crate) ctx: CleaningContext<'r>,
}

impl<'r, 'l> TreeBuilder<'r, 'l> {
    pub(crate) fn new(
        provider: &'r dyn TagRuleProvider,
        props: &'r CleanerProperties,
        cancel: &'r CancelToken,
        listener: &'l mut dyn CleanListener,
        ctx: CleaningContext<'r>,
    ) -> Self {
        Self {
            provider,
            props,
            cancel,
            listener,
            ctx,
        }
    }

    pub(crate) fn info(&self, name: &str) -> Option<&'r TagInfo> {
        let provider: &'r dyn TagRuleProvider = self.provider;
        provider.tag_info(name)
    }

    /// Hand a diagnostic to the listener, the log and the result.
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.listener.on_diagnostic(&diagnostic);
        self.ctx.diagnostics.push(diagnostic);
    }

    fn report_at(&mut self, kind: ErrorKind, severity: Severity, certain: bool, tag: &str, position: usize) {
        self.report(Diagnostic::at(kind, severity, certain, tag, position));
    }

    fn is_foreign(&self, name: &str) -> bool {
        self.props.namespaces_aware
            && (name.contains(':') || self.ctx.namespaces.in_foreign_context())
    }

    /// Build subtrees for everything in `items`.
    ///
    /// On return every item is vacant, a node, a group of nodes, a loose
    /// content token, or a start tag that is still open.
    pub(crate) fn make_tree(&mut self, items: &mut Vec<Item>) -> Result<(), CleanError> {
        let mut synthesized: Vec<String> = Vec::new();
        let mut i = 0;
        while i < items.len() {
            self.cancel.check()?;
            let auto_generated =
                matches!(&items[i], Item::Token(Token::StartTag(tag)) if tag.auto_generated);
            let step = match &items[i] {
                Item::Token(Token::StartTag(_)) => self.start_tag(items, i)?,
                Item::Token(Token::EndTag { .. }) => self.end_tag(items, i)?,
                Item::Token(_) => self.content(items, i),
                Item::Vacant | Item::Node(_) | Item::Group(_) => Step::Advance,
            };
            match step {
                Step::Advance => {
                    if !auto_generated {
                        synthesized.clear();
                    }
                    i += 1;
                }
                Step::Retry => {}
                Step::Inserted(name) => {
                    if synthesized.contains(&name) {
                        return Err(CleanError::RuleCycle { tag: name });
                    }
                    synthesized.push(name);
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, items: &mut Vec<Item>, at: usize, tag: StartTag) {
        items.insert(at, Item::Token(Token::StartTag(tag)));
        self.ctx.nesting.child_breaks.shift_from(at);
    }

    fn start_tag(&mut self, items: &mut Vec<Item>, i: usize) -> Result<Step, CleanError> {
        let Item::Token(Token::StartTag(tag)) = &items[i] else {
            return Ok(Step::Advance);
        };
        let name = tag.name.clone();
        let opening = Token::start(&name);

        if SYNTHETIC_TAGS.contains(&name.as_str()) {
            self.merge_synthetic(items, i, &name);
            return Ok(Step::Advance);
        }

        let foreign = self.is_foreign(&name);
        let info = if foreign { None } else { self.info(&name) };

        if !foreign {
            if info.is_none() && self.props.omit_unknown_tags {
                items[i] = Item::Vacant;
                self.report_at(ErrorKind::UnknownTagOmitted, Severity::Ugly, true, &name, i);
                return Ok(Step::Advance);
            }
            if info.is_some_and(TagInfo::is_deprecated) && self.props.omit_deprecated_tags {
                items[i] = Item::Vacant;
                self.report_at(ErrorKind::DeprecatedTagOmitted, Severity::Ugly, true, &name, i);
                return Ok(Step::Advance);
            }
        }

        let last = self.ctx.nesting.open_tags.last().cloned();

        if info.is_none()
            && !foreign
            && let Some(last) = &last
            && let Some(last_info) = last.info
            && !last_info.allows_anything()
            && !last_info.allows_tag(&name)
        {
            let _ = self.close_snippet(items, last.position, Some(i))?;
            return Ok(Step::Retry);
        }

        if let Some(info) = info {
            if info.has_permitted_tags()
                && self.ctx.nesting.open_tags.is_any_open(info.permitted_tags())
            {
                items[i] = Item::Vacant;
                self.report_at(ErrorKind::NotAllowedTag, Severity::Error, true, &name, i);
                return Ok(Step::Advance);
            }
            if info.is_unique() && self.ctx.all_tags.contains(&name) {
                items[i] = Item::Vacant;
                self.report_at(ErrorKind::UniqueTagDuplicated, Severity::Error, true, &name, i);
                return Ok(Step::Advance);
            }
            if !self.is_fatal_tag_satisfied(info) {
                items[i] = Item::Vacant;
                self.report_at(ErrorKind::FatalTagMissing, Severity::Error, false, &name, i);
                return Ok(Step::Advance);
            }
            if let Some(parent) = self.missing_required_parent(info, last.as_ref()) {
                self.insert(items, i, StartTag::auto_generated(&parent));
                self.report_at(ErrorKind::RequiredParentMissing, Severity::Error, true, &name, i);
                return Ok(Step::Inserted(parent));
            }
            if let Some(last) = &last
                && let Some(last_info) = last.info
                && info.is_must_close_tag(last_info)
            {
                self.force_close(items, i, last, info)?;
                return Ok(Step::Retry);
            }
            if let Some(last) = &last
                && let Some(last_info) = last.info
                && !last_info.allows_item(&opening)
            {
                if let Some(child) = self.preferred_child_for(last_info, &opening) {
                    self.insert(items, i, StartTag::auto_generated(&child));
                    self.report_at(ErrorKind::PreferredChildInserted, Severity::Ugly, true, &child, i);
                    return Ok(Step::Inserted(child));
                }
                if self.relocate(items, i) {
                    self.report_at(ErrorKind::UnpermittedChild, Severity::Error, true, &name, i);
                    return Ok(Step::Advance);
                }
            }
        }

        self.accept(items, i, info)?;
        Ok(Step::Advance)
    }

    /// Donate the attributes of an `html`, `head` or `body` tag to the
    /// synthetic node of that name and drop the token.
    fn merge_synthetic(&mut self, items: &mut [Item], i: usize, name: &str) {
        let Item::Token(Token::StartTag(tag)) = mem::replace(&mut items[i], Item::Vacant) else {
            return;
        };
        self.register_prefixes(&tag.attributes);
        if let Some(id) = self.ctx.synthetic_for(name)
            && let Some(data) = self.ctx.tree.as_element_mut(id)
        {
            data.auto_generated = false;
            for attr in &tag.attributes {
                data.set_attribute_if_absent(&attr.name, &attr.value);
            }
        }
        match name {
            "head" => self.ctx.head_opened = true,
            "body" => self.ctx.body_opened = true,
            _ => {}
        }
        let _ = self.ctx.all_tags.insert(name.to_string());
    }

    fn register_prefixes(&mut self, attributes: &[Attribute]) {
        if !self.props.namespaces_aware {
            return;
        }
        for attr in attributes {
            if let Some(prefix) = attr.name.strip_prefix("xmlns:") {
                self.ctx.namespaces.register_prefix(prefix, &attr.value);
            }
        }
    }

    fn is_fatal_tag_satisfied(&self, info: &TagInfo) -> bool {
        let fatal = info.fatal_tags();
        fatal.is_empty()
            || fatal.iter().any(|name| {
                self.ctx
                    .nesting
                    .open_tags
                    .find_open(name, self.info(name))
                    .is_some()
            })
    }

    /// First required parent to synthesize, if the tag needs one.
    ///
    /// A parent is present when the nearest higher-level open tag is reached
    /// before crossing one of the tag's fatal tags. Required parents count as
    /// higher-level tags. Nothing is synthesized when the parent itself could
    /// not be placed under the last open tag; the tag goes on to the later
    /// rules and is usually relocated.
    fn missing_required_parent(&self, info: &TagInfo, last: Option<&TagPos<'r>>) -> Option<String> {
        let parent = info.required_parent_tags().first()?;
        for tp in self.ctx.nesting.open_tags.iter().rev() {
            if info.is_higher_level(&tp.name) {
                return None;
            }
            if info.is_fatal_tag(&tp.name) {
                break;
            }
        }
        self.is_placeable(parent, last.and_then(|tp| tp.info), 0)
            .then(|| parent.clone())
    }

    /// Whether a synthesized `name` can sit under the last open tag, either
    /// directly, inside the last tag's preferred child, or below its own
    /// synthesized required parent.
    fn is_placeable(&self, name: &str, last_info: Option<&TagInfo>, depth: usize) -> bool {
        let Some(last_info) = last_info else {
            return true;
        };
        let opening = Token::start(name);
        if last_info.allows_item(&opening) || self.preferred_child_for(last_info, &opening).is_some() {
            return true;
        }
        depth < PARENT_CHAIN_LIMIT
            && self
                .info(name)
                .and_then(|info| info.required_parent_tags().first())
                .is_some_and(|parent| self.is_placeable(parent, Some(last_info), depth + 1))
    }

    /// Wrapper the last open tag prefers for content it cannot hold directly.
    fn preferred_child_for(&self, last_info: &TagInfo, token: &Token) -> Option<String> {
        let child = last_info.preferred_child_tag()?;
        if token.tag_name() == Some(child) || !last_info.allows_item(&Token::start(child)) {
            return None;
        }
        let child_info = self.info(child)?;
        child_info.allows_item(token).then(|| child.to_string())
    }

    /// Close the last open tag because `info`'s tag cannot nest inside it,
    /// remember the break and copy formatting tags inside the new tag.
    fn force_close(
        &mut self,
        items: &mut Vec<Item>,
        i: usize,
        last: &TagPos<'r>,
        info: &'r TagInfo,
    ) -> Result<(), CleanError> {
        let closed = self.close_snippet(items, last.position, Some(i))?;
        let breaking = TagPos {
            position: i,
            name: info.name().to_string(),
            info: Some(info),
        };
        if let Some(first) = closed.first() {
            self.ctx
                .nesting
                .child_breaks
                .record_break(first.clone(), breaking);
        }
        if !info.has_copy_tags() {
            return Ok(());
        }
        let run = closed
            .iter()
            .rev()
            .take_while(|c| info.is_copy(&c.name))
            .count();
        let mut at = i + 1;
        for closed_tag in &closed[closed.len() - run..] {
            let Some(copy) = self.copy_of(closed_tag.node, true) else {
                continue;
            };
            if is_redundant_copy(items, at, &copy) {
                continue;
            }
            self.insert(items, at, copy);
            at += 1;
        }
        Ok(())
    }

    /// An auto-generated start tag shaped like the formed element `node`.
    fn copy_of(&self, node: NodeId, keep_id: bool) -> Option<StartTag> {
        let data = self.ctx.tree.as_element(node)?;
        let mut tag = StartTag::auto_generated(&data.tag_name);
        tag.foreign_markup = data.foreign_markup;
        tag.attributes = data
            .attrs
            .iter()
            .filter(|(name, _)| keep_id || name.as_str() != "id")
            .map(|(name, value)| Attribute::new(name.clone(), value.clone()))
            .collect();
        Some(tag)
    }

    /// Move the item at `i` into the start token of the relocation target.
    ///
    /// Returns `false`, leaving the item in place, when nothing is open.
    fn relocate(&mut self, items: &mut [Item], i: usize) -> bool {
        let Some(target) = self
            .ctx
            .nesting
            .open_tags
            .find_relocation_target()
            .map(|tp| tp.position)
        else {
            return false;
        };
        let item = mem::replace(&mut items[i], Item::Vacant);
        if let Item::Token(Token::StartTag(tag)) = &mut items[target] {
            tag.relocated.push(item);
            true
        } else {
            items[i] = item;
            false
        }
    }

    /// Accept the start tag at `i`: form it at once if it has no body,
    /// otherwise open it.
    fn accept(
        &mut self,
        items: &mut [Item],
        i: usize,
        info: Option<&'r TagInfo>,
    ) -> Result<(), CleanError> {
        let Item::Token(Token::StartTag(mut tag)) = mem::replace(&mut items[i], Item::Vacant) else {
            return Ok(());
        };
        let name = tag.name.clone();
        let allows_body = info.is_none_or(TagInfo::allows_body);

        self.register_prefixes(&tag.attributes);
        if allows_body && self.props.namespaces_aware {
            let explicit = tag.attribute("xmlns").map(str::to_string);
            if let Some(uri) = explicit.or_else(|| info.and_then(TagInfo::assumed_namespace).map(str::to_string)) {
                self.ctx.namespaces.push(&uri);
                tag.namespace_pushed = true;
            }
        }

        tag.foreign_markup = self.is_foreign(&name);
        if tag.foreign_markup {
            tag.namespace = self.ctx.namespaces.namespace_for(&name);
        } else if let Some(info) = info {
            tag.head_candidate = info.is_head_tag()
                || (info.is_head_and_body_tag() && self.ctx.head_opened && !self.ctx.body_opened);
            if !tag.head_candidate && !info.is_head_and_body_tag() {
                self.ctx.body_opened = true;
            }
        }
        let _ = self.ctx.all_tags.insert(name.clone());

        if !allows_body {
            let id = self.form_node(tag);
            items[i] = Item::Node(id);
            return Ok(());
        }

        let self_closing = tag.self_closing;
        let info = if tag.foreign_markup { None } else { info };
        self.ctx.nesting.open_tags.push(&name, info, i);
        items[i] = Item::Token(Token::StartTag(tag));
        if self_closing {
            let _ = self.close_snippet(items, i, Some(i + 1))?;
        }
        Ok(())
    }

    fn end_tag(&mut self, items: &mut Vec<Item>, i: usize) -> Result<Step, CleanError> {
        let Item::Token(Token::EndTag { name }) = mem::replace(&mut items[i], Item::Vacant) else {
            return Ok(Step::Advance);
        };
        if SYNTHETIC_TAGS.contains(&name.as_str()) {
            return Ok(Step::Advance);
        }

        let foreign = self.is_foreign(&name);
        let info = if foreign { None } else { self.info(&name) };
        if !foreign
            && ((info.is_none() && self.props.omit_unknown_tags)
                || (info.is_some_and(TagInfo::is_deprecated) && self.props.omit_deprecated_tags))
        {
            return Ok(Step::Advance);
        }
        if info.is_some_and(|info| !info.allows_body()) {
            return Ok(Step::Advance);
        }

        let Some(matched) = self.ctx.nesting.open_tags.find_open(&name, info).cloned() else {
            self.report_at(ErrorKind::StrayEndTag, Severity::Ugly, true, &name, i);
            return Ok(Step::Advance);
        };

        let closed = self.close_snippet(items, matched.position, Some(i))?;
        let mut at = i + 1;

        while !self.ctx.nesting.child_breaks.is_empty()
            && self
                .ctx
                .nesting
                .child_breaks
                .last_breaking_tag_position()
                .is_some_and(|pos| pos >= matched.position)
        {
            let reopen = self.ctx.nesting.child_breaks.last_breaking_tag_name() == Some(name.as_str());
            let Some((broken, breaking)) = self.ctx.nesting.child_breaks.pop() else {
                break;
            };
            if reopen
                && broken.name != breaking.name
                && self.can_reopen(&broken.name)
                && let Some(clone) = self.copy_of(broken.node, false)
                && !is_redundant_copy(items, at, &clone)
            {
                self.insert(items, at, clone);
                at += 1;
            }
        }

        if let Some(info) = info {
            let continued: Vec<&ClosedTag> = closed
                .iter()
                .skip(1)
                .filter(|c| info.is_continue_after(&c.name))
                .collect();
            for closed_tag in continued {
                if let Some(clone) = self.copy_of(closed_tag.node, false)
                    && !is_redundant_copy(items, at, &clone)
                {
                    self.insert(items, at, clone);
                    at += 1;
                }
            }
        }
        Ok(Step::Advance)
    }

    /// Whether a reopened `name` can go right after the closed tag: the
    /// last open tag takes it as a direct child and any required parent is
    /// still open.
    fn can_reopen(&self, name: &str) -> bool {
        let last = self.ctx.nesting.open_tags.last();
        let fits = last
            .and_then(|tp| tp.info)
            .is_none_or(|info| info.allows_item(&Token::start(name)));
        let parented = self.info(name).is_none_or(|info| {
            info.required_parent_tags().is_empty()
                || last.is_some_and(|tp| info.is_higher_level(&tp.name))
        });
        fits && parented
    }

    fn content(&mut self, items: &mut [Item], i: usize) -> Step {
        let Item::Token(token) = &items[i] else {
            return Step::Advance;
        };
        if self.props.omit_comments && matches!(token, Token::Comment { .. }) {
            items[i] = Item::Vacant;
            return Step::Advance;
        }
        if self.ctx.nesting.open_tags.is_empty()
            && matches!(token, Token::Text { .. } | Token::CData { .. })
            && !token.is_blank_text()
        {
            self.ctx.body_opened = true;
        }
        let Some(last) = self.ctx.nesting.open_tags.last() else {
            return Step::Advance;
        };
        if last.info.is_none_or(|info| info.allows_item(token)) {
            return Step::Advance;
        }
        let name = last.name.clone();
        if self.relocate(items, i) {
            self.report_at(ErrorKind::UnpermittedChild, Severity::Error, true, &name, i);
        }
        Step::Advance
    }
}

/// Whether inserting `copy` at `at` would put more than [`COPY_LIMIT`]
/// identical auto-generated copies in a row.
///
/// Copies already on either side of `at` count, vacant slots are skipped.
/// A run of exactly [`COPY_LIMIT`] is allowed, so it is the next copy that
/// gets dropped.
pub(crate) fn is_redundant_copy(items: &[Item], at: usize, copy: &StartTag) -> bool {
    let is_copy = |item: &&Item| {
        matches!(item, Item::Token(Token::StartTag(tag)) if tag.auto_generated && tag.same_shape(copy))
    };
    let occupied = |item: &&Item| !matches!(item, Item::Vacant);
    let (before, after) = items.split_at(at.min(items.len()));
    let run_before = before.iter().rev().filter(occupied).take_while(is_copy).count();
    let run_after = after.iter().filter(occupied).take_while(is_copy).count();
    run_before + run_after >= COPY_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto_b() -> Item {
        Item::Token(Token::StartTag(StartTag::auto_generated("b")))
    }

    #[test]
    fn test_copy_allowed_below_limit() {
        let items = vec![Item::Vacant, auto_b(), auto_b()];
        assert!(!is_redundant_copy(&items, 1, &StartTag::auto_generated("b")));
    }

    #[test]
    fn test_copy_skipped_at_limit() {
        let items = vec![auto_b(), auto_b(), auto_b()];
        assert!(is_redundant_copy(&items, 0, &StartTag::auto_generated("b")));
    }

    #[test]
    fn test_copy_compares_attributes() {
        let items = vec![auto_b(), auto_b(), auto_b()];
        let styled = StartTag::auto_generated("b").with_attribute("class", "x");
        assert!(!is_redundant_copy(&items, 0, &styled));
    }

    #[test]
    fn test_copies_before_the_slot_count() {
        let items = vec![auto_b(), Item::Vacant, auto_b(), Item::Token(Token::text("x"))];
        assert!(!is_redundant_copy(&items, 3, &StartTag::auto_generated("b")));

        let items = vec![auto_b(), auto_b(), Item::Vacant, auto_b()];
        assert!(is_redundant_copy(&items, 2, &StartTag::auto_generated("b")));
    }

    #[test]
    fn test_written_tags_do_not_count() {
        let items = vec![
            Item::Token(Token::start("b")),
            auto_b(),
            auto_b(),
        ];
        assert!(!is_redundant_copy(&items, 0, &StartTag::auto_generated("b")));
    }
}
