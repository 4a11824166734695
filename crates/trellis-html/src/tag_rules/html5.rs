//! Built-in HTML5 tag rules.
//!
//! The table is built once, on first use, and shared read-only by every
//! cleaner through [`Html5TagProvider::shared`].

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use super::{BelongsTo, ContentType, TagInfo, TagRuleProvider};
use crate::cleaner::{MATHML_NAMESPACE, SVG_NAMESPACE};

/// Inline formatting tags that are closed and copied into a block that
/// interrupts them.
const FORMATTING: &str = "b,big,em,font,i,q,s,small,strike,strong,sub,sup,tt,u";

/// Phrasing tags that table cells, rows and list items close on arrival.
const PHRASING: &str = "a,abbr,b,bdi,bdo,big,cite,code,data,dfn,em,font,i,kbd,label,mark,\
                        q,s,samp,small,span,strike,strong,sub,sup,time,tt,u,var";

/// Flow containers other than lists.
const FLOW: &str = "address,article,aside,blockquote,center,details,dialog,div,fieldset,\
                    figcaption,figure,footer,form,h1,h2,h3,h4,h5,h6,header,hgroup,main,nav,p,\
                    pre,section";

const LISTS: &str = "dir,dl,menu,ol,ul,li,dd,dt";

const TABLE_PARTS: &str = "caption,colgroup,thead,tbody,tfoot,tr,td,th";

const HEADINGS: &str = "h1,h2,h3,h4,h5,h6";

static HTML5: LazyLock<Arc<Html5TagProvider>> =
    LazyLock::new(|| Arc::new(Html5TagProvider::new()));

fn tag(name: &str, content: ContentType) -> TagInfo {
    TagInfo::new(name, content, BelongsTo::Body)
}

fn void(name: &str) -> TagInfo {
    tag(name, ContentType::None)
}

fn block(name: &str) -> TagInfo {
    tag(name, ContentType::All)
        .define_close_before_tags("p")
        .define_close_before_copy_inside_tags(FORMATTING)
}

fn formatting(name: &str) -> TagInfo {
    tag(name, ContentType::All).define_close_inside_copy_after_tags(FORMATTING)
}

fn list(name: &str) -> TagInfo {
    tag(name, ContentType::All)
        .define_close_before_tags("p")
        .define_allowed_children_tags("li,script,template")
        .define_preferred_child_tag("li")
}

fn list_item(name: &str, required: &str, closes: &str) -> TagInfo {
    tag(name, ContentType::All)
        .define_required_enclosing_tags(required)
        .define_close_before_tags(closes)
        .define_close_before_tags(PHRASING)
        .define_close_before_tags(FLOW)
        .define_close_before_copy_inside_tags(FORMATTING)
}

fn table_section(name: &str) -> TagInfo {
    tag(name, ContentType::All)
        .define_fatal_tags("table")
        .define_allowed_children_tags("tr,script,template")
        .define_preferred_child_tag("tr")
        .define_close_before_tags(TABLE_PARTS)
        .define_close_before_tags(PHRASING)
        .define_close_before_tags(FLOW)
        .define_close_before_tags(LISTS)
}

fn table_cell(name: &str) -> TagInfo {
    tag(name, ContentType::All)
        .define_fatal_tags("table")
        .define_required_enclosing_tags("tr")
        .define_close_before_tags("td,th,caption,colgroup")
        .define_close_before_tags(PHRASING)
        .define_close_before_tags(FLOW)
        .define_close_before_tags(LISTS)
}

/// Tag rules for HTML5 documents, including the obsolete HTML4 tags (marked
/// deprecated) and the `svg` and `math` roots.
#[derive(Debug, Clone)]
pub struct Html5TagProvider {
    tags: HashMap<String, TagInfo>,
}

impl Html5TagProvider {
    /// Build the table.
    #[must_use]
    pub fn new() -> Self {
        let mut provider = Self {
            tags: HashMap::new(),
        };
        provider.document_metadata();
        provider.sections_and_grouping();
        provider.text_level();
        provider.edits_and_embedded();
        provider.tables();
        provider.forms();
        provider.interactive_and_scripting();
        provider.obsolete();
        provider.foreign_roots();
        provider
    }

    /// The process-wide instance.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(&HTML5)
    }

    /// Number of tags defined.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the table is empty. It never is once built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Names of all defined tags, in no particular order.
    #[must_use]
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    fn put(&mut self, info: TagInfo) {
        let _ = self.tags.insert(info.name().to_string(), info);
    }

    fn document_metadata(&mut self) {
        self.put(tag("html", ContentType::All).unique());
        self.put(TagInfo::new("head", ContentType::All, BelongsTo::Head).unique());
        self.put(tag("body", ContentType::All).unique());
        self.put(TagInfo::new("title", ContentType::Text, BelongsTo::Head).unique());
        self.put(TagInfo::new("base", ContentType::None, BelongsTo::Head).unique());
        self.put(TagInfo::new("meta", ContentType::None, BelongsTo::Head));
        self.put(TagInfo::new("link", ContentType::None, BelongsTo::HeadAndBody));
        self.put(TagInfo::new("style", ContentType::Text, BelongsTo::HeadAndBody));
    }

    fn sections_and_grouping(&mut self) {
        for name in [
            "address", "article", "aside", "blockquote", "div", "figcaption", "figure", "footer",
            "header", "hgroup", "main", "nav", "pre", "section",
        ] {
            self.put(block(name));
        }
        self.put(block("p"));
        for name in HEADINGS.split(',') {
            self.put(block(name).define_close_before_tags(HEADINGS));
        }
        self.put(void("hr").define_close_before_tags("p"));

        self.put(list("ul"));
        self.put(list("ol"));
        self.put(list("menu"));
        self.put(list_item("li", "ul,ol,menu,dir", "li"));

        self.put(
            tag("dl", ContentType::All)
                .define_close_before_tags("p")
                .define_allowed_children_tags("dt,dd,div,script,template")
                .define_preferred_child_tag("dd"),
        );
        self.put(list_item("dt", "dl", "dt,dd"));
        self.put(list_item("dd", "dl", "dt,dd"));
    }

    fn text_level(&mut self) {
        for name in ["b", "em", "i", "q", "s", "small", "strong", "sub", "sup", "u"] {
            self.put(formatting(name));
        }
        self.put(
            tag("a", ContentType::All)
                .define_close_before_tags("a")
                .define_close_inside_copy_after_tags(FORMATTING),
        );
        for name in [
            "abbr", "bdi", "bdo", "cite", "code", "data", "dfn", "kbd", "mark", "ruby", "rb",
            "samp", "span", "time", "var",
        ] {
            self.put(tag(name, ContentType::All));
        }
        self.put(tag("rt", ContentType::All).define_close_before_tags("rt,rp,rb"));
        self.put(tag("rp", ContentType::All).define_close_before_tags("rt,rp,rb"));
        self.put(void("br"));
        self.put(void("wbr"));
    }

    fn edits_and_embedded(&mut self) {
        self.put(tag("del", ContentType::All));
        self.put(tag("ins", ContentType::All));
        for name in ["img", "embed", "param", "source", "track", "area"] {
            self.put(void(name));
        }
        for name in ["object", "video", "audio", "canvas", "map", "picture"] {
            self.put(tag(name, ContentType::All));
        }
        self.put(tag("iframe", ContentType::Text));
    }

    fn tables(&mut self) {
        self.put(
            tag("table", ContentType::All)
                .define_close_before_tags("p")
                .define_allowed_children_tags("caption,colgroup,thead,tbody,tfoot,script,template")
                .define_preferred_child_tag("tbody"),
        );
        self.put(
            tag("caption", ContentType::All)
                .define_fatal_tags("table")
                .define_close_before_tags(TABLE_PARTS),
        );
        self.put(
            tag("colgroup", ContentType::All)
                .define_fatal_tags("table")
                .define_allowed_children_tags("col,template")
                .define_close_before_tags(TABLE_PARTS),
        );
        self.put(
            void("col")
                .define_fatal_tags("table")
                .define_required_enclosing_tags("colgroup"),
        );
        self.put(table_section("thead"));
        self.put(table_section("tbody"));
        self.put(table_section("tfoot"));
        self.put(
            tag("tr", ContentType::All)
                .define_fatal_tags("table")
                .define_required_enclosing_tags("tbody")
                .define_higher_level_tags("thead,tfoot")
                .define_allowed_children_tags("td,th,script,template")
                .define_preferred_child_tag("td")
                .define_close_before_tags("tr,td,th,caption,colgroup")
                .define_close_before_tags(PHRASING)
                .define_close_before_tags(FLOW)
                .define_close_before_tags(LISTS),
        );
        self.put(table_cell("td"));
        self.put(table_cell("th"));
    }

    fn forms(&mut self) {
        self.put(block("form").define_forbidden_tags("form"));
        self.put(block("fieldset"));
        self.put(tag("legend", ContentType::All).define_required_enclosing_tags("fieldset"));
        self.put(tag("label", ContentType::All).define_forbidden_tags("label"));
        self.put(void("input"));
        self.put(tag("button", ContentType::All).define_close_before_tags("button"));
        self.put(
            tag("select", ContentType::All)
                .define_allowed_children_tags("option,optgroup,hr,script,template")
                .define_preferred_child_tag("option"),
        );
        self.put(
            tag("optgroup", ContentType::All)
                .define_required_enclosing_tags("select")
                .define_allowed_children_tags("option,script,template")
                .define_close_before_tags("optgroup,option"),
        );
        self.put(tag("option", ContentType::Text).define_close_before_tags("option"));
        self.put(tag("textarea", ContentType::Text));
        for name in ["output", "progress", "meter", "datalist"] {
            self.put(tag(name, ContentType::All));
        }
    }

    fn interactive_and_scripting(&mut self) {
        self.put(block("details"));
        self.put(block("dialog"));
        self.put(tag("summary", ContentType::All));
        self.put(tag("slot", ContentType::All));
        self.put(TagInfo::new("script", ContentType::Text, BelongsTo::HeadAndBody));
        self.put(TagInfo::new("noscript", ContentType::All, BelongsTo::HeadAndBody));
        self.put(TagInfo::new("template", ContentType::All, BelongsTo::HeadAndBody));
    }

    fn obsolete(&mut self) {
        for name in ["big", "font", "strike", "tt"] {
            self.put(formatting(name).deprecated());
        }
        self.put(block("center").deprecated());
        self.put(block("listing").deprecated());
        self.put(list("dir").deprecated());
        for name in ["acronym", "applet", "blink", "marquee", "frameset", "noframes"] {
            self.put(tag(name, ContentType::All).deprecated());
        }
        for name in ["basefont", "frame", "isindex", "keygen"] {
            self.put(void(name).deprecated());
        }
        self.put(tag("xmp", ContentType::Text).define_close_before_tags("p").deprecated());
        self.put(tag("plaintext", ContentType::Text).define_close_before_tags("p").deprecated());
    }

    fn foreign_roots(&mut self) {
        self.put(
            tag("svg", ContentType::All)
                .define_close_before_tags("p")
                .define_assumed_namespace(SVG_NAMESPACE),
        );
        self.put(tag("math", ContentType::All).define_assumed_namespace(MATHML_NAMESPACE));
    }
}

impl Default for Html5TagProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TagRuleProvider for Html5TagProvider {
    fn tag_info(&self, name: &str) -> Option<&TagInfo> {
        self.tags.get(name).or_else(|| {
            name.bytes()
                .any(|b| b.is_ascii_uppercase())
                .then(|| self.tags.get(&name.to_ascii_lowercase()))
                .flatten()
        })
    }
}
