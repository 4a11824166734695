//! Turning a cleaned tree back into markup.

use trellis_dom::{DomTree, ElementData, NodeId, NodeType};

use crate::cleaner::CleanedDocument;
use crate::config::CleanerProperties;
use crate::tag_rules::{ContentType, TagRuleProvider};
use crate::token::Doctype;

/// Compact HTML serializer for cleaned trees.
///
/// No whitespace is added or removed. Elements without body content are
/// written as `<br />`, text-content elements such as `script` are written
/// raw, everything else is escaped.
#[derive(Clone, Copy)]
pub struct HtmlSerializer<'a> {
    provider: &'a dyn TagRuleProvider,
    properties: &'a CleanerProperties,
}

impl<'a> HtmlSerializer<'a> {
    /// Create a serializer over the given rules and attribute-name settings.
    #[must_use]
    pub const fn new(provider: &'a dyn TagRuleProvider, properties: &'a CleanerProperties) -> Self {
        Self {
            provider,
            properties,
        }
    }

    /// The whole document: doctype, then the root element or, when the
    /// envelope is omitted, the root's children.
    #[must_use]
    pub fn to_html(&self, document: &CleanedDocument) -> String {
        let mut out = String::new();
        if let Some(doctype) = &document.doctype {
            write_doctype(&mut out, doctype);
        }
        self.write_node(&mut out, &document.tree, document.root);
        out
    }

    /// A node and its subtree.
    #[must_use]
    pub fn outer_html(&self, tree: &DomTree, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, tree, id);
        out
    }

    /// The subtree of a node, without the node itself.
    #[must_use]
    pub fn inner_html(&self, tree: &DomTree, id: NodeId) -> String {
        let mut out = String::new();
        self.write_children(&mut out, tree, id, false);
        out
    }

    fn write_node(&self, out: &mut String, tree: &DomTree, id: NodeId) {
        let Some(node) = tree.get(id) else {
            return;
        };
        match &node.node_type {
            NodeType::Document => self.write_children(out, tree, id, false),
            NodeType::Element(data) => self.write_element(out, tree, id, data),
            NodeType::Text(text) => escape_into(out, text, false),
            NodeType::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeType::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
        }
    }

    fn write_element(&self, out: &mut String, tree: &DomTree, id: NodeId, data: &ElementData) {
        let content = if data.foreign_markup {
            None
        } else {
            self.provider.tag_info(&data.tag_name).map(|info| info.content_type())
        };
        let children = tree.children(id);

        out.push('<');
        out.push_str(&data.tag_name);
        for (name, value) in &data.attrs {
            let Some(name) = self.attribute_name(name) else {
                continue;
            };
            out.push(' ');
            out.push_str(&name);
            out.push_str("=\"");
            escape_into(out, value, true);
            out.push('"');
        }

        let self_closing = match content {
            Some(ContentType::None) => true,
            Some(_) => false,
            None => data.foreign_markup && children.is_empty(),
        };
        if self_closing {
            out.push_str(" />");
            return;
        }
        out.push('>');
        self.write_children(out, tree, id, content == Some(ContentType::Text));
        out.push_str("</");
        out.push_str(&data.tag_name);
        out.push('>');
    }

    fn write_children(&self, out: &mut String, tree: &DomTree, id: NodeId, raw: bool) {
        for &child in tree.children(id) {
            match tree.as_text(child) {
                Some(text) if raw => out.push_str(text),
                _ => self.write_node(out, tree, child),
            }
        }
    }

    /// The attribute name as it will be written, or `None` if it sanitizes
    /// to nothing.
    fn attribute_name(&self, name: &str) -> Option<String> {
        if self.properties.allow_invalid_attribute_names {
            return Some(name.to_string());
        }
        sanitize_xml_name(name, &self.properties.invalid_xml_attribute_name_prefix)
    }
}

/// Make `name` a valid XML name: drop characters that may not appear in a
/// name and put `prefix` in front when what is left cannot start one.
#[must_use]
pub fn sanitize_xml_name(name: &str, prefix: &str) -> Option<String> {
    let kept: String = name.chars().filter(|&c| is_name_char(c)).collect();
    let valid_start = kept.chars().next().is_some_and(is_name_start_char);
    let sanitized = if valid_start {
        kept
    } else {
        format!("{prefix}{kept}")
    };
    let usable = sanitized.chars().next().is_some_and(is_name_start_char);
    usable.then_some(sanitized)
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c) || c.is_numeric() || c == '-' || c == '.'
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

fn write_doctype(out: &mut String, doctype: &Doctype) {
    out.push_str("<!DOCTYPE ");
    out.push_str(&doctype.name);
    match (&doctype.public_id, &doctype.system_id) {
        (Some(public), Some(system)) => {
            out.push_str(&format!(" PUBLIC \"{public}\" \"{system}\""));
        }
        (Some(public), None) => out.push_str(&format!(" PUBLIC \"{public}\"")),
        (None, Some(system)) => out.push_str(&format!(" SYSTEM \"{system}\"")),
        (None, None) => {}
    }
    out.push('>');
}

/// Render a tree as an indented outline for debugging.
///
/// Auto-generated elements are marked with `*`, foreign ones with their
/// namespace.
#[must_use]
pub fn dump_tree(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    dump_into(&mut out, tree, id, 0);
    out
}

fn dump_into(out: &mut String, tree: &DomTree, id: NodeId, indent: usize) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let prefix = "  ".repeat(indent);
    let line = match &node.node_type {
        NodeType::Document => "#document".to_string(),
        NodeType::Element(data) => {
            let marker = if data.auto_generated { "*" } else { "" };
            let mut line = format!("<{}{marker}", data.tag_name);
            if let Some(namespace) = &data.namespace {
                line.push_str(&format!(" @{namespace}"));
            }
            for (k, v) in &data.attrs {
                if v.is_empty() {
                    line.push_str(&format!(" {k}"));
                } else {
                    line.push_str(&format!(" {k}=\"{v}\""));
                }
            }
            line.push('>');
            line
        }
        NodeType::Text(text) => format!("\"{}\"", text.replace('\n', "\\n")),
        NodeType::Comment(text) => format!("<!-- {text} -->"),
        NodeType::CData(text) => format!("<![CDATA[{text}]]>"),
    };
    out.push_str(&prefix);
    out.push_str(&line);
    out.push('\n');
    for &child in tree.children(id) {
        dump_into(out, tree, child, indent + 1);
    }
}
