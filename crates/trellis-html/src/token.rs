use core::fmt;

use crate::cleaner::Item;

/// An attribute on a start tag token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as written.
    pub name: String,
    /// Attribute value, already entity-decoded by the tokenizer.
    pub value: String,
}

impl Attribute {
    /// Create a new attribute with the given name and value.
    #[must_use]
    pub const fn new(name: String, value: String) -> Self {
        Self { name, value }
    }
}

/// The document type declaration, extracted by the tokenizer and attached to
/// the cleaned document as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    /// Root element name, usually `html`.
    pub name: String,
    /// Public identifier, if any.
    pub public_id: Option<String>,
    /// System identifier, if any.
    pub system_id: Option<String>,
}

impl Doctype {
    /// The HTML5 doctype, `<!DOCTYPE html>`.
    #[must_use]
    pub fn html5() -> Self {
        Self {
            name: "html".to_string(),
            public_id: None,
            system_id: None,
        }
    }
}

/// A start tag that has not been turned into a tree node yet.
///
/// Besides what the tokenizer saw, a start tag carries the bookkeeping the
/// cleaner attaches while it is still open: content relocated in front of
/// it and the facts recorded when it was accepted (namespace, head
/// placement).
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct StartTag {
    /// Tag name as written, possibly prefixed (`svg:rect`).
    pub name: String,
    /// Attributes in document order. Duplicates are allowed here; the first
    /// occurrence wins once the element is formed.
    pub attributes: Vec<Attribute>,
    /// The tokenizer saw `<tag ... />`.
    pub self_closing: bool,
    /// The tag was synthesized by the cleaner.
    pub auto_generated: bool,
    /// The tag belongs to non-HTML markup.
    pub foreign_markup: bool,
    pub(crate) relocated: Vec<Item>,
    pub(crate) namespace_pushed: bool,
    pub(crate) namespace: Option<String>,
    pub(crate) head_candidate: bool,
}

impl StartTag {
    /// Create a start tag with no attributes.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            self_closing: false,
            auto_generated: false,
            foreign_markup: false,
            relocated: Vec::new(),
            namespace_pushed: false,
            namespace: None,
            head_candidate: false,
        }
    }

    /// Create a start tag the cleaner synthesized.
    #[must_use]
    pub fn auto_generated(name: &str) -> Self {
        let mut tag = Self::new(name);
        tag.auto_generated = true;
        tag
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .push(Attribute::new(name.to_string(), value.to_string()));
        self
    }

    /// Mark the tag as written in self-closing form.
    #[must_use]
    pub const fn self_closed(mut self) -> Self {
        self.self_closing = true;
        self
    }

    /// Value of the first attribute with the given name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// A fresh auto-generated copy with the same name and attributes and
    /// none of the cleaner bookkeeping.
    #[must_use]
    pub fn copy(&self) -> Self {
        let mut tag = Self::auto_generated(&self.name);
        tag.attributes.clone_from(&self.attributes);
        tag.foreign_markup = self.foreign_markup;
        tag
    }

    /// Two tags describe the same element: same name and same attributes.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name && self.attributes == other.attributes
    }
}

/// A lexical token produced by the tokenizer, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<name attr=value>`
    StartTag(StartTag),
    /// `</name>`
    EndTag {
        /// Tag name as written.
        name: String,
    },
    /// Character data.
    Text {
        /// Decoded text.
        content: String,
    },
    /// `<!-- content -->`
    Comment {
        /// Text between the delimiters.
        content: String,
    },
    /// `<![CDATA[content]]>`
    CData {
        /// Text between the delimiters.
        content: String,
    },
}

impl Token {
    /// Create a start tag token with no attributes.
    #[must_use]
    pub fn start(name: &str) -> Self {
        Self::StartTag(StartTag::new(name))
    }

    /// Create an end tag token.
    #[must_use]
    pub fn end(name: &str) -> Self {
        Self::EndTag {
            name: name.to_string(),
        }
    }

    /// Create a text token.
    #[must_use]
    pub fn text(content: &str) -> Self {
        Self::Text {
            content: content.to_string(),
        }
    }

    /// Create a comment token.
    #[must_use]
    pub fn comment(content: &str) -> Self {
        Self::Comment {
            content: content.to_string(),
        }
    }

    /// Create a CDATA token.
    #[must_use]
    pub fn cdata(content: &str) -> Self {
        Self::CData {
            content: content.to_string(),
        }
    }

    /// Tag name for start and end tags.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Self::StartTag(tag) => Some(&tag.name),
            Self::EndTag { name } => Some(name),
            _ => None,
        }
    }

    /// Whether this token is a start or end tag.
    #[must_use]
    pub const fn is_tag(&self) -> bool {
        matches!(self, Self::StartTag(_) | Self::EndTag { .. })
    }

    /// Whether this is text made only of whitespace (or empty).
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text { content } if content.chars().all(char::is_whitespace))
    }
}

impl From<StartTag> for Token {
    fn from(tag: StartTag) -> Self {
        Self::StartTag(tag)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartTag(tag) => {
                write!(f, "<{}", tag.name)?;
                for attr in &tag.attributes {
                    write!(f, " {}=\"{}\"", attr.name, attr.value)?;
                }
                if tag.self_closing {
                    write!(f, " /")?;
                }
                write!(f, ">")
            }
            Self::EndTag { name } => write!(f, "</{name}>"),
            Self::Text { content } => write!(f, "{content}"),
            Self::Comment { content } => write!(f, "<!--{content}-->"),
            Self::CData { content } => write!(f, "<![CDATA[{content}]]>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_drops_bookkeeping() {
        let mut original = StartTag::new("b").with_attribute("class", "x");
        original.namespace_pushed = true;
        original.relocated.push(Item::Vacant);

        let copy = original.copy();
        assert!(copy.auto_generated);
        assert!(copy.relocated.is_empty());
        assert!(!copy.namespace_pushed);
        assert!(copy.same_shape(&original));
    }

    #[test]
    fn test_display_start_tag() {
        let token = Token::from(
            StartTag::new("img")
                .with_attribute("src", "a.png")
                .self_closed(),
        );
        assert_eq!(token.to_string(), "<img src=\"a.png\" />");
    }

    #[test]
    fn test_blank_text() {
        assert!(Token::text(" \n\t").is_blank_text());
        assert!(!Token::text(" x ").is_blank_text());
        assert!(!Token::comment(" ").is_blank_text());
    }
}
