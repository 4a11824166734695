//! Tolerant HTML tree construction for Trellis.
//!
//! # Scope
//!
//! This crate turns an already-tokenized HTML stream into a well-formed
//! document tree, repairing whatever the markup gets wrong:
//! - **Tag rules** - a per-tag table of content models, required parents,
//!   implicit closes and copy/reopen behaviour, with a built-in HTML5 table
//! - **Tree building** - implicit closing, required parent and preferred
//!   child synthesis, relocation of content a container cannot hold,
//!   reopening of formatting tags interrupted by blocks
//! - **Document assembly** - `html`/`head`/`body` envelope, head element
//!   promotion, pruning by configurable tag conditions
//! - **Serialization** - compact HTML output and a debug outline
//!
//! # Not Included
//!
//! - Tokenizing raw markup (tokens come from the caller)
//! - XML, DOM or JDOM output backends

pub mod cleaner;
pub mod condition;
pub mod config;
pub mod error;
pub mod serialize;
pub mod tag_rules;
/// Tokens accepted by the cleaner.
pub mod token;

pub use cleaner::{
    CleanListener, CleanedDocument, HtmlCleaner, MATHML_NAMESPACE, NoopListener, SVG_NAMESPACE,
    XHTML_NAMESPACE,
};
pub use condition::TagCondition;
pub use config::CleanerProperties;
pub use error::CleanError;
pub use serialize::{HtmlSerializer, dump_tree, sanitize_xml_name};
pub use tag_rules::{BelongsTo, ContentType, Html5TagProvider, TagInfo, TagRuleProvider};
pub use token::{Attribute, Doctype, StartTag, Token};
pub use trellis_common::{CancelToken, Canceled, Diagnostic, ErrorKind, Severity};
pub use trellis_dom::{DomTree, ElementData, NodeId, NodeType};
