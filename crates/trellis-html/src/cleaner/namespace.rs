//! Namespace tracking for foreign markup.

use std::collections::HashMap;

/// The XHTML namespace.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
/// The SVG namespace.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
/// The `MathML` namespace.
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Active namespace URIs, innermost on top, plus every `xmlns:prefix`
/// declaration seen so far.
#[derive(Debug, Default)]
pub(crate) struct NamespaceTracker {
    stack: Vec<String>,
    prefixes: HashMap<String, String>,
}

impl NamespaceTracker {
    pub(crate) fn push(&mut self, uri: &str) {
        self.stack.push(uri.to_string());
    }

    pub(crate) fn pop(&mut self) -> Option<String> {
        self.stack.pop()
    }

    pub(crate) fn top(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Inside an element whose namespace is not XHTML.
    pub(crate) fn in_foreign_context(&self) -> bool {
        self.top().is_some_and(|uri| uri != XHTML_NAMESPACE)
    }

    pub(crate) fn register_prefix(&mut self, prefix: &str, uri: &str) {
        let _ = self.prefixes.insert(prefix.to_string(), uri.to_string());
    }

    pub(crate) fn resolve(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Namespace of a foreign element: its prefix binding if it has one,
    /// the innermost active namespace otherwise.
    pub(crate) fn namespace_for(&self, name: &str) -> Option<String> {
        name.split_once(':')
            .and_then(|(prefix, _)| self.resolve(prefix))
            .or_else(|| self.top())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_context_follows_stack() {
        let mut ns = NamespaceTracker::default();
        assert!(!ns.in_foreign_context());

        ns.push(SVG_NAMESPACE);
        assert!(ns.in_foreign_context());
        ns.push(XHTML_NAMESPACE);
        assert!(!ns.in_foreign_context());

        assert_eq!(ns.pop().as_deref(), Some(XHTML_NAMESPACE));
        assert_eq!(ns.depth(), 1);
        assert_eq!(ns.top(), Some(SVG_NAMESPACE));
    }

    #[test]
    fn test_prefix_wins_over_stack() {
        let mut ns = NamespaceTracker::default();
        ns.register_prefix("o", "urn:schemas-microsoft-com:office:office");
        ns.push(MATHML_NAMESPACE);

        assert_eq!(
            ns.namespace_for("o:p").as_deref(),
            Some("urn:schemas-microsoft-com:office:office")
        );
        assert_eq!(ns.namespace_for("mi").as_deref(), Some(MATHML_NAMESPACE));
        assert_eq!(ns.namespace_for("x:y").as_deref(), Some(MATHML_NAMESPACE));
    }
}
