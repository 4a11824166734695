//! Property tests: arbitrary token soup always yields a well-formed tree.

use std::collections::HashSet;

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use trellis_html::{
    CleanedDocument, CleanerProperties, DomTree, HtmlCleaner, Html5TagProvider, NodeId,
    StartTag, TagCondition, Token,
};

/// Longest run of identical auto-generated copies the cleaner produces.
const COPY_LIMIT: usize = 3;

const NAMES: &[&str] = &[
    "div", "p", "b", "i", "span", "a", "table", "tbody", "tr", "td", "th", "caption", "ul", "ol",
    "li", "dl", "dd", "select", "option", "form", "fieldset", "legend", "title", "script", "br",
    "svg", "foo", "center", "template", "h1",
];

/// A random sequence of tokens drawn from a small tag vocabulary.
#[derive(Debug, Clone)]
struct Soup(Vec<Token>);

impl Arbitrary for Soup {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 48;
        let tokens = (0..len)
            .map(|_| {
                let name = g.choose(NAMES).copied().unwrap_or("div");
                match u8::arbitrary(g) % 7 {
                    0 | 1 => Token::start(name),
                    2 | 3 => Token::end(name),
                    4 => Token::text("x"),
                    5 => Token::text(" "),
                    _ => StartTag::new(name).self_closed().into(),
                }
            })
            .collect();
        Self(tokens)
    }
}

fn clean(props: CleanerProperties, soup: Soup) -> CleanedDocument {
    HtmlCleaner::new(props)
        .expect("valid properties")
        .clean(soup.0)
        .expect("html5 rules never cycle")
}

/// Every node reachable from the root, checking that none is reached twice
fn reachable(doc: &CleanedDocument) -> Option<HashSet<NodeId>> {
    let mut seen = HashSet::new();
    for id in doc.tree.descendants(doc.tree.root()) {
        if !seen.insert(id) {
            return None;
        }
    }
    Some(seen)
}

#[quickcheck]
fn prop_tree_is_well_formed(soup: Soup) -> bool {
    let doc = clean(CleanerProperties::default(), soup);
    let Some(nodes) = reachable(&doc) else {
        return false;
    };
    nodes.iter().all(|&id| {
        let parent_ok = doc
            .tree
            .parent(id)
            .is_none_or(|parent| doc.tree.children(parent).contains(&id));
        let formed_ok = doc.tree.as_element(id).is_none_or(|e| e.formed);
        parent_ok && formed_ok
    })
}

#[quickcheck]
fn prop_text_is_kept_exactly_once(soup: Soup) -> bool {
    let expected = soup
        .0
        .iter()
        .filter(|t| matches!(t, Token::Text { content } if content == "x"))
        .count();
    let doc = clean(CleanerProperties::default(), soup);
    doc.tree.text_content(doc.root).matches('x').count() == expected
}

#[quickcheck]
fn prop_pruning_reaches_fixed_point(soup: Soup) -> bool {
    let props = CleanerProperties {
        prune_conditions: vec![TagCondition::EmptyContent],
        ..CleanerProperties::default()
    };
    let doc = clean(props, soup);
    let provider = Html5TagProvider::shared();
    let synthetic = [doc.root, doc.head.unwrap_or(doc.root), doc.body.unwrap_or(doc.root)];
    doc.tree
        .descendants(doc.root)
        .filter(|id| !synthetic.contains(id))
        .all(|id| !TagCondition::EmptyContent.matches(&doc.tree, id, &*provider))
}

/// Length of the chain of auto-generated elements, starting at `id`, where
/// each one is the only child of the previous and has the same name and
/// attributes.
fn clone_chain(tree: &DomTree, id: NodeId) -> usize {
    let Some(head) = tree.as_element(id).filter(|e| e.auto_generated) else {
        return 0;
    };
    let mut len = 1;
    let mut current = id;
    while let [only] = tree.children(current)
        && let Some(next) = tree.as_element(*only)
        && next.auto_generated
        && next.tag_name == head.tag_name
        && next.attrs == head.attrs
    {
        len += 1;
        current = *only;
    }
    len
}

#[quickcheck]
fn prop_clone_chains_stay_bounded(soup: Soup) -> bool {
    let doc = clean(CleanerProperties::default(), soup);
    doc.tree
        .descendants(doc.tree.root())
        .all(|id| clone_chain(&doc.tree, id) <= COPY_LIMIT)
}

#[quickcheck]
fn prop_nested_formatting_copies_stay_bounded(depth: u8) -> bool {
    let mut tokens = vec![Token::start("b"); usize::from(depth % 12)];
    tokens.extend([
        Token::text("x"),
        Token::start("div"),
        Token::text("y"),
        Token::end("div"),
        Token::text("z"),
    ]);
    let doc = HtmlCleaner::new(CleanerProperties::default())
        .expect("valid properties")
        .clean(tokens)
        .expect("clean succeeds");
    doc.tree
        .descendants(doc.tree.root())
        .all(|id| clone_chain(&doc.tree, id) <= COPY_LIMIT)
}
