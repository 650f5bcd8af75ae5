//! Paragraph reconstruction from `<br>`-separated markup.
//!
//! Forum posts mark line boundaries with `<br>` instead of block elements. Each
//! break contributes the trimmed text of the node right before it and the node
//! right after it. Adjoining breaks share a text node, so the collected halves
//! are de-duplicated keeping the first occurrence, then joined with newlines.

use std::collections::HashSet;

use ego_tree::NodeRef;
use scraper::{Html, Node};

const BREAK_TAG: &str = "br";

/// Rebuild the paragraph text of `fragment`.
///
/// Without any break marker the fragment's raw text is returned unchanged.
pub fn reconstruct(fragment: NodeRef<'_, Node>) -> String {
    let markers: Vec<NodeRef<'_, Node>> = fragment
        .descendants()
        .filter(|node| is_break(*node))
        .collect();

    if markers.is_empty() {
        return raw_text(fragment);
    }

    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for marker in markers {
        // Previous half before next half, marker by marker.
        let halves = [marker.prev_sibling(), marker.next_sibling()];
        for half in halves.into_iter().flatten().filter_map(sibling_text) {
            if seen.insert(half.clone()) {
                lines.push(half);
            }
        }
    }
    lines.join("\n")
}

/// Parse an HTML fragment and reconstruct its text.
pub fn reconstruct_fragment(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    reconstruct(*fragment.root_element())
}

pub(crate) fn trim_text(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == ':')
}

fn is_break(node: NodeRef<'_, Node>) -> bool {
    node.value()
        .as_element()
        .is_some_and(|element| element.name().eq_ignore_ascii_case(BREAK_TAG))
}

fn raw_text(fragment: NodeRef<'_, Node>) -> String {
    fragment
        .descendants()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect()
}

/// Trimmed text a sibling contributes, if any.
fn sibling_text(node: NodeRef<'_, Node>) -> Option<String> {
    let text = trim_text(single_string(node)?);
    (!text.is_empty()).then(|| text.to_string())
}

/// The node's text when it is a text node or an element wrapping exactly one
/// such node, however deeply. Breaks, comments and mixed content give `None`.
fn single_string<'a>(node: NodeRef<'a, Node>) -> Option<&'a str> {
    match node.value() {
        Node::Text(text) => Some(&**text),
        Node::Element(_) => {
            let mut children = node.children();
            let only = children.next()?;
            if children.next().is_some() {
                return None;
            }
            single_string(only)
        }
        _ => None,
    }
}
