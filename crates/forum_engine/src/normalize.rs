use ego_tree::{NodeId, NodeRef, Tree};
use forum_core::{ParsedComment, Quotes, ANONYMOUS_AUTHOR};
use forum_logging::forum_debug;
use scraper::{Html, Node};

use crate::reconstruct::{reconstruct, trim_text};

const QUOTE_TAG: &str = "blockquote";
const AUTHOR_TAG: &str = "b";

/// Split the comment cell at `cell` into the focus user's text and the
/// quotation blocks it contains.
///
/// Quotation blocks are detached from `tree` once read, so the focus text never
/// repeats quoted words. A block nested inside an already extracted block
/// stays part of the outer quote. A block whose text reconstructs to nothing
/// is dropped without touching any earlier quote from the same author.
pub fn normalize_cell(tree: &mut Tree<Node>, cell: NodeId) -> ParsedComment {
    let quote_ids: Vec<NodeId> = match tree.get(cell) {
        Some(node) => node
            .descendants()
            .skip(1)
            .filter(|node| has_tag(*node, QUOTE_TAG))
            .map(|node| node.id())
            .collect(),
        None => return ParsedComment::default(),
    };

    let mut quotes = Quotes::new();
    for id in quote_ids {
        let Some(block) = tree.get(id) else { continue };
        if !block.ancestors().any(|ancestor| ancestor.id() == cell) {
            continue;
        }

        let author = quote_author(block);
        let text = trim_text(&reconstruct(block)).to_string();
        if text.is_empty() {
            forum_debug!("Skipping empty quote from {}", author);
        } else if let Some(previous) = quotes.insert(author.clone(), text) {
            forum_debug!(
                "Quote from {} replaced an earlier one ({} chars)",
                author,
                previous.len()
            );
        }

        if let Some(mut block) = tree.get_mut(id) {
            block.detach();
        }
    }

    let focus_text = tree
        .get(cell)
        .map(|node| trim_text(&reconstruct(node)).to_string())
        .unwrap_or_default();

    ParsedComment::new(focus_text, quotes)
}

/// Parse a comment cell's markup and normalize it.
pub fn normalize_fragment(html: &str) -> ParsedComment {
    let mut fragment = Html::parse_fragment(html);
    let root = fragment.root_element().id();
    normalize_cell(&mut fragment.tree, root)
}

fn has_tag(node: NodeRef<'_, Node>, tag: &str) -> bool {
    node.value()
        .as_element()
        .is_some_and(|element| element.name().eq_ignore_ascii_case(tag))
}

/// Text of the block's first bold marker, or the anonymous sentinel.
fn quote_author(block: NodeRef<'_, Node>) -> String {
    block
        .descendants()
        .find(|node| has_tag(*node, AUTHOR_TAG))
        .map(|bold| {
            bold.descendants()
                .filter_map(|node| node.value().as_text())
                .map(|text| &**text)
                .collect::<String>()
        })
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string())
}
