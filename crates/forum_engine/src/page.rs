//! Row-paired comment tables.
//!
//! Post pages and user history pages both lay comments out as a name row
//! followed by a comment row. Every field is read through a short chain of
//! selectors because the markup varies between rendering variants; a chain
//! that runs dry degrades the field instead of failing the page.

use std::sync::LazyLock;

use ego_tree::NodeId;
use forum_core::{
    PageRecord, ParsedComment, ResourceKind, SiteConfig, StructuralAnomaly, TopicComment,
    TopicSummary, NOBODY,
};
use forum_logging::{forum_debug, forum_warn};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::audit::CommentAudit;
use crate::normalize::normalize_cell;
use crate::topics::parse_topics;
use crate::types::BuildError;

const RE_PREFIX: &str = "Re:";

/// Which table layout a page is read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    Post,
    UserHistory,
    Topics,
}

impl From<ResourceKind> for RecordMode {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Post => RecordMode::Post,
            ResourceKind::UserHistory => RecordMode::UserHistory,
            ResourceKind::Section => RecordMode::Topics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum PageContent {
    Comments(PageRecord<ParsedComment>),
    History(PageRecord<TopicComment>),
    Topics(Vec<TopicSummary>),
}

impl PageContent {
    pub fn len(&self) -> usize {
        match self {
            PageContent::Comments(record) => record.len(),
            PageContent::History(record) => record.len(),
            PageContent::Topics(topics) => topics.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A built page together with every degradation applied while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPage {
    pub content: PageContent,
    pub anomalies: Vec<StructuralAnomaly>,
}

/// One way of locating a field: a cell inside the row, then a target inside
/// the cell.
struct FieldStrategy {
    cell: Selector,
    target: Selector,
}

impl FieldStrategy {
    fn new(cell: &str, target: &str) -> Self {
        Self {
            cell: Selector::parse(cell).expect("cell selector"),
            target: Selector::parse(target).expect("target selector"),
        }
    }

    fn first<'a>(&self, row: ElementRef<'a>) -> Option<ElementRef<'a>> {
        row.select(&self.cell).next()?.select(&self.target).next()
    }

    fn all<'a>(&self, row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        row.select(&self.cell)
            .next()
            .map(|cell| cell.select(&self.target).collect())
            .unwrap_or_default()
    }
}

/// First strategy that yields a target wins.
fn resolve_first<'a>(chain: &[FieldStrategy], row: ElementRef<'a>) -> Option<ElementRef<'a>> {
    chain.iter().find_map(|strategy| strategy.first(row))
}

fn resolve_all<'a>(chain: &[FieldStrategy], row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    chain
        .iter()
        .map(|strategy| strategy.all(row))
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

struct Selectors {
    post_table: Selector,
    listing_table: Selector,
    row: Selector,
    anomaly_cell: Selector,
    post_name: [FieldStrategy; 2],
    post_comment: [FieldStrategy; 2],
    history_links: [FieldStrategy; 2],
    history_comment: [FieldStrategy; 2],
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    post_table: Selector::parse(r#"table[summary="posts"]"#).expect("post table selector"),
    listing_table: Selector::parse("table:not([id]):not([summary])")
        .expect("listing table selector"),
    row: Selector::parse("tr").expect("row selector"),
    anomaly_cell: Selector::parse(r#"td[class="l pu pd"]"#).expect("anomaly selector"),
    post_name: [
        FieldStrategy::new(r#"td[class="bold l pu"]"#, "a[href][class]"),
        FieldStrategy::new(r#"td[class="bold l pu nocopy"]"#, "a[href][class]"),
    ],
    post_comment: [
        FieldStrategy::new(r#"td[id][class="l w pd"]"#, "div.narrow"),
        FieldStrategy::new(r#"td[id][class="l w pd nocopy"]"#, "div.narrow"),
    ],
    history_links: [
        FieldStrategy::new(r#"td[class="bold l pu"]"#, "a[href]:not([class])"),
        FieldStrategy::new(r#"td[class="bold l pu nocopy"]"#, "a[href]:not([class])"),
    ],
    history_comment: [
        FieldStrategy::new(r#"td[class="l w pd"]"#, "div.narrow"),
        FieldStrategy::new(r#"td[class="l w pd nocopy"]"#, "div.narrow"),
    ],
});

/// What a name/comment row pair resolved to before any tree mutation.
struct RowPair {
    row: usize,
    names: Vec<String>,
    comment: Option<NodeId>,
}

/// Builds page records from fetched markup.
///
/// Nothing is kept between pages; building the same markup twice yields
/// equal records.
#[derive(Default)]
pub struct PageBuilder<'a> {
    audit: Option<&'a dyn CommentAudit>,
}

impl<'a> PageBuilder<'a> {
    pub fn new() -> Self {
        Self { audit: None }
    }

    /// Every comment cell is handed to `audit` before it is normalized.
    pub fn with_audit(audit: &'a dyn CommentAudit) -> Self {
        Self { audit: Some(audit) }
    }

    pub fn build(
        &self,
        html: &str,
        mode: RecordMode,
        site: &SiteConfig,
    ) -> Result<BuiltPage, BuildError> {
        let (content, anomalies) = match mode {
            RecordMode::Post => {
                let (record, anomalies) = self.build_post(html)?;
                (PageContent::Comments(record), anomalies)
            }
            RecordMode::UserHistory => {
                let (record, anomalies) = self.build_history(html)?;
                (PageContent::History(record), anomalies)
            }
            RecordMode::Topics => {
                let (topics, anomalies) = parse_topics(html, site)?;
                (PageContent::Topics(topics), anomalies)
            }
        };
        for anomaly in &anomalies {
            forum_warn!("Degraded page content: {}", anomaly);
        }
        Ok(BuiltPage { content, anomalies })
    }

    /// Commenter name to comment, for one page of a topic thread.
    ///
    /// A row without a resolvable name is keyed by [`NOBODY`]; a missing
    /// comment cell yields an empty comment.
    pub fn build_post(
        &self,
        html: &str,
    ) -> Result<(PageRecord<ParsedComment>, Vec<StructuralAnomaly>), BuildError> {
        let selectors = &*SELECTORS;
        let mut doc = Html::parse_document(html);
        let mut anomalies = Vec::new();

        let pairs = collect_pairs(
            &doc,
            &selectors.post_table,
            "posts",
            post_fields,
            &mut anomalies,
        )?;

        let mut rows = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let name = match pair.names.into_iter().next() {
                Some(name) => name,
                None => {
                    anomalies.push(StructuralAnomaly::MissingName { row: pair.row });
                    NOBODY.to_string()
                }
            };
            let comment = match pair.comment {
                Some(cell) => self.normalize(&mut doc, cell),
                None => {
                    anomalies.push(StructuralAnomaly::MissingComment { row: pair.row });
                    ParsedComment::default()
                }
            };
            rows.push((name, pair.row, comment));
        }

        let record = PageRecord::from_rows(rows);
        forum_debug!("Built post page with {} comments", record.len());
        Ok((record, anomalies))
    }

    /// Section name to topic comment, for one page of a user's history.
    ///
    /// A field that cannot be resolved reuses the value of the previous row
    /// pair on the page. The first pair has nothing to reuse and falls back
    /// to [`NOBODY`] or an empty value.
    pub fn build_history(
        &self,
        html: &str,
    ) -> Result<(PageRecord<TopicComment>, Vec<StructuralAnomaly>), BuildError> {
        let selectors = &*SELECTORS;
        let mut doc = Html::parse_document(html);
        let mut anomalies = Vec::new();

        let pairs = collect_pairs(
            &doc,
            &selectors.listing_table,
            "history",
            history_fields,
            &mut anomalies,
        )?;

        let mut section = NOBODY.to_string();
        let mut topic = String::new();
        let mut comment = ParsedComment::default();
        let mut rows = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let mut links = pair.names.into_iter();
            match links.next() {
                Some(found) => section = found,
                None => anomalies.push(StructuralAnomaly::MissingSection { row: pair.row }),
            }
            match links.next() {
                Some(found) => topic = strip_reply_prefix(&found).to_string(),
                None => anomalies.push(StructuralAnomaly::MissingTopic { row: pair.row }),
            }
            match pair.comment {
                Some(cell) => comment = self.normalize(&mut doc, cell),
                None => anomalies.push(StructuralAnomaly::MissingComment { row: pair.row }),
            }

            let entry = TopicComment {
                topic: topic.clone(),
                comment: comment.clone(),
            };
            rows.push((section.clone(), pair.row, entry));
        }

        let record = PageRecord::from_rows(rows);
        forum_debug!("Built history page with {} comments", record.len());
        Ok((record, anomalies))
    }

    fn normalize(&self, doc: &mut Html, cell: NodeId) -> ParsedComment {
        if let Some(audit) = self.audit {
            if let Some(element) = doc.tree.get(cell).and_then(ElementRef::wrap) {
                audit.record(&element.html());
            }
        }
        normalize_cell(&mut doc.tree, cell)
    }
}

/// Names and comment cell resolved from a name row and its comment row.
type RowFields = fn(ElementRef<'_>, ElementRef<'_>) -> (Vec<String>, Option<NodeId>);

fn post_fields(
    name_row: ElementRef<'_>,
    comment_row: ElementRef<'_>,
) -> (Vec<String>, Option<NodeId>) {
    let selectors = &*SELECTORS;
    let names = resolve_first(&selectors.post_name, name_row)
        .map(|link| vec![element_text(link)])
        .unwrap_or_default();
    let comment = resolve_first(&selectors.post_comment, comment_row).map(|cell| cell.id());
    (names, comment)
}

/// Section link first, topic link second.
fn history_fields(
    name_row: ElementRef<'_>,
    comment_row: ElementRef<'_>,
) -> (Vec<String>, Option<NodeId>) {
    let selectors = &*SELECTORS;
    let names = resolve_all(&selectors.history_links, name_row)
        .into_iter()
        .take(2)
        .map(element_text)
        .collect();
    let comment = resolve_first(&selectors.history_comment, comment_row).map(|cell| cell.id());
    (names, comment)
}

/// Pair up the table's rows after dropping rows flagged by the anomaly
/// marker. A trailing name row without a comment row is reported and skipped.
fn collect_pairs(
    doc: &Html,
    table: &Selector,
    table_name: &'static str,
    fields: RowFields,
    anomalies: &mut Vec<StructuralAnomaly>,
) -> Result<Vec<RowPair>, BuildError> {
    let selectors = &*SELECTORS;
    let table = doc
        .select(table)
        .next()
        .ok_or(BuildError::MissingTable(table_name))?;

    let rows: Vec<ElementRef<'_>> = table
        .select(&selectors.row)
        .filter(|row| !is_anomaly_row(*row, &selectors.anomaly_cell))
        .collect();

    let mut pairs = Vec::with_capacity(rows.len() / 2);
    for (pair_index, chunk) in rows.chunks(2).enumerate() {
        let row = pair_index * 2;
        let [name_row, comment_row] = chunk else {
            anomalies.push(StructuralAnomaly::UnpairedRow { row });
            continue;
        };
        let (names, comment) = fields(*name_row, *comment_row);
        pairs.push(RowPair {
            row,
            names,
            comment,
        });
    }
    Ok(pairs)
}

fn is_anomaly_row(row: ElementRef<'_>, marker: &Selector) -> bool {
    row.children()
        .filter_map(ElementRef::wrap)
        .any(|cell| marker.matches(&cell))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn strip_reply_prefix(topic: &str) -> &str {
    topic.strip_prefix(RE_PREFIX).unwrap_or(topic).trim()
}
