use std::sync::LazyLock;

use forum_core::{SiteConfig, StructuralAnomaly, TopicSummary};
use scraper::{ElementRef, Html, Selector};

use crate::types::BuildError;

struct TopicSelectors {
    listing_table: Selector,
    topic_cell: Selector,
    title_block: Selector,
    title_link: Selector,
    meta_block: Selector,
    meta_value: Selector,
}

static SELECTORS: LazyLock<TopicSelectors> = LazyLock::new(|| TopicSelectors {
    listing_table: Selector::parse("table:not([id]):not([summary])")
        .expect("listing table selector"),
    topic_cell: Selector::parse("td[id]").expect("topic cell selector"),
    title_block: Selector::parse("b").expect("title block selector"),
    title_link: Selector::parse("a[href]").expect("title link selector"),
    meta_block: Selector::parse("span.s").expect("meta block selector"),
    meta_value: Selector::parse("b").expect("meta value selector"),
});

/// Read the topic rows of one section listing page.
///
/// Cells missing the title link or the poster/count block are reported and
/// skipped; the rest of the page is still read.
pub fn parse_topics(
    html: &str,
    site: &SiteConfig,
) -> Result<(Vec<TopicSummary>, Vec<StructuralAnomaly>), BuildError> {
    let selectors = &*SELECTORS;
    let doc = Html::parse_document(html);
    let table = doc
        .select(&selectors.listing_table)
        .next()
        .ok_or(BuildError::MissingTable("topics"))?;

    let mut topics = Vec::new();
    let mut anomalies = Vec::new();
    for (cell_index, cell) in table.select(&selectors.topic_cell).enumerate() {
        match parse_topic_cell(cell, site) {
            Some(topic) => topics.push(topic),
            None => anomalies.push(StructuralAnomaly::MalformedTopic { cell: cell_index }),
        }
    }
    Ok((topics, anomalies))
}

fn parse_topic_cell(cell: ElementRef<'_>, site: &SiteConfig) -> Option<TopicSummary> {
    let selectors = &*SELECTORS;
    let link = cell
        .select(&selectors.title_block)
        .next()?
        .select(&selectors.title_link)
        .next()?;
    let href = link.value().attr("href")?.trim();

    let mut meta = cell
        .select(&selectors.meta_block)
        .next()?
        .select(&selectors.meta_value)
        .map(text_of);
    let poster = meta.next()?;
    // Displayed count includes the opening post.
    let comments = meta.next()?.replace(',', "").parse().ok()?;

    Some(TopicSummary {
        poster,
        title: text_of(link),
        url: site.absolute(href),
        comments,
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separator_in_count_is_accepted() {
        let html = r#"<table><tr><td id="top1"><b><a href="/1/x">X</a></b>
            <span class="s">by <b>ade</b>. <b>1,204</b> posts</span></td></tr></table>"#;
        let (topics, anomalies) = parse_topics(html, &SiteConfig::default()).unwrap();
        assert!(anomalies.is_empty());
        assert_eq!(topics[0].comments, 1204);
        assert_eq!(topics[0].url, "https://www.nairaland.com/1/x");
    }
}
