use std::sync::LazyLock;

use forum_core::{CountMarker, Resource, SiteConfig};
use forum_logging::{forum_debug, forum_warn};
use regex::Regex;
use scraper::Html;

use crate::fetch::PageFetcher;
use crate::types::FetchError;

static BOLD_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<b>\s*(\d+)\s*</b>").expect("bold count regex"));
static OF_PAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(of\s*(\d+)\s*pages\)").expect("of pages regex"));

/// Read the page count embedded in page 0 of a user history or section.
///
/// `None` when the marker is absent or its number does not fit.
pub fn embedded_page_count(html: &str, marker: CountMarker) -> Option<u32> {
    let digits = match marker {
        CountMarker::BoldCount => first_capture(&BOLD_COUNT, html)?,
        CountMarker::OfPages => {
            let text: String = Html::parse_document(html).root_element().text().collect();
            first_capture(&OF_PAGES, &text)?
        }
    };
    digits.parse().ok()
}

fn first_capture(pattern: &Regex, haystack: &str) -> Option<String> {
    pattern
        .captures(haystack)
        .and_then(|captures| captures.get(1))
        .map(|digits| digits.as_str().to_string())
}

/// Count the pages of a resource by probing `page_url(i)` for i = 0, 1, ...
/// and stopping at the first miss.
///
/// Probing also stops after `limit` hits, so a site that answers every URL
/// cannot keep the crawl spinning.
pub async fn probe_page_count(
    fetcher: &dyn PageFetcher,
    resource: &Resource,
    site: &SiteConfig,
    limit: u32,
) -> Result<u32, FetchError> {
    let mut count = 0;
    while count < limit {
        let url = resource.page_url(site, count);
        if !fetcher.exists(&url).await? {
            forum_debug!("{} has {} pages (first miss at {})", resource, count, url);
            return Ok(count);
        }
        count += 1;
    }
    forum_warn!("Stopped probing {} after {} pages", resource, limit);
    Ok(count)
}
