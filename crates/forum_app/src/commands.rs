use std::io::{self, Write};
use std::sync::Arc;

use chrono::Utc;
use forum_core::{
    commenter_activity, title_word_count, unique_commenters, PageRecord, ParsedComment, Resource,
    StopBound,
};
use forum_engine::{CrawledPage, Crawler, PageContent, ReqwestPageFetcher};
use forum_logging::{forum_info, forum_warn};
use futures_util::{pin_mut, StreamExt};
use serde::Serialize;

use crate::cli::{Commands, PageRange};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct CountLine<'a> {
    name: &'a str,
    count: usize,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    resource: String,
    pages: usize,
    generated_utc: String,
    entries: Vec<CountLine<'a>>,
}

pub(crate) async fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    let fetcher = Arc::new(ReqwestPageFetcher::new(config.fetch_settings()));
    let crawler = Crawler::new(fetcher, config.crawl_settings()?)?;

    match command {
        Commands::Post { url, range } => {
            let post = crawler.open(Resource::post(url)).await?;
            print_pages(&crawler, post, range).await
        }
        Commands::User { name, range } => {
            let user = crawler.open(Resource::user(name)).await?;
            print_pages(&crawler, user, range).await
        }
        Commands::Section { name, range } => {
            let section = crawler.open(Resource::section(name)).await?;
            print_pages(&crawler, section, range).await
        }
        Commands::Commenters { url, unique } => {
            let post = crawler.open(Resource::post(url)).await?;
            let pages = collect_pages(&crawler, &post, 0, StopBound::All).await?;
            let records: Vec<&PageRecord<ParsedComment>> = pages
                .iter()
                .filter_map(|page| match &page.content {
                    PageContent::Comments(record) => Some(record),
                    _ => None,
                })
                .collect();

            if unique {
                for name in unique_commenters(records.iter().copied()) {
                    println!("{name}");
                }
                return Ok(());
            }

            let activity = commenter_activity(records.iter().copied());
            let entries = activity
                .ranked()
                .into_iter()
                .map(|name| CountLine {
                    name,
                    count: activity.count(name),
                })
                .collect();
            print_json(&Summary {
                resource: post.to_string(),
                pages: pages.len(),
                generated_utc: Utc::now().to_rfc3339(),
                entries,
            })
        }
        Commands::Words { name, range, top } => {
            let section = crawler.open(Resource::section(name)).await?;
            let pages =
                collect_pages(&crawler, &section, range.start, range.stop_bound()).await?;
            let titles: Vec<&str> = pages
                .iter()
                .filter_map(|page| match &page.content {
                    PageContent::Topics(topics) => Some(topics),
                    _ => None,
                })
                .flatten()
                .map(|topic| topic.title.as_str())
                .collect();

            let words = title_word_count(titles);
            let entries = words
                .ranked()
                .into_iter()
                .take(top.unwrap_or(usize::MAX))
                .map(|name| CountLine {
                    name,
                    count: words.count(name),
                })
                .collect();
            print_json(&Summary {
                resource: section.to_string(),
                pages: pages.len(),
                generated_utc: Utc::now().to_rfc3339(),
                entries,
            })
        }
    }
}

/// Stream pages to stdout as they are crawled, one JSON object per line.
async fn print_pages(
    crawler: &Crawler,
    resource: Resource,
    range: PageRange,
) -> anyhow::Result<()> {
    let label = resource.to_string();
    let pages = crawler.iterate_pages(resource, range.start, range.stop_bound());
    pin_mut!(pages);

    let mut printed = 0usize;
    let mut degraded = 0usize;
    while let Some(page) = pages.next().await {
        let page = page?;
        degraded += page.anomalies.len();
        print_json(&page)?;
        printed += 1;
    }

    if degraded > 0 {
        forum_warn!("{} degraded fields across {} pages of {}", degraded, printed, label);
    }
    forum_info!("Printed {} pages of {}", printed, label);
    Ok(())
}

async fn collect_pages(
    crawler: &Crawler,
    resource: &Resource,
    start: u32,
    stop: StopBound,
) -> anyhow::Result<Vec<CrawledPage>> {
    let pages = crawler.iterate_pages(resource.clone(), start, stop);
    pin_mut!(pages);

    let mut collected = Vec::new();
    while let Some(page) = pages.next().await {
        collected.push(page?);
    }
    Ok(collected)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let line = serde_json::to_string(value)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")?;
    Ok(())
}
