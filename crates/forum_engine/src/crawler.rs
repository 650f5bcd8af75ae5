use std::path::PathBuf;
use std::sync::Arc;

use forum_core::{
    CrawlFrontier, DiscoveryStrategy, Resource, SiteConfig, StopBound, StructuralAnomaly,
};
use forum_logging::{forum_debug, forum_info, forum_warn};
use futures_util::stream::{self, Stream};
use serde::Serialize;

use crate::audit::FileCommentAudit;
use crate::cache::CachingFetcher;
use crate::discovery::{embedded_page_count, probe_page_count};
use crate::fetch::PageFetcher;
use crate::page::{PageBuilder, PageContent};
use crate::persist::ensure_output_dir;
use crate::types::{CacheMode, CrawlError};

#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub site: SiteConfig,
    /// Root of the page cache. Each resource kind gets its own sub-directory.
    pub cache_dir: Option<PathBuf>,
    pub cache_mode: CacheMode,
    /// File every comment cell is appended to before normalization.
    pub audit_path: Option<PathBuf>,
    pub max_probe_pages: u32,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            cache_dir: None,
            cache_mode: CacheMode::Refresh,
            audit_path: None,
            max_probe_pages: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawledPage {
    pub index: u32,
    pub url: String,
    pub content: PageContent,
    #[serde(skip)]
    pub anomalies: Vec<StructuralAnomaly>,
}

/// Drives page discovery and the page-by-page crawl of a resource.
///
/// A crawler holds no per-resource state, so one instance can serve
/// concurrent crawls of different resources.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    settings: CrawlSettings,
    audit: Option<FileCommentAudit>,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, settings: CrawlSettings) -> Result<Self, CrawlError> {
        if let Some(dir) = &settings.cache_dir {
            ensure_output_dir(dir)?;
        }
        let audit = settings
            .audit_path
            .as_ref()
            .map(FileCommentAudit::create)
            .transpose()?;
        Ok(Self {
            fetcher,
            settings,
            audit,
        })
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Confirm the resource exists before anything else is fetched for it.
    pub async fn open(&self, resource: Resource) -> Result<Resource, CrawlError> {
        let url = resource.landing_url(&self.settings.site);
        if self.fetcher.exists(&url).await? {
            forum_debug!("Opened {}", resource);
            Ok(resource)
        } else {
            forum_warn!("{} not found at {}", resource, url);
            Err(CrawlError::ResourceNotFound { resource, url })
        }
    }

    /// Number of pages the resource has. Page indices run `0..count`.
    pub async fn max_page(&self, resource: &Resource) -> Result<u32, CrawlError> {
        let site = &self.settings.site;
        let count = match resource.discovery() {
            DiscoveryStrategy::LinearProbe => {
                probe_page_count(
                    self.fetcher.as_ref(),
                    resource,
                    site,
                    self.settings.max_probe_pages,
                )
                .await?
            }
            DiscoveryStrategy::EmbeddedCount(marker) => {
                let url = resource.page_url(site, 0);
                let mode = match self.settings.cache_mode {
                    CacheMode::Bypass => CacheMode::Bypass,
                    _ => CacheMode::Refresh,
                };
                let page = self.fetcher_for(resource).fetch(&url, mode).await?;
                embedded_page_count(&page.html, marker).ok_or_else(|| {
                    CrawlError::MaxPageNotFound {
                        resource: resource.clone(),
                        url,
                    }
                })?
            }
        };
        forum_info!("{} has {} pages", resource, count);
        Ok(count)
    }

    /// Inclusive stop index for `stop`; `None` when the resource has no pages.
    pub async fn resolve_stop(
        &self,
        resource: &Resource,
        stop: StopBound,
    ) -> Result<Option<u32>, CrawlError> {
        match stop {
            StopBound::At(last) => Ok(Some(last)),
            StopBound::All => Ok(self.max_page(resource).await?.checked_sub(1)),
        }
    }

    /// Lazily crawl pages `start..=stop` in ascending order.
    ///
    /// With [`StopBound::All`] the page count is discovered when the first
    /// element is requested. Any error ends the stream after it is yielded;
    /// pages produced before it stay valid.
    pub fn iterate_pages(
        &self,
        resource: Resource,
        start: u32,
        stop: StopBound,
    ) -> impl Stream<Item = Result<CrawledPage, CrawlError>> + Send + '_ {
        let frontier = CrawlFrontier::new(resource, start, stop);
        stream::try_unfold(frontier, move |mut frontier| async move {
            if frontier.needs_discovery() {
                frontier.begin_resolving();
                match self.max_page(frontier.resource()).await {
                    Ok(count) => frontier.resolve(count),
                    Err(err) => {
                        frontier.fail();
                        return Err(err);
                    }
                }
            }
            let Some(index) = frontier.next_index() else {
                forum_debug!("Finished crawling {}", frontier.resource());
                return Ok(None);
            };
            let page = self.crawl_page(frontier.resource(), index).await?;
            Ok(Some((page, frontier)))
        })
    }

    /// Fetch and build a single page.
    pub async fn crawl_page(
        &self,
        resource: &Resource,
        index: u32,
    ) -> Result<CrawledPage, CrawlError> {
        let url = resource.page_url(&self.settings.site, index);
        let fetched = self
            .fetcher_for(resource)
            .fetch(&url, self.settings.cache_mode)
            .await
            .map_err(|err| {
                forum_warn!("Fetching {} failed: {}", url, err);
                err
            })?;

        let builder = match &self.audit {
            Some(audit) => PageBuilder::with_audit(audit),
            None => PageBuilder::new(),
        };
        let built = builder
            .build(&fetched.html, resource.kind().into(), &self.settings.site)
            .map_err(|source| CrawlError::Build {
                url: url.clone(),
                source,
            })?;

        forum_info!(
            "Crawled {} page {} ({} entries)",
            resource,
            index,
            built.content.len()
        );
        Ok(CrawledPage {
            index,
            url,
            content: built.content,
            anomalies: built.anomalies,
        })
    }

    fn fetcher_for(&self, resource: &Resource) -> Arc<dyn PageFetcher> {
        match &self.settings.cache_dir {
            Some(dir) => Arc::new(CachingFetcher::new(
                Arc::clone(&self.fetcher),
                dir.join(resource.namespace()),
            )),
            None => Arc::clone(&self.fetcher),
        }
    }
}
