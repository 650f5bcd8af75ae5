use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use forum_logging::{forum_debug, forum_warn};
use sha2::{Digest, Sha256};

use crate::persist::AtomicFileWriter;
use crate::{CacheMode, FetchError, FetchedPage, PageFetcher};

/// Deterministic cache file name for a page URL: `{sha256 prefix}.html`.
pub fn cache_file_name(url: &str) -> String {
    let digest = Sha256::digest(url.trim().as_bytes());
    let mut name = String::with_capacity(21);
    for byte in digest.iter().take(8) {
        let _ = write!(&mut name, "{byte:02x}");
    }
    name.push_str(".html");
    name
}

/// Page cache in front of another fetcher, rooted at one resource namespace.
///
/// Cache read and write failures degrade to a plain fetch; they are logged,
/// never returned.
pub struct CachingFetcher {
    inner: Arc<dyn PageFetcher>,
    writer: AtomicFileWriter,
}

impl CachingFetcher {
    pub fn new(inner: Arc<dyn PageFetcher>, dir: PathBuf) -> Self {
        Self {
            inner,
            writer: AtomicFileWriter::new(dir),
        }
    }

    fn cached_path(&self, url: &str) -> PathBuf {
        self.writer.dir().join(cache_file_name(url))
    }

    fn read_cached(&self, url: &str) -> Option<FetchedPage> {
        let path = self.cached_path(url);
        match fs::read_to_string(&path) {
            Ok(html) => {
                forum_debug!("Cache hit for {} at {:?}", url, path);
                Some(FetchedPage {
                    original_url: url.to_string(),
                    final_url: url.to_string(),
                    content_type: None,
                    html,
                    from_cache: true,
                })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                forum_warn!("Ignoring unreadable cache entry {:?}: {}", path, err);
                None
            }
        }
    }

    fn store(&self, url: &str, page: &FetchedPage) {
        if let Err(err) = self.writer.write(&cache_file_name(url), &page.html) {
            forum_warn!("Failed to cache {}: {}", url, err);
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher for CachingFetcher {
    async fn fetch(&self, url: &str, cache: CacheMode) -> Result<FetchedPage, FetchError> {
        if cache == CacheMode::Reuse {
            if let Some(page) = self.read_cached(url) {
                return Ok(page);
            }
        }
        let page = self.inner.fetch(url, cache).await?;
        if cache != CacheMode::Bypass {
            self.store(url, &page);
        }
        Ok(page)
    }

    async fn exists(&self, url: &str) -> Result<bool, FetchError> {
        self.inner.exists(url).await
    }
}
