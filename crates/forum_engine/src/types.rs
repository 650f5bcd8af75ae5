use std::fmt;

use forum_core::Resource;

use crate::persist::PersistError;

/// How a fetch interacts with the on-disk page cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Always download, then overwrite the stored copy.
    #[default]
    Refresh,
    /// Return the stored copy when there is one; download and store otherwise.
    Reuse,
    /// Neither read nor write the cache.
    Bypass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub html: String,
    pub from_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// The page is not shaped like a forum listing at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("no {0} table in page")]
    MissingTable(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("{resource} does not exist ({url})")]
    ResourceNotFound { resource: Resource, url: String },
    #[error("page count marker for {resource} not found in {url}")]
    MaxPageNotFound { resource: Resource, url: String },
    #[error("could not read {url}: {source}")]
    Build {
        url: String,
        #[source]
        source: BuildError,
    },
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}
