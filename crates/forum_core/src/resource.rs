use std::fmt;

use url::Url;

pub const DEFAULT_SITE: &str = "https://www.nairaland.com";

/// Root of the forum every user, section and topic URL is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    base_url: Url,
}

impl SiteConfig {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(base_url.trim())?,
        })
    }

    /// Base URL without a trailing slash.
    pub fn root(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Resolve a site-relative link such as `/1234/some-topic`.
    pub fn absolute(&self, href: &str) -> String {
        match self.base_url.join(href.trim()) {
            Ok(url) => url.into(),
            Err(_) => format!("{}{}", self.root(), href.trim()),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_SITE).expect("default site url is valid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Post,
    UserHistory,
    Section,
}

impl ResourceKind {
    /// Cache sub-directory owned by resources of this kind.
    pub fn namespace(self) -> &'static str {
        match self {
            ResourceKind::Post => "page_rips_post",
            ResourceKind::UserHistory => "page_rips_user",
            ResourceKind::Section => "page_rips_section",
        }
    }
}

/// Textual marker that carries a page count inside page 0 of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMarker {
    /// A bolded integer, `<b>12</b>`, searched in the raw markup.
    BoldCount,
    /// A parenthetical `(of 12 pages)`, searched in the visible text.
    OfPages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// Probe `{pages_url}/{i}` for i = 0, 1, ... until the first miss.
    LinearProbe,
    /// Fetch page 0 and read the count next to a marker.
    EmbeddedCount(CountMarker),
}

/// Top-level crawl target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// A topic thread, identified by the URL of its page 0.
    Post(String),
    /// The comment history of a user.
    UserHistory(String),
    /// A forum section, e.g. `politics`.
    Section(String),
}

impl Resource {
    pub fn post(url: impl Into<String>) -> Self {
        Resource::Post(url.into().trim().trim_end_matches('/').to_string())
    }

    pub fn user(username: impl Into<String>) -> Self {
        Resource::UserHistory(username.into().trim().to_lowercase())
    }

    pub fn section(name: impl Into<String>) -> Self {
        Resource::Section(name.into().trim().trim_matches('/').to_string())
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Post(_) => ResourceKind::Post,
            Resource::UserHistory(_) => ResourceKind::UserHistory,
            Resource::Section(_) => ResourceKind::Section,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.kind().namespace()
    }

    pub fn discovery(&self) -> DiscoveryStrategy {
        match self {
            Resource::Post(_) => DiscoveryStrategy::LinearProbe,
            Resource::UserHistory(_) => DiscoveryStrategy::EmbeddedCount(CountMarker::BoldCount),
            Resource::Section(_) => DiscoveryStrategy::EmbeddedCount(CountMarker::OfPages),
        }
    }

    /// URL probed to decide whether the resource exists at all.
    pub fn landing_url(&self, site: &SiteConfig) -> String {
        match self {
            Resource::Post(url) => url.clone(),
            Resource::UserHistory(name) => format!("{}/{}", site.root(), name),
            Resource::Section(name) => format!("{}/{}", site.root(), name),
        }
    }

    /// URL that numbered pages are appended to.
    pub fn pages_url(&self, site: &SiteConfig) -> String {
        match self {
            Resource::UserHistory(name) => format!("{}/{}/posts", site.root(), name),
            _ => self.landing_url(site),
        }
    }

    pub fn page_url(&self, site: &SiteConfig, index: u32) -> String {
        format!("{}/{}", self.pages_url(site), index)
    }

    /// Last path segment of a post URL; the name for users and sections.
    pub fn title(&self) -> &str {
        match self {
            Resource::Post(url) => url.rsplit('/').next().unwrap_or(url),
            Resource::UserHistory(name) | Resource::Section(name) => name,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Post(url) => write!(f, "post {url}"),
            Resource::UserHistory(name) => write!(f, "user {name}"),
            Resource::Section(name) => write!(f, "section {name}"),
        }
    }
}
