use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use forum_core::{SiteConfig, DEFAULT_SITE};
use forum_engine::{CacheMode, CrawlSettings, FetchSettings};
use forum_logging::{LevelFilter, LogDestination};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when no `--config` is given.
pub(crate) const DEFAULT_CONFIG_FILENAME: &str = "forum_harvest.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub(crate) enum CacheSetting {
    #[default]
    Refresh,
    Reuse,
    Bypass,
}

impl From<CacheSetting> for CacheMode {
    fn from(setting: CacheSetting) -> Self {
        match setting {
            CacheSetting::Refresh => CacheMode::Refresh,
            CacheSetting::Reuse => CacheMode::Reuse,
            CacheSetting::Bypass => CacheMode::Bypass,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub site_url: String,
    pub cache_dir: Option<PathBuf>,
    pub cache_mode: CacheSetting,
    pub audit_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_to_terminal: bool,
    pub log_level: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_probe_pages: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let crawl = CrawlSettings::default();
        let fetch = FetchSettings::default();
        Self {
            site_url: DEFAULT_SITE.to_string(),
            cache_dir: Some(PathBuf::from("page_rips")),
            cache_mode: CacheSetting::default(),
            audit_path: None,
            log_file: None,
            log_to_terminal: true,
            log_level: "info".to_string(),
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            max_probe_pages: crawl.max_probe_pages,
        }
    }
}

impl AppConfig {
    /// Read `path`, or the default file when present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
        };

        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };

        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn log_destination(&self) -> LogDestination {
        match (&self.log_file, self.log_to_terminal) {
            (Some(path), true) => LogDestination::Both(path.clone()),
            (Some(path), false) => LogDestination::File(path.clone()),
            (None, _) => LogDestination::Terminal,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..FetchSettings::default()
        }
    }

    pub fn crawl_settings(&self) -> anyhow::Result<CrawlSettings> {
        let site = SiteConfig::new(&self.site_url)
            .with_context(|| format!("invalid site url {:?}", self.site_url))?;
        Ok(CrawlSettings {
            site,
            cache_dir: self.cache_dir.clone(),
            cache_mode: self.cache_mode.into(),
            audit_path: self.audit_path.clone(),
            max_probe_pages: self.max_probe_pages,
        })
    }
}
