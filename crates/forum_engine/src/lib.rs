//! Forum engine: markup normalization, page building and the paginated crawl.
mod audit;
mod cache;
mod crawler;
mod decode;
mod discovery;
mod fetch;
mod normalize;
mod page;
mod persist;
mod reconstruct;
mod topics;
mod types;

pub use audit::{CommentAudit, FileCommentAudit};
pub use cache::{cache_file_name, CachingFetcher};
pub use crawler::{CrawlSettings, CrawledPage, Crawler};
pub use decode::{decode_html, DecodedHtml};
pub use discovery::{embedded_page_count, probe_page_count};
pub use fetch::{FetchSettings, PageFetcher, ReqwestPageFetcher};
pub use normalize::{normalize_cell, normalize_fragment};
pub use page::{BuiltPage, PageBuilder, PageContent, RecordMode};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use reconstruct::{reconstruct, reconstruct_fragment};
pub use topics::parse_topics;
pub use types::{BuildError, CacheMode, CrawlError, FailureKind, FetchError, FetchedPage};
