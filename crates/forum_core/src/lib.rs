//! Forum core: pure data model, crawl frontier state machine and registry helpers.
mod frontier;
mod record;
mod registry;
mod resource;

pub use frontier::{CrawlFrontier, FrontierState, StopBound};
pub use record::{
    PageRecord, ParsedComment, Quotes, StructuralAnomaly, TopicComment, TopicSummary,
    ANONYMOUS_AUTHOR, NOBODY, ROW_SUFFIX_SEPARATOR,
};
pub use registry::{
    all_commenters, commenter_activity, ranked_by_value, strip_row_suffix, title_word_count,
    unique_commenters, FrequencyTable,
};
pub use resource::{
    CountMarker, DiscoveryStrategy, Resource, ResourceKind, SiteConfig, DEFAULT_SITE,
};
