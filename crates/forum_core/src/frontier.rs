use crate::Resource;

/// Upper bound requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBound {
    /// Inclusive zero-based index of the last page.
    At(u32),
    /// Every page; the bound is discovered before the first fetch.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierState {
    Unresolved,
    Resolving,
    /// `last` is the inclusive stop index, `None` when the resource has no pages.
    Resolved { last: Option<u32> },
    /// The page count could not be discovered. Terminal.
    Failed,
}

/// Pure page-index bookkeeping for one crawl of one resource.
///
/// Indices are handed out once, in ascending order, and never rewound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlFrontier {
    resource: Resource,
    start: u32,
    stop: StopBound,
    state: FrontierState,
    next: u32,
}

impl CrawlFrontier {
    pub fn new(resource: Resource, start: u32, stop: StopBound) -> Self {
        let state = match stop {
            StopBound::At(last) => FrontierState::Resolved { last: Some(last) },
            StopBound::All => FrontierState::Unresolved,
        };
        Self {
            resource,
            start,
            stop,
            state,
            next: start,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn stop(&self) -> StopBound {
        self.stop
    }

    pub fn state(&self) -> FrontierState {
        self.state
    }

    pub fn needs_discovery(&self) -> bool {
        self.state == FrontierState::Unresolved
    }

    pub fn begin_resolving(&mut self) {
        if self.state == FrontierState::Unresolved {
            self.state = FrontierState::Resolving;
        }
    }

    /// Fix the stop index from a discovered page count: `stop = count - 1`.
    pub fn resolve(&mut self, discovered_count: u32) {
        if matches!(
            self.state,
            FrontierState::Unresolved | FrontierState::Resolving
        ) {
            self.state = FrontierState::Resolved {
                last: discovered_count.checked_sub(1),
            };
        }
    }

    pub fn fail(&mut self) {
        if !matches!(self.state, FrontierState::Resolved { .. }) {
            self.state = FrontierState::Failed;
        }
    }

    /// Inclusive stop index once resolved.
    pub fn last_index(&self) -> Option<u32> {
        match self.state {
            FrontierState::Resolved { last } => last,
            _ => None,
        }
    }

    /// Hand out the next page index, or `None` once the range is exhausted or
    /// the frontier is not resolved.
    pub fn next_index(&mut self) -> Option<u32> {
        let last = self.last_index()?;
        if self.next > last {
            return None;
        }
        let index = self.next;
        // Saturate so `last == u32::MAX` cannot wrap back to zero.
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => self.state = FrontierState::Resolved { last: None },
        }
        Some(index)
    }

    /// Number of indices not yet handed out.
    pub fn remaining(&self) -> u64 {
        match self.last_index() {
            Some(last) if self.next <= last => u64::from(last - self.next) + 1,
            _ => 0,
        }
    }
}
