//! Serializes everything that causes a page fetch: the initial load, manual
//! refreshes, "load more" requests and the refresh after a record was
//! created. At most one fetch is outstanding at any time.

use crate::{
    model::LectureRecord,
    prelude::*,
    source::{SourceError, SourceResult},
};
use super::{
    cache::CatalogCache,
    pagination::{Advance, FetchTicket, PageState, Pagination},
};


/// The event that wants a fetch to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    /// Initial load or explicit user refresh. Starts over at page 1.
    Refresh,

    /// Fetch the next page into the current cache generation.
    LoadMore,

    /// A record was created. Like `Refresh`, but never dropped: if a fetch is
    /// in flight, that fetch starts over at page 1 once it resolves.
    RecordCreated,
}

/// Result of a trigger, as seen by whoever triggered.
#[derive(Debug)]
pub(crate) enum FetchOutcome {
    /// A page was fetched and ingested.
    Ingested {
        page: u32,
        added: usize,
        exhausted: bool,
    },

    /// Another fetch was in flight, so this trigger was ignored.
    Dropped,

    /// The in-flight fetch was invalidated and will reload page 1 instead.
    Rescheduled,

    /// Everything has been fetched already.
    Exhausted,

    /// The fetch failed. The error is also available via `Catalog::error`.
    Failed(SourceError),
}

/// What to do after a fetch has resolved.
pub(super) enum Settled {
    Done(FetchOutcome),

    /// The result was stale and discarded. The caller has to fetch this
    /// ticket next.
    Reissue(FetchTicket),
}

pub(super) struct RefreshCoordinator {
    pub(super) cache: CatalogCache,
    pub(super) pagination: Pagination,
    error: Option<String>,
    succeeded_once: bool,
}

impl RefreshCoordinator {
    pub(super) fn new(page_size: u32) -> Self {
        Self {
            cache: CatalogCache::new(),
            pagination: Pagination::new(page_size),
            error: None,
            succeeded_once: false,
        }
    }

    /// `true` while the very first fetch of this catalog is outstanding.
    pub(super) fn is_loading(&self) -> bool {
        self.pagination.is_fetching() && !self.succeeded_once
    }

    /// `true` while any later fetch is outstanding.
    pub(super) fn is_refreshing(&self) -> bool {
        self.pagination.is_fetching() && self.succeeded_once
    }

    pub(super) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Decides whether `trigger` results in a fetch. If so, the returned
    /// ticket has to be fetched and passed to [`Self::settle`].
    pub(super) fn begin(&mut self, trigger: Trigger) -> Result<FetchTicket, FetchOutcome> {
        if let PageState::Fetching(outstanding) = self.pagination.state() {
            if trigger == Trigger::RecordCreated {
                debug!(
                    "Record created while page {} is being fetched: starting over",
                    outstanding.page,
                );
                self.invalidate();
                return Err(FetchOutcome::Rescheduled);
            }

            trace!("Ignoring {trigger:?}: page {} is already being fetched", outstanding.page);
            return Err(FetchOutcome::Dropped);
        }

        if matches!(trigger, Trigger::Refresh | Trigger::RecordCreated) {
            self.invalidate();
        }

        match self.pagination.request() {
            Some(ticket) => {
                self.error = None;
                debug!("Fetching page {} ({trigger:?})", ticket.page);
                Ok(ticket)
            }
            None => {
                trace!("Ignoring {trigger:?}: all pages fetched");
                Err(FetchOutcome::Exhausted)
            }
        }
    }

    /// Applies the result of fetching `ticket`. Failed pages are never
    /// partially ingested, and a failed first page of a reset leaves the
    /// previous records in place.
    pub(super) fn settle(
        &mut self,
        ticket: FetchTicket,
        result: SourceResult<Vec<LectureRecord>>,
    ) -> Settled {
        match result {
            Ok(records) => {
                let replaces_cache = self.pagination.is_reset_pending();
                match self.pagination.complete(ticket, records.len()) {
                    Advance::Stale => {
                        debug!("Discarding stale page {} ({} records)", ticket.page, records.len());
                        Settled::Reissue(self.reissue())
                    }
                    advance => {
                        if replaces_cache {
                            self.cache.reset();
                            debug!("Started cache generation {}", self.pagination.generation());
                        }
                        Settled::Done(self.ingest(ticket, records, advance))
                    }
                }
            }
            Err(e) => {
                if !self.pagination.fail(ticket) {
                    debug!("Ignoring failure of stale fetch for page {}: {e}", ticket.page);
                    return Settled::Reissue(self.reissue());
                }

                warn!("Fetching page {} of lectures failed: {e}", ticket.page);
                self.error = Some(e.to_string());
                Settled::Done(FetchOutcome::Failed(e))
            }
        }
    }

    fn ingest(&mut self, ticket: FetchTicket, records: Vec<LectureRecord>, advance: Advance) -> FetchOutcome {
        let fetched = records.len();
        let added = self.cache.ingest(records);
        self.succeeded_once = true;
        if added < fetched {
            debug!("Page {} contained {} already known records", ticket.page, fetched - added);
        }
        let exhausted = advance == Advance::Exhausted;
        if exhausted {
            debug!("Reached end of lecture collection ({} records)", self.cache.len());
        }

        FetchOutcome::Ingested { page: ticket.page, added, exhausted }
    }

    /// Makes any outstanding fetch stale and lets the next one start over at
    /// page 1. The cache is only replaced once that page has arrived.
    fn invalidate(&mut self) {
        self.pagination.reset();
        trace!("Pending reset to generation {}", self.pagination.generation());
    }

    fn reissue(&mut self) -> FetchTicket {
        self.error = None;
        self.pagination.request()
            .expect("bug: pagination not idle after settling a stale fetch")
    }
}
