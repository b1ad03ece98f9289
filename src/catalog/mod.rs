//! The catalog controller: owns the records fetched so far, the page cursor
//! and the active filter, and decides when to talk to the lecture source.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    model::{Course, LectureRecord},
    prelude::*,
    source::{LectureSource, NewLecture, SourceResult},
};
use self::refresh::{RefreshCoordinator, Settled, Trigger};

mod cache;
mod filter;
mod pagination;
mod refresh;


pub(crate) use self::{
    filter::FilterCriteria,
    refresh::FetchOutcome,
};


#[derive(Debug, confique::Config)]
pub(crate) struct CatalogConfig {
    /// Number of lectures requested from the lecture source at once. Must be
    /// at least 1.
    #[config(default = 12)]
    pub(crate) page_size: u32,

    /// If a newly set filter leaves fewer than one page worth of visible
    /// lectures while more pages are available, automatically fetch one more
    /// page.
    #[config(default = true)]
    pub(crate) prefetch_sparse_results: bool,
}

/// One catalog view. Create one per consumer; nothing is shared between
/// instances.
///
/// All operations take `&self`. Fetches are serialized internally: while one
/// is in flight, further `refresh` and `load_more` calls return
/// [`FetchOutcome::Dropped`] immediately.
pub(crate) struct Catalog<S> {
    source: S,
    prefetch_sparse_results: bool,
    state: Mutex<State>,
}

struct State {
    coordinator: RefreshCoordinator,
    criteria: FilterCriteria,
}

impl<S: LectureSource> Catalog<S> {
    pub(crate) fn new(source: S, config: &CatalogConfig) -> Self {
        Self {
            source,
            prefetch_sparse_results: config.prefetch_sparse_results,
            state: Mutex::new(State {
                coordinator: RefreshCoordinator::new(config.page_size),
                criteria: FilterCriteria::default(),
            }),
        }
    }

    /// Fetches the first page again and replaces all known records with it.
    /// If that fetch fails, the known records and the page cursor stay as
    /// they are. This is also how the initial load is triggered.
    pub(crate) async fn refresh(&self) -> FetchOutcome {
        self.run(Trigger::Refresh).await
    }

    /// Fetches the next page, e.g. when the user scrolled near the end.
    pub(crate) async fn load_more(&self) -> FetchOutcome {
        self.run(Trigger::LoadMore).await
    }

    /// Must be called after a record was created successfully. As the new
    /// record can end up anywhere in the ranking, the catalog starts over
    /// from page 1 instead of appending it.
    pub(crate) async fn on_record_created(&self) -> FetchOutcome {
        self.run(Trigger::RecordCreated).await
    }

    /// Creates a new record in the lecture source and refreshes the catalog
    /// on success. Creation errors are returned and leave the catalog as is.
    pub(crate) async fn create_record(&self, record: &NewLecture) -> SourceResult<FetchOutcome> {
        self.source.create_record(record).await?;
        Ok(self.on_record_created().await)
    }

    /// Replaces the active filter. Never refetches anything, except for a
    /// single extra page if the filter leaves less than a page of visible
    /// records while more are available. In that case, the outcome of that
    /// fetch is returned.
    pub(crate) async fn set_filter(&self, criteria: FilterCriteria) -> Option<FetchOutcome> {
        if let Some(course) = criteria.course.as_deref().filter(|c| Course::find(c).is_none()) {
            warn!("Filtering by unknown course '{course}': no lectures will match");
        }

        let sparse = {
            let mut state = self.lock();
            state.criteria = criteria;
            let visible = filter::apply(state.coordinator.cache.all(), &state.criteria).len();
            let pagination = &state.coordinator.pagination;
            trace!("Filter '{}' leaves {visible} visible lectures", state.criteria);

            visible < pagination.page_size() as usize
                && pagination.has_more()
                && !pagination.is_fetching()
        };

        if sparse && self.prefetch_sparse_results {
            debug!("Few lectures visible with the new filter: fetching one more page");
            Some(self.load_more().await)
        } else {
            None
        }
    }

    pub(crate) fn criteria(&self) -> FilterCriteria {
        self.lock().criteria.clone()
    }

    /// All cached records matching the active filter, in rank order.
    pub(crate) fn visible_records(&self) -> Vec<LectureRecord> {
        let state = self.lock();
        filter::apply(state.coordinator.cache.all(), &state.criteria)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Number of cached records, ignoring the filter.
    pub(crate) fn cached_len(&self) -> usize {
        self.lock().coordinator.cache.len()
    }

    /// The page that `load_more` would fetch next.
    pub(crate) fn next_page(&self) -> u32 {
        self.lock().coordinator.pagination.page()
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.lock().coordinator.is_loading()
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        self.lock().coordinator.is_refreshing()
    }

    pub(crate) fn has_more(&self) -> bool {
        self.lock().coordinator.pagination.has_more()
    }

    /// Message of the last failed fetch. Cleared when the next fetch starts.
    pub(crate) fn error(&self) -> Option<String> {
        self.lock().coordinator.error().map(ToOwned::to_owned)
    }

    async fn run(&self, trigger: Trigger) -> FetchOutcome {
        let (mut ticket, page_size) = {
            let mut state = self.lock();
            match state.coordinator.begin(trigger) {
                Ok(ticket) => (ticket, state.coordinator.pagination.page_size()),
                Err(outcome) => return outcome,
            }
        };

        // The lock is never held while waiting for the source. Other triggers
        // in the meantime see the outstanding fetch and back off.
        loop {
            let result = self.source.fetch_page(ticket.page, page_size).await;
            match self.lock().coordinator.settle(ticket, result) {
                Settled::Done(outcome) => return outcome,
                Settled::Reissue(next) => ticket = next,
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // The state is consistent after every critical section, so a panic in
        // another one does not leave it broken.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
