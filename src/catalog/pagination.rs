use crate::prelude::*;


/// Identifies one issued page fetch. Results are only accepted if the
/// generation still matches when they arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FetchTicket {
    /// Cache generation the fetch was issued in. Bumped on every full reset.
    pub(crate) generation: u64,
    pub(crate) page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageState {
    /// Ready to fetch `Pagination::page`.
    Idle,

    /// A fetch is outstanding. Note that the ticket might belong to an older
    /// generation if a reset happened in the meantime.
    Fetching(FetchTicket),

    /// The last page has been fetched. Only a successful reset leaves this
    /// state.
    Exhausted,
}

/// What a completed fetch means for the page cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    /// The result belongs to an older generation and must be discarded.
    Stale,

    /// A full page arrived, the cursor moved to the next page.
    More,

    /// A short page arrived, there is nothing more to fetch.
    Exhausted,
}

/// Page cursor over the remote collection.
#[derive(Debug)]
pub(crate) struct Pagination {
    page_size: u32,
    page: u32,
    generation: u64,
    state: PageState,

    /// `Some` while a reset waits for the first page of the new generation.
    /// Until then `page` still points into the old generation. The flag says
    /// whether the old generation was exhausted.
    pending_reset: Option<bool>,
}

impl Pagination {
    pub(crate) fn new(page_size: u32) -> Self {
        assert!(page_size > 0, "page size must be positive");
        Self {
            page_size,
            page: 1,
            generation: 0,
            state: PageState::Idle,
            pending_reset: None,
        }
    }

    pub(crate) fn page(&self) -> u32 {
        self.page
    }

    pub(crate) fn page_size(&self) -> u32 {
        self.page_size
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn state(&self) -> PageState {
        self.state
    }

    pub(crate) fn is_fetching(&self) -> bool {
        matches!(self.state, PageState::Fetching(_))
    }

    pub(crate) fn has_more(&self) -> bool {
        self.state != PageState::Exhausted
    }

    /// Whether the next successful fetch starts the new generation, i.e.
    /// replaces everything fetched so far.
    pub(crate) fn is_reset_pending(&self) -> bool {
        self.pending_reset.is_some()
    }

    /// Tries to start fetching the current page. Returns `None` if a fetch is
    /// already outstanding or if the collection is exhausted; neither is an
    /// error.
    pub(crate) fn request(&mut self) -> Option<FetchTicket> {
        match self.state {
            PageState::Idle => {
                let page = if self.is_reset_pending() { 1 } else { self.page };
                let ticket = FetchTicket { generation: self.generation, page };
                self.state = PageState::Fetching(ticket);
                trace!("Requesting page {} (generation {})", ticket.page, ticket.generation);
                Some(ticket)
            }
            PageState::Fetching(_) | PageState::Exhausted => None,
        }
    }

    /// Records the successful completion of `ticket` which returned `count`
    /// records.
    pub(crate) fn complete(&mut self, ticket: FetchTicket, count: usize) -> Advance {
        debug_assert_eq!(self.state, PageState::Fetching(ticket));

        if ticket.generation != self.generation {
            self.state = PageState::Idle;
            return Advance::Stale;
        }

        if self.pending_reset.take().is_some() {
            self.page = 1;
        }
        if count >= self.page_size as usize {
            self.page += 1;
            self.state = PageState::Idle;
            Advance::More
        } else {
            self.state = PageState::Exhausted;
            Advance::Exhausted
        }
    }

    /// Records a failed fetch. The cursor stays where it is so that the same
    /// page is requested again next time. A pending reset is abandoned and
    /// the cursor is left exactly as it was before the reset. Returns `false`
    /// if the ticket was stale.
    pub(crate) fn fail(&mut self, ticket: FetchTicket) -> bool {
        debug_assert_eq!(self.state, PageState::Fetching(ticket));
        self.state = PageState::Idle;
        if ticket.generation != self.generation {
            return false;
        }

        if self.pending_reset.take() == Some(true) {
            self.state = PageState::Exhausted;
        }
        true
    }

    /// Starts a new generation. The next requested ticket is for page 1, but
    /// the cursor only moves there once that fetch succeeds. An outstanding
    /// fetch stays outstanding, but its result will be [`Advance::Stale`].
    pub(crate) fn reset(&mut self) {
        self.generation += 1;
        if self.pending_reset.is_none() {
            self.pending_reset = Some(self.state == PageState::Exhausted);
        }
        if self.state == PageState::Exhausted {
            self.state = PageState::Idle;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{Advance, PageState, Pagination};

    #[test]
    fn initial_state() {
        let p = Pagination::new(10);
        assert_eq!(p.state(), PageState::Idle);
        assert_eq!(p.page(), 1);
        assert!(p.has_more());
        assert!(!p.is_fetching());
    }

    #[test]
    fn full_pages_advance() {
        let mut p = Pagination::new(10);
        let ticket = p.request().unwrap();
        assert_eq!(ticket.page, 1);
        assert!(p.is_fetching());
        assert_eq!(p.complete(ticket, 10), Advance::More);
        assert_eq!(p.page(), 2);
        assert_eq!(p.state(), PageState::Idle);

        let ticket = p.request().unwrap();
        assert_eq!(ticket.page, 2);
    }

    #[test]
    fn no_second_request_while_fetching() {
        let mut p = Pagination::new(10);
        let ticket = p.request().unwrap();
        assert_eq!(p.request(), None);
        assert_eq!(p.request(), None);
        assert_eq!(p.state(), PageState::Fetching(ticket));
    }

    #[test]
    fn short_page_exhausts_until_reset() {
        let mut p = Pagination::new(10);
        let ticket = p.request().unwrap();
        p.complete(ticket, 10);
        let ticket = p.request().unwrap();
        assert_eq!(p.complete(ticket, 4), Advance::Exhausted);
        assert!(!p.has_more());
        assert_eq!(p.request(), None);
        assert_eq!(p.request(), None);

        p.reset();
        assert!(p.has_more());
        assert!(p.is_reset_pending());
        let ticket = p.request().unwrap();
        assert_eq!(ticket.page, 1);
        assert_eq!(p.complete(ticket, 10), Advance::More);
        assert!(!p.is_reset_pending());
        assert_eq!(p.page(), 2);
    }

    #[test]
    fn empty_first_page_exhausts() {
        let mut p = Pagination::new(3);
        let ticket = p.request().unwrap();
        assert_eq!(p.complete(ticket, 0), Advance::Exhausted);
        assert_eq!(p.page(), 1);
    }

    #[test]
    fn failure_keeps_cursor() {
        let mut p = Pagination::new(5);
        let ticket = p.request().unwrap();
        p.complete(ticket, 5);
        let ticket = p.request().unwrap();
        assert!(p.fail(ticket));
        assert_eq!(p.state(), PageState::Idle);
        assert_eq!(p.page(), 2);
        assert_eq!(p.request().map(|t| t.page), Some(2));
    }

    #[test]
    fn reset_while_fetching_makes_result_stale() {
        let mut p = Pagination::new(5);
        let ticket = p.request().unwrap();
        p.complete(ticket, 5);
        let old = p.request().unwrap();
        assert_eq!(old.page, 2);

        p.reset();
        assert_eq!(p.generation(), 1);
        assert!(p.is_fetching(), "outstanding fetch must still block new ones");
        assert_eq!(p.request(), None);

        assert_eq!(p.complete(old, 5), Advance::Stale);
        assert!(p.is_reset_pending());
        let fresh = p.request().unwrap();
        assert_eq!((fresh.generation, fresh.page), (1, 1));
    }

    #[test]
    fn stale_failure() {
        let mut p = Pagination::new(5);
        let old = p.request().unwrap();
        p.reset();
        assert!(!p.fail(old));
        assert_eq!(p.state(), PageState::Idle);
    }

    #[test]
    fn failed_reset_restores_cursor() {
        let mut p = Pagination::new(5);
        let ticket = p.request().unwrap();
        p.complete(ticket, 5);
        let ticket = p.request().unwrap();
        p.complete(ticket, 2);
        assert_eq!(p.state(), PageState::Exhausted);

        p.reset();
        let ticket = p.request().unwrap();
        assert_eq!(ticket.page, 1);
        assert!(p.fail(ticket));
        assert_eq!(p.state(), PageState::Exhausted);
        assert_eq!(p.page(), 2);
        assert!(!p.is_reset_pending());
        assert_eq!(p.request(), None);
    }
}
