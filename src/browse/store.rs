use super::hydrate::{apply_thumbnails, fetch_thumbnails, page_ids, page_needs_hydration};
use super::pagination::{PagerButton, Paginator};
use super::search::SearchResult;
use super::tasks::Sequencer;
use crate::api::client::MediaApi;
use bytes::Bytes;

/// Thumbnail work for the page that was visible when it was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationTicket {
    pub seq: u64,
    pub page: usize,
    pub ids: Vec<Option<u64>>,
}

/// Paged view over the current result set.
///
/// Owns the results, the page cursor, the item open in the viewer and the
/// bookkeeping that makes thumbnail hydration happen once per page becoming
/// visible. Only the visible page is ever hydrated; issuing a ticket for a
/// new page makes any older ticket stale.
#[derive(Debug)]
pub struct ResultStore {
    pages: Paginator<SearchResult>,
    open_item: Option<usize>,
    hydration: Sequencer,
    in_flight: Option<(u64, usize)>,
}

impl ResultStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            pages: Paginator::new(page_size),
            open_item: None,
            hydration: Sequencer::default(),
            in_flight: None,
        }
    }

    pub fn page(&self) -> &[SearchResult] {
        self.pages.page()
    }

    pub fn results(&self) -> &[SearchResult] {
        self.pages.items()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn current_page(&self) -> usize {
        self.pages.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.pages.total_pages()
    }

    pub fn page_size(&self) -> usize {
        self.pages.page_size()
    }

    /// Bumped whenever the visible page changes shape or content
    pub fn generation(&self) -> u64 {
        self.pages.generation()
    }

    pub fn pager(&self) -> Vec<PagerButton> {
        self.pages.pager()
    }

    pub fn set_page(&mut self, page: usize) -> usize {
        self.pages.set_page(page)
    }

    pub fn next_page(&mut self) -> bool {
        self.pages.next_page()
    }

    pub fn prev_page(&mut self) -> bool {
        self.pages.prev_page()
    }

    /// Mutate entries of the visible page without reshaping the set
    pub fn update_page<F>(&mut self, f: F)
    where
        F: FnOnce(&mut [SearchResult]),
    {
        self.pages.update_page(f);
    }

    /// Swap in a new result set: back to page 1, viewer closed, pending
    /// thumbnail work for the old set discarded.
    pub fn reset(&mut self, results: Vec<SearchResult>) {
        tracing::debug!(count = results.len(), "result set replaced");
        self.pages.reset(results);
        self.open_item = None;
        self.hydration.invalidate();
        self.in_flight = None;
    }

    /// Open an entry of the visible page in the viewer
    pub fn open(&mut self, index_in_page: usize) -> Option<&SearchResult> {
        let range = self.pages.page_range();
        if index_in_page >= range.len() {
            return None;
        }
        let index = range.start + index_in_page;
        self.open_item = Some(index);
        self.pages.items().get(index)
    }

    pub fn close(&mut self) {
        self.open_item = None;
    }

    pub fn open_item(&self) -> Option<&SearchResult> {
        self.open_item.and_then(|i| self.pages.items().get(i))
    }

    /// Ticket for hydrating the visible page, if it needs one and no fetch
    /// for this page is already running.
    pub fn begin_hydration(&mut self) -> Option<HydrationTicket> {
        let page = self.pages.current_page();
        if let Some((seq, in_flight_page)) = self.in_flight {
            if in_flight_page == page && self.hydration.is_latest(seq) {
                return None;
            }
        }
        if !page_needs_hydration(self.pages.page()) {
            return None;
        }

        let seq = self.hydration.issue();
        self.in_flight = Some((seq, page));
        Some(HydrationTicket {
            seq,
            page,
            ids: page_ids(self.pages.page()),
        })
    }

    /// Store thumbnails fetched for a ticket. Returns `false` and drops them
    /// when the ticket is stale or the user has moved to another page.
    pub fn complete_hydration(&mut self, ticket: &HydrationTicket, thumbnails: Vec<Option<Bytes>>) -> bool {
        if !self.hydration.is_latest(ticket.seq) {
            tracing::debug!(seq = ticket.seq, "stale thumbnails dropped");
            return false;
        }
        self.in_flight = None;
        if ticket.page != self.pages.current_page() || ticket.ids != page_ids(self.pages.page()) {
            tracing::debug!(page = ticket.page, "thumbnails for a page no longer visible dropped");
            return false;
        }

        self.pages.update_page(|page| apply_thumbnails(page, thumbnails));
        true
    }

    /// Fetch thumbnails for the visible page and store them. No-op when the
    /// page is already hydrated. Individual failures leave their slot unset.
    pub async fn hydrate_visible_page(&mut self, api: &dyn MediaApi) -> bool {
        let Some(ticket) = self.begin_hydration() else {
            return false;
        };
        let thumbnails = fetch_thumbnails(api, &ticket.ids).await;
        self.complete_hydration(&ticket, thumbnails)
    }
}
