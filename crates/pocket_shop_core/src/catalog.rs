//! crates/pocket_shop_core/src/catalog.rs
//!
//! Client-side incremental search and pagination over one fetched catalog snapshot.

use crate::domain::{CatalogItem, ProductId};
use crate::ports::{CatalogService, PortError, PortResult};
use tracing::{debug, info, warn};

/// Number of items materialized per page.
pub const PAGE_SIZE: usize = 12;

/// Where the snapshot is in its load lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// The last load failed; the previous snapshot is still in place.
    Failed(PortError),
}

/// Identifies one load attempt. Only the most recently issued ticket is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "pass the ticket to `finish_load` once the fetch completes"]
pub struct LoadTicket {
    generation: u64,
}

/// Owns an immutable catalog snapshot plus the transient query and page cursor.
#[derive(Debug)]
pub struct CatalogView {
    snapshot: Vec<CatalogItem>,
    query: String,
    page_count: usize,
    page_size: usize,
    advancing: bool,
    load_state: LoadState,
    load_generation: u64,
    scroll_epoch: u64,
}

impl Default for CatalogView {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogView {
    pub fn new() -> Self {
        Self::with_page_size(PAGE_SIZE)
    }

    /// A view with a custom page size (at least one).
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            snapshot: Vec::new(),
            query: String::new(),
            page_count: 1,
            page_size: page_size.max(1),
            advancing: false,
            load_state: LoadState::Idle,
            load_generation: 0,
            scroll_epoch: 0,
        }
    }

    //=====================================================================================
    // Loading
    //=====================================================================================

    /// Fetches the catalog once and applies the result.
    ///
    /// On failure the error is kept as [`LoadState::Failed`] and also returned;
    /// the caller retries by calling `load` again.
    pub async fn load(&mut self, fetcher: &dyn CatalogService) -> PortResult<usize> {
        let ticket = self.begin_load();
        let result = fetcher.fetch_catalog().await;
        let outcome = result.as_ref().map(Vec::len).map_err(PortError::clone);
        self.finish_load(ticket, result);
        outcome
    }

    /// Starts a load attempt, superseding any attempt still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        self.load_state = LoadState::Loading;
        LoadTicket {
            generation: self.load_generation,
        }
    }

    /// Applies the outcome of the attempt identified by `ticket`.
    ///
    /// Returns `false` when a newer attempt has started since; the stale result is dropped.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: PortResult<Vec<CatalogItem>>) -> bool {
        if ticket.generation != self.load_generation {
            debug!(
                "Discarding stale catalog response (generation {} superseded by {}).",
                ticket.generation, self.load_generation
            );
            return false;
        }

        match result {
            Ok(items) => {
                info!("Catalog loaded with {} items.", items.len());
                self.snapshot = items;
                self.load_state = LoadState::Ready;
            }
            Err(e) => {
                warn!("Catalog load failed: {}", e);
                self.load_state = LoadState::Failed(e);
            }
        }
        true
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    /// The raw snapshot, in fetch order.
    pub fn snapshot(&self) -> &[CatalogItem] {
        &self.snapshot
    }

    pub fn find(&self, id: ProductId) -> Option<&CatalogItem> {
        self.snapshot.iter().find(|item| item.id == id)
    }

    //=====================================================================================
    // Query and Pagination
    //=====================================================================================

    /// Replaces the query, rewinds to the first page, and asks the display to
    /// scroll to the top (see [`scroll_epoch`](Self::scroll_epoch)). A pending
    /// advance is cancelled.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.page_count = 1;
        self.advancing = false;
        self.scroll_epoch += 1;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Bumped on every query change. A display whose last rendered epoch differs
    /// scrolls back to the top.
    pub fn scroll_epoch(&self) -> u64 {
        self.scroll_epoch
    }

    /// Items whose title contains the trimmed query, case-insensitively, in
    /// snapshot order. An empty query matches everything.
    pub fn filtered_view(&self) -> Vec<&CatalogItem> {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return self.snapshot.iter().collect();
        }
        self.snapshot
            .iter()
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// How many filtered items the current page count exposes.
    pub fn visible_limit(&self) -> usize {
        self.page_count.saturating_mul(self.page_size)
    }

    /// The first `page_count × page_size` items of the filtered view.
    pub fn visible_slice(&self) -> Vec<&CatalogItem> {
        let mut filtered = self.filtered_view();
        filtered.truncate(self.visible_limit());
        filtered
    }

    /// Whether the filtered view extends past the visible slice.
    pub fn has_more(&self) -> bool {
        self.filtered_view().len() > self.visible_limit()
    }

    /// Nothing matches the current query (also true before the first load).
    pub fn is_empty_result(&self) -> bool {
        self.filtered_view().is_empty()
    }

    /// Materializes one more page. No-op once exhausted or while an advance is pending.
    ///
    /// Returns whether the page count changed.
    pub fn advance(&mut self) -> bool {
        if !self.begin_advance() {
            return false;
        }
        self.complete_advance();
        true
    }

    /// Marks an advance as in flight. Returns `false` (and changes nothing) when
    /// one is already pending or there is nothing more to show.
    pub fn begin_advance(&mut self) -> bool {
        if self.advancing || !self.has_more() {
            return false;
        }
        self.advancing = true;
        true
    }

    /// Applies the pending advance, if any, and clears the busy flag.
    pub fn complete_advance(&mut self) {
        if !self.advancing {
            return;
        }
        self.page_count += 1;
        self.advancing = false;
    }

    pub fn is_advancing(&self) -> bool {
        self.advancing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(titles: &[&str]) -> Vec<CatalogItem> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| CatalogItem {
                id: ProductId(i as u64 + 1),
                title: title.to_string(),
                price: None,
                description: String::new(),
                images: Vec::new(),
                thumbnail: None,
            })
            .collect()
    }

    fn loaded(titles: &[&str], page_size: usize) -> CatalogView {
        let mut view = CatalogView::with_page_size(page_size);
        let ticket = view.begin_load();
        assert!(view.finish_load(ticket, Ok(items(titles))));
        view
    }

    fn titles<'a>(slice: &[&'a CatalogItem]) -> Vec<&'a str> {
        slice.iter().map(|item| item.title.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_snapshot_in_order() {
        let mut view = loaded(&["Red Shoe", "Blue Hat", "Green Scarf"], 12);
        view.set_query("   ");
        assert_eq!(titles(&view.filtered_view()), ["Red Shoe", "Blue Hat", "Green Scarf"]);
    }

    #[test]
    fn query_is_trimmed_case_insensitive_substring() {
        let mut view = loaded(&["Red Shoe", "Blue Hat", "Hatchback Toy", "shoehorn"], 12);

        view.set_query("  HAT ");
        assert_eq!(titles(&view.filtered_view()), ["Blue Hat", "Hatchback Toy"]);

        view.set_query("shoe");
        assert_eq!(titles(&view.filtered_view()), ["Red Shoe", "shoehorn"]);

        view.set_query("xyz-no-match");
        assert!(view.filtered_view().is_empty());
        assert!(view.is_empty_result());
    }

    #[test]
    fn set_query_rewinds_pages_and_bumps_scroll_epoch() {
        let mut view = loaded(&["a1", "a2", "a3", "a4", "a5"], 2);
        assert!(view.advance());
        assert_eq!(view.page_count(), 2);
        let epoch = view.scroll_epoch();

        view.set_query("a");
        assert_eq!(view.page_count(), 1);
        assert_eq!(view.scroll_epoch(), epoch + 1);
        assert_eq!(view.visible_slice().len(), 2);
    }

    #[test]
    fn advance_grows_until_exhausted() {
        let mut view = loaded(&["1", "2", "3", "4", "5"], 2);
        let mut lengths = vec![view.visible_slice().len()];
        while view.advance() {
            lengths.push(view.visible_slice().len());
        }
        assert_eq!(lengths, [2, 4, 5]);
        assert!(!view.has_more());

        let pages = view.page_count();
        assert!(!view.advance());
        assert_eq!(view.page_count(), pages);
    }

    #[test]
    fn pending_advance_blocks_duplicate_triggers() {
        let mut view = loaded(&["1", "2", "3", "4", "5", "6", "7"], 2);
        assert!(view.begin_advance());
        assert!(!view.begin_advance());
        assert!(!view.advance());
        assert_eq!(view.page_count(), 1);

        view.complete_advance();
        assert_eq!(view.page_count(), 2);
        assert!(!view.is_advancing());

        // A second completion without a pending advance changes nothing.
        view.complete_advance();
        assert_eq!(view.page_count(), 2);
    }

    #[test]
    fn query_change_cancels_pending_advance() {
        let mut view = loaded(&["1", "2", "3"], 1);
        assert!(view.begin_advance());
        view.set_query("2");
        view.complete_advance();
        assert_eq!(view.page_count(), 1);
    }

    #[test]
    fn stale_load_result_is_discarded() {
        let mut view = CatalogView::new();
        let first = view.begin_load();
        let second = view.begin_load();

        assert!(view.finish_load(second, Ok(items(&["fresh"]))));
        assert!(!view.finish_load(first, Ok(items(&["stale", "stale"]))));

        assert_eq!(titles(&view.filtered_view()), ["fresh"]);
        assert_eq!(view.load_state(), &LoadState::Ready);
    }

    #[test]
    fn failed_load_keeps_previous_snapshot() {
        let mut view = loaded(&["kept"], 12);
        let ticket = view.begin_load();
        assert!(view.is_loading());
        view.finish_load(ticket, Err(PortError::Network("offline".to_string())));

        assert_eq!(titles(&view.filtered_view()), ["kept"]);
        assert!(matches!(view.load_state(), LoadState::Failed(PortError::Network(_))));
    }

    #[test]
    fn page_size_has_a_floor_of_one() {
        let view = loaded(&["1", "2"], 0);
        assert_eq!(view.page_size(), 1);
        assert_eq!(view.visible_slice().len(), 1);
    }
}
