//! Query, search and pagination actions

use crate::model::{ViewEffect, PAGE_SIZE};
use super::SessionController;

impl SessionController {
    pub async fn set_query(&self, query: impl Into<String>) {
        self.model.set_query(query.into()).await;
    }

    /// Enter in the search box: always starts from the first page
    pub async fn on_enter_key(&self) {
        self.search(0).await;
    }

    /// Search button: same as pressing Enter
    pub async fn on_search_button(&self) {
        self.search(0).await;
    }

    /// Search the current query at `offset`
    pub async fn search(&self, offset: u32) {
        let query = self.model.query().await;
        self.run_search(&query, offset).await;
    }

    pub async fn next_page(&self) {
        let offset = self.model.result_offset().await;
        self.search(offset.saturating_add(PAGE_SIZE as u32)).await;
    }

    pub async fn previous_page(&self) {
        let offset = self.model.result_offset().await;
        self.search(offset.saturating_sub(PAGE_SIZE as u32)).await;
    }

    /// Replace the result set with the page for `query` at `offset`.
    ///
    /// Overlapping searches are not cancelled; which response ends up on
    /// screen is decided by the configured [`crate::SearchOrdering`].
    pub async fn run_search(&self, query: &str, offset: u32) {
        let seq = self.model.begin_search(offset).await;
        self.emit(ViewEffect::ScrollToTop);

        let _loading = self.model.loading().begin();
        self.ensure_fresh_credential().await;
        let credential = self.credentials.current().await;

        let result = self.catalog.search(credential.as_ref(), query, offset).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, query = %query, offset, "Error fetching music data");
        }

        self.model
            .finish_search(seq, self.config.search_ordering, result)
            .await;
    }
}
