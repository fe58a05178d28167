//! Search results state.
//!
//! A [`SearchSession`] holds what the results view shows. Every new query or
//! page change is issued as a [`SearchRequest`] tagged with a generation
//! number; when the response comes back it only replaces the results if no
//! newer request has been issued since. Slow responses to old queries are
//! dropped instead of overwriting newer results.
//!
//! ```rust,ignore
//! let mut session = SearchSession::new();
//! if let Some(request) = session.issue("Lightning Bolt", 1) {
//!     let response = request.execute(&client).await;
//!     session.apply(response);
//! }
//! ```

use tracing::debug;

use crate::api::{ApiError, Card, CardhubClient, SearchPage};

/// One issued lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    generation: u64,
    query: String,
    page: usize,
}

impl SearchRequest {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Run the lookup. Failures are carried in the response, not returned.
    pub async fn execute(self, client: &CardhubClient) -> SearchResponse {
        let result = client.search_cards(&self.query, self.page).await;
        SearchResponse {
            generation: self.generation,
            result,
        }
    }
}

/// The outcome of a [`SearchRequest`].
#[derive(Debug)]
pub struct SearchResponse {
    pub generation: u64,
    pub result: Result<SearchPage, ApiError>,
}

/// What [`SearchSession::apply`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The response belonged to the latest request and is now shown.
    Current,
    /// A newer request was issued in the meantime; the response was dropped.
    Superseded,
}

/// Search results view state.
#[derive(Debug, Default)]
pub struct SearchSession {
    generation: u64,
    query: String,
    page: usize,
    loading: bool,
    error: Option<String>,
    total: usize,
    cards: Vec<Card>,
    has_more: bool,
}

impl SearchSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }

    /// Start a lookup for `query` at `page` (1-based, 0 reads as 1).
    ///
    /// A blank query clears the results and issues nothing. Either way any
    /// request still in flight is superseded.
    pub fn issue(&mut self, query: &str, page: usize) -> Option<SearchRequest> {
        self.generation = self.generation.wrapping_add(1);
        self.query = query.trim().to_owned();
        self.page = page.max(1);
        self.error = None;

        if self.query.is_empty() {
            self.loading = false;
            self.clear_results();
            return None;
        }

        self.loading = true;
        Some(SearchRequest {
            generation: self.generation,
            query: self.query.clone(),
            page: self.page,
        })
    }

    /// Show a response if it answers the latest request.
    pub fn apply(&mut self, response: SearchResponse) -> Applied {
        if response.generation != self.generation {
            debug!(
                response = response.generation,
                latest = self.generation,
                "Dropping superseded search response"
            );
            return Applied::Superseded;
        }

        self.loading = false;
        match response.result {
            Ok(page) => {
                self.error = None;
                self.total = page.total;
                self.has_more = page.has_more;
                self.cards = page.cards;
            }
            Err(e) => {
                debug!(error = %e, query = %self.query, "Search failed");
                self.error = Some(e.to_string());
                self.clear_results();
            }
        }
        Applied::Current
    }

    fn clear_results(&mut self) {
        self.cards.clear();
        self.total = 0;
        self.has_more = false;
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// The card shown at `id`, for opening its detail view.
    #[must_use]
    pub fn card(&self, id: cardhub_core::CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }
}
