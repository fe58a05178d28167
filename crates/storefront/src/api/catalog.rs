//! Catalog search.

use serde_json::Value;
use tracing::{instrument, warn};

use cardhub_core::CardId;

use super::types::{Card, SearchPage};
use super::{ApiError, CardhubClient, wire};

impl CardhubClient {
    /// Search cards by name and return one page of results.
    ///
    /// The service returns every match at once; the page window is cut
    /// client side. `page` is 1-based and 0 is treated as 1. A blank query
    /// returns an empty page without a request.
    ///
    /// # Errors
    ///
    /// See [`CardhubClient::search_all`].
    #[instrument(skip(self), fields(limit = self.page_size()))]
    pub async fn search_cards(&self, name: &str, page: usize) -> Result<SearchPage, ApiError> {
        let limit = self.page_size();
        if name.trim().is_empty() {
            return Ok(SearchPage::empty(page.max(1), limit));
        }

        let (total, cards) = self.search_all(name).await?;
        Ok(paginate(cards, total, page, limit))
    }

    /// Search cards by name and return the reported total with every
    /// decodable match, from a single request.
    ///
    /// A blank query returns `(0, [])` without a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not the
    /// `[total, [row, ...]]` pair. Individual rows that cannot be decoded are
    /// skipped with a warning.
    pub async fn search_all(&self, name: &str) -> Result<(usize, Vec<Card>), ApiError> {
        let query = name.trim();
        if query.is_empty() {
            return Ok((0, Vec::new()));
        }

        let url = self.endpoint(&format!("/cards/search/{}", urlencoding::encode(query)))?;
        let (total, rows): (u64, Vec<Value>) = self.execute(self.http().get(url)).await?;

        let cards = decode_cards(&rows);
        Ok((usize::try_from(total).unwrap_or(usize::MAX), cards))
    }

    /// Pick one card out of a name search.
    ///
    /// With `id`, the card with that id. Without, the first card whose name
    /// equals the query ignoring ASCII case, else the first result.
    ///
    /// # Errors
    ///
    /// See [`CardhubClient::search_all`].
    #[instrument(skip(self))]
    pub async fn find_card(&self, name: &str, id: Option<CardId>) -> Result<Option<Card>, ApiError> {
        let (_, cards) = self.search_all(name).await?;
        Ok(pick_card(cards, name.trim(), id))
    }
}

fn pick_card(cards: Vec<Card>, query: &str, id: Option<CardId>) -> Option<Card> {
    match id {
        Some(id) => cards.into_iter().find(|c| c.id == id),
        None => {
            let exact = cards
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(query))
                .unwrap_or(0);
            cards.into_iter().nth(exact)
        }
    }
}

fn decode_cards(rows: &[Value]) -> Vec<Card> {
    rows.iter()
        .enumerate()
        .filter_map(|(position, row)| match wire::card(row) {
            Ok(card) => Some(card),
            Err(e) => {
                warn!(position, error = %e, "Skipping undecodable card row");
                None
            }
        })
        .collect()
}

/// Cut the window for a 1-based `page` out of the full result list.
fn paginate(cards: Vec<Card>, total: usize, page: usize, limit: usize) -> SearchPage {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(limit);
    let end = start.saturating_add(limit);

    SearchPage {
        total,
        cards: cards.into_iter().skip(start).take(limit).collect(),
        page,
        limit,
        has_more: end < total,
    }
}
