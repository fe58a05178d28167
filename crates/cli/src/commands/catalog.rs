//! Catalog search and card lookup.

use tracing::debug;

use cardhub_core::CardId;
use cardhub_storefront::api::Card;
use cardhub_storefront::error::AppError;
use cardhub_storefront::product::ProductPopup;

use super::Context;
use crate::render;

pub async fn search(ctx: &Context, query: &str, page: usize) -> Result<(), AppError> {
    let results = ctx.client.search_cards(query, page).await?;
    render::search_page(query, &results);
    Ok(())
}

pub async fn show(ctx: &Context, query: &str, id: Option<CardId>) -> Result<(), AppError> {
    let card = find_card(ctx, query, id).await?;
    render::product(&ProductPopup::new(card));
    Ok(())
}

/// Resolve a card from a name search.
///
/// With an id, the card with that id among the results. Without one, an
/// exact name match, else the first result.
pub async fn find_card(ctx: &Context, query: &str, id: Option<CardId>) -> Result<Card, AppError> {
    if query.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Enter a card name to search for".to_string(),
        ));
    }

    let found = ctx.client.find_card(query, id).await?;
    debug!(found = found.is_some(), "Looked up card");

    found.ok_or_else(|| {
        AppError::BadRequest(match id {
            Some(id) => format!("Card {id} is not among the results for \"{query}\""),
            None => format!("No cards found for \"{query}\""),
        })
    })
}
