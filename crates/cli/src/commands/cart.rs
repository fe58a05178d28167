//! Cart commands.

use cardhub_core::{CardId, Quality};
use cardhub_storefront::cart::{CartError, Rejection};
use cardhub_storefront::checkout::{self, CheckoutKind};
use cardhub_storefront::error::{AppError, add_breadcrumb};
use cardhub_storefront::product::ProductPopup;

use super::Context;
use super::catalog::find_card;
use crate::render;

pub fn show(ctx: &Context) -> Result<(), AppError> {
    let cart = ctx.cart()?;
    render::cart(&cart.summary());
    Ok(())
}

pub async fn add(
    ctx: &Context,
    query: &str,
    id: Option<CardId>,
    quality: Quality,
    quantity: u32,
) -> Result<(), AppError> {
    if quantity == 0 {
        return Err(CartError::from(Rejection::EmptyQuantity).into());
    }

    let card = find_card(ctx, query, id).await?;
    let mut popup = ProductPopup::new(card);

    if !popup.select_quality(quality) {
        let offered: Vec<String> = popup.quality_choices().iter().map(ToString::to_string).collect();
        return Err(AppError::BadRequest(format!(
            "{} is not available in {quality}; choose one of {}",
            popup.card().name,
            offered.join(", ")
        )));
    }

    let mut cart = ctx.cart()?;
    popup.sync_with_cart(&cart);
    let line = popup.in_cart().saturating_add(quantity);
    cart.limits()
        .check(line, cart.count().saturating_add(quantity))
        .map_err(CartError::from)?;

    popup.set_quantity(quantity);
    if popup.max_quantity() > 0 && popup.quantity() < quantity {
        let copies = if popup.quantity() == 1 { "copy" } else { "copies" };
        render::notice(&format!(
            "Only {} more {copies} in stock, adding what there is",
            popup.quantity()
        ));
    }

    let card_id = popup.card().id.to_string();
    let added = popup.quantity();
    popup.add_to_cart(&mut cart)?;
    add_breadcrumb(
        "cart",
        "Added card",
        Some(&[
            ("card_id", card_id.as_str()),
            ("quality", quality.code()),
            ("quantity", added.to_string().as_str()),
        ]),
    );

    render::added(&popup, added, &cart.summary());
    Ok(())
}

pub fn remove(ctx: &Context, card_id: CardId, quality: Quality) -> Result<(), AppError> {
    let mut cart = ctx.cart()?;
    if !cart.remove(card_id, quality)? {
        return Err(AppError::BadRequest(format!(
            "Card {card_id} in {quality} is not in the cart"
        )));
    }
    add_breadcrumb(
        "cart",
        "Removed card",
        Some(&[("card_id", card_id.to_string().as_str()), ("quality", quality.code())]),
    );

    render::cart(&cart.summary());
    Ok(())
}

pub fn set(ctx: &Context, card_id: CardId, quality: Quality, quantity: u32) -> Result<(), AppError> {
    let mut cart = ctx.cart()?;
    if cart.line(card_id, quality).is_none() {
        return Err(AppError::BadRequest(format!(
            "Card {card_id} in {quality} is not in the cart"
        )));
    }
    if !cart.set_quantity(card_id, quality, quantity)? {
        return Err(AppError::BadRequest(format!(
            "Quantity must be at least 1; use `cardhub cart remove {card_id} {quality}` to drop the line"
        )));
    }

    render::cart(&cart.summary());
    Ok(())
}

pub fn clear(ctx: &Context) -> Result<(), AppError> {
    let mut cart = ctx.cart()?;
    cart.clear()?;
    add_breadcrumb("cart", "Cleared cart", None);
    render::notice("Cart cleared");
    Ok(())
}

pub fn checkout(ctx: &Context, kind: CheckoutKind) -> Result<(), AppError> {
    let cart = ctx.cart()?;
    let summary = cart.summary();
    add_breadcrumb("checkout", "Checkout requested", Some(&[("kind", kind.to_string().as_str())]));

    match kind {
        CheckoutKind::Purchase => checkout::checkout_purchase(&summary)?,
        CheckoutKind::Preorder => checkout::checkout_preorder(&summary)?,
        CheckoutKind::All => checkout::checkout_all(&summary)?,
    }
    Ok(())
}
