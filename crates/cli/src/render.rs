//! Terminal output. Results go to stdout, notices and errors to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use cardhub_core::Price;
use cardhub_storefront::api::{Card, SearchPage, User};
use cardhub_storefront::cart::{CartLine, CartSection, CartSummary};
use cardhub_storefront::error::AppError;
use cardhub_storefront::product::ProductPopup;
use cardhub_storefront::profile::ProfileForm;

pub fn notice(message: &str) {
    eprintln!("{message}");
}

/// Print an error the way the user should see it.
///
/// An expired or missing session also points at `cardhub login`.
pub fn failure(error: &AppError) {
    eprintln!("error: {}", error.user_message());
    if matches!(error, AppError::SessionExpired) {
        eprintln!("Sign in with `cardhub login -e <email>` and try again.");
    }
}

pub fn search_page(query: &str, page: &SearchPage) {
    if page.cards.is_empty() {
        println!("No cards found for \"{query}\"");
        return;
    }

    for card in &page.cards {
        println!("{}", card_row(card));
    }
    println!();
    println!(
        "Page {} of {} ({} cards)",
        page.page,
        page.page_count().max(1),
        page.total
    );
    if page.has_more {
        println!(
            "Next page: cardhub search \"{query}\" --page {}",
            page.page + 1
        );
    }
}

fn card_row(card: &Card) -> String {
    let availability = match card.min_price {
        _ if card.is_preorder() => "pre-order".to_string(),
        Some(price) => format!("{} in stock, from {price}", card.in_stock),
        None => format!("{} in stock", card.in_stock),
    };
    format!(
        "[{}] {} ({} #{}) - {availability}",
        card.id,
        card.name,
        card.set_code.to_uppercase(),
        card.collector_number
    )
}

pub fn product(popup: &ProductPopup) {
    let card = popup.card();
    println!("{} - {}", card.name, popup.heading());
    println!("  {}", card.type_line);
    println!("  {} ({}) #{}", card.set_name, card.set_code.to_uppercase(), card.collector_number);
    if let Some(color) = &card.color {
        println!("  Color: {color}");
    }
    match popup.price_from() {
        Some(price) => println!("  From {price}"),
        None if card.is_preorder() => println!("  Price agreed with a manager"),
        None => {}
    }
    let grades: Vec<String> = popup
        .quality_choices()
        .iter()
        .map(|q| format!("{q} ({})", q.label()))
        .collect();
    println!("  Grades: {}", grades.join(", "));
    println!("  Up to {} per order", popup.max_quantity());
    println!("  Image: {}", popup.image_url());
    println!("  Id: {}", card.id);
}

pub fn added(popup: &ProductPopup, quantity: u32, summary: &CartSummary<'_>) {
    let copies = if quantity == 1 { "copy" } else { "copies" };
    println!(
        "Added {quantity} {copies} of {} ({}) to the cart",
        popup.card().name,
        popup.quality()
    );
    println!("{}", capacity_line(summary));
}

pub fn cart(summary: &CartSummary<'_>) {
    if summary.is_empty() {
        println!("Your cart is empty");
        return;
    }

    if !summary.purchase.is_empty() {
        section("In stock", &summary.purchase, true);
        println!("  Total: {}", summary.purchase.total);
    }
    if !summary.preorder.is_empty() {
        if !summary.purchase.is_empty() {
            println!();
        }
        section("Pre-order", &summary.preorder, false);
        println!("  A manager will confirm prices before you pay");
    }

    println!();
    println!("{}", capacity_line(summary));
    if summary.offers_combined_checkout() {
        println!("Checkout: cardhub cart checkout purchase | preorder | all");
    } else if summary.purchase.is_empty() {
        println!("Checkout: cardhub cart checkout preorder");
    } else {
        println!("Checkout: cardhub cart checkout purchase");
    }
}

fn section(title: &str, section: &CartSection<'_>, priced: bool) {
    let cards = if section.count == 1 { "card" } else { "cards" };
    println!("{title} ({} {cards})", section.count);
    for line in &section.lines {
        println!("  {}", line_row(line, priced));
    }
}

fn line_row(line: &CartLine, priced: bool) -> String {
    let head = format!(
        "[{}] {} ({}) {} x{}",
        line.item.id,
        line.item.name,
        line.item.set_code.to_uppercase(),
        line.quality,
        line.quantity
    );
    if !priced {
        return head;
    }
    match line.item.price {
        Some(price) => format!("{head}  {}", Price::new(line.subtotal(), price.currency_code)),
        None => format!("{head}  no price yet"),
    }
}

fn capacity_line(summary: &CartSummary<'_>) -> String {
    format!(
        "{} of {} cards, room for {} more",
        summary.count,
        summary.limits.max_total,
        summary.remaining_capacity()
    )
}

pub fn signed_in(user: &User) {
    println!("Signed in as {} ({})", user.display_name(), user.email);
}

pub fn profile(form: &ProfileForm) {
    let user = form.user();
    println!("{}", user.display_name());
    println!("  Email: {}{}", user.email, if user.email_confirmed { "" } else { " (not confirmed)" });
    println!("  Role: {}", user.role);
    println!("  Telegram: {}", form.telegram_status());
    if let Some(address) = user.shipping_address.as_deref().filter(|a| !a.trim().is_empty()) {
        println!("  Shipping address: {address}");
    }
    if let Some(created) = user.created_at {
        println!("  Member since {}", created.date_naive());
    }
}
