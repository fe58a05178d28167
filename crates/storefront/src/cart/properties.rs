//! Cart invariants over random sequences of changes.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use proptest::prelude::*;

use cardhub_core::{CardId, CurrencyCode, Price, Quality};

use super::{Cart, CatalogItem, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};
use crate::storage::MemoryStorage;

#[derive(Debug, Clone)]
enum Op {
    Add {
        id: i64,
        quality: Quality,
        quantity: u32,
        preorder: bool,
    },
    Set {
        id: i64,
        quality: Quality,
        quantity: u32,
    },
    Remove {
        id: i64,
        quality: Quality,
    },
}

/// (card id, grade, quantity) in cart order.
type Lines = Vec<(i64, Quality, u32)>;

fn grade() -> impl Strategy<Value = Quality> {
    prop::sample::select(Quality::ALL.to_vec())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..8i64, grade(), 0..=6u32, any::<bool>()).prop_map(
            |(id, quality, quantity, preorder)| Op::Add { id, quality, quantity, preorder }
        ),
        2 => (0..8i64, grade(), 0..=6u32)
            .prop_map(|(id, quality, quantity)| Op::Set { id, quality, quantity }),
        1 => (0..8i64, grade()).prop_map(|(id, quality)| Op::Remove { id, quality }),
    ]
}

fn item(id: i64, preorder: bool) -> CatalogItem {
    CatalogItem {
        id: CardId::new(id),
        name: format!("Card {id}"),
        set_code: "mh2".to_owned(),
        set_name: "Modern Horizons 2".to_owned(),
        image_url_small: None,
        price: (!preorder).then(|| Price::new(25.into(), CurrencyCode::RUB)),
        is_preorder: preorder,
    }
}

fn lines<P>(cart: &Cart<P>) -> Lines {
    cart.lines()
        .iter()
        .map(|l| (l.item.id.get(), l.quality, l.quantity))
        .collect()
}

/// What the lines should be after `op`, applying both caps by hand.
fn expected(before: &Lines, op: &Op) -> Lines {
    let count: u32 = before.iter().map(|l| l.2).sum();
    let position = |id: i64, quality: Quality| {
        before
            .iter()
            .position(|l| l.0 == id && l.1 == quality)
    };
    let mut next = before.clone();

    match *op {
        Op::Add {
            id,
            quality,
            quantity,
            ..
        } => {
            let held = position(id, quality)
                .and_then(|i| before.get(i))
                .map_or(0, |l| l.2);
            let fits = quantity > 0
                && held + quantity <= MAX_ITEM_QUANTITY
                && count + quantity <= MAX_CART_ITEMS;
            if fits {
                match position(id, quality).and_then(|i| next.get_mut(i)) {
                    Some(line) => line.2 += quantity,
                    None => next.push((id, quality, quantity)),
                }
            }
        }
        Op::Set {
            id,
            quality,
            quantity,
        } => {
            if let Some(line) = position(id, quality).and_then(|i| next.get_mut(i)) {
                let fits = quantity > 0
                    && quantity <= MAX_ITEM_QUANTITY
                    && count - line.2 + quantity <= MAX_CART_ITEMS;
                if fits {
                    line.2 = quantity;
                }
            }
        }
        Op::Remove { id, quality } => next.retain(|l| !(l.0 == id && l.1 == quality)),
    }

    next
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn property_random_changes_keep_cart_invariants(
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let storage = MemoryStorage::new();
        let mut cart = Cart::load(&storage).unwrap();

        for op in &ops {
            let before = lines(&cart);
            let outcome = match *op {
                Op::Add { id, quality, quantity, preorder } => {
                    cart.add(item(id, preorder), quality, quantity).map(|()| true)
                }
                Op::Set { id, quality, quantity } => {
                    cart.set_quantity(CardId::new(id), quality, quantity)
                }
                Op::Remove { id, quality } => cart.remove(CardId::new(id), quality),
            };
            let after = lines(&cart);

            prop_assert_eq!(&after, &expected(&before, op), "after {:?}", op);
            if outcome.is_err() {
                prop_assert_eq!(&after, &before, "rejected {:?} changed the cart", op);
            }

            prop_assert!(cart.count() <= MAX_CART_ITEMS);
            prop_assert!(after.iter().all(|l| (1..=MAX_ITEM_QUANTITY).contains(&l.2)));

            let keys: HashSet<(i64, Quality)> = after.iter().map(|l| (l.0, l.1)).collect();
            prop_assert_eq!(keys.len(), after.len());

            let purchasable = cart.purchasable().count();
            let preorderable = cart.preorderable().count();
            prop_assert_eq!(purchasable + preorderable, after.len());
            prop_assert!(cart.purchasable().all(|l| !l.is_preorder()));
            prop_assert!(cart.preorderable().all(|l| l.is_preorder()));

            let reloaded = Cart::load(&storage).unwrap();
            prop_assert_eq!(lines(&reloaded), after);
        }
    }

    #[test]
    fn property_different_cards_never_merge(
        first in 0..8i64,
        second in 0..8i64,
        quality in grade(),
    ) {
        prop_assume!(first != second);
        let storage = MemoryStorage::new();
        let mut cart = Cart::load(&storage).unwrap();

        cart.add(item(first, false), quality, 2).unwrap();
        cart.add(item(second, true), quality, 2).unwrap();

        prop_assert_eq!(cart.lines().len(), 2);
        prop_assert_eq!(cart.purchasable().count(), 1);
        prop_assert_eq!(cart.preorderable().count(), 1);
    }
}
