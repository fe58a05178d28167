//! CardHub Storefront library.
//!
//! Everything the storefront does short of drawing it: the cart engine and
//! its persistence, the catalog and account API client, search and session
//! state, the card detail and profile models, and checkout entry points.
//! Front ends (the `cardhub` CLI) drive these types and render the results.
//!
//! # Modules
//!
//! - [`cart`] - Cart aggregate with capacity rules and purchase/pre-order views
//! - [`storage`] - Key/value persistence port with file and memory adapters
//! - [`api`] - HTTP client for the CardHub service
//! - [`search`] - Search results state with stale-response protection
//! - [`session`] - Sign-in state and authorized calls
//! - [`product`] - Card detail view model
//! - [`profile`] - Profile form and Telegram status
//! - [`checkout`] - Checkout entry points
//! - [`config`], [`error`], [`telemetry`] - Configuration, errors, logging

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod product;
pub mod profile;
pub mod search;
pub mod session;
pub mod storage;
pub mod telemetry;
