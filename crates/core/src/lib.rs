//! CardHub Core - Shared domain types.
//!
//! This crate provides the value types used across all CardHub components:
//! - `storefront` - Cart engine, catalog client, and session handling
//! - `cli` - Command-line front end for the storefront
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. Everything here is cheap to construct in tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, quality grades, and availability

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
