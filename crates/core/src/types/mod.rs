//! Core types for CardHub.
//!
//! This module provides type-safe wrappers for the marketplace's domain concepts.

pub mod availability;
pub mod email;
pub mod id;
pub mod price;
pub mod quality;

pub use availability::Availability;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use quality::{Quality, QualityError};
