//! KoosDoos Core - storefront domain library.
//!
//! This crate holds the buyer-facing state machines of the KoosDoos fire pit
//! shop, shared by the components of the workspace:
//! - `storefront` - HTTP service the site talks to
//! - `cli` - command-line tools for catalog checks and quote estimates
//!
//! # Architecture
//!
//! The core crate has no HTTP clients and no server. Persistence goes through
//! the [`storage::KeyValueStore`] port and remote shipping quotes through the
//! [`shipping::QuoteSource`] trait, so everything here runs the same in the
//! storefront, the CLI and tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails and provinces
//! - [`catalog`] - Products and variants the cart resolves against
//! - [`storage`] - Key-value persistence port
//! - [`cart`] - Cart store with snapshot persistence and subscribers
//! - [`address`] - South African address validation and form state
//! - [`shipping`] - Quote lookup with fallback rates and the calculator
//! - [`checkout`] - Checkout gating, inventory checks and payment hand-off
//! - [`consent`] - Cookie consent record

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod consent;
pub mod shipping;
pub mod storage;
pub mod types;

pub use types::*;
