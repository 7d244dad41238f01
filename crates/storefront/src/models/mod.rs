//! Session-backed models for the storefront.
//!
//! The storefront is stateless between requests apart from the visitor's
//! session, which holds the same JSON records a browser would keep in local
//! storage.

pub mod session;

pub use session::keys as session_keys;
pub use session::{ShippingSelection, load_storage, store_storage};
